//! Unread badge.

use crate::repo::notification_api::NotificationApi;
use crate::service::notification_store::NotificationStore;

/// Badge text for `count`, capped as `"{cap}+"`. `None` hides the badge.
pub fn badge_label(count: u64, cap: u64) -> Option<String> {
    match count {
        0 => None,
        count if count > cap => Some(format!("{cap}+")),
        count => Some(count.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgePresenter {
    cap: u64,
}

impl BadgePresenter {
    pub fn new(cap: u64) -> Self {
        Self { cap }
    }

    pub fn render<A: NotificationApi>(&self, store: &NotificationStore<A>) -> Option<String> {
        badge_label(store.unread_count(), self.cap)
    }
}

impl Default for BadgePresenter {
    fn default() -> Self {
        Self::new(99)
    }
}
