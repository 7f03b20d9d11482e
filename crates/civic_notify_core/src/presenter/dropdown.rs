//! Notification dropdown: paged list with per-row actions.

use crate::model::notification::{NotificationId, Priority};
use crate::presenter::badge::badge_label;
use crate::presenter::routing::route_for;
use crate::repo::notification_api::NotificationApi;
use crate::service::notification_store::{NotificationStore, StoreResult};
use chrono::{DateTime, Utc};

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownRow {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub priority: Priority,
    pub is_read: bool,
    pub route: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownView {
    pub rows: Vec<DropdownRow>,
    pub badge: Option<String>,
    pub page: u32,
    pub has_more: bool,
    /// Transient message of the last failed command.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropdownPresenter {
    limit: u32,
    badge_cap: u64,
    open: bool,
    error: Option<String>,
}

impl DropdownPresenter {
    pub fn new(limit: u32, badge_cap: u64) -> Self {
        Self {
            limit: limit.max(1),
            badge_cap,
            open: false,
            error: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Opens the dropdown and loads the first page.
    pub fn open<A: NotificationApi>(&mut self, store: &mut NotificationStore<A>) -> StoreResult<()> {
        self.open = true;
        let result = store.fetch(1, self.limit);
        self.record(result)
    }

    pub fn close(&mut self) {
        self.open = false;
        self.error = None;
    }

    /// Loads the following page when one exists.
    pub fn next_page<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
    ) -> StoreResult<()> {
        if !store.has_more() {
            return Ok(());
        }
        let result = store.fetch(store.pagination().page + 1, self.limit);
        self.record(result)
    }

    pub fn previous_page<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
    ) -> StoreResult<()> {
        let page = store.pagination().page;
        if page <= 1 {
            return Ok(());
        }
        let result = store.fetch(page - 1, self.limit);
        self.record(result)
    }

    pub fn mark_read<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
        id: &NotificationId,
    ) -> StoreResult<()> {
        let result = store.mark_as_read(id).map(|_| ());
        self.record(result)
    }

    pub fn mark_all_read<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
    ) -> StoreResult<()> {
        let result = store.mark_all_as_read();
        self.record(result)
    }

    pub fn delete<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
        id: &NotificationId,
    ) -> StoreResult<()> {
        let result = store.delete(id);
        self.record(result)
    }

    pub fn delete_all_read<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
    ) -> StoreResult<()> {
        let result = store.delete_all_read().map(|_| ());
        self.record(result)
    }

    pub fn render<A: NotificationApi>(
        &self,
        store: &NotificationStore<A>,
        now: DateTime<Utc>,
    ) -> DropdownView {
        let rows = store
            .notifications()
            .iter()
            .map(|notification| DropdownRow {
                id: notification.id.clone(),
                title: notification.title.clone(),
                message: notification.message.clone(),
                priority: notification.priority,
                is_read: notification.is_read,
                route: route_for(notification),
                age: relative_age(notification.created_at, now),
            })
            .collect();

        DropdownView {
            rows,
            badge: badge_label(store.unread_count(), self.badge_cap),
            page: store.pagination().page,
            has_more: store.has_more(),
            error: self.error.clone(),
        }
    }

    fn record(&mut self, result: StoreResult<()>) -> StoreResult<()> {
        self.error = result.as_ref().err().map(ToString::to_string);
        result
    }
}

/// Short age label: "just now", "5m ago", "3h ago", "2d ago".
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    if elapsed.num_minutes() < 1 {
        "just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else {
        format!("{}d ago", elapsed.num_days())
    }
}
