//! Toast manager: bounded presentation queue plus auto-dismiss timers.
//!
//! # Responsibility
//! - Turn incoming notifications into visible toasts and play their cue.
//! - Expire toasts on their deadline; handle dismiss/view/mark-read actions.
//!
//! # Invariants
//! - Never more than `capacity` visible toasts; the oldest is evicted first,
//!   regardless of priority.
//! - A toast's timer starts the instant it becomes visible.
//! - Removal cancels the toast token before the store is touched.
//! - Store failures are reported in `ToastAction::error`; the toast closes
//!   anyway.

use crate::config::NotifyConfig;
use crate::model::notification::{Notification, NotificationId, Priority};
use crate::presenter::routing::route_for;
use crate::repo::notification_api::NotificationApi;
use crate::service::notification_store::{NotificationStore, StoreError};
use crate::sound::synthesizer::SoundSynthesizer;
use crate::toast::queue::{BoundedToastQueue, RemovalReason, ToastEntry, ToastState};
use crate::toast::timer::TimerQueue;
use crate::toast::ToastId;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Result of a user action on a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastAction {
    pub toast_id: ToastId,
    pub notification_id: NotificationId,
    /// Set by "view" only.
    pub navigate_to: Option<String>,
    /// Non-blocking error indicator for the UI.
    pub error: Option<StoreError>,
}

pub struct ToastManager {
    queue: BoundedToastQueue,
    timers: TimerQueue,
    duration: Duration,
    urgent_duration: Duration,
    sound: Option<Arc<SoundSynthesizer>>,
}

impl ToastManager {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            queue: BoundedToastQueue::new(config.toast_capacity),
            timers: TimerQueue::new(),
            duration: config.toast_duration(Priority::Normal),
            urgent_duration: config.toast_duration(Priority::Urgent),
            sound: None,
        }
    }

    /// Plays a cue through `sound` for every enqueued toast.
    pub fn with_sound(mut self, sound: Arc<SoundSynthesizer>) -> Self {
        self.sound = Some(sound);
        self
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn duration_for(&self, priority: Priority) -> Duration {
        match priority {
            Priority::Urgent => self.urgent_duration,
            _ => self.duration,
        }
    }

    /// Presents `notification` and starts its auto-dismiss timer.
    pub fn enqueue(&mut self, notification: Notification, now: Instant) -> ToastId {
        let priority = notification.priority;
        let expires_at = now + self.duration_for(priority);
        let mut entry = ToastEntry::new(notification, now, expires_at);
        entry.state = ToastState::Visible;

        let toast_id = entry.toast_id;
        self.timers
            .schedule(toast_id, expires_at, entry.token.clone());
        if let Some(sound) = &self.sound {
            sound.play_by_type(&entry.notification.kind, Some(priority));
        }

        if let Some(evicted) = self.queue.push(entry) {
            debug!(
                "event=toast_remove module=toast reason={} toast_id={} notification_id={}",
                RemovalReason::Evicted.as_str(),
                evicted.toast_id,
                evicted.notification.id
            );
        }
        info!(
            "event=toast_enqueue module=toast status=ok toast_id={toast_id} priority={priority} visible={}",
            self.queue.len()
        );
        toast_id
    }

    /// Visible toasts, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &ToastEntry> {
        self.queue.iter()
    }

    pub fn get(&self, toast_id: ToastId) -> Option<&ToastEntry> {
        self.queue.get(toast_id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of timers that can still fire.
    pub fn pending_timers(&self) -> usize {
        self.timers.live()
    }

    /// Earliest auto-dismiss deadline among visible toasts.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Fires every timer due at `now`. Returns the auto-dismissed toasts.
    pub fn fire_due(&mut self, now: Instant) -> Vec<ToastEntry> {
        self.timers
            .pop_due(now)
            .into_iter()
            .filter_map(|toast_id| self.remove(toast_id, RemovalReason::AutoDismiss))
            .collect()
    }

    /// Closes one toast without touching read state.
    pub fn dismiss(&mut self, toast_id: ToastId) -> bool {
        self.remove(toast_id, RemovalReason::ManualDismiss).is_some()
    }

    /// Marks read, closes the toast and returns the navigation target.
    pub fn view<A: NotificationApi>(
        &mut self,
        toast_id: ToastId,
        store: &mut NotificationStore<A>,
    ) -> Option<ToastAction> {
        let entry = self.remove(toast_id, RemovalReason::Viewed)?;
        let error = mark_read_in_store(store, &entry.notification.id);
        Some(ToastAction {
            toast_id,
            navigate_to: Some(route_for(&entry.notification)),
            notification_id: entry.notification.id,
            error,
        })
    }

    /// Marks read and closes the toast without navigating.
    pub fn mark_read<A: NotificationApi>(
        &mut self,
        toast_id: ToastId,
        store: &mut NotificationStore<A>,
    ) -> Option<ToastAction> {
        let entry = self.remove(toast_id, RemovalReason::MarkedRead)?;
        let error = mark_read_in_store(store, &entry.notification.id);
        Some(ToastAction {
            toast_id,
            navigate_to: None,
            notification_id: entry.notification.id,
            error,
        })
    }

    /// Tears the surface down: cancels every timer and removes every toast.
    pub fn clear(&mut self) -> usize {
        let removed = self.queue.drain(RemovalReason::Cleared).len();
        self.timers.clear();
        if removed > 0 {
            debug!("event=toast_clear module=toast removed={removed}");
        }
        removed
    }

    fn remove(&mut self, toast_id: ToastId, reason: RemovalReason) -> Option<ToastEntry> {
        let entry = self.queue.remove(toast_id, reason)?;
        debug!(
            "event=toast_remove module=toast reason={} toast_id={} notification_id={}",
            reason.as_str(),
            toast_id,
            entry.notification.id
        );
        Some(entry)
    }
}

impl Drop for ToastManager {
    fn drop(&mut self) {
        self.clear();
    }
}

fn mark_read_in_store<A: NotificationApi>(
    store: &mut NotificationStore<A>,
    id: &NotificationId,
) -> Option<StoreError> {
    match store.mark_as_read(id) {
        Ok(_) => None,
        Err(err) => {
            warn!("event=toast_mark_read module=toast status=error notification_id={id} error={err}");
            Some(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ToastManager;
    use crate::config::NotifyConfig;
    use crate::model::notification::{Notification, NotificationType, Priority};
    use std::time::{Duration, Instant};

    fn notification(id: &str, priority: Priority) -> Notification {
        Notification::new(id, NotificationType::System, "t", "m").with_priority(priority)
    }

    #[test]
    fn urgent_toast_outlives_normal_toast() {
        let mut toasts = ToastManager::new(&NotifyConfig::default());
        let now = Instant::now();
        let normal = toasts.enqueue(notification("a", Priority::Normal), now);
        let urgent = toasts.enqueue(notification("b", Priority::Urgent), now);

        let expired = toasts.fire_due(now + Duration::from_secs(5));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].toast_id, normal);
        assert!(toasts.get(urgent).is_some());

        let expired = toasts.fire_due(now + Duration::from_secs(10));
        assert_eq!(expired[0].toast_id, urgent);
        assert!(toasts.is_empty());
    }

    #[test]
    fn dismissed_toast_timer_never_fires() {
        let mut toasts = ToastManager::new(&NotifyConfig::default());
        let now = Instant::now();
        let toast_id = toasts.enqueue(notification("a", Priority::Normal), now);
        assert!(toasts.dismiss(toast_id));
        assert!(!toasts.dismiss(toast_id));
        assert_eq!(toasts.pending_timers(), 0);
        assert!(toasts.fire_due(now + Duration::from_secs(60)).is_empty());
        assert_eq!(toasts.next_deadline(), None);
    }

    #[test]
    fn evicted_toast_timer_is_cancelled() {
        let mut toasts = ToastManager::new(&NotifyConfig::default());
        let now = Instant::now();
        for index in 0..4 {
            toasts.enqueue(notification(&format!("n-{index}"), Priority::Urgent), now);
        }
        assert_eq!(toasts.len(), 3);
        assert_eq!(toasts.pending_timers(), 3);
    }

    #[test]
    fn clear_cancels_everything() {
        let mut toasts = ToastManager::new(&NotifyConfig::default());
        let now = Instant::now();
        toasts.enqueue(notification("a", Priority::Normal), now);
        toasts.enqueue(notification("b", Priority::High), now);
        assert_eq!(toasts.clear(), 2);
        assert_eq!(toasts.pending_timers(), 0);
        assert!(toasts.is_empty());
    }
}
