use civic_notify_core::toast::queue::{RemovalReason, ToastState};
use civic_notify_core::{
    EventSourceAdapter, InMemoryNotificationApi, LocalPushHub, Notification, NotificationId,
    NotificationStore, NotificationType, NotifyConfig, Priority, ToastManager,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Store = NotificationStore<Arc<InMemoryNotificationApi>>;

fn store_with(api: &Arc<InMemoryNotificationApi>) -> Store {
    let mut store = NotificationStore::new(Arc::clone(api));
    store.fetch(1, 10).unwrap();
    store.fetch_unread_count().unwrap();
    store
}

/// Seeds the backend, inserts into the store and presents a toast.
fn deliver(
    api: &InMemoryNotificationApi,
    store: &mut Store,
    toasts: &mut ToastManager,
    notification: Notification,
    now: Instant,
) -> civic_notify_core::ToastId {
    api.seed(notification.clone());
    store.insert_received(notification.clone());
    toasts.enqueue(notification, now)
}

#[test]
fn fourth_toast_evicts_the_oldest_but_store_keeps_it() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let now = Instant::now();

    for index in 0..4 {
        let notification = Notification::new(
            format!("n{index}"),
            NotificationType::System,
            format!("title {index}"),
            "body",
        );
        deliver(&api, &mut store, &mut toasts, notification, now);
    }

    let visible: Vec<&str> = toasts
        .visible()
        .map(|entry| entry.notification.id.as_str())
        .collect();
    assert_eq!(visible, vec!["n1", "n2", "n3"]);
    assert!(toasts.visible().all(|entry| entry.state == ToastState::Visible));
    assert!(store.get(&NotificationId::new("n0")).is_some());
    assert_eq!(store.unread_count(), 4);
    assert_eq!(toasts.pending_timers(), 3);
}

#[test]
fn urgent_push_counts_and_uses_the_long_window() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let hub = LocalPushHub::new();
    let mut adapter = EventSourceAdapter::connect(&hub).unwrap();
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());

    let notification = Notification::new("urgent-1", NotificationType::DebtCreated, "Debt", "pay now")
        .with_priority(Priority::Urgent);
    api.seed(notification.clone());
    hub.publish("notification:new", serde_json::to_string(&notification).unwrap());

    let accepted = adapter.dispatch_pending(&mut store, &mut toasts, Instant::now());

    assert_eq!(accepted.len(), 1);
    assert_eq!(store.unread_count(), 1);
    let toast = toasts.get(accepted[0]).unwrap();
    assert_eq!(toast.expires_at - toast.shown_at, Duration::from_secs(10));
    assert_eq!(
        toasts.duration_for(Priority::Normal),
        Duration::from_secs(5)
    );
}

#[test]
fn view_marks_read_and_navigates_to_the_literal_action_url() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let notification = Notification::new("reward-1", NotificationType::RewardEarned, "Reward", "+5")
        .with_action_url("/dashboard/citizen/rewards");
    let toast_id = deliver(&api, &mut store, &mut toasts, notification, Instant::now());
    assert_eq!(store.unread_count(), 1);

    let action = toasts.view(toast_id, &mut store).unwrap();

    assert_eq!(action.navigate_to.as_deref(), Some("/dashboard/citizen/rewards"));
    assert!(action.error.is_none());
    assert_eq!(store.unread_count(), 0);
    assert!(store.get(&action.notification_id).unwrap().is_read);
    assert!(api.get(&action.notification_id).unwrap().is_read);
    assert!(toasts.get(toast_id).is_none());
    assert_eq!(toasts.pending_timers(), 0);
}

#[test]
fn view_without_action_url_falls_back_to_type_route() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let notification = Notification::new("appeal-1", NotificationType::AppealApproved, "Appeal", "ok");
    let toast_id = deliver(&api, &mut store, &mut toasts, notification, Instant::now());

    let action = toasts.view(toast_id, &mut store).unwrap();
    assert_eq!(action.navigate_to.as_deref(), Some("/dashboard/citizen/appeals"));
}

#[test]
fn failed_mark_read_still_closes_the_toast() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let notification = Notification::new("n1", NotificationType::System, "t", "m");
    let toast_id = deliver(&api, &mut store, &mut toasts, notification, Instant::now());
    api.set_offline(true);

    let action = toasts.mark_read(toast_id, &mut store).unwrap();

    assert!(action.error.is_some());
    assert!(toasts.is_empty());
    assert_eq!(store.unread_count(), 1);
}

#[test]
fn timers_expire_by_priority_and_ignore_removed_toasts() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let start = Instant::now();

    let normal = deliver(
        &api,
        &mut store,
        &mut toasts,
        Notification::new("normal", NotificationType::System, "t", "m"),
        start,
    );
    let urgent = deliver(
        &api,
        &mut store,
        &mut toasts,
        Notification::new("urgent", NotificationType::System, "t", "m").with_priority(Priority::Urgent),
        start,
    );
    let dismissed = deliver(
        &api,
        &mut store,
        &mut toasts,
        Notification::new("dismissed", NotificationType::System, "t", "m"),
        start,
    );
    assert!(toasts.dismiss(dismissed));
    assert!(!toasts.dismiss(dismissed));

    assert!(toasts.fire_due(start + Duration::from_secs(4)).is_empty());

    let expired = toasts.fire_due(start + Duration::from_secs(5));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].toast_id, normal);
    assert_eq!(expired[0].state, ToastState::Removed(RemovalReason::AutoDismiss));
    assert!(toasts.get(urgent).is_some());

    let expired = toasts.fire_due(start + Duration::from_secs(10));
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].toast_id, urgent);
    assert!(toasts.is_empty());
    assert_eq!(toasts.next_deadline(), None);
}

#[test]
fn clear_cancels_every_pending_timer() {
    let api = Arc::new(InMemoryNotificationApi::new());
    let mut store = store_with(&api);
    let mut toasts = ToastManager::new(&NotifyConfig::default());
    let start = Instant::now();
    for index in 0..3 {
        let notification = Notification::new(format!("n{index}"), NotificationType::System, "t", "m");
        deliver(&api, &mut store, &mut toasts, notification, start);
    }

    assert_eq!(toasts.clear(), 3);
    assert_eq!(toasts.pending_timers(), 0);
    assert!(toasts.fire_due(start + Duration::from_secs(60)).is_empty());
}
