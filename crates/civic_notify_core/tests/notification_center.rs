use civic_notify_core::{
    CenterHandle, EventSourceAdapter, InMemoryNotificationApi, LocalPushHub,
    MemoryPreferenceStore, Notification, NotificationCenter, NotificationStore, NotificationType,
    NotifyConfig, PcmAudioBackend, Priority, SoundSynthesizer,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

type Api = Arc<InMemoryNotificationApi>;

struct Fixture {
    api: Api,
    hub: LocalPushHub,
    audio: Arc<PcmAudioBackend>,
    center: NotificationCenter<Api>,
}

fn fixture() -> Fixture {
    let api = Arc::new(InMemoryNotificationApi::new());
    let hub = LocalPushHub::new();
    let audio = Arc::new(PcmAudioBackend::default());
    let sound = Arc::new(SoundSynthesizer::new(
        audio.clone(),
        Arc::new(MemoryPreferenceStore::new()),
    ));
    let adapter = EventSourceAdapter::connect(&hub).unwrap();
    let center = NotificationCenter::new(
        NotifyConfig::default(),
        NotificationStore::new(Arc::clone(&api)),
        adapter,
        sound,
    );
    Fixture {
        api,
        hub,
        audio,
        center,
    }
}

fn push(api: &InMemoryNotificationApi, hub: &LocalPushHub, notification: Notification) {
    api.seed(notification.clone());
    let event = if notification.priority == Priority::Urgent {
        "notification:urgent"
    } else {
        "notification:new"
    };
    hub.publish(event, serde_json::to_string(&notification).unwrap());
}

/// Lets the center drain everything already queued.
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn toasts_auto_dismiss_on_their_deadline() {
    let Fixture { api, hub, center, .. } = fixture();
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        push(&api, &hub, Notification::new("n1", NotificationType::System, "Normal", "m"));
        push(
            &api,
            &hub,
            Notification::new("n2", NotificationType::DebtCreated, "Urgent", "m")
                .with_priority(Priority::Urgent),
        );
        settle().await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.toasts.len(), 2);
        assert_eq!(snapshot.unread_count, 2);
        assert_eq!(snapshot.badge.as_deref(), Some("2"));

        sleep(Duration::from_secs(6)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.toasts.len(), 1);
        assert_eq!(snapshot.toasts[0].priority, Priority::Urgent);

        sleep(Duration::from_secs(5)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.toasts.is_empty());
        assert_eq!(snapshot.unread_count, 2);

        handle.shutdown().await;
    };

    let (report, ()) = tokio::join!(center.run(commands), driver);
    assert_eq!(report.events_delivered, 2);
    assert_eq!(report.toasts_cleared, 0);
}

#[tokio::test(start_paused = true)]
async fn polling_reconciles_missed_pushes() {
    let Fixture { api, center, .. } = fixture();
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        settle().await;
        assert_eq!(handle.snapshot().await.unwrap().unread_count, 0);

        api.seed(Notification::new("silent", NotificationType::System, "t", "m"));
        sleep(Duration::from_secs(29)).await;
        assert_eq!(handle.snapshot().await.unwrap().unread_count, 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.snapshot().await.unwrap().unread_count, 1);
        handle.shutdown().await;
    };

    let (report, ()) = tokio::join!(center.run(commands), driver);
    assert_eq!(report.polls, 1);
}

#[tokio::test(start_paused = true)]
async fn polling_continues_after_push_stream_ends() {
    let Fixture { api, hub, center, .. } = fixture();
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        hub.shutdown();
        settle().await;

        api.seed(Notification::new("a", NotificationType::System, "t", "m"));
        api.seed(Notification::new("b", NotificationType::System, "t", "m"));
        sleep(Duration::from_secs(61)).await;
        assert_eq!(handle.snapshot().await.unwrap().unread_count, 2);
        handle.shutdown().await;
    };

    let (report, ()) = tokio::join!(center.run(commands), driver);
    assert_eq!(report.polls, 2);
}

#[tokio::test(start_paused = true)]
async fn events_buffered_before_the_stream_ends_are_delivered() {
    let Fixture { api, hub, center, .. } = fixture();
    push(&api, &hub, Notification::new("last", NotificationType::System, "t", "m"));
    hub.shutdown();
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        settle().await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.toasts.len(), 1);
        assert_eq!(snapshot.unread_count, 1);
        assert!(snapshot.window.iter().any(|id| id.as_str() == "last"));
        handle.shutdown().await;
    };

    let (report, ()) = tokio::join!(center.run(commands), driver);
    assert_eq!(report.events_delivered, 1);
    assert_eq!(report.events_dropped, 0);
}

#[tokio::test(start_paused = true)]
async fn view_toast_marks_read_and_returns_route() {
    let Fixture { api, hub, center, .. } = fixture();
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        push(
            &api,
            &hub,
            Notification::new("r1", NotificationType::RewardEarned, "Reward", "+5")
                .with_action_url("/dashboard/citizen/rewards"),
        );
        settle().await;
        let toast_id = handle.snapshot().await.unwrap().toasts[0].toast_id;

        let action = handle.view_toast(toast_id).await.unwrap();
        assert_eq!(action.navigate_to.as_deref(), Some("/dashboard/citizen/rewards"));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.unread_count, 0);
        assert!(snapshot.badge.is_none());
        assert!(snapshot.toasts.is_empty());
        assert!(handle.view_toast(toast_id).await.is_none());
        handle.shutdown().await;
    };

    tokio::join!(center.run(commands), driver);
}

#[tokio::test(start_paused = true)]
async fn dropdown_commands_go_through_the_store() {
    let Fixture { api, center, .. } = fixture();
    for index in 0..12 {
        api.seed(Notification::new(format!("n{index}"), NotificationType::System, "t", "m"));
    }
    let (handle, commands) = NotificationCenter::<Api>::channel();

    let driver = async {
        let view = handle.open_dropdown().await.unwrap().unwrap();
        assert_eq!(view.rows.len(), 10);
        assert!(view.has_more);
        assert_eq!(view.badge.as_deref(), Some("12"));

        let view = handle.next_page().await.unwrap().unwrap();
        assert_eq!(view.page, 2);
        assert_eq!(view.rows.len(), 2);

        let view = handle.previous_page().await.unwrap().unwrap();
        assert_eq!(view.page, 1);
        assert_eq!(view.rows.len(), 10);

        handle.mark_all_read().await.unwrap().unwrap();
        assert_eq!(handle.snapshot().await.unwrap().unread_count, 0);
        handle.delete_all_read().await.unwrap().unwrap();
        assert_eq!(api.len(), 0);

        api.set_offline(true);
        assert!(handle.open_dropdown().await.unwrap().is_err());
        handle.shutdown().await;
    };

    tokio::join!(center.run(commands), driver);
}

#[tokio::test(start_paused = true)]
async fn shutdown_clears_toasts_and_releases_subscription() {
    let Fixture {
        api,
        hub,
        audio,
        center,
    } = fixture();
    let (handle, commands): (CenterHandle, _) = NotificationCenter::<Api>::channel();

    let driver = async {
        handle.user_gesture().await;
        push(&api, &hub, Notification::new("n1", NotificationType::System, "t", "m"));
        push(&api, &hub, Notification::new("n2", NotificationType::System, "t", "m"));
        settle().await;
        handle.shutdown().await;
    };

    let (report, ()) = tokio::join!(center.run(commands), driver);
    assert_eq!(report.toasts_cleared, 2);
    assert_eq!(hub.subscriber_count(), 0);
    assert_eq!(audio.contexts_created(), 1);
    assert!(!audio.drain_samples().is_empty());
    assert!(handle.snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_center() {
    let Fixture { hub, center, .. } = fixture();
    let (handle, commands) = NotificationCenter::<Api>::channel();
    drop(handle);

    let report = center.run(commands).await;
    assert_eq!(report.events_delivered, 0);
    assert_eq!(hub.subscriber_count(), 0);
}
