//! Line-driven demo host for `civic_notify_core`.
//!
//! # Responsibility
//! - Wire the in-memory backend, push hub, PCM audio and preferences into a
//!   running notification center.
//! - Translate stdin commands into push deliveries and user actions.
//!
//! Commands (one per line):
//! `push <json>`, `urgent <json>`, `gesture`, `sound on|off`, `view <n>`,
//! `dismiss <n>`, `open`, `next`, `prev`, `read <id>`, `read-all`, `delete <id>`,
//! `clear-read`, `snapshot`, `quit`.

use civic_notify_core::{
    init_logging, CenterHandle, EventSourceAdapter, InMemoryNotificationApi, LocalPushHub,
    LogLevel, MemoryPreferenceStore, Notification, NotificationCenter, NotificationId,
    NotificationStore, NotifyConfig, PcmAudioBackend, Priority, SoundSynthesizer, StoreResult,
};
use log::warn;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let log_dir = std::env::var("CIVIC_NOTIFY_LOG_DIR")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("civic_notify"));
    if let Err(err) = init_logging(LogLevel::build_default().as_str(), &log_dir) {
        eprintln!("logging disabled: {err}");
    }

    let config = match std::env::args().nth(1) {
        Some(path) => NotifyConfig::load(path)?,
        None => NotifyConfig::default(),
    };

    let api = Arc::new(InMemoryNotificationApi::new());
    let hub = LocalPushHub::new();
    let sound = Arc::new(
        SoundSynthesizer::new(
            Arc::new(PcmAudioBackend::default()),
            Arc::new(MemoryPreferenceStore::new()),
        )
        .with_volume(config.sound_volume)
        .with_default_enabled(config.default_sound_enabled),
    );
    let adapter = EventSourceAdapter::connect(&hub)?;
    let store = NotificationStore::new(Arc::clone(&api));
    let center = NotificationCenter::new(config, store, adapter, sound);
    let (handle, commands) = NotificationCenter::<Arc<InMemoryNotificationApi>>::channel();

    let (report, input) = tokio::join!(center.run(commands), drive(&handle, &hub, &api));
    println!(
        "stopped delivered={} dropped={} polls={} toasts_cleared={}",
        report.events_delivered, report.events_dropped, report.polls, report.toasts_cleared
    );
    input
}

async fn drive(
    handle: &CenterHandle,
    hub: &LocalPushHub,
    api: &InMemoryNotificationApi,
) -> Result<(), Box<dyn Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (command, argument) = split_command(&line);
        match command {
            "" => continue,
            "push" | "urgent" => {
                // The backend must know the record before the client acts on it.
                match seed_record(command, argument) {
                    Ok(notification) => api.seed(notification),
                    Err(err) => warn!("event=cli_seed module=cli status=skipped error={err}"),
                }
                let event = if command == "push" {
                    "notification:new"
                } else {
                    "notification:urgent"
                };
                println!("published receivers={}", hub.publish(event, argument));
            }
            "gesture" => {
                handle.user_gesture().await;
            }
            "sound" => {
                handle.set_sound_enabled(argument == "on").await;
            }
            "view" | "dismiss" => {
                let Some(toast_id) = toast_at(handle, argument).await else {
                    println!("no toast at `{argument}`");
                    continue;
                };
                if command == "dismiss" {
                    handle.dismiss_toast(toast_id).await;
                } else if let Some(action) = handle.view_toast(toast_id).await {
                    println!(
                        "navigate {} error={}",
                        action.navigate_to.unwrap_or_default(),
                        action.error.map(|err| err.to_string()).unwrap_or_default()
                    );
                }
            }
            "open" | "next" | "prev" => {
                let view = match command {
                    "open" => handle.open_dropdown().await,
                    "next" => handle.next_page().await,
                    _ => handle.previous_page().await,
                };
                match view {
                    Some(Ok(view)) => {
                        for row in &view.rows {
                            let marker = if row.is_read { ' ' } else { '*' };
                            println!("{marker} {} [{}] {} ({})", row.id, row.priority, row.title, row.age);
                        }
                        println!("page={} has_more={}", view.page, view.has_more);
                    }
                    Some(Err(err)) => println!("error {err}"),
                    None => break,
                }
            }
            "read" => report(handle.mark_read(NotificationId::new(argument)).await),
            "read-all" => report(handle.mark_all_read().await),
            "delete" => report(handle.delete(NotificationId::new(argument)).await),
            "clear-read" => report(handle.delete_all_read().await),
            "snapshot" => match handle.snapshot().await {
                Some(snapshot) => {
                    println!(
                        "unread={} badge={} toasts={} window={}",
                        snapshot.unread_count,
                        snapshot.badge.unwrap_or_default(),
                        snapshot.toasts.len(),
                        snapshot.window.len()
                    );
                    for (index, toast) in snapshot.toasts.iter().enumerate() {
                        println!("  toast {index}: [{}] {}", toast.priority, toast.title);
                    }
                }
                None => break,
            },
            "quit" => break,
            other => println!("unknown command `{other}`"),
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Backend record for a published payload. The urgent channel is presented
/// as URGENT, so the seeded record carries the same priority.
fn seed_record(command: &str, payload: &str) -> Result<Notification, serde_json::Error> {
    let mut notification = serde_json::from_str::<Notification>(payload)?;
    if command == "urgent" {
        notification.priority = Priority::Urgent;
    }
    Ok(notification)
}

fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    }
}

async fn toast_at(handle: &CenterHandle, index: &str) -> Option<civic_notify_core::ToastId> {
    let index: usize = index.parse().ok()?;
    let snapshot = handle.snapshot().await?;
    snapshot.toasts.get(index).map(|toast| toast.toast_id)
}

fn report(result: Option<StoreResult<()>>) {
    match result {
        Some(Ok(())) => println!("ok"),
        Some(Err(err)) => println!("error {err}"),
        None => println!("center stopped"),
    }
}

#[cfg(test)]
mod tests {
    use super::{seed_record, split_command};
    use civic_notify_core::{Notification, NotificationType, Priority};

    fn payload(priority: Priority) -> String {
        let mut notification = Notification::new("n-1", NotificationType::System, "t", "m");
        notification.priority = priority;
        serde_json::to_string(&notification).expect("serialize")
    }

    #[test]
    fn urgent_command_seeds_an_urgent_record() {
        let seeded = seed_record("urgent", &payload(Priority::Low)).expect("seed");
        assert_eq!(seeded.priority, Priority::Urgent);

        let seeded = seed_record("push", &payload(Priority::Low)).expect("seed");
        assert_eq!(seeded.priority, Priority::Low);
    }

    #[test]
    fn malformed_payload_is_not_seeded() {
        assert!(seed_record("push", "{not json").is_err());
    }

    #[test]
    fn commands_split_on_first_whitespace() {
        assert_eq!(split_command("  read  n-1 "), ("read", "n-1"));
        assert_eq!(split_command("quit"), ("quit", ""));
    }
}
