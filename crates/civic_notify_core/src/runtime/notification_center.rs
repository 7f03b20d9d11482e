//! Notification center event loop.
//!
//! # Responsibility
//! - Multiplex push deliveries, toast deadlines, unread polling and user
//!   commands on one task.
//! - Own every stateful component so mutations happen in arrival order.
//!
//! # Invariants
//! - Polling keeps running after the push stream ends.
//! - Every exit path cancels pending toast timers and closes the push
//!   subscription.

use crate::config::NotifyConfig;
use crate::events::adapter::EventSourceAdapter;
use crate::model::notification::{NotificationId, Priority};
use crate::presenter::badge::BadgePresenter;
use crate::presenter::dropdown::{DropdownPresenter, DropdownView};
use crate::repo::notification_api::NotificationApi;
use crate::service::notification_store::{NotificationStore, StoreResult};
use crate::sound::synthesizer::SoundSynthesizer;
use crate::toast::manager::{ToastAction, ToastManager};
use crate::toast::ToastId;
use async_channel::{Receiver, Sender};
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::time::{interval_at, sleep_until, MissedTickBehavior};

/// One visible toast as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastSummary {
    pub toast_id: ToastId,
    pub notification_id: NotificationId,
    pub title: String,
    pub priority: Priority,
}

/// Point-in-time view of the whole surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterSnapshot {
    pub unread_count: u64,
    pub badge: Option<String>,
    pub toasts: Vec<ToastSummary>,
    pub window: Vec<NotificationId>,
    pub dropdown_open: bool,
}

/// Counters returned when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CenterReport {
    pub events_delivered: u64,
    pub events_dropped: u64,
    pub polls: u64,
    pub toasts_cleared: usize,
}

pub enum CenterCommand {
    UserGesture,
    SetSoundEnabled(bool),
    DismissToast(ToastId),
    ViewToast(ToastId, oneshot::Sender<Option<ToastAction>>),
    MarkToastRead(ToastId, oneshot::Sender<Option<ToastAction>>),
    OpenDropdown(oneshot::Sender<StoreResult<DropdownView>>),
    NextPage(oneshot::Sender<StoreResult<DropdownView>>),
    PreviousPage(oneshot::Sender<StoreResult<DropdownView>>),
    CloseDropdown,
    MarkRead(NotificationId, oneshot::Sender<StoreResult<()>>),
    MarkAllRead(oneshot::Sender<StoreResult<()>>),
    Delete(NotificationId, oneshot::Sender<StoreResult<()>>),
    DeleteAllRead(oneshot::Sender<StoreResult<()>>),
    Snapshot(oneshot::Sender<CenterSnapshot>),
    Shutdown,
}

/// Cloneable command sender for a running center.
#[derive(Clone)]
pub struct CenterHandle {
    commands: Sender<CenterCommand>,
}

impl CenterHandle {
    pub async fn user_gesture(&self) -> bool {
        self.send(CenterCommand::UserGesture).await
    }

    pub async fn set_sound_enabled(&self, enabled: bool) -> bool {
        self.send(CenterCommand::SetSoundEnabled(enabled)).await
    }

    pub async fn dismiss_toast(&self, toast_id: ToastId) -> bool {
        self.send(CenterCommand::DismissToast(toast_id)).await
    }

    pub async fn view_toast(&self, toast_id: ToastId) -> Option<ToastAction> {
        self.request(|reply| CenterCommand::ViewToast(toast_id, reply))
            .await
            .flatten()
    }

    pub async fn mark_toast_read(&self, toast_id: ToastId) -> Option<ToastAction> {
        self.request(|reply| CenterCommand::MarkToastRead(toast_id, reply))
            .await
            .flatten()
    }

    pub async fn open_dropdown(&self) -> Option<StoreResult<DropdownView>> {
        self.request(CenterCommand::OpenDropdown).await
    }

    pub async fn next_page(&self) -> Option<StoreResult<DropdownView>> {
        self.request(CenterCommand::NextPage).await
    }

    pub async fn previous_page(&self) -> Option<StoreResult<DropdownView>> {
        self.request(CenterCommand::PreviousPage).await
    }

    pub async fn close_dropdown(&self) -> bool {
        self.send(CenterCommand::CloseDropdown).await
    }

    pub async fn mark_read(&self, id: NotificationId) -> Option<StoreResult<()>> {
        self.request(|reply| CenterCommand::MarkRead(id, reply)).await
    }

    pub async fn mark_all_read(&self) -> Option<StoreResult<()>> {
        self.request(CenterCommand::MarkAllRead).await
    }

    pub async fn delete(&self, id: NotificationId) -> Option<StoreResult<()>> {
        self.request(|reply| CenterCommand::Delete(id, reply)).await
    }

    pub async fn delete_all_read(&self) -> Option<StoreResult<()>> {
        self.request(CenterCommand::DeleteAllRead).await
    }

    /// `None` once the center has stopped.
    pub async fn snapshot(&self) -> Option<CenterSnapshot> {
        self.request(CenterCommand::Snapshot).await
    }

    pub async fn shutdown(&self) -> bool {
        self.send(CenterCommand::Shutdown).await
    }

    async fn send(&self, command: CenterCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> CenterCommand,
    ) -> Option<T> {
        let (reply, response) = oneshot::channel();
        if !self.send(command(reply)).await {
            return None;
        }
        response.await.ok()
    }
}

enum Flow {
    Continue,
    Stop,
}

pub struct NotificationCenter<A: NotificationApi> {
    config: NotifyConfig,
    store: NotificationStore<A>,
    toasts: ToastManager,
    adapter: EventSourceAdapter,
    sound: Arc<SoundSynthesizer>,
    badge: BadgePresenter,
    dropdown: DropdownPresenter,
    polls: u64,
}

impl<A: NotificationApi> NotificationCenter<A> {
    pub fn new(
        config: NotifyConfig,
        store: NotificationStore<A>,
        adapter: EventSourceAdapter,
        sound: Arc<SoundSynthesizer>,
    ) -> Self {
        let toasts = ToastManager::new(&config).with_sound(Arc::clone(&sound));
        let badge = BadgePresenter::new(config.badge_cap);
        let dropdown = DropdownPresenter::new(config.page_limit, config.badge_cap);
        Self {
            config,
            store,
            toasts,
            adapter,
            sound,
            badge,
            dropdown,
            polls: 0,
        }
    }

    /// Creates the command channel for [`NotificationCenter::run`].
    pub fn channel() -> (CenterHandle, Receiver<CenterCommand>) {
        let (commands, receiver) = async_channel::unbounded();
        (CenterHandle { commands }, receiver)
    }

    /// Runs until `Shutdown` or until every handle is dropped.
    pub async fn run(mut self, commands: Receiver<CenterCommand>) -> CenterReport {
        info!("event=center_start module=runtime status=ok");
        if let Err(err) = self.store.fetch_unread_count() {
            warn!("event=unread_poll module=runtime status=error error={err}");
        }

        let period = self.config.unread_poll_interval().max(Duration::from_millis(1));
        let mut poll = interval_at(tokio::time::Instant::now() + period, period);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.toasts.next_deadline();
            let push_open = self.adapter.is_open();

            tokio::select! {
                event = self.adapter.next_event(), if push_open => match event {
                    Some(event) => {
                        self.adapter
                            .dispatch(&event, &mut self.store, &mut self.toasts, now());
                    }
                    None => {
                        warn!("event=push_stream_closed module=runtime status=degraded fallback=polling");
                        self.adapter.close();
                    }
                },
                _ = wait_for(deadline) => {
                    let expired = self.toasts.fire_due(now());
                    debug!("event=toast_expire module=runtime count={}", expired.len());
                }
                _ = poll.tick() => {
                    self.polls += 1;
                    if let Err(err) = self.store.fetch_unread_count() {
                        warn!("event=unread_poll module=runtime status=error error={err}");
                    }
                }
                command = commands.recv() => match command {
                    Ok(command) => {
                        if let Flow::Stop = self.handle(command) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
            }
        }

        self.teardown()
    }

    fn handle(&mut self, command: CenterCommand) -> Flow {
        match command {
            CenterCommand::UserGesture => {
                self.sound.initialize();
            }
            CenterCommand::SetSoundEnabled(enabled) => {
                self.sound.set_enabled(enabled);
            }
            CenterCommand::DismissToast(toast_id) => {
                self.toasts.dismiss(toast_id);
            }
            CenterCommand::ViewToast(toast_id, reply) => {
                let _ = reply.send(self.toasts.view(toast_id, &mut self.store));
            }
            CenterCommand::MarkToastRead(toast_id, reply) => {
                let _ = reply.send(self.toasts.mark_read(toast_id, &mut self.store));
            }
            CenterCommand::OpenDropdown(reply) => {
                let result = self.dropdown.open(&mut self.store).map(|()| self.render_dropdown());
                let _ = reply.send(result);
            }
            CenterCommand::NextPage(reply) => {
                let result = self
                    .dropdown
                    .next_page(&mut self.store)
                    .map(|()| self.render_dropdown());
                let _ = reply.send(result);
            }
            CenterCommand::PreviousPage(reply) => {
                let result = self
                    .dropdown
                    .previous_page(&mut self.store)
                    .map(|()| self.render_dropdown());
                let _ = reply.send(result);
            }
            CenterCommand::CloseDropdown => self.dropdown.close(),
            CenterCommand::MarkRead(id, reply) => {
                let _ = reply.send(self.dropdown.mark_read(&mut self.store, &id));
            }
            CenterCommand::MarkAllRead(reply) => {
                let _ = reply.send(self.dropdown.mark_all_read(&mut self.store));
            }
            CenterCommand::Delete(id, reply) => {
                let _ = reply.send(self.dropdown.delete(&mut self.store, &id));
            }
            CenterCommand::DeleteAllRead(reply) => {
                let _ = reply.send(self.dropdown.delete_all_read(&mut self.store));
            }
            CenterCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            CenterCommand::Shutdown => return Flow::Stop,
        }
        Flow::Continue
    }

    fn render_dropdown(&self) -> DropdownView {
        self.dropdown.render(&self.store, Utc::now())
    }

    fn snapshot(&self) -> CenterSnapshot {
        CenterSnapshot {
            unread_count: self.store.unread_count(),
            badge: self.badge.render(&self.store),
            toasts: self
                .toasts
                .visible()
                .map(|entry| ToastSummary {
                    toast_id: entry.toast_id,
                    notification_id: entry.notification.id.clone(),
                    title: entry.notification.title.clone(),
                    priority: entry.notification.priority,
                })
                .collect(),
            window: self
                .store
                .notifications()
                .iter()
                .map(|notification| notification.id.clone())
                .collect(),
            dropdown_open: self.dropdown.is_open(),
        }
    }

    fn teardown(mut self) -> CenterReport {
        let toasts_cleared = self.toasts.clear();
        self.adapter.close();
        let report = CenterReport {
            events_delivered: self.adapter.delivered(),
            events_dropped: self.adapter.dropped(),
            polls: self.polls,
            toasts_cleared,
        };
        info!(
            "event=center_stop module=runtime status=ok delivered={} dropped={} polls={} toasts_cleared={}",
            report.events_delivered, report.events_dropped, report.polls, report.toasts_cleared
        );
        report
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
