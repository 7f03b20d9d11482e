//! Event source adapter: push payload -> store + toast + count refresh.

use crate::events::transport::{PushChannel, PushEvent, PushTransport, Subscription, TransportError};
use crate::model::notification::{Notification, NotificationValidationError, Priority};
use crate::repo::notification_api::NotificationApi;
use crate::service::notification_store::NotificationStore;
use crate::toast::manager::ToastManager;
use crate::toast::ToastId;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum PayloadError {
    Json(serde_json::Error),
    Invalid(NotificationValidationError),
}

impl Display for PayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed push payload: {err}"),
            Self::Invalid(err) => write!(f, "invalid push payload: {err}"),
        }
    }
}

impl Error for PayloadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<NotificationValidationError> for PayloadError {
    fn from(value: NotificationValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Parses one push payload into a validated notification.
///
/// Deliveries on the urgent channel are always presented as `URGENT`.
pub fn normalize_payload(event: &PushEvent) -> Result<Notification, PayloadError> {
    let mut notification: Notification = serde_json::from_str(&event.payload)?;
    notification.validate()?;
    if event.channel == PushChannel::Urgent {
        notification.priority = Priority::Urgent;
    }
    Ok(notification)
}

/// Owns the push subscription and forwards deliveries.
///
/// Redelivered events are not deduplicated: each delivery inserts and toasts.
pub struct EventSourceAdapter {
    subscription: Subscription,
    delivered: u64,
    dropped: u64,
}

impl EventSourceAdapter {
    /// Subscribes to both notification channels.
    pub fn connect<T: PushTransport + ?Sized>(transport: &T) -> Result<Self, TransportError> {
        let subscription = transport.subscribe(&PushChannel::ALL)?;
        info!("event=push_connect module=events status=ok");
        Ok(Self {
            subscription,
            delivered: 0,
            dropped: 0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_open()
    }

    /// Waits for the next raw event; `None` once the transport is gone.
    pub async fn next_event(&self) -> Option<PushEvent> {
        self.subscription.recv().await
    }

    pub fn try_next_event(&self) -> Option<PushEvent> {
        self.subscription.try_recv()
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Applies one delivery. Returns the toast id when it was accepted.
    pub fn dispatch<A: NotificationApi>(
        &mut self,
        event: &PushEvent,
        store: &mut NotificationStore<A>,
        toasts: &mut ToastManager,
        now: Instant,
    ) -> Option<ToastId> {
        let notification = match normalize_payload(event) {
            Ok(notification) => notification,
            Err(err) => {
                self.dropped += 1;
                warn!(
                    "event=push_payload_dropped module=events status=error channel={} error={err}",
                    event.channel.event_name()
                );
                return None;
            }
        };

        info!(
            "event=push_received module=events status=ok id={} priority={}",
            notification.id, notification.priority
        );
        store.insert_received(notification.clone());
        let toast_id = toasts.enqueue(notification, now);
        if let Err(err) = store.fetch_unread_count() {
            warn!("event=unread_refresh module=events status=error error={err}");
        }
        self.delivered += 1;
        Some(toast_id)
    }

    /// Drains everything already queued without waiting.
    pub fn dispatch_pending<A: NotificationApi>(
        &mut self,
        store: &mut NotificationStore<A>,
        toasts: &mut ToastManager,
        now: Instant,
    ) -> Vec<ToastId> {
        let mut accepted = Vec::new();
        while let Some(event) = self.try_next_event() {
            accepted.extend(self.dispatch(&event, store, toasts, now));
        }
        accepted
    }

    pub fn close(&mut self) {
        if self.subscription.is_open() {
            info!(
                "event=push_disconnect module=events status=ok delivered={} dropped={}",
                self.delivered, self.dropped
            );
        }
        self.subscription.close();
    }
}
