//! Push transport contract and an in-process hub implementation.

use async_channel::{Receiver, Sender, TryRecvError};
use log::{debug, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

/// Event name of the regular notification channel.
pub const NEW_NOTIFICATION_EVENT: &str = "notification:new";
/// Event name of the urgent notification channel.
pub const URGENT_NOTIFICATION_EVENT: &str = "notification:urgent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushChannel {
    Normal,
    Urgent,
}

impl PushChannel {
    pub const ALL: [PushChannel; 2] = [PushChannel::Normal, PushChannel::Urgent];

    pub fn event_name(self) -> &'static str {
        match self {
            Self::Normal => NEW_NOTIFICATION_EVENT,
            Self::Urgent => URGENT_NOTIFICATION_EVENT,
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            NEW_NOTIFICATION_EVENT => Some(Self::Normal),
            URGENT_NOTIFICATION_EVENT => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// One raw push delivery. `payload` is the JSON notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub channel: PushChannel,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Closed,
    NoChannels,
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "push transport is closed"),
            Self::NoChannels => write!(f, "subscription requires at least one channel"),
        }
    }
}

impl Error for TransportError {}

/// Real-time transport consumed by the event source adapter.
pub trait PushTransport {
    fn subscribe(&self, channels: &[PushChannel]) -> Result<Subscription, TransportError>;
}

/// Scoped subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    receiver: Receiver<PushEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Builds a handle; `release` runs exactly once on close or drop.
    pub fn new(receiver: Receiver<PushEvent>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    /// Waits for the next event. `None` once closed and drained.
    pub async fn recv(&self) -> Option<PushEvent> {
        self.receiver.recv().await.ok()
    }

    pub fn try_recv(&self) -> Option<PushEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => None,
        }
    }

    /// True until closed locally, or until the transport closed and every
    /// buffered event was received.
    pub fn is_open(&self) -> bool {
        self.release.is_some() && (!self.receiver.is_closed() || !self.receiver.is_empty())
    }

    pub fn close(&mut self) {
        self.receiver.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Default)]
struct HubState {
    next_id: u64,
    subscribers: HashMap<u64, (Vec<PushChannel>, Sender<PushEvent>)>,
    closed: bool,
}

/// In-process push hub.
///
/// Stands in for a socket connection: the host publishes named events and
/// every matching subscription receives a copy.
#[derive(Clone, Default)]
pub struct LocalPushHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalPushHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` under `event_name`. Returns the receiver count.
    pub fn publish(&self, event_name: &str, payload: impl Into<String>) -> usize {
        let Some(channel) = PushChannel::from_event_name(event_name) else {
            warn!("event=push_publish module=events status=ignored reason=unknown_event name={event_name}");
            return 0;
        };
        let Ok(state) = self.state.lock() else {
            return 0;
        };
        if state.closed {
            return 0;
        }

        let event = PushEvent {
            channel,
            payload: payload.into(),
        };
        state
            .subscribers
            .values()
            .filter(|(channels, _)| channels.contains(&channel))
            .filter(|(_, sender)| sender.try_send(event.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.subscribers.len())
            .unwrap_or(0)
    }

    /// Simulates a lost connection: every subscription stream ends.
    pub fn shutdown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            for (_, (_, sender)) in state.subscribers.drain() {
                sender.close();
            }
        }
    }
}

impl PushTransport for LocalPushHub {
    fn subscribe(&self, channels: &[PushChannel]) -> Result<Subscription, TransportError> {
        if channels.is_empty() {
            return Err(TransportError::NoChannels);
        }
        let mut state = self.state.lock().map_err(|_| TransportError::Closed)?;
        if state.closed {
            return Err(TransportError::Closed);
        }

        let (sender, receiver) = async_channel::unbounded();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, (channels.to_vec(), sender));
        debug!("event=push_subscribe module=events status=ok subscription={id}");

        let hub = Arc::clone(&self.state);
        Ok(Subscription::new(receiver, move || {
            if let Ok(mut state) = hub.lock() {
                state.subscribers.remove(&id);
            }
            debug!("event=push_unsubscribe module=events status=ok subscription={id}");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalPushHub, PushChannel, PushTransport, TransportError};

    #[test]
    fn routes_events_by_channel() {
        let hub = LocalPushHub::new();
        let urgent_only = hub.subscribe(&[PushChannel::Urgent]).expect("subscribe");
        let both = hub.subscribe(&PushChannel::ALL).expect("subscribe");

        assert_eq!(hub.publish("notification:new", "{}"), 1);
        assert_eq!(hub.publish("notification:urgent", "{}"), 2);
        assert_eq!(hub.publish("notification:unknown", "{}"), 0);

        assert_eq!(urgent_only.try_recv().map(|event| event.channel), Some(PushChannel::Urgent));
        assert!(urgent_only.try_recv().is_none());
        assert_eq!(both.try_recv().map(|event| event.channel), Some(PushChannel::Normal));
    }

    #[test]
    fn dropping_subscription_releases_registration() {
        let hub = LocalPushHub::new();
        let subscription = hub.subscribe(&PushChannel::ALL).expect("subscribe");
        assert_eq!(hub.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish("notification:new", "{}"), 0);
    }

    #[test]
    fn explicit_close_is_idempotent() {
        let hub = LocalPushHub::new();
        let mut subscription = hub.subscribe(&PushChannel::ALL).expect("subscribe");
        subscription.close();
        subscription.close();
        assert!(!subscription.is_open());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn stays_open_until_buffered_events_are_received() {
        let hub = LocalPushHub::new();
        let subscription = hub.subscribe(&PushChannel::ALL).expect("subscribe");
        hub.publish("notification:new", "{}");
        hub.shutdown();

        assert!(subscription.is_open());
        assert!(subscription.try_recv().is_some());
        assert!(!subscription.is_open());
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn shutdown_rejects_new_subscriptions() {
        let hub = LocalPushHub::new();
        hub.shutdown();
        assert!(matches!(
            hub.subscribe(&PushChannel::ALL),
            Err(TransportError::Closed)
        ));
        assert!(matches!(hub.subscribe(&[]), Err(TransportError::NoChannels)));
    }
}
