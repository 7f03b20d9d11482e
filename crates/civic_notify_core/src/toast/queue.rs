//! Fixed-capacity toast arena with drop-oldest eviction.

use crate::model::notification::Notification;
use crate::toast::timer::CancelToken;
use crate::toast::ToastId;
use std::collections::VecDeque;
use std::time::Instant;

/// Lifecycle state of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastState {
    Pending,
    Visible,
    Removed(RemovalReason),
}

/// Why a toast left the presentation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    AutoDismiss,
    ManualDismiss,
    Viewed,
    MarkedRead,
    /// Pushed out by a newer toast.
    Evicted,
    /// The toast surface was torn down.
    Cleared,
}

impl RemovalReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoDismiss => "auto_dismiss",
            Self::ManualDismiss => "manual_dismiss",
            Self::Viewed => "viewed",
            Self::MarkedRead => "marked_read",
            Self::Evicted => "evicted",
            Self::Cleared => "cleared",
        }
    }
}

/// One presented notification.
#[derive(Debug, Clone)]
pub struct ToastEntry {
    pub toast_id: ToastId,
    /// Snapshot taken at enqueue time; later store mutations do not show up.
    pub notification: Notification,
    pub state: ToastState,
    pub shown_at: Instant,
    pub expires_at: Instant,
    pub(crate) token: CancelToken,
}

impl ToastEntry {
    pub(crate) fn new(notification: Notification, now: Instant, expires_at: Instant) -> Self {
        Self {
            toast_id: ToastId::new(),
            notification,
            state: ToastState::Pending,
            shown_at: now,
            expires_at,
            token: CancelToken::new(),
        }
    }

    /// Invalidates the timer token and records the final state.
    pub(crate) fn retire(&mut self, reason: RemovalReason) {
        self.token.cancel();
        self.state = ToastState::Removed(reason);
    }
}

/// Arena holding at most `capacity` visible toasts, oldest first.
#[derive(Debug)]
pub struct BoundedToastQueue {
    capacity: usize,
    entries: VecDeque<ToastEntry>,
}

impl BoundedToastQueue {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends `entry` as newest; returns the evicted oldest entry, retired.
    pub fn push(&mut self, entry: ToastEntry) -> Option<ToastEntry> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front().map(|mut oldest| {
                oldest.retire(RemovalReason::Evicted);
                oldest
            })
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Removes one toast, retiring it with `reason`.
    pub fn remove(&mut self, toast_id: ToastId, reason: RemovalReason) -> Option<ToastEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.toast_id == toast_id)?;
        self.entries[index].token.cancel();
        let mut entry = self.entries.remove(index)?;
        entry.retire(reason);
        Some(entry)
    }

    pub fn get(&self, toast_id: ToastId) -> Option<&ToastEntry> {
        self.entries.iter().find(|entry| entry.toast_id == toast_id)
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ToastEntry> {
        self.entries.iter()
    }

    /// Retires and removes every toast.
    pub fn drain(&mut self, reason: RemovalReason) -> Vec<ToastEntry> {
        self.entries
            .drain(..)
            .map(|mut entry| {
                entry.retire(reason);
                entry
            })
            .collect()
    }
}
