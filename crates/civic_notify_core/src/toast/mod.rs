//! Ephemeral toast presentation of incoming notifications.
//!
//! # Responsibility
//! - Keep at most `capacity` toasts visible with drop-oldest eviction.
//! - Own per-toast auto-dismiss timers and their cancellation tokens.
//!
//! # Invariants
//! - Toast lifecycle is independent of read state: dismissing a toast never
//!   marks its notification read, and evicting it never touches the store.
//! - Every removal path cancels the toast's token before any other cleanup,
//!   so a stale timer can never act on a removed toast.

pub mod manager;
pub mod queue;
pub mod timer;

use uuid::Uuid;

/// Ephemeral toast identity. Distinct from `NotificationId`: a redelivered
/// notification gets a fresh toast id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(Uuid);

impl ToastId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ToastId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ToastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
