//! Push channel plumbing.
//!
//! # Responsibility
//! - Abstract the real-time transport behind subscribe/receive.
//! - Normalize push payloads and fan them out to the store and toasts.
//!
//! # Invariants
//! - Subscriptions are scoped handles: closing or dropping one releases the
//!   transport registration on every exit path.
//! - Malformed payloads are dropped with a diagnostic log, never propagated.

pub mod adapter;
pub mod transport;
