//! Canonical notification data model.
//!
//! # Responsibility
//! - Define the record shared by the store, the toast queue and presenters.
//! - Keep wire naming (`camelCase`, `type`) stable for push and REST payloads.
//!
//! # Invariants
//! - Every notification is identified by a stable `NotificationId`.
//! - `is_read` is monotonic: it flips false -> true and never reverts.

pub mod notification;
