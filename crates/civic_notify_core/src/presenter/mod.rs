//! Read-only views over the notification store.
//!
//! # Responsibility
//! - Render the unread badge and the dropdown list from store state.
//! - Forward user commands (mark read, delete) straight to the store.
//!
//! # Invariants
//! - Presenters hold no notification state of their own.
//! - Opening the dropdown fetches from the store; it never creates toasts.

pub mod badge;
pub mod dropdown;
pub mod routing;
