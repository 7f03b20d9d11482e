//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate collaborator calls into use-case level state changes.
//! - Keep presenters and the event loop decoupled from transport details.

pub mod notification_store;
