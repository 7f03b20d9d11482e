//! REST collaborator contracts.
//!
//! # Responsibility
//! - Define the list/count/mutate operations the store consumes.
//! - Provide an in-memory implementation for tests and local demos.
//!
//! # Invariants
//! - Collaborator APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.
//! - A failed call never leaves a partial mutation behind.

pub mod notification_api;
