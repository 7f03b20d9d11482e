//! Audible cues for incoming notifications.
//!
//! # Responsibility
//! - Map priority/type to a short tone pattern without any asset files.
//! - Own one lazily created audio context per synthesizer instance.
//!
//! # Invariants
//! - The persisted sound preference is consulted before any audio work.
//! - Audio failures degrade to silence and are never surfaced to users.
//! - Overlapping patterns are mixed, not serialized.

pub mod backend;
pub mod pattern;
pub mod synthesizer;
