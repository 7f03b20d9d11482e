//! Notification pipeline settings.
//!
//! # Responsibility
//! - Hold tunables for toasts, polling, paging, badge and sound.
//! - Load them from JSON with every field optional.
//!
//! # Invariants
//! - `validate()` must pass before a config reaches the runtime.
//! - URGENT toasts always stay visible longer than any other priority.

use crate::model::notification::Priority;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

const TOAST_CAPACITY_MAX: usize = 10;
const PAGE_LIMIT_MAX: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub toast_capacity: usize,
    pub toast_duration_ms: u64,
    pub urgent_toast_duration_ms: u64,
    pub unread_poll_interval_ms: u64,
    pub page_limit: u32,
    pub badge_cap: u64,
    pub sound_volume: f32,
    pub default_sound_enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            toast_capacity: 3,
            toast_duration_ms: 5_000,
            urgent_toast_duration_ms: 10_000,
            unread_poll_interval_ms: 30_000,
            page_limit: 10,
            badge_cap: 99,
            sound_volume: 0.1,
            default_sound_enabled: true,
        }
    }
}

impl NotifyConfig {
    /// Parses and validates a JSON document. Missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.toast_capacity == 0 || self.toast_capacity > TOAST_CAPACITY_MAX {
            return Err(ConfigError::Invalid(format!(
                "toast_capacity must be within 1..={TOAST_CAPACITY_MAX}, got {}",
                self.toast_capacity
            )));
        }
        if self.toast_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "toast_duration_ms must be positive".to_string(),
            ));
        }
        if self.urgent_toast_duration_ms <= self.toast_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "urgent_toast_duration_ms ({}) must exceed toast_duration_ms ({})",
                self.urgent_toast_duration_ms, self.toast_duration_ms
            )));
        }
        if self.unread_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "unread_poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.page_limit == 0 || self.page_limit > PAGE_LIMIT_MAX {
            return Err(ConfigError::Invalid(format!(
                "page_limit must be within 1..={PAGE_LIMIT_MAX}, got {}",
                self.page_limit
            )));
        }
        if !(self.sound_volume > 0.0 && self.sound_volume <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "sound_volume must be within (0, 1], got {}",
                self.sound_volume
            )));
        }
        Ok(())
    }

    /// Auto-dismiss window for a toast of `priority`.
    pub fn toast_duration(&self, priority: Priority) -> Duration {
        match priority {
            Priority::Urgent => Duration::from_millis(self.urgent_toast_duration_ms),
            _ => Duration::from_millis(self.toast_duration_ms),
        }
    }

    pub fn unread_poll_interval(&self) -> Duration {
        Duration::from_millis(self.unread_poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(message) => write!(f, "failed to read config: {message}"),
            Self::Parse(message) => write!(f, "failed to parse config: {message}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {}
