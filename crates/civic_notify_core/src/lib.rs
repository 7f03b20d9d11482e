//! Client-side notification core: store, toasts, sound cues and push intake.
//! Components are single-writer; the async [`NotificationCenter`] owns them
//! and applies every mutation in arrival order.

pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod presenter;
pub mod repo;
pub mod runtime;
pub mod service;
pub mod sound;
pub mod toast;

pub use config::{ConfigError, NotifyConfig};
pub use events::adapter::{normalize_payload, EventSourceAdapter, PayloadError};
pub use events::transport::{
    LocalPushHub, PushChannel, PushEvent, PushTransport, Subscription, TransportError,
};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::notification::{
    Notification, NotificationDraft, NotificationId, NotificationType,
    NotificationValidationError, Priority,
};
pub use prefs::{MemoryPreferenceStore, PreferenceError, PreferenceStore, SqlitePreferenceStore};
pub use presenter::badge::{badge_label, BadgePresenter};
pub use presenter::dropdown::{DropdownPresenter, DropdownRow, DropdownView};
pub use presenter::routing::route_for;
pub use repo::notification_api::{
    ApiError, ApiResult, InMemoryNotificationApi, ListQuery, NotificationApi, NotificationPage,
};
pub use runtime::notification_center::{
    CenterCommand, CenterHandle, CenterReport, CenterSnapshot, NotificationCenter, ToastSummary,
};
pub use service::notification_store::{NotificationStore, Pagination, StoreError, StoreResult};
pub use sound::backend::{AudioBackend, AudioContext, AudioError, PcmAudioBackend};
pub use sound::pattern::{cue_for, SoundCue, Tone};
pub use sound::synthesizer::SoundSynthesizer;
pub use toast::manager::{ToastAction, ToastManager};
pub use toast::ToastId;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
