//! Notification domain model.
//!
//! # Responsibility
//! - Define the canonical `Notification` record and its enumerations.
//! - Validate records that enter the core from push or REST payloads.
//!
//! # Invariants
//! - `id` is non-empty and never reused for another notification.
//! - `action_url`, when set, is an absolute in-app path or an http(s) URL.
//! - `mark_read` is the only way to mutate read state; there is no unread.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static ACTION_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(/[A-Za-z0-9/_\-.~%?=&#:+]*|https?://[^\s]+)$").expect("valid action url regex")
});

/// Stable identifier assigned by the notification backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Severity tier. Drives auto-dismiss duration and sound pattern.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }

    /// Parses the wire spelling, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "NORMAL" => Some(Self::Normal),
            "HIGH" => Some(Self::High),
            "URGENT" => Some(Self::Urgent),
            _ => None,
        }
    }

    /// `HIGH` and `URGENT` use the attention sound pattern.
    pub fn demands_attention(self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification category.
///
/// Unknown wire values are preserved in `Other` so that a newer backend never
/// breaks an older client; they route to the generic notifications view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    ReportSubmitted,
    ReportApproved,
    ReportRejected,
    AppealSubmitted,
    AppealApproved,
    AppealRejected,
    RewardEarned,
    PaymentReceived,
    DebtCreated,
    PenaltyApplied,
    System,
    Error,
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ReportSubmitted => "REPORT_SUBMITTED",
            Self::ReportApproved => "REPORT_APPROVED",
            Self::ReportRejected => "REPORT_REJECTED",
            Self::AppealSubmitted => "APPEAL_SUBMITTED",
            Self::AppealApproved => "APPEAL_APPROVED",
            Self::AppealRejected => "APPEAL_REJECTED",
            Self::RewardEarned => "REWARD_EARNED",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::DebtCreated => "DEBT_CREATED",
            Self::PenaltyApplied => "PENALTY_APPLIED",
            Self::System => "SYSTEM",
            Self::Error => "ERROR",
            Self::Other(value) => value.as_str(),
        }
    }

    /// Approvals and rewards get the ascending "success" tone.
    pub fn is_success_like(&self) -> bool {
        matches!(
            self,
            Self::ReportApproved | Self::AppealApproved | Self::RewardEarned
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "REPORT_SUBMITTED" => Self::ReportSubmitted,
            "REPORT_APPROVED" => Self::ReportApproved,
            "REPORT_REJECTED" => Self::ReportRejected,
            "APPEAL_SUBMITTED" => Self::AppealSubmitted,
            "APPEAL_APPROVED" => Self::AppealApproved,
            "APPEAL_REJECTED" => Self::AppealRejected,
            "REWARD_EARNED" => Self::RewardEarned,
            "PAYMENT_RECEIVED" => Self::PaymentReceived,
            "DEBT_CREATED" => Self::DebtCreated,
            "PENALTY_APPLIED" => Self::PenaltyApplied,
            "SYSTEM" => Self::System,
            "ERROR" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    /// Serialized as `type` to match the backend schema.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub is_read: bool,
    /// Deep link opened by the "view" action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

impl Notification {
    /// Creates an unread notification stamped with the current time.
    pub fn new(
        id: impl Into<NotificationId>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            message: message.into(),
            kind,
            priority: Priority::Normal,
            is_read: false,
            action_url: None,
            created_at: Utc::now(),
            related_entity_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_action_url(mut self, action_url: impl Into<String>) -> Self {
        self.action_url = Some(action_url.into());
        self
    }

    /// Flips read state. Returns `true` only on the unread -> read transition.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        true
    }

    /// Validates fields that come from outside the core.
    ///
    /// # Errors
    /// - `EmptyId` when `id` is blank.
    /// - `EmptyTitle` when `title` is blank.
    /// - `InvalidActionUrl` when `action_url` is neither an in-app path nor
    ///   an http(s) URL.
    pub fn validate(&self) -> Result<(), NotificationValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(NotificationValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle(self.id.clone()));
        }
        if let Some(url) = self.action_url.as_deref() {
            if !ACTION_URL_RE.is_match(url) {
                return Err(NotificationValidationError::InvalidActionUrl {
                    id: self.id.clone(),
                    url: url.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Payload for locally originated notifications (admin tools, tests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<String>,
}

impl NotificationDraft {
    pub fn new(kind: NotificationType, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            priority: Priority::Normal,
            action_url: None,
            related_entity_id: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Materializes the draft under a backend-assigned id.
    pub fn into_notification(self, id: NotificationId, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            priority: self.priority,
            is_read: false,
            action_url: self.action_url,
            created_at,
            related_entity_id: self.related_entity_id,
        }
    }
}

/// Validation errors for externally supplied notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    EmptyId,
    EmptyTitle(NotificationId),
    InvalidActionUrl { id: NotificationId, url: String },
}

impl Display for NotificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "notification id must not be empty"),
            Self::EmptyTitle(id) => write!(f, "notification {id} has an empty title"),
            Self::InvalidActionUrl { id, url } => {
                write!(f, "notification {id} has an invalid action url `{url}`")
            }
        }
    }
}

impl Error for NotificationValidationError {}
