//! Notification REST collaborator contract and in-memory implementation.
//!
//! # Responsibility
//! - Describe the backend operations: list, unread-count, mark-read,
//!   mark-all-read, delete, delete-all-read, create, broadcast, send-to-role.
//! - Keep HTTP/serialization details outside of the core.
//!
//! # Invariants
//! - `list` returns items newest-first with 1-based page numbers.
//! - `unread_count` is authoritative and independent of any client window.

use crate::model::notification::{
    Notification, NotificationDraft, NotificationId, NotificationType, Priority,
};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure reported by the REST collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Network or server failure; the request may be retried later.
    Transport(String),
    NotFound(NotificationId),
    /// Request understood but refused (validation, permissions).
    Rejected(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "notification backend unreachable: {message}"),
            Self::NotFound(id) => write!(f, "notification not found: {id}"),
            Self::Rejected(message) => write!(f, "notification request rejected: {message}"),
        }
    }
}

impl Error for ApiError {}

/// Query options for listing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub kind: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub is_read: Option<bool>,
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            kind: None,
            priority: None,
            is_read: None,
            from: None,
            to: None,
        }
    }

    /// Returns whether one notification passes every filter of this query.
    pub fn matches(&self, notification: &Notification) -> bool {
        if let Some(kind) = &self.kind {
            if &notification.kind != kind {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if notification.priority != priority {
                return false;
            }
        }
        if let Some(is_read) = self.is_read {
            if notification.is_read != is_read {
                return false;
            }
        }
        if let Some(from) = self.from {
            if notification.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if notification.created_at > to {
                return false;
            }
        }
        true
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::page(1, 10)
    }
}

/// One page of notifications plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Backend operations consumed by the notification store.
pub trait NotificationApi {
    fn list(&self, query: &ListQuery) -> ApiResult<NotificationPage>;
    fn unread_count(&self) -> ApiResult<u64>;
    fn mark_read(&self, id: &NotificationId) -> ApiResult<()>;
    /// Returns the number of notifications that flipped to read.
    fn mark_all_read(&self) -> ApiResult<u64>;
    fn delete(&self, id: &NotificationId) -> ApiResult<()>;
    /// Returns the number of deleted notifications.
    fn delete_all_read(&self) -> ApiResult<u64>;
    /// Creates one notification for the current user and returns it.
    fn create(&self, draft: &NotificationDraft) -> ApiResult<Notification>;
    /// Fans a notification out to every user. Returns the recipient count.
    fn broadcast(&self, draft: &NotificationDraft) -> ApiResult<u64>;
    /// Fans a notification out to every user holding `role`.
    fn send_to_role(&self, role: &str, draft: &NotificationDraft) -> ApiResult<u64>;
}

impl<T: NotificationApi + ?Sized> NotificationApi for Arc<T> {
    fn list(&self, query: &ListQuery) -> ApiResult<NotificationPage> {
        (**self).list(query)
    }

    fn unread_count(&self) -> ApiResult<u64> {
        (**self).unread_count()
    }

    fn mark_read(&self, id: &NotificationId) -> ApiResult<()> {
        (**self).mark_read(id)
    }

    fn mark_all_read(&self) -> ApiResult<u64> {
        (**self).mark_all_read()
    }

    fn delete(&self, id: &NotificationId) -> ApiResult<()> {
        (**self).delete(id)
    }

    fn delete_all_read(&self) -> ApiResult<u64> {
        (**self).delete_all_read()
    }

    fn create(&self, draft: &NotificationDraft) -> ApiResult<Notification> {
        (**self).create(draft)
    }

    fn broadcast(&self, draft: &NotificationDraft) -> ApiResult<u64> {
        (**self).broadcast(draft)
    }

    fn send_to_role(&self, role: &str, draft: &NotificationDraft) -> ApiResult<u64> {
        (**self).send_to_role(role, draft)
    }
}

#[derive(Debug, Default)]
struct InMemoryState {
    /// Newest first.
    notifications: Vec<Notification>,
    roles: Vec<String>,
    offline: bool,
}

/// Single-user in-memory backend.
///
/// Used by tests and the CLI demo. `set_offline(true)` makes every call fail
/// with `ApiError::Transport`.
#[derive(Debug, Default)]
pub struct InMemoryNotificationApi {
    state: Mutex<InMemoryState>,
}

impl InMemoryNotificationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose current user holds `roles`.
    pub fn with_roles(roles: &[&str]) -> Self {
        let api = Self::new();
        if let Ok(mut state) = api.state.lock() {
            state.roles = roles.iter().map(|role| role.to_string()).collect();
        }
        api
    }

    /// Stores one notification as if the server had created it.
    pub fn seed(&self, notification: Notification) {
        if let Ok(mut state) = self.state.lock() {
            state.notifications.insert(0, notification);
        }
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.offline = offline;
        }
    }

    /// Returns a server-side copy of one notification.
    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        let state = self.state.lock().ok()?;
        state
            .notifications
            .iter()
            .find(|notification| &notification.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.notifications.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn online_state(&self) -> ApiResult<MutexGuard<'_, InMemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| ApiError::Transport("in-memory state poisoned".to_string()))?;
        if state.offline {
            return Err(ApiError::Transport("backend offline".to_string()));
        }
        Ok(state)
    }

    fn insert_from_draft(state: &mut InMemoryState, draft: &NotificationDraft) -> Notification {
        let id = NotificationId::new(format!("ntf-{}", Uuid::new_v4()));
        let notification = draft.clone().into_notification(id, Utc::now());
        state.notifications.insert(0, notification.clone());
        notification
    }
}

impl NotificationApi for InMemoryNotificationApi {
    fn list(&self, query: &ListQuery) -> ApiResult<NotificationPage> {
        if query.page == 0 || query.limit == 0 {
            return Err(ApiError::Rejected(format!(
                "page and limit must be positive, got page={} limit={}",
                query.page, query.limit
            )));
        }

        let state = self.online_state()?;
        let mut matching: Vec<&Notification> = state
            .notifications
            .iter()
            .filter(|notification| query.matches(notification))
            .collect();
        matching.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        let total = matching.len() as u64;
        let limit = query.limit as usize;
        let total_pages = matching.len().div_ceil(limit) as u32;
        let start = (query.page as usize - 1).saturating_mul(limit);
        let items = matching
            .into_iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect();

        Ok(NotificationPage {
            items,
            page: query.page,
            limit: query.limit,
            total,
            total_pages,
        })
    }

    fn unread_count(&self) -> ApiResult<u64> {
        let state = self.online_state()?;
        Ok(state
            .notifications
            .iter()
            .filter(|notification| !notification.is_read)
            .count() as u64)
    }

    fn mark_read(&self, id: &NotificationId) -> ApiResult<()> {
        let mut state = self.online_state()?;
        let notification = state
            .notifications
            .iter_mut()
            .find(|notification| &notification.id == id)
            .ok_or_else(|| ApiError::NotFound(id.clone()))?;
        notification.mark_read();
        Ok(())
    }

    fn mark_all_read(&self) -> ApiResult<u64> {
        let mut state = self.online_state()?;
        let flipped = state
            .notifications
            .iter_mut()
            .map(Notification::mark_read)
            .filter(|flipped| *flipped)
            .count();
        Ok(flipped as u64)
    }

    fn delete(&self, id: &NotificationId) -> ApiResult<()> {
        let mut state = self.online_state()?;
        let before = state.notifications.len();
        state.notifications.retain(|notification| &notification.id != id);
        if state.notifications.len() == before {
            return Err(ApiError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn delete_all_read(&self) -> ApiResult<u64> {
        let mut state = self.online_state()?;
        let before = state.notifications.len();
        state.notifications.retain(|notification| !notification.is_read);
        Ok((before - state.notifications.len()) as u64)
    }

    fn create(&self, draft: &NotificationDraft) -> ApiResult<Notification> {
        if draft.title.trim().is_empty() {
            return Err(ApiError::Rejected("title must not be empty".to_string()));
        }
        let mut state = self.online_state()?;
        Ok(Self::insert_from_draft(&mut state, draft))
    }

    fn broadcast(&self, draft: &NotificationDraft) -> ApiResult<u64> {
        let mut state = self.online_state()?;
        Self::insert_from_draft(&mut state, draft);
        Ok(1)
    }

    fn send_to_role(&self, role: &str, draft: &NotificationDraft) -> ApiResult<u64> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ApiError::Rejected("role must not be empty".to_string()));
        }
        let mut state = self.online_state()?;
        if !state.roles.iter().any(|held| held == role) {
            return Ok(0);
        }
        Self::insert_from_draft(&mut state, draft);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, InMemoryNotificationApi, ListQuery, NotificationApi};
    use crate::model::notification::{
        Notification, NotificationDraft, NotificationId, NotificationType, Priority,
    };
    use chrono::{Duration, Utc};

    fn seeded(count: usize) -> InMemoryNotificationApi {
        let api = InMemoryNotificationApi::new();
        let base = Utc::now();
        for index in 0..count {
            let mut notification = Notification::new(
                format!("n-{index}"),
                NotificationType::System,
                format!("title {index}"),
                "body",
            );
            notification.created_at = base + Duration::seconds(index as i64);
            api.seed(notification);
        }
        api
    }

    #[test]
    fn list_paginates_newest_first() {
        let api = seeded(5);
        let first = api.list(&ListQuery::page(1, 2)).expect("first page");
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items[0].id, NotificationId::from("n-4"));
        assert_eq!(first.items[1].id, NotificationId::from("n-3"));

        let last = api.list(&ListQuery::page(3, 2)).expect("last page");
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].id, NotificationId::from("n-0"));
    }

    #[test]
    fn list_applies_filters() {
        let api = seeded(3);
        api.seed(
            Notification::new("urgent", NotificationType::PenaltyApplied, "t", "m")
                .with_priority(Priority::Urgent),
        );
        let query = ListQuery {
            priority: Some(Priority::Urgent),
            ..ListQuery::default()
        };
        let page = api.list(&query).expect("filtered page");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, NotificationId::from("urgent"));
    }

    #[test]
    fn offline_backend_fails_with_transport_error() {
        let api = seeded(1);
        api.set_offline(true);
        assert!(matches!(api.unread_count(), Err(ApiError::Transport(_))));
        api.set_offline(false);
        assert_eq!(api.unread_count().expect("count"), 1);
    }

    #[test]
    fn send_to_role_only_reaches_role_holders() {
        let api = InMemoryNotificationApi::with_roles(&["officer"]);
        let draft = NotificationDraft::new(NotificationType::System, "shift", "starts at 8");
        assert_eq!(api.send_to_role("admin", &draft).expect("send"), 0);
        assert_eq!(api.send_to_role("officer", &draft).expect("send"), 1);
        assert_eq!(api.len(), 1);
    }

    #[test]
    fn delete_all_read_keeps_unread() {
        let api = seeded(3);
        api.mark_read(&NotificationId::from("n-1")).expect("mark");
        assert_eq!(api.delete_all_read().expect("delete"), 1);
        assert_eq!(api.len(), 2);
        assert!(api.get(&NotificationId::from("n-1")).is_none());
    }
}
