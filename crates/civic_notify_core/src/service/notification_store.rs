//! Notification store: the single source of truth for presenters.
//!
//! # Responsibility
//! - Own the loaded window of notifications, the unread counter and the
//!   pagination cursor.
//! - Apply collaborator results to local state only after they succeed.
//!
//! # Invariants
//! - The unread counter never goes negative (all decrements saturate).
//! - The window is newest-first by arrival: received and created items are
//!   inserted at the head regardless of `created_at`.
//! - A failed collaborator call leaves the window and counters unchanged.
//! - The authoritative unread counter is refreshed independently of the
//!   window and may drift from `local_unread_count()` until then.

use crate::model::notification::{Notification, NotificationDraft, NotificationId};
use crate::repo::notification_api::{ApiError, ListQuery, NotificationApi};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation failure. Local state is untouched when returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Api(ApiError),
    InvalidDraft(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{err}"),
            Self::InvalidDraft(details) => write!(f, "invalid notification draft: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::InvalidDraft(_) => None,
        }
    }
}

impl From<ApiError> for StoreError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

/// Pagination metadata of the last successful fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            total: 0,
            total_pages: 0,
        }
    }
}

/// In-memory notification window backed by a REST collaborator.
pub struct NotificationStore<A: NotificationApi> {
    api: A,
    items: Vec<Notification>,
    unread_count: u64,
    pagination: Pagination,
}

impl<A: NotificationApi> NotificationStore<A> {
    /// Creates an empty store. Nothing is loaded until `fetch`.
    pub fn new(api: A) -> Self {
        Self {
            api,
            items: Vec::new(),
            unread_count: 0,
            pagination: Pagination::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Loaded window, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.items
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Notification> {
        self.items.iter().find(|notification| &notification.id == id)
    }

    /// Authoritative unread counter (with local optimistic updates).
    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    /// Distinct unread notifications inside the loaded window.
    ///
    /// Redelivered copies of one id count once.
    pub fn local_unread_count(&self) -> u64 {
        self.items
            .iter()
            .filter(|notification| !notification.is_read)
            .map(|notification| &notification.id)
            .collect::<HashSet<_>>()
            .len() as u64
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn has_more(&self) -> bool {
        self.pagination.page < self.pagination.total_pages
    }

    /// Replaces the window with one page and resets pagination metadata.
    pub fn fetch(&mut self, page: u32, limit: u32) -> StoreResult<()> {
        self.fetch_with(&ListQuery::page(page, limit))
    }

    /// Same as `fetch`, with type/priority/read-state/date filters.
    ///
    /// Invalid records in the page are dropped with a diagnostic log.
    pub fn fetch_with(&mut self, query: &ListQuery) -> StoreResult<()> {
        let page = match self.api.list(query) {
            Ok(page) => page,
            Err(err) => {
                warn!(
                    "event=store_fetch module=store status=error page={} limit={} error={}",
                    query.page, query.limit, err
                );
                return Err(err.into());
            }
        };

        let received = page.items.len();
        let items: Vec<Notification> = page
            .items
            .into_iter()
            .filter(|notification| match notification.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!("event=store_fetch_item_dropped module=store error={err}");
                    false
                }
            })
            .collect();

        self.items = items;
        self.pagination = Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        };
        info!(
            "event=store_fetch module=store status=ok page={} received={} kept={} total={}",
            page.page,
            received,
            self.items.len(),
            page.total
        );
        Ok(())
    }

    /// Replaces the unread counter with the collaborator's value.
    pub fn fetch_unread_count(&mut self) -> StoreResult<u64> {
        let count = self.api.unread_count().map_err(|err| {
            warn!("event=store_unread_refresh module=store status=error error={err}");
            StoreError::from(err)
        })?;
        if count != self.unread_count {
            debug!(
                "event=store_unread_refresh module=store status=corrected from={} to={}",
                self.unread_count, count
            );
        }
        self.unread_count = count;
        Ok(count)
    }

    /// Marks one notification read.
    ///
    /// Returns `Ok(true)` when a loaded entry flipped, `Ok(false)` when every
    /// copy was already read (no collaborator call) or the id is outside the
    /// window.
    ///
    /// # Contract
    /// - Idempotent: a second call is a no-op.
    /// - Every window copy of `id` flips; the counter decrements once,
    ///   floored at zero.
    /// - Outside the window, or when redelivered copies were present, the
    ///   counter is re-fetched instead of guessed.
    pub fn mark_as_read(&mut self, id: &NotificationId) -> StoreResult<bool> {
        let mut copies = self.items.iter().filter(|entry| &entry.id == id).peekable();
        if copies.peek().is_none() {
            self.api.mark_read(id)?;
            self.refresh_unread_best_effort();
            return Ok(false);
        }
        if copies.all(|entry| entry.is_read) {
            return Ok(false);
        }

        self.api.mark_read(id)?;
        let flipped = self
            .items
            .iter_mut()
            .filter(|entry| &entry.id == id)
            .map(Notification::mark_read)
            .filter(|flipped| *flipped)
            .count();
        self.unread_count = self.unread_count.saturating_sub(1);
        if flipped > 1 {
            self.refresh_unread_best_effort();
        }
        debug!("event=store_mark_read module=store status=ok id={id} copies={flipped}");
        Ok(true)
    }

    /// Marks every loaded entry read and zeroes the counter.
    ///
    /// Entries outside the window are corrected by the next authoritative
    /// refresh.
    pub fn mark_all_as_read(&mut self) -> StoreResult<()> {
        let flipped = self.api.mark_all_read()?;
        for entry in &mut self.items {
            entry.mark_read();
        }
        self.unread_count = 0;
        info!("event=store_mark_all_read module=store status=ok flipped={flipped}");
        Ok(())
    }

    /// Deletes one notification, including every redelivered window copy.
    ///
    /// Decrements the total count, and the unread counter too when the
    /// removed entry was unread.
    pub fn delete(&mut self, id: &NotificationId) -> StoreResult<()> {
        self.api.delete(id)?;

        let before = self.items.len();
        let had_unread = self
            .items
            .iter()
            .any(|entry| &entry.id == id && !entry.is_read);
        self.items.retain(|entry| &entry.id != id);
        let removed = before - self.items.len();

        self.pagination.total = self.pagination.total.saturating_sub(removed.max(1) as u64);
        if had_unread {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        if removed == 0 || (removed > 1 && had_unread) {
            self.refresh_unread_best_effort();
        }
        debug!("event=store_delete module=store status=ok id={id} copies={removed}");
        Ok(())
    }

    /// Deletes every read notification. Returns how many left the window.
    pub fn delete_all_read(&mut self) -> StoreResult<u64> {
        let deleted = self.api.delete_all_read()?;
        let before = self.items.len();
        self.items.retain(|entry| !entry.is_read);
        let removed = (before - self.items.len()) as u64;
        self.pagination.total = self.pagination.total.saturating_sub(deleted.max(removed));
        info!(
            "event=store_delete_all_read module=store status=ok deleted={deleted} removed_from_window={removed}"
        );
        Ok(removed)
    }

    /// Creates a locally originated notification and inserts it at the head.
    pub fn create(&mut self, draft: &NotificationDraft) -> StoreResult<Notification> {
        validate_draft(draft)?;
        let created = self.api.create(draft)?;
        self.insert_received(created.clone());
        Ok(created)
    }

    /// Inserts a notification delivered by the push channel at the head.
    ///
    /// No deduplication: a redelivered id produces a second entry.
    pub fn insert_received(&mut self, notification: Notification) {
        if !notification.is_read {
            self.unread_count += 1;
        }
        self.pagination.total += 1;
        debug!(
            "event=store_insert module=store status=ok id={} priority={} unread={}",
            notification.id, notification.priority, self.unread_count
        );
        self.items.insert(0, notification);
    }

    /// Sends a notification to every user. The push channel delivers it back.
    pub fn broadcast(&self, draft: &NotificationDraft) -> StoreResult<u64> {
        validate_draft(draft)?;
        let recipients = self.api.broadcast(draft)?;
        info!("event=store_broadcast module=store status=ok recipients={recipients}");
        Ok(recipients)
    }

    /// Sends a notification to every holder of `role`.
    pub fn send_to_role(&self, role: &str, draft: &NotificationDraft) -> StoreResult<u64> {
        validate_draft(draft)?;
        let recipients = self.api.send_to_role(role, draft)?;
        info!("event=store_send_to_role module=store status=ok recipients={recipients}");
        Ok(recipients)
    }

    fn refresh_unread_best_effort(&mut self) {
        if let Err(err) = self.fetch_unread_count() {
            debug!("event=store_unread_refresh module=store status=deferred error={err}");
        }
    }
}

fn validate_draft(draft: &NotificationDraft) -> StoreResult<()> {
    if draft.title.trim().is_empty() {
        return Err(StoreError::InvalidDraft("title must not be empty"));
    }
    if draft.message.trim().is_empty() {
        return Err(StoreError::InvalidDraft("message must not be empty"));
    }
    Ok(())
}
