//! Debounced best-effort saving.
//!
//! Every change re-arms a debounce timer; once it elapses the document is
//! downgraded to the stored format and written. A failed write is logged and
//! dropped, and the next change arms a new attempt.

use crate::document::Document;
use crate::migrate::{load_document, to_storage_value};
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use web_time::{Duration, Instant};

/// Quiet period after the last change before a save runs.
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1500);

/// What a poll of the auto-saver did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No unsaved changes.
    Idle,
    /// Changes are waiting for the debounce to elapse.
    Pending,
    Saved,
    /// The write failed; local state is untouched.
    Failed(String),
}

/// Saves one project after edits settle.
pub struct AutoSaver<S: Storage> {
    storage: Arc<S>,
    project_id: String,
    debounce: Duration,
    /// When the pending save becomes due.
    deadline: Option<Instant>,
    last_save: Option<Instant>,
}

impl<S: Storage> AutoSaver<S> {
    /// Create an auto-saver for `project_id` with the default debounce.
    pub fn new(storage: Arc<S>, project_id: impl Into<String>) -> Self {
        Self {
            storage,
            project_id: project_id.into(),
            debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            deadline: None,
            last_save: None,
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Time of the last successful save.
    pub fn last_save(&self) -> Option<Instant> {
        self.last_save
    }

    /// Check if changes are waiting to be saved.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Record a change at `now`, restarting the debounce.
    pub fn notify_change(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    /// Record a change now.
    pub fn mark_dirty(&mut self) {
        self.notify_change(Instant::now());
    }

    /// Check if a pending save is due at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Save `document` if the debounce has elapsed at `now`.
    pub async fn poll_at(&mut self, now: Instant, document: &Document) -> SaveOutcome {
        match self.deadline {
            None => SaveOutcome::Idle,
            Some(deadline) if now < deadline => SaveOutcome::Pending,
            Some(_) => self.save_now(now, document).await,
        }
    }

    /// Save `document` if the debounce has elapsed.
    pub async fn poll(&mut self, document: &Document) -> SaveOutcome {
        self.poll_at(Instant::now(), document).await
    }

    /// Save immediately, regardless of the debounce.
    pub async fn flush(&mut self, document: &Document) -> SaveOutcome {
        self.save_now(Instant::now(), document).await
    }

    async fn save_now(&mut self, now: Instant, document: &Document) -> SaveOutcome {
        // Cleared up front: failures wait for the next change.
        self.deadline = None;
        match self.write(document).await {
            Ok(()) => {
                self.last_save = Some(now);
                log::debug!("Saved project {}", self.project_id);
                SaveOutcome::Saved
            }
            Err(err) => {
                log::warn!("Autosave of project {} failed: {}", self.project_id, err);
                SaveOutcome::Failed(err.to_string())
            }
        }
    }

    async fn write(&self, document: &Document) -> StorageResult<()> {
        let value = to_storage_value(document)?;
        self.storage.save(&self.project_id, &value).await
    }

    /// Load the project, or an empty document if it was never saved.
    pub async fn load(&self) -> StorageResult<Document> {
        match self.storage.load(&self.project_id).await {
            Ok(value) => Ok(load_document(value)),
            Err(StorageError::NotFound(_)) => Ok(Document::new()),
            Err(err) => Err(err),
        }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
