//! Local note storage contracts.
//!
//! The engine talks to local persistence only through these traits. The SQLite
//! store backs the desktop build; [`MemoryStore`] backs the web build, where
//! nothing survives a reload and the remote set is ground truth.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{Note, NoteId};

/// Note storage operations. Every call may fail; failures are not retried here.
#[allow(async_fn_in_trait)]
pub trait NoteStore {
    /// All notes, including soft-deleted ones
    async fn list(&self) -> Result<Vec<Note>>;

    /// Get a note by ID
    async fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// Create an empty note in `list`
    async fn create(&self, list: &str) -> Result<Note>;

    /// Save new content, bumping `updated_at` and `version_num`
    async fn update(&self, id: &NoteId, content: &str) -> Result<Note>;

    /// Move a note to Recently Deleted
    async fn soft_delete(&self, id: &NoteId) -> Result<Note>;

    /// Bring a note back from Recently Deleted
    async fn restore(&self, id: &NoteId) -> Result<Note>;

    /// Remove a note for good
    async fn hard_delete(&self, id: &NoteId) -> Result<()>;

    /// Replace the whole store with `notes`
    async fn replace_all(&self, notes: &[Note]) -> Result<()>;

    /// Pin or unpin a note
    async fn set_pinned(&self, id: &NoteId, pinned: bool) -> Result<Note>;

    /// Move a note to another folder
    async fn move_list(&self, id: &NoteId, list: &str) -> Result<Note>;

    /// Write a full record as received from elsewhere.
    ///
    /// Ignored when the stored copy already has a higher version.
    async fn put(&self, note: &Note) -> Result<()>;

    /// Whether the store survives restarts
    fn is_durable(&self) -> bool {
        true
    }
}

/// Small pieces of persisted engine state outside the note table
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// True until the first reconciliation that reached the remote service
    async fn is_first_run(&self) -> Result<bool>;

    /// Clear the first-run flag permanently
    async fn clear_first_run(&self) -> Result<()>;

    /// Shared-note ids `identity` has already been told about
    async fn seen_shared_ids(&self, identity: &str) -> Result<Vec<NoteId>>;

    /// Overwrite the seen shared-note ids for `identity`
    async fn set_seen_shared_ids(&self, identity: &str, ids: &[NoteId]) -> Result<()>;
}
