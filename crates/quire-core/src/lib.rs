//! quire-core - note synchronization engine for Quire
//!
//! Holds the note model, the local stores, the remote data service contract and
//! the engine that reconciles them: full reconciliation, the per-note save path,
//! realtime change routing and shared-note aggregation.

pub mod autosave;
pub mod clock;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod note_set;
pub mod realtime;
pub mod remote;
pub mod session;
pub mod sharing;
pub mod store;
pub mod sync;
pub mod todos;
pub mod tracker;
pub mod util;

pub use config::Config;
pub use content::{ContentPredicates, DocumentContent, StorageRefs};
pub use db::SqliteStore;
pub use error::{Error, Result};
pub use events::{EngineEvent, SharedNotice};
pub use models::{Identity, Note, NoteId, SharedNoteEntry, TodoList, TodoRecord, DEFAULT_LIST};
pub use realtime::RealtimeMessage;
pub use remote::{MemoryRemote, RemoteService, SupabaseRemote};
pub use session::Session;
pub use store::{MemoryStore, NoteStore, StateStore};
pub use sync::{LeaveOutcome, ReconcileOutcome, SaveOutcome, SyncEngine};
