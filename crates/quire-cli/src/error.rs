use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] quire_core::Error),
    #[error(transparent)]
    Remote(#[from] quire_core::remote::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("To-do item not found for id/prefix: {0}")]
    TodoNotFound(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Could not resolve a local data directory; pass --db-path")]
    NoDataDir,
    #[error(
        "Sync is not configured. Set SUPABASE_URL, SUPABASE_ANON_KEY, QUIRE_ACCESS_TOKEN and QUIRE_USER_ID, or add them to the config file."
    )]
    SyncNotConfigured,
}
