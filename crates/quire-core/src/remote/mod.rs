//! Remote data service contract and the row types it exchanges.
//!
//! Rows arrive loosely typed; they are validated into core models here, once,
//! so the engine only ever handles well-formed [`Note`]s.

mod memory;
mod supabase;

pub use memory::MemoryRemote;
pub use supabase::SupabaseRemote;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Note, NoteId, ShareGrant, SharedWithMe, TodoList, TodoRecord, DEFAULT_LIST};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote record: {0}")]
    InvalidRecord(String),
    #[error("Remote service unavailable")]
    Unavailable,
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Table reads and writes against the hosted backend
#[allow(async_fn_in_trait)]
pub trait RemoteService {
    /// Every note owned by `owner_id`, soft-deleted ones included
    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<Note>>;

    /// Insert or update a note keyed by id
    async fn upsert_note(&self, owner_id: &str, note: &Note) -> RemoteResult<()>;

    /// Remove a note row
    async fn delete_note(&self, id: &NoteId) -> RemoteResult<()>;

    /// Notes other people shared with `identity`, with their owners' profiles
    async fn shared_with(&self, identity: &str) -> RemoteResult<Vec<SharedWithMe>>;

    /// Recipients of every note `identity` has shared
    async fn shared_by(&self, identity: &str) -> RemoteResult<Vec<ShareGrant>>;

    /// Notes by id, in no particular order
    async fn fetch_notes_by_ids(&self, ids: &[NoteId]) -> RemoteResult<Vec<Note>>;

    /// Give `recipient_id` access to a note owned by `owner_id`
    async fn share_note(&self, note_id: &NoteId, owner_id: &str, recipient_id: &str)
        -> RemoteResult<()>;

    /// Revoke a recipient's access
    async fn unshare_note(&self, note_id: &NoteId, recipient_id: &str) -> RemoteResult<()>;

    /// The to-do blob of `owner_id`, if one exists
    async fn fetch_todo(&self, owner_id: &str) -> RemoteResult<Option<TodoRecord>>;

    /// Write the to-do blob
    async fn upsert_todo(&self, record: &TodoRecord) -> RemoteResult<()>;
}

/// `notes` row as the backend returns it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteRow {
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
    #[serde(default)]
    pub pinned: Option<bool>,
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub deleted_at: Option<i64>,
    #[serde(default)]
    pub version_num: Option<i64>,
}

impl NoteRow {
    /// Row to upsert for `note` owned by `owner_id`
    pub fn from_note(owner_id: &str, note: &Note) -> Self {
        Self {
            id: Some(note.id.to_string()),
            user_id: Some(owner_id.to_string()),
            content: Some(note.content.clone()),
            created_at: Some(note.created_at),
            updated_at: Some(note.updated_at),
            pinned: Some(note.pinned),
            list: Some(note.list.clone()),
            deleted: Some(note.deleted),
            deleted_at: note.deleted_at,
            version_num: Some(note.version_num),
        }
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = RemoteError;

    fn try_from(row: NoteRow) -> RemoteResult<Self> {
        let raw_id = row
            .id
            .ok_or_else(|| RemoteError::InvalidRecord("note row without id".to_string()))?;
        let id = raw_id
            .trim()
            .parse::<NoteId>()
            .map_err(|error| RemoteError::InvalidRecord(format!("note id {raw_id:?}: {error}")))?;
        let updated_at = row.updated_at.ok_or_else(|| {
            RemoteError::InvalidRecord(format!("note {id} has no updated_at"))
        })?;
        let version_num = row.version_num.unwrap_or(1);
        if version_num < 1 {
            return Err(RemoteError::InvalidRecord(format!(
                "note {id} has version_num {version_num}"
            )));
        }
        let deleted = row.deleted.unwrap_or(false);

        Ok(Self {
            id,
            content: row.content.unwrap_or_default(),
            created_at: row.created_at.unwrap_or(updated_at),
            updated_at,
            pinned: row.pinned.unwrap_or(false) && !deleted,
            list: row
                .list
                .filter(|list| !list.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LIST.to_string()),
            deleted,
            deleted_at: if deleted { row.deleted_at } else { None },
            version_num,
        })
    }
}

/// Validate a batch of rows, dropping (and logging) the malformed ones
pub fn notes_from_rows(rows: Vec<NoteRow>) -> Vec<Note> {
    rows.into_iter()
        .filter_map(|row| match Note::try_from(row) {
            Ok(note) => Some(note),
            Err(error) => {
                tracing::warn!("Skipping remote note row: {}", error);
                None
            }
        })
        .collect()
}

/// `to_do_list` row; `data` holds the JSON blob, sometimes double-encoded as a string
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoRow {
    pub user_id: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub version_num: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl TodoRow {
    pub fn from_record(record: &TodoRecord) -> RemoteResult<Self> {
        let data = serde_json::to_value(&record.list)
            .map_err(|error| RemoteError::InvalidRecord(error.to_string()))?;
        Ok(Self {
            user_id: record.owner_id.clone(),
            data,
            version_num: Some(record.version_num),
            updated_at: Some(record.updated_at),
        })
    }
}

impl TryFrom<TodoRow> for TodoRecord {
    type Error = RemoteError;

    fn try_from(row: TodoRow) -> RemoteResult<Self> {
        let list = match row.data {
            serde_json::Value::String(raw) => serde_json::from_str::<TodoList>(&raw),
            serde_json::Value::Null => Ok(TodoList::default()),
            value => serde_json::from_value::<TodoList>(value),
        }
        .map_err(|error| {
            RemoteError::InvalidRecord(format!("to-do blob for {}: {error}", row.user_id))
        })?;

        Ok(Self {
            owner_id: row.user_id,
            list,
            version_num: row.version_num.unwrap_or(0),
            updated_at: row.updated_at.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(id: &str) -> NoteRow {
        NoteRow {
            id: Some(id.to_string()),
            updated_at: Some(100),
            ..NoteRow::default()
        }
    }

    #[test]
    fn note_row_fills_defaults() {
        let id = NoteId::new();
        let note = Note::try_from(row(&id.to_string())).unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.created_at, 100);
        assert_eq!(note.version_num, 1);
        assert_eq!(note.list, DEFAULT_LIST);
        assert!(note.content.is_empty());
    }

    #[test]
    fn note_row_rejects_bad_ids_and_versions() {
        assert!(Note::try_from(row("not-a-uuid")).is_err());
        assert!(Note::try_from(NoteRow::default()).is_err());

        let mut bad_version = row(&NoteId::new().to_string());
        bad_version.version_num = Some(0);
        assert!(Note::try_from(bad_version).is_err());

        let mut no_timestamp = row(&NoteId::new().to_string());
        no_timestamp.updated_at = None;
        assert!(Note::try_from(no_timestamp).is_err());
    }

    #[test]
    fn live_rows_drop_stray_deleted_at() {
        let mut live = row(&NoteId::new().to_string());
        live.deleted_at = Some(50);
        live.pinned = Some(true);
        let note = Note::try_from(live).unwrap();
        assert_eq!(note.deleted_at, None);
        assert!(note.pinned);
    }

    #[test]
    fn note_round_trips_through_row() {
        let note = Note::new_at("Work", 10).edited("body", 20).soft_deleted(30);
        let back = Note::try_from(NoteRow::from_note("u1", &note)).unwrap();
        assert_eq!(back, note);
    }

    #[test]
    fn notes_from_rows_skips_malformed() {
        let good = NoteId::new();
        let notes = notes_from_rows(vec![row("garbage"), row(&good.to_string())]);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, good);
    }

    #[test]
    fn todo_row_accepts_string_and_object_blobs() {
        let object = TodoRow {
            user_id: "u1".to_string(),
            data: serde_json::json!({"items": [], "rolled_over_on": "2026-03-02"}),
            version_num: Some(3),
            updated_at: None,
        };
        let record = TodoRecord::try_from(object).unwrap();
        assert_eq!(record.version_num, 3);
        assert!(record.list.rolled_over_on.is_some());

        let string = TodoRow {
            user_id: "u1".to_string(),
            data: serde_json::Value::String(r#"{"items":[]}"#.to_string()),
            version_num: None,
            updated_at: None,
        };
        assert_eq!(TodoRecord::try_from(string).unwrap().version_num, 0);

        let broken = TodoRow {
            user_id: "u1".to_string(),
            data: serde_json::Value::String("{not json".to_string()),
            version_num: Some(1),
            updated_at: None,
        };
        assert!(TodoRecord::try_from(broken).is_err());
    }
}
