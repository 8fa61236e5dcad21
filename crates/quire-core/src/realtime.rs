//! Realtime change routing.
//!
//! Change notifications for the `notes`, `note_sharing` and `to_do_list`
//! relations are decoded from the backend's payloads into typed messages and
//! applied to the session. Every handler is idempotent and never moves a note
//! to an older version, so duplicated or reordered deliveries are harmless.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::content::ContentPredicates;
use crate::error::Result;
use crate::events::{emit, EngineEvent};
use crate::models::{Note, NoteId, TodoRecord};
use crate::remote::{NoteRow, RemoteError, RemoteResult, RemoteService, TodoRow};
use crate::session::Session;
use crate::store::{NoteStore, StateStore};
use crate::sync::SyncEngine;

pub const NOTES_TABLE: &str = "notes";
pub const SHARING_TABLE: &str = "note_sharing";
pub const TODO_TABLE: &str = "to_do_list";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One row change; deletes only carry the key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent<T, K> {
    Insert(T),
    Update(T),
    Delete(K),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeMessage {
    Notes(ChangeEvent<Note, NoteId>),
    Sharing(ChangeKind),
    Todo(ChangeEvent<TodoRecord, String>),
}

#[derive(Debug, Deserialize)]
struct RawChange {
    table: String,
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(default)]
    new: Value,
    #[serde(default)]
    old: Value,
}

impl RealtimeMessage {
    /// Decode a raw change payload (`{"table", "eventType", "new", "old"}`)
    pub fn decode(payload: &Value) -> RemoteResult<Self> {
        let raw = RawChange::deserialize(payload)
            .map_err(|error| RemoteError::InvalidRecord(format!("realtime payload: {error}")))?;
        let kind = match raw.event_type.to_ascii_uppercase().as_str() {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            other => {
                return Err(RemoteError::InvalidRecord(format!(
                    "unknown realtime event type {other:?}"
                )))
            }
        };

        match raw.table.as_str() {
            NOTES_TABLE => decode_note_change(kind, raw.new, &raw.old).map(Self::Notes),
            SHARING_TABLE => Ok(Self::Sharing(kind)),
            TODO_TABLE => decode_todo_change(kind, raw.new, &raw.old).map(Self::Todo),
            other => Err(RemoteError::InvalidRecord(format!(
                "realtime change for unknown table {other:?}"
            ))),
        }
    }
}

fn row_field<T: DeserializeOwned>(value: Value, what: &str) -> RemoteResult<T> {
    serde_json::from_value(value)
        .map_err(|error| RemoteError::InvalidRecord(format!("{what}: {error}")))
}

fn decode_note_change(kind: ChangeKind, new: Value, old: &Value) -> RemoteResult<ChangeEvent<Note, NoteId>> {
    if kind == ChangeKind::Delete {
        let id = old
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::InvalidRecord("note delete without id".to_string()))?;
        let id = id
            .parse::<NoteId>()
            .map_err(|error| RemoteError::InvalidRecord(format!("note id {id:?}: {error}")))?;
        return Ok(ChangeEvent::Delete(id));
    }

    let note = Note::try_from(row_field::<NoteRow>(new, "note row")?)?;
    Ok(match kind {
        ChangeKind::Insert => ChangeEvent::Insert(note),
        _ => ChangeEvent::Update(note),
    })
}

fn decode_todo_change(
    kind: ChangeKind,
    new: Value,
    old: &Value,
) -> RemoteResult<ChangeEvent<TodoRecord, String>> {
    if kind == ChangeKind::Delete {
        let owner = old
            .get("user_id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::InvalidRecord("to-do delete without user_id".to_string()))?;
        return Ok(ChangeEvent::Delete(owner.to_string()));
    }

    let record = TodoRecord::try_from(row_field::<TodoRow>(new, "to-do row")?)?;
    Ok(match kind {
        ChangeKind::Insert => ChangeEvent::Insert(record),
        _ => ChangeEvent::Update(record),
    })
}

impl<S, R, P> SyncEngine<S, R, P>
where
    S: NoteStore + StateStore,
    R: RemoteService,
    P: ContentPredicates,
{
    /// Apply one change. Returns whether the session changed.
    pub async fn handle_change(&self, session: &mut Session, message: RealtimeMessage) -> Result<bool> {
        match message {
            RealtimeMessage::Notes(ChangeEvent::Insert(note)) => self.note_inserted(session, note).await,
            RealtimeMessage::Notes(ChangeEvent::Update(note)) => self.note_updated(session, note).await,
            RealtimeMessage::Notes(ChangeEvent::Delete(id)) => self.note_deleted(session, &id).await,
            RealtimeMessage::Sharing(kind) => {
                tracing::debug!("Sharing changed ({:?}); re-aggregating", kind);
                self.aggregate_shared(session).await?;
                Ok(true)
            }
            RealtimeMessage::Todo(change) => Ok(Self::todo_changed(session, change)),
        }
    }

    /// Decode and apply a raw payload. Malformed payloads are dropped.
    pub async fn handle_raw(&self, session: &mut Session, payload: &Value) -> Result<bool> {
        match RealtimeMessage::decode(payload) {
            Ok(message) => self.handle_change(session, message).await,
            Err(error) => {
                tracing::warn!("Dropping realtime payload: {}", error);
                Ok(false)
            }
        }
    }

    /// Apply changes until the sending side closes the channel
    pub async fn run(&self, session: &mut Session, mut changes: mpsc::Receiver<RealtimeMessage>) {
        while let Some(message) = changes.recv().await {
            if let Err(error) = self.handle_change(session, message).await {
                tracing::warn!("Failed to apply realtime change: {}", error);
            }
        }
        tracing::debug!("Realtime channel closed");
    }

    async fn note_inserted(&self, session: &mut Session, note: Note) -> Result<bool> {
        if session.tracker.is_cleaned_up(&note.id) || session.notes.contains(&note.id) {
            return Ok(false);
        }
        self.store.put(&note).await?;
        Ok(session.notes.insert_new(note))
    }

    async fn note_updated(&self, session: &mut Session, note: Note) -> Result<bool> {
        if session.tracker.is_cleaned_up(&note.id) {
            return Ok(false);
        }
        let id = note.id;
        let version = note.version_num;
        if !session.notes.advance(note.clone()) {
            return Ok(false);
        }
        self.store.put(&note).await?;

        let from_elsewhere = !matches!(session.last_sent_version(&id), Some(sent) if sent >= version);
        if session.open_note == Some(id) && from_elsewhere {
            emit(&self.events, EngineEvent::NoteChangedElsewhere { id });
        }
        Ok(true)
    }

    async fn note_deleted(&self, session: &mut Session, id: &NoteId) -> Result<bool> {
        let held = session.notes.remove(id).is_some();
        session.autosave.cancel(id);
        session.last_sent.remove(id);
        if let Err(error) = self.store.hard_delete(id).await {
            tracing::warn!("Failed to remove note {} locally: {}", id, error);
        }
        Ok(held)
    }

    fn todo_changed(session: &mut Session, change: ChangeEvent<TodoRecord, String>) -> bool {
        let owner_id = session.identity().id.clone();
        match change {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => {
                if record.owner_id != owner_id || !session.todo.is_superseded_by(&record) {
                    return false;
                }
                session.todo = record;
                true
            }
            ChangeEvent::Delete(owner) if owner == owner_id => {
                session.todo = TodoRecord::empty(owner_id);
                true
            }
            ChangeEvent::Delete(_) => false,
        }
    }
}
