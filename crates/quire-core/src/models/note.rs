//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::clock::VersionClock;

/// Folder a note lands in when none is given
pub const DEFAULT_LIST: &str = "My Notes";

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A note in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    /// Serialized editor document
    pub content: String,
    /// Creation timestamp (Unix seconds)
    pub created_at: i64,
    /// Last content update timestamp (Unix seconds)
    pub updated_at: i64,
    /// Pinned to the top of its folder
    #[serde(default)]
    pub pinned: bool,
    /// Folder the note belongs to
    #[serde(default = "default_list")]
    pub list: String,
    /// Soft delete flag
    #[serde(default)]
    pub deleted: bool,
    /// When the note was moved to Recently Deleted
    #[serde(default)]
    pub deleted_at: Option<i64>,
    /// Write counter, bumped on every content-affecting write
    #[serde(default = "initial_version")]
    pub version_num: i64,
}

fn default_list() -> String {
    DEFAULT_LIST.to_string()
}

const fn initial_version() -> i64 {
    1
}

impl Note {
    /// Create a new empty note in the given folder
    #[must_use]
    pub fn new(list: impl Into<String>) -> Self {
        Self::new_at(list, crate::util::unix_timestamp_now())
    }

    /// Create a new empty note with an explicit creation time
    #[must_use]
    pub fn new_at(list: impl Into<String>, now: i64) -> Self {
        Self {
            id: NoteId::new(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            pinned: false,
            list: list.into(),
            deleted: false,
            deleted_at: None,
            version_num: initial_version(),
        }
    }

    /// The `(updated_at, version_num)` pair used to order conflicting writes
    #[must_use]
    pub const fn clock(&self) -> VersionClock {
        VersionClock::new(self.updated_at, self.version_num)
    }

    /// Content save: new content, fresh timestamp, next version
    #[must_use]
    pub fn edited(mut self, content: impl Into<String>, now: i64) -> Self {
        self.content = content.into();
        self.updated_at = now;
        self.version_num += 1;
        self
    }

    /// Pin or unpin. Keeps `updated_at` so pinning does not reorder the list.
    #[must_use]
    pub fn pinned_as(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self.version_num += 1;
        self
    }

    /// Move to another folder. Keeps `updated_at`.
    #[must_use]
    pub fn moved_to(mut self, list: impl Into<String>) -> Self {
        self.list = list.into();
        self.version_num += 1;
        self
    }

    /// Move to Recently Deleted. Deleted notes are never pinned.
    #[must_use]
    pub fn soft_deleted(mut self, now: i64) -> Self {
        self.deleted = true;
        self.deleted_at = Some(now);
        self.pinned = false;
        self.updated_at = now;
        self.version_num += 1;
        self
    }

    /// Bring back from Recently Deleted
    #[must_use]
    pub fn restored(mut self, now: i64) -> Self {
        self.deleted = false;
        self.deleted_at = None;
        self.updated_at = now;
        self.version_num += 1;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_note_new() {
        let note = Note::new("Work");
        assert!(note.content.is_empty());
        assert_eq!(note.list, "Work");
        assert_eq!(note.version_num, 1);
        assert!(!note.deleted);
        assert!(note.created_at > 0);
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_edited_bumps_version_and_timestamp() {
        let note = Note::new_at(DEFAULT_LIST, 100).edited("hello", 150);
        assert_eq!(note.content, "hello");
        assert_eq!(note.updated_at, 150);
        assert_eq!(note.version_num, 2);
        assert_eq!(note.created_at, 100);
    }

    #[test]
    fn test_pin_and_move_keep_timestamp() {
        let note = Note::new_at(DEFAULT_LIST, 100).pinned_as(true).moved_to("Ideas");
        assert!(note.pinned);
        assert_eq!(note.list, "Ideas");
        assert_eq!(note.updated_at, 100);
        assert_eq!(note.version_num, 3);
    }

    #[test]
    fn test_soft_delete_unpins_and_restore_clears() {
        let deleted = Note::new_at(DEFAULT_LIST, 100)
            .pinned_as(true)
            .soft_deleted(200);
        assert!(deleted.deleted);
        assert!(!deleted.pinned);
        assert_eq!(deleted.deleted_at, Some(200));

        let restored = deleted.restored(300);
        assert!(!restored.deleted);
        assert_eq!(restored.deleted_at, None);
        assert_eq!(restored.updated_at, 300);
        assert_eq!(restored.version_num, 4);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let id = NoteId::new();
        let json = format!(
            r#"{{"id":"{id}","content":"","created_at":1,"updated_at":2,"deleted_at":null}}"#
        );
        let note: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note.list, DEFAULT_LIST);
        assert_eq!(note.version_num, 1);
        assert!(!note.pinned);
        assert!(!note.deleted);
    }
}
