//! Identity and shared-note models

use serde::{Deserialize, Serialize};

use super::Note;

/// The signed-in user a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id from the auth provider
    pub id: String,
    /// Name shown to people you share with
    pub display_name: String,
    /// Index into the avatar palette
    #[serde(default)]
    pub avatar_num: i32,
}

impl Identity {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            avatar_num: 0,
        }
    }
}

/// A note someone shared with the current identity, with its owner's profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedWithMe {
    pub note: Note,
    pub owner_display_name: String,
    pub owner_avatar_num: i32,
}

/// One recipient of a note the current identity shared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareGrant {
    pub note_id: super::NoteId,
    pub recipient_display_name: String,
}

/// Ownership-annotated view of a shared note.
///
/// Rebuilt on every aggregation pass and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedNoteEntry {
    #[serde(flatten)]
    pub note: Note,
    pub owner_display_name: String,
    pub owner_avatar_num: i32,
    /// True when the current identity owns the note
    pub is_own: bool,
    /// Recipients the current identity shared this note with (own notes only)
    pub shared_with_names: Vec<String>,
}
