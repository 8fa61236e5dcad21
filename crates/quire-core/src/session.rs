//! Signed-in session context.
//!
//! Everything the engine remembers between calls lives here: the in-memory note
//! set, the lifecycle tracker, the versions this device last pushed, and the
//! open note. A session is built on sign-in and dropped on sign-out, and is
//! passed explicitly to every engine operation.

use std::collections::HashMap;
use std::time::Duration;

use crate::autosave::AutosaveQueue;
use crate::models::{Identity, Note, NoteId, SharedNoteEntry, TodoRecord};
use crate::note_set::NoteSet;
use crate::tracker::Tracker;

#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    pub(crate) notes: NoteSet,
    pub(crate) tracker: Tracker,
    /// Last `version_num` this device pushed per note; tells echoes apart
    pub(crate) last_sent: HashMap<NoteId, i64>,
    pub(crate) open_note: Option<NoteId>,
    pub(crate) shared: Vec<SharedNoteEntry>,
    pub(crate) todo: TodoRecord,
    pub(crate) autosave: AutosaveQueue,
}

impl Session {
    #[must_use]
    pub fn new(identity: Identity, notes: impl IntoIterator<Item = Note>) -> Self {
        Self::with_autosave_delay(identity, notes, crate::autosave::DEFAULT_AUTOSAVE_DELAY)
    }

    #[must_use]
    pub fn with_autosave_delay(
        identity: Identity,
        notes: impl IntoIterator<Item = Note>,
        delay: Duration,
    ) -> Self {
        let todo = TodoRecord::empty(identity.id.clone());
        Self {
            identity,
            notes: notes.into_iter().collect(),
            tracker: Tracker::new(),
            last_sent: HashMap::new(),
            open_note: None,
            shared: Vec::new(),
            todo,
            autosave: AutosaveQueue::new(delay),
        }
    }

    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    pub const fn notes(&self) -> &NoteSet {
        &self.notes
    }

    pub fn note(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub const fn open_note(&self) -> Option<NoteId> {
        self.open_note
    }

    pub fn shared_notes(&self) -> &[SharedNoteEntry] {
        &self.shared
    }

    pub const fn todo(&self) -> &TodoRecord {
        &self.todo
    }

    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn last_sent_version(&self, id: &NoteId) -> Option<i64> {
        self.last_sent.get(id).copied()
    }

    pub const fn autosave(&self) -> &AutosaveQueue {
        &self.autosave
    }
}
