//! In-memory note set held by a session.
//!
//! Incremental writes funnel through [`NoteSet::advance`], which never lets a
//! note's `version_num` move backwards. A reconciliation pass swaps the whole
//! set with [`NoteSet::adopt_reconciled`] so memory mirrors the local store.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::{Note, NoteId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteSet {
    notes: HashMap<NoteId, Note>,
}

impl NoteSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn contains(&self, id: &NoteId) -> bool {
        self.notes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Held version for `id`, if any
    pub fn version_of(&self, id: &NoteId) -> Option<i64> {
        self.notes.get(id).map(|note| note.version_num)
    }

    /// Insert `note` unless the id is already known. Returns whether it was inserted.
    pub fn insert_new(&mut self, note: Note) -> bool {
        if self.notes.contains_key(&note.id) {
            return false;
        }
        self.notes.insert(note.id, note);
        true
    }

    /// Adopt `note` if the id is unknown or `note` carries a strictly higher version.
    pub fn advance(&mut self, note: Note) -> bool {
        match self.notes.get(&note.id) {
            Some(held) if note.version_num <= held.version_num => false,
            _ => {
                self.notes.insert(note.id, note);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &NoteId) -> Option<Note> {
        self.notes.remove(id)
    }

    /// Replace the set with the records a reconciliation wrote to the store.
    ///
    /// The merge winner can carry a lower version than the held copy when it
    /// won on `updated_at`; it is adopted anyway.
    pub fn adopt_reconciled(&mut self, notes: impl IntoIterator<Item = Note>) {
        self.notes = notes.into_iter().map(|note| (note.id, note)).collect();
    }

    /// All notes, newest `updated_at` first
    pub fn sorted(&self) -> Vec<Note> {
        sort_newest_first(self.notes.values().cloned().collect())
    }

    /// Live notes of one folder: pinned first, then newest first
    pub fn in_list(&self, list: &str) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|note| !note.deleted && note.list == list)
            .cloned()
            .collect();
        notes.sort_by_key(|note| (Reverse(note.pinned), Reverse(note.updated_at), note.id));
        notes
    }

    /// Soft-deleted notes, most recently deleted first
    pub fn recently_deleted(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|note| note.deleted)
            .cloned()
            .collect();
        notes.sort_by_key(|note| (Reverse(note.deleted_at), note.id));
        notes
    }

    /// Folder names in use by live notes, sorted
    pub fn lists(&self) -> Vec<String> {
        let mut lists: Vec<String> = self
            .notes
            .values()
            .filter(|note| !note.deleted)
            .map(|note| note.list.clone())
            .collect();
        lists.sort();
        lists.dedup();
        lists
    }
}

impl FromIterator<Note> for NoteSet {
    fn from_iter<T: IntoIterator<Item = Note>>(iter: T) -> Self {
        Self {
            notes: iter.into_iter().map(|note| (note.id, note)).collect(),
        }
    }
}

/// Sort by `updated_at` descending; ids break ties so output is stable.
pub fn sort_newest_first(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by_key(|note| (Reverse(note.updated_at), note.id));
    notes
}
