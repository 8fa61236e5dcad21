//! Per-note lifecycle for freshly created notes.
//!
//! A note created in this session starts `Pending` and stays there until it
//! first holds non-empty content. Leaving a pending note while it is still empty
//! discards it and marks it `CleanedUp`; the next save for that id is a stale
//! autosave racing the discard and is swallowed exactly once.

use std::collections::HashMap;

use crate::models::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created here and never filled. `touched_remote` is set once a copy was pushed.
    Pending { touched_remote: bool },
    /// Holds, or once held, real content
    Active,
    /// Discarded; the next save for this id is swallowed
    CleanedUp,
}

/// What to do with a note the user navigated away from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveAction {
    Keep,
    /// Hard delete locally, and remotely too when `remote` is set
    Discard { remote: bool },
}

/// What to do with an incoming save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveGate {
    /// The note was just discarded; drop this save
    Swallow,
    /// Still pending and still empty: write locally, skip the remote
    LocalOnly,
    /// Save and push
    Sync,
}

#[derive(Debug, Clone, Default)]
pub struct Tracker {
    states: HashMap<NoteId, Lifecycle>,
}

impl Tracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes without an entry were not created in this session and count as active
    pub fn state(&self, id: &NoteId) -> Lifecycle {
        self.states.get(id).copied().unwrap_or(Lifecycle::Active)
    }

    pub fn is_pending(&self, id: &NoteId) -> bool {
        matches!(self.state(id), Lifecycle::Pending { .. })
    }

    /// Ids still pending, in no particular order
    pub fn pending_ids(&self) -> Vec<NoteId> {
        self.states
            .iter()
            .filter(|(_, state)| matches!(state, Lifecycle::Pending { .. }))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn created(&mut self, id: NoteId) {
        self.states.insert(
            id,
            Lifecycle::Pending {
                touched_remote: false,
            },
        );
    }

    /// A pending note's copy reached the remote service
    pub fn pushed(&mut self, id: &NoteId) {
        if let Some(Lifecycle::Pending { touched_remote }) = self.states.get_mut(id) {
            *touched_remote = true;
        }
    }

    /// Decide how a save for `id` proceeds and apply the resulting transition
    pub fn on_save(&mut self, id: &NoteId, content_is_empty: bool) -> SaveGate {
        match self.state(id) {
            Lifecycle::CleanedUp => {
                self.states.remove(id);
                SaveGate::Swallow
            }
            Lifecycle::Pending { .. } if content_is_empty => SaveGate::LocalOnly,
            Lifecycle::Pending { .. } => {
                self.states.remove(id);
                SaveGate::Sync
            }
            Lifecycle::Active => SaveGate::Sync,
        }
    }

    /// Decide what happens when the user leaves `id` and apply the transition
    pub fn on_leave(&mut self, id: &NoteId, content_is_empty: bool) -> LeaveAction {
        match self.state(id) {
            Lifecycle::Pending { touched_remote } if content_is_empty => {
                self.states.insert(*id, Lifecycle::CleanedUp);
                LeaveAction::Discard {
                    remote: touched_remote,
                }
            }
            _ => LeaveAction::Keep,
        }
    }

    /// `id` was deleted for good here; swallow the next save and ignore echoes
    pub fn discarded(&mut self, id: NoteId) {
        self.states.insert(id, Lifecycle::CleanedUp);
    }

    pub fn is_cleaned_up(&self, id: &NoteId) -> bool {
        self.state(id) == Lifecycle::CleanedUp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pending_note_is_discarded_then_next_save_swallowed_once() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        tracker.created(id);

        assert_eq!(tracker.on_save(&id, true), SaveGate::LocalOnly);
        assert!(tracker.is_pending(&id));

        assert_eq!(
            tracker.on_leave(&id, true),
            LeaveAction::Discard { remote: false }
        );
        assert_eq!(tracker.state(&id), Lifecycle::CleanedUp);

        assert_eq!(tracker.on_save(&id, false), SaveGate::Swallow);
        assert_eq!(tracker.on_save(&id, false), SaveGate::Sync);
    }

    #[test]
    fn filled_note_becomes_active_and_is_kept() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        tracker.created(id);

        assert_eq!(tracker.on_save(&id, false), SaveGate::Sync);
        assert_eq!(tracker.state(&id), Lifecycle::Active);

        // Edited back to empty: never auto-deleted
        assert_eq!(tracker.on_leave(&id, true), LeaveAction::Keep);
    }

    #[test]
    fn pushed_pending_note_is_discarded_remotely_too() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        tracker.created(id);
        tracker.pushed(&id);

        assert_eq!(
            tracker.on_leave(&id, true),
            LeaveAction::Discard { remote: true }
        );
    }

    #[test]
    fn untracked_notes_are_active() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        assert_eq!(tracker.state(&id), Lifecycle::Active);
        assert_eq!(tracker.on_leave(&id, true), LeaveAction::Keep);
        tracker.pushed(&id);
        assert_eq!(tracker.state(&id), Lifecycle::Active);
    }

    #[test]
    fn discarded_note_swallows_one_save() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        tracker.discarded(id);
        assert!(tracker.is_cleaned_up(&id));
        assert_eq!(tracker.on_save(&id, false), SaveGate::Swallow);
        assert!(!tracker.is_cleaned_up(&id));
    }

    #[test]
    fn pending_note_left_with_content_is_kept() {
        let mut tracker = Tracker::new();
        let id = NoteId::new();
        tracker.created(id);
        assert_eq!(tracker.on_leave(&id, false), LeaveAction::Keep);
        assert_eq!(tracker.pending_ids(), vec![id]);
    }
}
