//! Pure local/remote reconciliation.

use std::collections::HashMap;

use crate::clock::{newer, Side};
use crate::models::{Note, NoteId};
use crate::note_set::sort_newest_first;

/// Outcome of merging two note sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Merged set, newest `updated_at` first
    pub notes: Vec<Note>,
    /// Local-only notes that must be upserted remotely
    pub to_push: Vec<Note>,
}

/// Merge a local and a remote note set.
///
/// On first run the remote set is taken verbatim and nothing is pushed, so stale
/// data from before a reinstall cannot come back.
pub fn reconcile(local: Vec<Note>, remote: Vec<Note>, is_first_run: bool) -> Reconciliation {
    if is_first_run {
        return Reconciliation {
            notes: sort_newest_first(remote),
            to_push: Vec::new(),
        };
    }

    let mut remote_by_id: HashMap<NoteId, Note> =
        remote.into_iter().map(|note| (note.id, note)).collect();
    let mut merged = Vec::with_capacity(local.len() + remote_by_id.len());
    let mut to_push = Vec::new();

    for local_note in local {
        match remote_by_id.remove(&local_note.id) {
            Some(remote_note) => merged.push(merge_pair(local_note, remote_note)),
            None => {
                to_push.push(local_note.clone());
                merged.push(local_note);
            }
        }
    }
    merged.extend(remote_by_id.into_values());

    Reconciliation {
        notes: sort_newest_first(merged),
        to_push: sort_newest_first(to_push),
    }
}

/// Merge two copies of the same note.
///
/// Content fields and `version_num` come from the newer copy by the version clock.
/// The deletion state is merged separately: when the copies disagree, the deleted
/// copy wins only if its `deleted_at` is no earlier than the live copy's
/// `updated_at`, i.e. nothing was written to the live copy after the delete.
pub fn merge_pair(local: Note, remote: Note) -> Note {
    let (winner, loser) = match newer(local.clock(), remote.clock()) {
        Side::Local => (local, remote),
        Side::Remote => (remote, local),
    };

    if winner.deleted == loser.deleted {
        return winner;
    }

    let (deleted, live) = if winner.deleted {
        (&winner, &loser)
    } else {
        (&loser, &winner)
    };
    let delete_stands = deleted
        .deleted_at
        .unwrap_or(deleted.updated_at)
        >= live.updated_at;

    let deleted_at = deleted.deleted_at.or(Some(deleted.updated_at));
    let mut merged = winner;
    if delete_stands {
        merged.deleted = true;
        merged.deleted_at = deleted_at;
        merged.pinned = false;
    } else {
        merged.deleted = false;
        merged.deleted_at = None;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_LIST;
    use pretty_assertions::assert_eq;

    fn note(updated_at: i64, version_num: i64) -> Note {
        let mut note = Note::new_at(DEFAULT_LIST, updated_at);
        note.version_num = version_num;
        note
    }

    fn copy_of(note: &Note, updated_at: i64, version_num: i64, content: &str) -> Note {
        let mut copy = note.clone();
        copy.updated_at = updated_at;
        copy.version_num = version_num;
        copy.content = content.to_string();
        copy
    }

    #[test]
    fn first_run_takes_remote_verbatim() {
        let a = note(100, 1);
        let b = note(100, 1);
        let result = reconcile(vec![a], vec![b.clone()], true);
        assert_eq!(result.notes, vec![b]);
        assert!(result.to_push.is_empty());
    }

    #[test]
    fn disjoint_sets_are_unioned_and_local_only_is_pushed() {
        let a = note(100, 1);
        let b = note(200, 1);
        let result = reconcile(vec![a.clone()], vec![b.clone()], false);
        assert_eq!(result.notes, vec![b, a.clone()]);
        assert_eq!(result.to_push, vec![a]);
    }

    #[test]
    fn version_breaks_timestamp_tie() {
        let base = note(100, 1);
        let local = copy_of(&base, 100, 3, "local");
        let remote = copy_of(&base, 100, 5, "remote");
        let result = reconcile(vec![local], vec![remote.clone()], false);
        assert_eq!(result.notes, vec![remote]);
        assert!(result.to_push.is_empty());
    }

    #[test]
    fn newer_local_content_wins_over_higher_remote_version() {
        let base = note(100, 1);
        let local = copy_of(&base, 300, 2, "local");
        let remote = copy_of(&base, 200, 7, "remote");
        let merged = merge_pair(local.clone(), remote);
        assert_eq!(merged, local);
    }

    #[test]
    fn stale_remote_delete_does_not_hide_newer_local_edit() {
        let base = note(100, 1);
        let local = copy_of(&base, 200, 2, "kept");
        let mut remote = copy_of(&base, 150, 2, "");
        remote.deleted = true;
        remote.deleted_at = Some(150);

        let merged = merge_pair(local.clone(), remote);
        assert_eq!(merged, local);
    }

    #[test]
    fn delete_after_last_edit_stands_even_when_losing_content() {
        let base = note(100, 1);
        let mut local = copy_of(&base, 100, 3, "text").pinned_as(true);
        local.version_num = 5;
        let mut remote = copy_of(&base, 100, 4, "text");
        remote.deleted = true;
        remote.deleted_at = Some(180);

        let merged = merge_pair(local.clone(), remote);
        assert_eq!(merged.version_num, 5);
        assert_eq!(merged.content, "text");
        assert!(merged.deleted);
        assert_eq!(merged.deleted_at, Some(180));
        assert!(!merged.pinned);
    }

    #[test]
    fn restore_on_other_device_wins_over_older_delete() {
        let base = note(100, 1);
        let mut local = copy_of(&base, 200, 3, "x");
        local.deleted = true;
        local.deleted_at = Some(200);
        let remote = copy_of(&base, 260, 4, "x");

        let merged = merge_pair(local, remote.clone());
        assert_eq!(merged, remote);
    }

    #[test]
    fn result_is_sorted_newest_first() {
        let notes = vec![note(10, 1), note(30, 1)];
        let remote = vec![note(20, 1)];
        let result = reconcile(notes, remote, false);
        let stamps: Vec<i64> = result.notes.iter().map(|n| n.updated_at).collect();
        assert_eq!(stamps, vec![30, 20, 10]);
        assert_eq!(result.to_push.len(), 2);
    }
}
