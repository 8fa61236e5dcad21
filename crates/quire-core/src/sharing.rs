//! Shared-note aggregation.
//!
//! Joins the notes shared with the current identity and the notes it shared
//! with others into one ownership-annotated list, and reports shares the user
//! has not seen yet.

use std::collections::{HashMap, HashSet};

use crate::content::ContentPredicates;
use crate::error::Result;
use crate::events::{emit, EngineEvent, SharedNotice};
use crate::models::{Identity, Note, NoteId, ShareGrant, SharedNoteEntry, SharedWithMe};
use crate::remote::RemoteService;
use crate::session::Session;
use crate::store::{NoteStore, StateStore};
use crate::sync::SyncEngine;

/// Build the combined shared list.
///
/// Soft-deleted notes are left out. A note that is both owned and shared with
/// the current identity appears once, as its own, carrying every recipient name.
pub fn build_entries(
    identity: &Identity,
    shared_with: Vec<SharedWithMe>,
    grants: &[ShareGrant],
    owned: Vec<Note>,
) -> Vec<SharedNoteEntry> {
    let mut recipients: HashMap<NoteId, Vec<String>> = HashMap::new();
    for grant in grants {
        let names = recipients.entry(grant.note_id).or_default();
        if !names.contains(&grant.recipient_display_name) {
            names.push(grant.recipient_display_name.clone());
        }
    }

    let mut entries: HashMap<NoteId, SharedNoteEntry> = HashMap::new();
    for note in owned.into_iter().filter(|note| !note.deleted) {
        let shared_with_names = recipients.remove(&note.id).unwrap_or_default();
        entries.insert(
            note.id,
            SharedNoteEntry {
                note,
                owner_display_name: identity.display_name.clone(),
                owner_avatar_num: identity.avatar_num,
                is_own: true,
                shared_with_names,
            },
        );
    }

    for shared in shared_with.into_iter().filter(|shared| !shared.note.deleted) {
        entries
            .entry(shared.note.id)
            .or_insert_with(|| SharedNoteEntry {
                note: shared.note,
                owner_display_name: shared.owner_display_name,
                owner_avatar_num: shared.owner_avatar_num,
                is_own: false,
                shared_with_names: Vec::new(),
            });
    }

    let mut entries: Vec<SharedNoteEntry> = entries.into_values().collect();
    entries.sort_by(|a, b| {
        b.note
            .updated_at
            .cmp(&a.note.updated_at)
            .then_with(|| b.note.id.cmp(&a.note.id))
    });
    entries
}

/// Compare the not-owned entries against the seen set.
///
/// Returns the notice to raise, if any, and the id set to persist as seen.
pub fn detect_new_shares(
    entries: &[SharedNoteEntry],
    seen: &[NoteId],
) -> (Option<SharedNotice>, Vec<NoteId>) {
    let seen: HashSet<&NoteId> = seen.iter().collect();
    let received: Vec<&SharedNoteEntry> = entries.iter().filter(|entry| !entry.is_own).collect();
    let fresh: Vec<&SharedNoteEntry> = received
        .iter()
        .copied()
        .filter(|entry| !seen.contains(&entry.note.id))
        .collect();

    let notice = match fresh.as_slice() {
        [] => None,
        [only] => Some(SharedNotice::Single {
            owner_name: only.owner_display_name.clone(),
        }),
        many => Some(SharedNotice::Many { count: many.len() }),
    };

    let mut now_seen: Vec<NoteId> = received.iter().map(|entry| entry.note.id).collect();
    now_seen.sort();
    (notice, now_seen)
}

impl<S, R, P> SyncEngine<S, R, P>
where
    S: NoteStore + StateStore,
    R: RemoteService,
    P: ContentPredicates,
{
    /// Re-query both sharing relations and rebuild the session's shared list.
    ///
    /// When either query fails the previous list is kept.
    pub async fn aggregate_shared(&self, session: &mut Session) -> Result<()> {
        let identity = session.identity().clone();

        let shared_with = match self.remote.shared_with(&identity.id).await {
            Ok(shared) => shared,
            Err(error) => {
                tracing::warn!("Failed to load notes shared with {}: {}", identity.id, error);
                return Ok(());
            }
        };
        let grants = match self.remote.shared_by(&identity.id).await {
            Ok(grants) => grants,
            Err(error) => {
                tracing::warn!("Failed to load notes shared by {}: {}", identity.id, error);
                return Ok(());
            }
        };

        let mut owned_ids: Vec<NoteId> = grants.iter().map(|grant| grant.note_id).collect();
        owned_ids.sort();
        owned_ids.dedup();
        let owned = if owned_ids.is_empty() {
            Vec::new()
        } else {
            match self.remote.fetch_notes_by_ids(&owned_ids).await {
                Ok(notes) => notes,
                Err(error) => {
                    tracing::warn!("Failed to load shared notes by id: {}", error);
                    return Ok(());
                }
            }
        };

        let entries = build_entries(&identity, shared_with, &grants, owned);
        let seen = self.store.seen_shared_ids(&identity.id).await?;
        let (notice, now_seen) = detect_new_shares(&entries, &seen);
        if let Some(notice) = notice {
            tracing::info!("{}", notice.message());
            emit(&self.events, EngineEvent::NewSharedNotes(notice));
        }
        self.store
            .set_seen_shared_ids(&identity.id, &now_seen)
            .await?;

        tracing::debug!("Aggregated {} shared notes", entries.len());
        session.shared = entries;
        Ok(())
    }

    /// Share an owned note with another user, then refresh the shared list
    pub async fn share_note(&self, session: &mut Session, id: &NoteId, recipient_id: &str) -> Result<()> {
        let owner_id = session.identity().id.clone();
        if recipient_id.trim().is_empty() || recipient_id == owner_id {
            return Err(crate::Error::InvalidInput(format!(
                "cannot share note {id} with {recipient_id:?}"
            )));
        }
        if !session.notes.contains(id) {
            return Err(crate::Error::NotFound(format!("note {id}")));
        }

        self.remote.share_note(id, &owner_id, recipient_id).await?;
        self.aggregate_shared(session).await
    }

    pub async fn unshare_note(&self, session: &mut Session, id: &NoteId, recipient_id: &str) -> Result<()> {
        self.remote.unshare_note(id, recipient_id).await?;
        self.aggregate_shared(session).await
    }
}
