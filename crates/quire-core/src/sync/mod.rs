//! Note sync engine: full reconciliation and the per-note write paths.
//!
//! Local writes always land before the matching remote push. Remote failures on
//! the push side are logged and abandoned; local state stays authoritative.

mod merge;

pub use merge::{merge_pair, reconcile, Reconciliation};

use std::time::Duration;

use crate::content::{ContentPredicates, DocumentContent};
use crate::error::Result;
use crate::events::{emit, EngineEvent, EventSender};
use crate::models::{Identity, Note, NoteId};
use crate::remote::RemoteService;
use crate::session::Session;
use crate::store::{NoteStore, StateStore};
use crate::tracker::{LeaveAction, SaveGate};

/// Result of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed {
        /// Notes held after the pass
        notes: usize,
        /// Local-only notes uploaded
        pushed: usize,
        /// Uploads that failed and were abandoned
        push_failures: usize,
        /// Whether this was the post-install pass that trusts remote only
        first_run: bool,
    },
    /// The remote read failed; nothing was changed
    Aborted { reason: String },
}

/// Result of a save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stale save for a note that was just discarded
    Ignored,
    /// Saved locally; the note is still an empty draft so nothing was pushed
    LocalOnly(Note),
    /// Saved locally and pushed
    Synced(Note),
    /// Saved locally; the push failed and was abandoned
    PushFailed(Note),
}

impl SaveOutcome {
    pub const fn note(&self) -> Option<&Note> {
        match self {
            Self::Ignored => None,
            Self::LocalOnly(note) | Self::Synced(note) | Self::PushFailed(note) => Some(note),
        }
    }
}

/// What happened to the note the user navigated away from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// No note was open
    NothingOpen,
    /// The note stays; a queued autosave may have been flushed
    Kept(NoteId),
    /// An empty draft was thrown away
    Discarded(NoteId),
}

/// Engine over a local store, a remote service and content predicates
pub struct SyncEngine<S, R, P = DocumentContent> {
    pub(crate) store: S,
    pub(crate) remote: R,
    pub(crate) predicates: P,
    pub(crate) events: EventSender,
}

impl<S, R> SyncEngine<S, R, DocumentContent> {
    pub const fn new(store: S, remote: R, events: EventSender) -> Self {
        Self {
            store,
            remote,
            predicates: DocumentContent,
            events,
        }
    }
}

impl<S, R, P> SyncEngine<S, R, P> {
    pub fn with_predicates<Q>(self, predicates: Q) -> SyncEngine<S, R, Q> {
        SyncEngine {
            store: self.store,
            remote: self.remote,
            predicates,
            events: self.events,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }
}

impl<S, R, P> SyncEngine<S, R, P>
where
    S: NoteStore + StateStore,
    R: RemoteService,
    P: ContentPredicates,
{
    /// Build a session for `identity` from whatever the local store holds
    pub async fn start_session(&self, identity: Identity, autosave_delay: Duration) -> Result<Session> {
        let notes = self.store.list().await?;
        tracing::info!(
            "Session started for {} with {} local notes",
            identity.id,
            notes.len()
        );
        Ok(Session::with_autosave_delay(identity, notes, autosave_delay))
    }

    /// Flush queued edits and leave the open note before the session is dropped
    pub async fn end_session(&self, mut session: Session) -> Result<()> {
        self.leave_note(&mut session).await?;
        for (id, content) in session.autosave.drain() {
            self.save(&mut session, &id, &content).await?;
        }
        tracing::info!("Session ended for {}", session.identity().id);
        Ok(())
    }

    /// Full local/remote reconciliation.
    ///
    /// A failed remote read aborts the pass before anything is written.
    pub async fn reconcile(&self, session: &mut Session) -> Result<ReconcileOutcome> {
        let owner_id = session.identity().id.clone();
        let remote_notes = match self.remote.fetch_notes(&owner_id).await {
            Ok(notes) => notes,
            Err(error) => {
                tracing::warn!("Reconciliation aborted, remote read failed: {}", error);
                return Ok(ReconcileOutcome::Aborted {
                    reason: error.to_string(),
                });
            }
        };

        let durable = self.store.is_durable();
        let first_run = durable && self.store.is_first_run().await?;
        let Reconciliation { mut notes, mut to_push } = if durable {
            reconcile(self.store.list().await?, remote_notes, first_run)
        } else {
            // Nothing local survives a reload; remote is ground truth
            reconcile(Vec::new(), remote_notes, true)
        };

        if !durable {
            // Drafts still open in this session are not on the remote yet
            for id in session.tracker.pending_ids() {
                if let Some(draft) = session.notes.get(&id) {
                    if !notes.iter().any(|note| note.id == id) {
                        notes.push(draft.clone());
                    }
                }
            }
        }

        // Empty drafts stay local until they hold content
        to_push.retain(|note| !session.tracker.is_pending(&note.id));

        self.store.replace_all(&notes).await?;
        if first_run {
            self.store.clear_first_run().await?;
            tracing::info!("First-run reconciliation complete; remote set adopted");
        }

        let held = notes.len();
        session.notes.adopt_reconciled(notes);

        let mut push_failures = 0;
        for note in &to_push {
            if !self.push(session, note).await {
                push_failures += 1;
            }
        }

        tracing::info!(
            "Reconciled {} notes ({} pushed, {} failed)",
            held,
            to_push.len() - push_failures,
            push_failures
        );
        Ok(ReconcileOutcome::Completed {
            notes: held,
            pushed: to_push.len() - push_failures,
            push_failures,
            first_run,
        })
    }

    /// Create an empty draft. It is not pushed until it holds content.
    pub async fn create_note(&self, session: &mut Session, list: &str) -> Result<Note> {
        let note = self.store.create(list).await?;
        session.tracker.created(note.id);
        session.notes.insert_new(note.clone());
        tracing::debug!("Created draft note {} in {}", note.id, list);
        Ok(note)
    }

    /// Save new content for a note: local write first, then the remote upsert.
    pub async fn save(&self, session: &mut Session, id: &NoteId, content: &str) -> Result<SaveOutcome> {
        let is_empty = self.predicates.is_empty(content);
        let gate = session.tracker.on_save(id, is_empty);
        if gate == SaveGate::Swallow {
            tracing::debug!("Dropped stale save for discarded note {}", id);
            return Ok(SaveOutcome::Ignored);
        }

        let note = self.store.update(id, content).await?;
        session.notes.advance(note.clone());

        if gate == SaveGate::LocalOnly {
            return Ok(SaveOutcome::LocalOnly(note));
        }
        if self.push(session, &note).await {
            Ok(SaveOutcome::Synced(note))
        } else {
            Ok(SaveOutcome::PushFailed(note))
        }
    }

    pub async fn set_pinned(&self, session: &mut Session, id: &NoteId, pinned: bool) -> Result<Note> {
        let note = self.store.set_pinned(id, pinned).await?;
        self.commit(session, note).await
    }

    pub async fn move_list(&self, session: &mut Session, id: &NoteId, list: &str) -> Result<Note> {
        let note = self.store.move_list(id, list).await?;
        self.commit(session, note).await
    }

    /// Move every live note in `old_list` to `new_list`. Returns how many moved.
    pub async fn rename_list(&self, session: &mut Session, old_list: &str, new_list: &str) -> Result<usize> {
        let ids: Vec<NoteId> = session
            .notes
            .iter()
            .filter(|note| note.list == old_list)
            .map(|note| note.id)
            .collect();
        for id in &ids {
            self.move_list(session, id, new_list).await?;
        }
        Ok(ids.len())
    }

    /// Move a note to Recently Deleted
    pub async fn soft_delete(&self, session: &mut Session, id: &NoteId) -> Result<Note> {
        session.autosave.cancel(id);
        let note = self.store.soft_delete(id).await?;
        self.commit(session, note).await
    }

    pub async fn restore(&self, session: &mut Session, id: &NoteId) -> Result<Note> {
        let note = self.store.restore(id).await?;
        self.commit(session, note).await
    }

    /// Delete a note for good, locally and remotely, and report its orphaned assets
    pub async fn purge(&self, session: &mut Session, id: &NoteId) -> Result<()> {
        let content = match session.notes.get(id) {
            Some(note) => Some(note.content.clone()),
            None => self.store.get(id).await?.map(|note| note.content),
        };

        self.store.hard_delete(id).await?;
        session.notes.remove(id);
        session.autosave.cancel(id);
        session.last_sent.remove(id);
        session.tracker.discarded(*id);
        if session.open_note == Some(*id) {
            session.open_note = None;
        }

        if let Err(error) = self.remote.delete_note(id).await {
            tracing::warn!("Failed to delete note {} remotely: {}", id, error);
        }

        if let Some(content) = content {
            let refs = self.predicates.extract_storage_references(&content);
            if !refs.is_empty() {
                emit(
                    &self.events,
                    EngineEvent::AssetsOrphaned {
                        note_id: *id,
                        refs,
                    },
                );
            }
        }
        Ok(())
    }

    /// Queue an edit for the coalescing autosave
    pub fn edit(&self, session: &mut Session, id: NoteId, content: impl Into<String>, now: std::time::Instant) {
        session.autosave.schedule(id, content, now);
    }

    /// Save every queued edit that is due at `now`
    pub async fn flush_due(&self, session: &mut Session, now: std::time::Instant) -> Result<Vec<SaveOutcome>> {
        let due = session.autosave.take_due(now);
        let mut outcomes = Vec::with_capacity(due.len());
        for (id, content) in due {
            outcomes.push(self.save(session, &id, &content).await?);
        }
        Ok(outcomes)
    }

    /// Switch the open note, leaving the previous one first
    pub async fn open_note(&self, session: &mut Session, id: NoteId) -> Result<LeaveOutcome> {
        let left = if session.open_note == Some(id) {
            LeaveOutcome::NothingOpen
        } else {
            self.leave_note(session).await?
        };
        session.open_note = Some(id);
        Ok(left)
    }

    /// Leave the open note.
    ///
    /// A queued edit is flushed first. A draft that never held content is
    /// discarded without a trace; a note edited back to empty is kept.
    pub async fn leave_note(&self, session: &mut Session) -> Result<LeaveOutcome> {
        let Some(id) = session.open_note.take() else {
            return Ok(LeaveOutcome::NothingOpen);
        };

        let queued = session.autosave.take(&id);
        let current = queued
            .clone()
            .or_else(|| session.notes.get(&id).map(|note| note.content.clone()))
            .unwrap_or_default();
        let is_empty = self.predicates.is_empty(&current);

        match session.tracker.on_leave(&id, is_empty) {
            LeaveAction::Discard { remote } => {
                self.store.hard_delete(&id).await?;
                session.notes.remove(&id);
                session.last_sent.remove(&id);
                if remote {
                    if let Err(error) = self.remote.delete_note(&id).await {
                        tracing::warn!("Failed to discard draft {} remotely: {}", id, error);
                    }
                }
                tracing::debug!("Discarded empty draft {}", id);
                Ok(LeaveOutcome::Discarded(id))
            }
            LeaveAction::Keep => {
                if let Some(content) = queued {
                    self.save(session, &id, &content).await?;
                }
                Ok(LeaveOutcome::Kept(id))
            }
        }
    }

    /// Adopt a locally written note and push it unless it is still a draft
    async fn commit(&self, session: &mut Session, note: Note) -> Result<Note> {
        session.notes.advance(note.clone());
        if !session.tracker.is_pending(&note.id) {
            self.push(session, &note).await;
        }
        Ok(note)
    }

    /// Upsert `note` remotely. The sent version is recorded before the request
    /// goes out so an echo arriving meanwhile is recognised.
    pub(crate) async fn push(&self, session: &mut Session, note: &Note) -> bool {
        session.last_sent.insert(note.id, note.version_num);
        let owner_id = session.identity().id.clone();
        match self.remote.upsert_note(&owner_id, note).await {
            Ok(()) => {
                session.tracker.pushed(&note.id);
                true
            }
            Err(error) => {
                tracing::warn!("Failed to push note {}: {}", note.id, error);
                false
            }
        }
    }
}
