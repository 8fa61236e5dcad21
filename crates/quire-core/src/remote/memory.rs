//! In-process remote service for tests and offline runs.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{RemoteError, RemoteResult, RemoteService};
use crate::models::{Note, NoteId, ShareGrant, SharedWithMe, TodoRecord};

#[derive(Debug, Clone)]
struct Profile {
    display_name: String,
    avatar_num: i32,
}

#[derive(Debug, Default)]
struct Inner {
    notes: HashMap<NoteId, (String, Note)>,
    shares: Vec<(NoteId, String, String)>,
    profiles: HashMap<String, Profile>,
    todos: HashMap<String, TodoRecord>,
    reads_fail: bool,
    writes_fail: bool,
    upserts: Vec<NoteId>,
}

/// Remote service held entirely in memory, with switchable failures
#[derive(Debug, Default)]
pub struct MemoryRemote {
    inner: Mutex<Inner>,
}

impl MemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user profile shown on shared notes
    pub async fn add_profile(&self, user_id: &str, display_name: &str, avatar_num: i32) {
        self.inner.lock().await.profiles.insert(
            user_id.to_string(),
            Profile {
                display_name: display_name.to_string(),
                avatar_num,
            },
        );
    }

    /// Store a note row without recording an upsert
    pub async fn seed_note(&self, owner_id: &str, note: Note) {
        self.inner
            .lock()
            .await
            .notes
            .insert(note.id, (owner_id.to_string(), note));
    }

    /// Record a share from `owner_id` to `recipient_id`
    pub async fn seed_share(&self, note_id: NoteId, owner_id: &str, recipient_id: &str) {
        self.inner.lock().await.shares.push((
            note_id,
            owner_id.to_string(),
            recipient_id.to_string(),
        ));
    }

    /// Make every read fail, as if the network were down
    pub async fn set_reads_fail(&self, fail: bool) {
        self.inner.lock().await.reads_fail = fail;
    }

    /// Make every write fail
    pub async fn set_writes_fail(&self, fail: bool) {
        self.inner.lock().await.writes_fail = fail;
    }

    pub async fn note(&self, id: &NoteId) -> Option<Note> {
        self.inner
            .lock()
            .await
            .notes
            .get(id)
            .map(|(_, note)| note.clone())
    }

    /// Ids passed to `upsert_note`, in call order
    pub async fn upserted_ids(&self) -> Vec<NoteId> {
        self.inner.lock().await.upserts.clone()
    }

    pub async fn todo(&self, owner_id: &str) -> Option<TodoRecord> {
        self.inner.lock().await.todos.get(owner_id).cloned()
    }

    fn read_guard(inner: &Inner) -> RemoteResult<()> {
        if inner.reads_fail {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn write_guard(inner: &Inner) -> RemoteResult<()> {
        if inner.writes_fail {
            Err(RemoteError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn profile(inner: &Inner, user_id: &str) -> Profile {
        inner.profiles.get(user_id).cloned().unwrap_or(Profile {
            display_name: user_id.to_string(),
            avatar_num: 0,
        })
    }
}

impl RemoteService for MemoryRemote {
    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<Note>> {
        let inner = self.inner.lock().await;
        Self::read_guard(&inner)?;
        Ok(inner
            .notes
            .values()
            .filter(|(owner, _)| owner == owner_id)
            .map(|(_, note)| note.clone())
            .collect())
    }

    async fn upsert_note(&self, owner_id: &str, note: &Note) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        Self::write_guard(&inner)?;
        inner.upserts.push(note.id);
        inner
            .notes
            .insert(note.id, (owner_id.to_string(), note.clone()));
        Ok(())
    }

    async fn delete_note(&self, id: &NoteId) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        Self::write_guard(&inner)?;
        inner.notes.remove(id);
        inner.shares.retain(|(note_id, _, _)| note_id != id);
        Ok(())
    }

    async fn shared_with(&self, identity: &str) -> RemoteResult<Vec<SharedWithMe>> {
        let inner = self.inner.lock().await;
        Self::read_guard(&inner)?;
        Ok(inner
            .shares
            .iter()
            .filter(|(_, owner, recipient)| recipient == identity && owner != identity)
            .filter_map(|(note_id, owner, _)| {
                let (_, note) = inner.notes.get(note_id)?;
                let profile = Self::profile(&inner, owner);
                Some(SharedWithMe {
                    note: note.clone(),
                    owner_display_name: profile.display_name,
                    owner_avatar_num: profile.avatar_num,
                })
            })
            .collect())
    }

    async fn shared_by(&self, identity: &str) -> RemoteResult<Vec<ShareGrant>> {
        let inner = self.inner.lock().await;
        Self::read_guard(&inner)?;
        Ok(inner
            .shares
            .iter()
            .filter(|(_, owner, _)| owner == identity)
            .map(|(note_id, _, recipient)| ShareGrant {
                note_id: *note_id,
                recipient_display_name: Self::profile(&inner, recipient).display_name,
            })
            .collect())
    }

    async fn fetch_notes_by_ids(&self, ids: &[NoteId]) -> RemoteResult<Vec<Note>> {
        let inner = self.inner.lock().await;
        Self::read_guard(&inner)?;
        Ok(ids
            .iter()
            .filter_map(|id| inner.notes.get(id).map(|(_, note)| note.clone()))
            .collect())
    }

    async fn share_note(
        &self,
        note_id: &NoteId,
        owner_id: &str,
        recipient_id: &str,
    ) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        Self::write_guard(&inner)?;
        let exists = inner
            .shares
            .iter()
            .any(|(id, _, recipient)| id == note_id && recipient == recipient_id);
        if !exists {
            inner
                .shares
                .push((*note_id, owner_id.to_string(), recipient_id.to_string()));
        }
        Ok(())
    }

    async fn unshare_note(&self, note_id: &NoteId, recipient_id: &str) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        Self::write_guard(&inner)?;
        inner
            .shares
            .retain(|(id, _, recipient)| !(id == note_id && recipient == recipient_id));
        Ok(())
    }

    async fn fetch_todo(&self, owner_id: &str) -> RemoteResult<Option<TodoRecord>> {
        let inner = self.inner.lock().await;
        Self::read_guard(&inner)?;
        Ok(inner.todos.get(owner_id).cloned())
    }

    async fn upsert_todo(&self, record: &TodoRecord) -> RemoteResult<()> {
        let mut inner = self.inner.lock().await;
        Self::write_guard(&inner)?;
        inner
            .todos
            .insert(record.owner_id.clone(), record.clone());
        Ok(())
    }
}
