//! In-memory store used by the web build and by tests.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::{NoteStore, StateStore};
use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::util::unix_timestamp_now;

#[derive(Debug, Default)]
struct Inner {
    notes: HashMap<NoteId, Note>,
    first_run: bool,
    seen_shared: HashMap<String, Vec<NoteId>>,
}

/// Volatile note and state store
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    durable: bool,
}

impl MemoryStore {
    /// Volatile store for the web build; reconciliation treats remote as ground truth.
    #[must_use]
    pub fn volatile() -> Self {
        Self {
            inner: Mutex::new(Inner {
                first_run: true,
                ..Inner::default()
            }),
            durable: false,
        }
    }

    /// Store that reports itself durable, seeded with `notes`.
    ///
    /// Stands in for the SQLite store in tests.
    #[must_use]
    pub fn durable(notes: impl IntoIterator<Item = Note>, first_run: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                notes: notes.into_iter().map(|note| (note.id, note)).collect(),
                first_run,
                seen_shared: HashMap::new(),
            }),
            durable: true,
        }
    }

    async fn modify(&self, id: &NoteId, change: impl FnOnce(Note) -> Note) -> Result<Note> {
        let mut inner = self.inner.lock().await;
        let current = inner
            .notes
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let updated = change(current);
        inner.notes.insert(*id, updated.clone());
        Ok(updated)
    }
}

impl NoteStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Note>> {
        Ok(self.inner.lock().await.notes.values().cloned().collect())
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        Ok(self.inner.lock().await.notes.get(id).cloned())
    }

    async fn create(&self, list: &str) -> Result<Note> {
        let note = Note::new(list);
        self.inner.lock().await.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: &NoteId, content: &str) -> Result<Note> {
        self.modify(id, |note| note.edited(content, unix_timestamp_now()))
            .await
    }

    async fn soft_delete(&self, id: &NoteId) -> Result<Note> {
        self.modify(id, |note| note.soft_deleted(unix_timestamp_now()))
            .await
    }

    async fn restore(&self, id: &NoteId) -> Result<Note> {
        self.modify(id, |note| note.restored(unix_timestamp_now()))
            .await
    }

    async fn hard_delete(&self, id: &NoteId) -> Result<()> {
        self.inner.lock().await.notes.remove(id);
        Ok(())
    }

    async fn replace_all(&self, notes: &[Note]) -> Result<()> {
        self.inner.lock().await.notes = notes.iter().map(|note| (note.id, note.clone())).collect();
        Ok(())
    }

    async fn set_pinned(&self, id: &NoteId, pinned: bool) -> Result<Note> {
        self.modify(id, |note| note.pinned_as(pinned)).await
    }

    async fn move_list(&self, id: &NoteId, list: &str) -> Result<Note> {
        self.modify(id, |note| note.moved_to(list)).await
    }

    async fn put(&self, note: &Note) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let stale = inner
            .notes
            .get(&note.id)
            .is_some_and(|held| held.version_num > note.version_num);
        if !stale {
            inner.notes.insert(note.id, note.clone());
        }
        Ok(())
    }

    fn is_durable(&self) -> bool {
        self.durable
    }
}

impl StateStore for MemoryStore {
    async fn is_first_run(&self) -> Result<bool> {
        Ok(self.inner.lock().await.first_run)
    }

    async fn clear_first_run(&self) -> Result<()> {
        self.inner.lock().await.first_run = false;
        Ok(())
    }

    async fn seen_shared_ids(&self, identity: &str) -> Result<Vec<NoteId>> {
        Ok(self
            .inner
            .lock()
            .await
            .seen_shared
            .get(identity)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_seen_shared_ids(&self, identity: &str, ids: &[NoteId]) -> Result<()> {
        self.inner
            .lock()
            .await
            .seen_shared
            .insert(identity.to_string(), ids.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_LIST;

    #[tokio::test]
    async fn update_bumps_version() {
        let store = MemoryStore::durable([], false);
        let note = store.create(DEFAULT_LIST).await.unwrap();
        let updated = store.update(&note.id, "hello").await.unwrap();
        assert_eq!(updated.version_num, 2);
        assert_eq!(store.get(&note.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn put_ignores_older_versions() {
        let note = Note::new(DEFAULT_LIST).edited("v2", 10);
        let store = MemoryStore::durable([note.clone()], false);

        let mut older = note.clone();
        older.version_num = 1;
        older.content = "v1".to_string();
        store.put(&older).await.unwrap();
        assert_eq!(store.get(&note.id).await.unwrap().unwrap().content, "v2");
    }

    #[tokio::test]
    async fn missing_note_is_not_found() {
        let store = MemoryStore::volatile();
        let error = store.soft_delete(&NoteId::new()).await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
        assert!(!store.is_durable());
        assert!(store.is_first_run().await.unwrap());
    }
}
