//! `SQLite`-backed note store

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Note, NoteId};
use crate::store::NoteStore;
use crate::util::unix_timestamp_now;

const NOTE_COLUMNS: &str =
    "id, content, created_at, updated_at, pinned, list, deleted, deleted_at, version_num";

/// Durable local store for the desktop build
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub(super) const fn db(&self) -> &Mutex<Database> {
        &self.db
    }

    /// Parse a note from a database row
    fn parse_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
        let id: String = row.get(0)?;
        let id = id.parse().map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(error))
        })?;
        Ok(Note {
            id,
            content: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
            pinned: row.get::<_, i32>(4)? != 0,
            list: row.get(5)?,
            deleted: row.get::<_, i32>(6)? != 0,
            deleted_at: row.get(7)?,
            version_num: row.get(8)?,
        })
    }

    fn fetch(conn: &Connection, id: &NoteId) -> Result<Option<Note>> {
        let note = conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"),
                params![id.as_str()],
                Self::parse_note,
            )
            .optional()?;
        Ok(note)
    }

    fn insert(conn: &Connection, note: &Note) -> Result<()> {
        conn.execute(
            &format!("INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                note.id.as_str(),
                note.content,
                note.created_at,
                note.updated_at,
                i32::from(note.pinned),
                note.list,
                i32::from(note.deleted),
                note.deleted_at,
                note.version_num
            ],
        )?;
        Ok(())
    }

    fn write(conn: &Connection, note: &Note) -> Result<()> {
        conn.execute(
            "UPDATE notes
             SET content = ?, created_at = ?, updated_at = ?, pinned = ?, list = ?,
                 deleted = ?, deleted_at = ?, version_num = ?
             WHERE id = ?",
            params![
                note.content,
                note.created_at,
                note.updated_at,
                i32::from(note.pinned),
                note.list,
                i32::from(note.deleted),
                note.deleted_at,
                note.version_num,
                note.id.as_str()
            ],
        )?;
        Ok(())
    }

    /// Read-modify-write a single note under the connection lock
    async fn modify(&self, id: &NoteId, change: impl FnOnce(Note) -> Note) -> Result<Note> {
        let db = self.db.lock().await;
        let current =
            Self::fetch(db.connection(), id)?.ok_or_else(|| Error::NotFound(id.to_string()))?;
        let updated = change(current);
        Self::write(db.connection(), &updated)?;
        Ok(updated)
    }
}

impl NoteStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        let mut stmt = db.connection().prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes ORDER BY updated_at DESC, id ASC"
        ))?;
        let notes = stmt
            .query_map([], Self::parse_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        Self::fetch(db.connection(), id)
    }

    async fn create(&self, list: &str) -> Result<Note> {
        let note = Note::new(list);
        let db = self.db.lock().await;
        Self::insert(db.connection(), &note)?;
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
        let db = self.db.lock().await;
        db.connection()
            .execute("DELETE FROM notes WHERE id = ?", params![id.as_str()])?;
        Ok(())
    }

    async fn replace_all(&self, notes: &[Note]) -> Result<()> {
        let mut db = self.db.lock().await;
        let tx = db.connection_mut().transaction()?;
        tx.execute("DELETE FROM notes", [])?;
        for note in notes {
            Self::insert(&tx, note)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn set_pinned(&self, id: &NoteId, pinned: bool) -> Result<Note> {
        self.modify(id, |note| note.pinned_as(pinned)).await
    }

    async fn move_list(&self, id: &NoteId, list: &str) -> Result<Note> {
        self.modify(id, |note| note.moved_to(list)).await
    }

    async fn put(&self, note: &Note) -> Result<()> {
        let db = self.db.lock().await;
        // The version guard trigger drops the update when the stored copy is ahead
        if Self::fetch(db.connection(), &note.id)?.is_some() {
            Self::write(db.connection(), note)
        } else {
            Self::insert(db.connection(), note)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_LIST;
    use pretty_assertions::assert_eq;

    fn setup() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = setup();

        let note = store.create("Work").await.unwrap();
        assert_eq!(note.list, "Work");
        assert_eq!(note.version_num, 1);

        let fetched = store.get(&note.id).await.unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = setup();

        let note = store.create(DEFAULT_LIST).await.unwrap();
        let updated = store.update(&note.id, "Updated").await.unwrap();

        assert_eq!(updated.content, "Updated");
        assert_eq!(updated.version_num, 2);
        assert!(updated.updated_at >= note.updated_at);
        assert_eq!(store.get(&note.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_soft_delete_restore_and_hard_delete() {
        let store = setup();
        let note = store.create(DEFAULT_LIST).await.unwrap();
        store.set_pinned(&note.id, true).await.unwrap();

        let deleted = store.soft_delete(&note.id).await.unwrap();
        assert!(deleted.deleted);
        assert!(!deleted.pinned);
        assert!(deleted.deleted_at.is_some());

        // Soft-deleted notes stay addressable
        assert!(store.get(&note.id).await.unwrap().is_some());

        let restored = store.restore(&note.id).await.unwrap();
        assert!(!restored.deleted);
        assert_eq!(restored.version_num, 4);

        store.hard_delete(&note.id).await.unwrap();
        assert!(store.get(&note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_note_is_not_found() {
        let store = setup();
        let error = store.update(&NoteId::new(), "x").await.unwrap_err();
        assert!(matches!(error, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_all() {
        let store = setup();
        store.create(DEFAULT_LIST).await.unwrap();

        let kept = Note::new_at("Ideas", 50).edited("kept", 60);
        store.replace_all(std::slice::from_ref(&kept)).await.unwrap();

        assert_eq!(store.list().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn test_put_respects_version_guard() {
        let store = setup();
        let note = Note::new_at(DEFAULT_LIST, 10).edited("v2", 20).edited("v3", 30);
        store.put(&note).await.unwrap();

        let mut older = note.clone();
        older.version_num = 2;
        older.content = "v2".to_string();
        store.put(&older).await.unwrap();
        assert_eq!(store.get(&note.id).await.unwrap(), Some(note.clone()));

        let newer = note.clone().moved_to("Archive");
        store.put(&newer).await.unwrap();
        assert_eq!(store.get(&note.id).await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = setup();
        let old = Note::new_at(DEFAULT_LIST, 10);
        let new = Note::new_at(DEFAULT_LIST, 30);
        store.put(&old).await.unwrap();
        store.put(&new).await.unwrap();

        let ids: Vec<NoteId> = store.list().await.unwrap().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }
}
