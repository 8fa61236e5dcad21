//! Persisted engine state in the `app_state` key-value table

use rusqlite::{params, Connection, OptionalExtension};

use super::SqliteStore;
use crate::error::Result;
use crate::models::NoteId;
use crate::store::StateStore;

const FIRST_RUN_DONE_KEY: &str = "first_run_done";
const SEEN_SHARED_PREFIX: &str = "seen_shared_notes:";

fn get_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM app_state WHERE key = ?",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO app_state (key, value) VALUES (?, ?)",
        params![key, value],
    )?;
    Ok(())
}

impl StateStore for SqliteStore {
    async fn is_first_run(&self) -> Result<bool> {
        let db = self.db().lock().await;
        Ok(get_state(db.connection(), FIRST_RUN_DONE_KEY)?.is_none())
    }

    async fn clear_first_run(&self) -> Result<()> {
        let db = self.db().lock().await;
        set_state(db.connection(), FIRST_RUN_DONE_KEY, "1")
    }

    async fn seen_shared_ids(&self, identity: &str) -> Result<Vec<NoteId>> {
        let db = self.db().lock().await;
        let Some(raw) = get_state(db.connection(), &format!("{SEEN_SHARED_PREFIX}{identity}"))?
        else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Vec<NoteId>>(&raw) {
            Ok(ids) => Ok(ids),
            Err(error) => {
                tracing::warn!("Discarding unreadable seen shared-note list: {}", error);
                Ok(Vec::new())
            }
        }
    }

    async fn set_seen_shared_ids(&self, identity: &str, ids: &[NoteId]) -> Result<()> {
        let raw = serde_json::to_string(ids)?;
        let db = self.db().lock().await;
        set_state(
            db.connection(),
            &format!("{SEEN_SHARED_PREFIX}{identity}"),
            &raw,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn first_run_flag_survives_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("quire.db");

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.is_first_run().await.unwrap());
        store.clear_first_run().await.unwrap();
        drop(store);

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(!reopened.is_first_run().await.unwrap());
    }

    #[tokio::test]
    async fn seen_shared_ids_are_scoped_per_identity() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ids = vec![NoteId::new(), NoteId::new()];

        store.set_seen_shared_ids("alice", &ids).await.unwrap();
        assert_eq!(store.seen_shared_ids("alice").await.unwrap(), ids);
        assert!(store.seen_shared_ids("bob").await.unwrap().is_empty());

        store.set_seen_shared_ids("alice", &[]).await.unwrap();
        assert!(store.seen_shared_ids("alice").await.unwrap().is_empty());
    }
}
