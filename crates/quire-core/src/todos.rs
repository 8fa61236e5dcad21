//! To-do list operations. The list is one versioned blob per identity.

use chrono::NaiveDate;

use crate::content::ContentPredicates;
use crate::error::Result;
use crate::models::{TodoList, TodoRecord};
use crate::remote::RemoteService;
use crate::session::Session;
use crate::store::{NoteStore, StateStore};
use crate::sync::SyncEngine;
use crate::util::unix_timestamp_now;

impl<S, R, P> SyncEngine<S, R, P>
where
    S: NoteStore + StateStore,
    R: RemoteService,
    P: ContentPredicates,
{
    /// Fetch the identity's list. A failed or undecodable read keeps what the session holds.
    pub async fn load_todos<'a>(&self, session: &'a mut Session) -> Result<&'a TodoRecord> {
        let owner_id = session.identity().id.clone();
        match self.remote.fetch_todo(&owner_id).await {
            Ok(Some(record)) if session.todo.is_superseded_by(&record) => {
                session.todo = record;
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!("Failed to load to-do list for {}: {}", owner_id, error);
            }
        }
        Ok(&session.todo)
    }

    /// Replace the list, bump its version and push it.
    ///
    /// Returns whether the push succeeded; the session keeps the new list either way.
    pub async fn save_todos(&self, session: &mut Session, list: TodoList) -> Result<bool> {
        let record = TodoRecord {
            owner_id: session.identity().id.clone(),
            list,
            version_num: session.todo.version_num + 1,
            updated_at: unix_timestamp_now(),
        };
        session.todo = record;

        match self.remote.upsert_todo(&session.todo).await {
            Ok(()) => Ok(true),
            Err(error) => {
                tracing::warn!("Failed to push to-do list: {}", error);
                Ok(false)
            }
        }
    }

    /// Carry unfinished items forward to `today` once per day and push the result
    pub async fn roll_over_todos(&self, session: &mut Session, today: NaiveDate) -> Result<bool> {
        let mut list = session.todo.list.clone();
        if !list.roll_over(today) {
            return Ok(false);
        }
        tracing::debug!("Rolled over to-do list to {}", today);
        self.save_todos(session, list).await?;
        Ok(true)
    }
}
