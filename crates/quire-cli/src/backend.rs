//! Remote backend selection: Supabase when configured, offline otherwise.

use quire_core::models::{ShareGrant, SharedWithMe};
use quire_core::remote::{RemoteError, RemoteResult, RemoteService};
use quire_core::{Config, Note, NoteId, SupabaseRemote, TodoRecord};

use crate::error::CliError;

#[derive(Debug)]
pub enum Backend {
    Supabase(SupabaseRemote),
    /// No remote configured; every call fails with `Unavailable`
    Offline,
}

impl Backend {
    pub fn from_config(config: &Config) -> Result<Self, CliError> {
        let Some(settings) = config.remote()? else {
            return Ok(Self::Offline);
        };
        let Some(token) = settings.access_token else {
            tracing::debug!("No access token configured; running offline");
            return Ok(Self::Offline);
        };
        Ok(Self::Supabase(SupabaseRemote::new(
            &settings.url,
            settings.anon_key,
            token,
        )?))
    }

    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline)
    }
}

impl RemoteService for Backend {
    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<Note>> {
        match self {
            Self::Supabase(remote) => remote.fetch_notes(owner_id).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn upsert_note(&self, owner_id: &str, note: &Note) -> RemoteResult<()> {
        match self {
            Self::Supabase(remote) => remote.upsert_note(owner_id, note).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn delete_note(&self, id: &NoteId) -> RemoteResult<()> {
        match self {
            Self::Supabase(remote) => remote.delete_note(id).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn shared_with(&self, identity: &str) -> RemoteResult<Vec<SharedWithMe>> {
        match self {
            Self::Supabase(remote) => remote.shared_with(identity).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn shared_by(&self, identity: &str) -> RemoteResult<Vec<ShareGrant>> {
        match self {
            Self::Supabase(remote) => remote.shared_by(identity).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_notes_by_ids(&self, ids: &[NoteId]) -> RemoteResult<Vec<Note>> {
        match self {
            Self::Supabase(remote) => remote.fetch_notes_by_ids(ids).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn share_note(
        &self,
        note_id: &NoteId,
        owner_id: &str,
        recipient_id: &str,
    ) -> RemoteResult<()> {
        match self {
            Self::Supabase(remote) => remote.share_note(note_id, owner_id, recipient_id).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn unshare_note(&self, note_id: &NoteId, recipient_id: &str) -> RemoteResult<()> {
        match self {
            Self::Supabase(remote) => remote.unshare_note(note_id, recipient_id).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn fetch_todo(&self, owner_id: &str) -> RemoteResult<Option<TodoRecord>> {
        match self {
            Self::Supabase(remote) => remote.fetch_todo(owner_id).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }

    async fn upsert_todo(&self, record: &TodoRecord) -> RemoteResult<()> {
        match self {
            Self::Supabase(remote) => remote.upsert_todo(record).await,
            Self::Offline => Err(RemoteError::Unavailable),
        }
    }
}
