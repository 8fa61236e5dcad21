//! Supabase (PostgREST) implementation of [`RemoteService`].

use std::fmt;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{notes_from_rows, NoteRow, RemoteError, RemoteResult, RemoteService, TodoRow};
use crate::models::{Note, NoteId, ShareGrant, SharedWithMe, TodoRecord};
use crate::realtime::{NOTES_TABLE, SHARING_TABLE, TODO_TABLE};
use crate::util::{is_http_url, non_blank};

/// PostgREST client scoped to one signed-in user
#[derive(Clone)]
pub struct SupabaseRemote {
    rest_url: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl fmt::Debug for SupabaseRemote {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SupabaseRemote")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar_num: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SharedWithRow {
    #[serde(default)]
    note: Option<NoteRow>,
    #[serde(default)]
    owner: Option<ProfileRow>,
}

#[derive(Debug, Deserialize)]
struct SharedByRow {
    note_id: String,
    #[serde(default)]
    recipient: Option<ProfileRow>,
}

#[derive(Debug, Serialize)]
struct ShareInsert<'a> {
    note_id: String,
    owner_id: &'a str,
    shared_with_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl SupabaseRemote {
    pub fn new(
        url: impl AsRef<str>,
        anon_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> RemoteResult<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = non_blank(Some(anon_key.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("Supabase anon key must not be empty".to_string())
        })?;
        let access_token = non_blank(Some(access_token.into())).ok_or_else(|| {
            RemoteError::InvalidConfiguration("access token must not be empty".to_string())
        })?;

        Ok(Self {
            rest_url,
            anon_key,
            access_token,
            client: Client::builder().build()?,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{table}", self.rest_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> RemoteResult<Vec<T>> {
        let request = self.authorized(self.client.get(self.table_url(table)).query(query));
        let response = checked(request.send().await?).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &T,
    ) -> RemoteResult<()> {
        let request = self.authorized(
            self.client
                .post(self.table_url(table))
                .query(&[("on_conflict", on_conflict)])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(body),
        );
        checked(request.send().await?).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, query: &[(&str, String)]) -> RemoteResult<()> {
        let request = self.authorized(self.client.delete(self.table_url(table)).query(query));
        checked(request.send().await?).await?;
        Ok(())
    }
}

impl RemoteService for SupabaseRemote {
    async fn fetch_notes(&self, owner_id: &str) -> RemoteResult<Vec<Note>> {
        let rows: Vec<NoteRow> = self
            .select(
                NOTES_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{owner_id}")),
                ],
            )
            .await?;
        Ok(notes_from_rows(rows))
    }

    async fn upsert_note(&self, owner_id: &str, note: &Note) -> RemoteResult<()> {
        self.upsert(NOTES_TABLE, "id", &NoteRow::from_note(owner_id, note))
            .await
    }

    async fn delete_note(&self, id: &NoteId) -> RemoteResult<()> {
        self.delete(NOTES_TABLE, &[("id", format!("eq.{id}"))]).await
    }

    async fn shared_with(&self, identity: &str) -> RemoteResult<Vec<SharedWithMe>> {
        let rows: Vec<SharedWithRow> = self
            .select(
                SHARING_TABLE,
                &[
                    (
                        "select",
                        "note:notes(*),owner:users!owner_id(display_name,avatar_num)".to_string(),
                    ),
                    ("shared_with_id", format!("eq.{identity}")),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let note = match Note::try_from(row.note?) {
                    Ok(note) => note,
                    Err(error) => {
                        tracing::warn!("Skipping shared note row: {}", error);
                        return None;
                    }
                };
                let owner = row.owner.unwrap_or(ProfileRow {
                    display_name: None,
                    avatar_num: None,
                });
                Some(SharedWithMe {
                    note,
                    owner_display_name: owner.display_name.unwrap_or_default(),
                    owner_avatar_num: owner.avatar_num.unwrap_or(0),
                })
            })
            .collect())
    }

    async fn shared_by(&self, identity: &str) -> RemoteResult<Vec<ShareGrant>> {
        let rows: Vec<SharedByRow> = self
            .select(
                SHARING_TABLE,
                &[
                    (
                        "select",
                        "note_id,recipient:users!shared_with_id(display_name)".to_string(),
                    ),
                    ("owner_id", format!("eq.{identity}")),
                ],
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let note_id = row.note_id.parse::<NoteId>().ok()?;
                Some(ShareGrant {
                    note_id,
                    recipient_display_name: row
                        .recipient
                        .and_then(|profile| profile.display_name)
                        .unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn fetch_notes_by_ids(&self, ids: &[NoteId]) -> RemoteResult<Vec<Note>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let rows: Vec<NoteRow> = self
            .select(
                NOTES_TABLE,
                &[("select", "*".to_string()), ("id", format!("in.({id_list})"))],
            )
            .await?;
        Ok(notes_from_rows(rows))
    }

    async fn share_note(
        &self,
        note_id: &NoteId,
        owner_id: &str,
        recipient_id: &str,
    ) -> RemoteResult<()> {
        let body = ShareInsert {
            note_id: note_id.to_string(),
            owner_id,
            shared_with_id: recipient_id,
        };
        self.upsert(SHARING_TABLE, "note_id,shared_with_id", &body)
            .await
    }

    async fn unshare_note(&self, note_id: &NoteId, recipient_id: &str) -> RemoteResult<()> {
        self.delete(
            SHARING_TABLE,
            &[
                ("note_id", format!("eq.{note_id}")),
                ("shared_with_id", format!("eq.{recipient_id}")),
            ],
        )
        .await
    }

    async fn fetch_todo(&self, owner_id: &str) -> RemoteResult<Option<TodoRecord>> {
        let rows: Vec<TodoRow> = self
            .select(
                TODO_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("user_id", format!("eq.{owner_id}")),
                ],
            )
            .await?;
        rows.into_iter().next().map(TodoRecord::try_from).transpose()
    }

    async fn upsert_todo(&self, record: &TodoRecord) -> RemoteResult<()> {
        self.upsert(TODO_TABLE, "user_id", &TodoRow::from_record(record)?)
            .await
    }
}

async fn checked(response: Response) -> RemoteResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Api(parse_api_error(status, &body)))
}

/// Longest slice of a response body quoted in an error message
const ERROR_EXCERPT_CHARS: usize = 180;

fn error_excerpt(body: &str) -> String {
    body.trim().chars().take(ERROR_EXCERPT_CHARS).collect()
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", error_excerpt(&message), status.as_u16());
        }
    }

    let trimmed = error_excerpt(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Normalize a project URL to its PostgREST base, `<project>/rest/v1`
pub fn normalize_rest_url(url: &str) -> RemoteResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(RemoteError::InvalidConfiguration(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(RemoteError::InvalidConfiguration(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        assert_eq!(
            normalize_rest_url("https://abc.supabase.co/").unwrap(),
            "https://abc.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("http://localhost:54321/rest/v1").unwrap(),
            "http://localhost:54321/rest/v1"
        );
    }

    #[test]
    fn normalize_rest_url_rejects_invalid_values() {
        assert!(normalize_rest_url("").is_err());
        assert!(normalize_rest_url("abc.supabase.co").is_err());
    }

    #[test]
    fn parse_api_error_prefers_message() {
        let message = parse_api_error(
            StatusCode::FORBIDDEN,
            r#"{"message":"permission denied for table notes"}"#,
        );
        assert_eq!(message, "permission denied for table notes (403)");
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }

    #[test]
    fn long_error_bodies_are_cut_short() {
        let body = format!("  {}  ", "x".repeat(500));
        let message = parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert_eq!(message, format!("{} (500)", "x".repeat(ERROR_EXCERPT_CHARS)));
    }

    #[test]
    fn debug_redacts_credentials() {
        let remote = SupabaseRemote::new("https://abc.supabase.co", "anon-key", "secret-token")
            .unwrap();
        let debug = format!("{remote:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("anon-key"));
        assert!(debug.contains("[REDACTED]"));
    }
}
