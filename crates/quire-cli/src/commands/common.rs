use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use quire_core::events::{self, EventReceiver};
use quire_core::note_set::NoteSet;
use quire_core::{
    Config, DocumentContent, EngineEvent, Identity, Note, Session, SqliteStore, SyncEngine,
};
use serde::Serialize;

use crate::backend::Backend;
use crate::error::CliError;

pub type Engine = SyncEngine<SqliteStore, Backend>;

const LOCAL_IDENTITY: &str = "local";

/// Engine, session and event stream for one CLI invocation
pub struct Context {
    pub engine: Engine,
    pub session: Session,
    events: EventReceiver,
}

impl Context {
    pub async fn open(config: &Config, db_path: Option<PathBuf>) -> Result<Self, CliError> {
        let db_path = resolve_db_path(db_path, config)?;
        let store = SqliteStore::open(&db_path)?;
        let backend = Backend::from_config(config)?;
        let (sender, events) = events::channel();
        let engine = SyncEngine::new(store, backend, sender);
        let session = engine
            .start_session(identity_from_config(config), config.autosave_delay())
            .await?;
        Ok(Self {
            engine,
            session,
            events,
        })
    }

    /// Print any engine notices raised so far
    pub fn report_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            eprintln!("{}", describe_event(&event));
        }
    }

    pub async fn finish(mut self) -> Result<(), CliError> {
        self.engine.end_session(self.session).await?;
        while let Ok(event) = self.events.try_recv() {
            eprintln!("{}", describe_event(&event));
        }
        Ok(())
    }
}

pub fn identity_from_config(config: &Config) -> Identity {
    let id = config
        .user_id
        .clone()
        .unwrap_or_else(|| LOCAL_IDENTITY.to_string());
    let display_name = config.display_name.clone().unwrap_or_else(|| id.clone());
    Identity::new(id, display_name)
}

pub fn describe_event(event: &EngineEvent) -> String {
    match event {
        EngineEvent::NoteChangedElsewhere { id } => {
            format!("Note {} was changed on another device", short_id(&id.to_string()))
        }
        EngineEvent::NewSharedNotes(notice) => notice.message(),
        EngineEvent::AssetsOrphaned { note_id, refs } => format!(
            "Note {} left {} image(s) and {} file(s) in storage",
            short_id(&note_id.to_string()),
            refs.images.len(),
            refs.files.len()
        ),
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub preview: String,
    pub list: String,
    pub pinned: bool,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub version_num: i64,
    pub relative_time: String,
}

/// Find a note by full id or unique id prefix
pub fn resolve_note(notes: &NoteSet, query: &str) -> Result<Note, CliError> {
    let query = normalize_note_identifier(query)?;
    if let Ok(id) = query.parse() {
        if let Some(note) = notes.get(&id) {
            return Ok(note.clone());
        }
    }

    let mut matching: Vec<&Note> = notes
        .iter()
        .filter(|note| note.id.to_string().starts_with(&query))
        .collect();
    matching.sort_by_key(|note| note.id);

    match matching.as_slice() {
        [] => Err(CliError::NoteNotFound(query)),
        [note] => Ok((*note).clone()),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|note| short_id(&note.id.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now = Utc::now().timestamp();
    notes
        .iter()
        .map(|note| {
            let marker = if note.pinned { "*" } else { " " };
            let preview = note_preview(note, 40);
            let relative_time = format_relative_time(note.updated_at, now);
            format!(
                "{marker} {:<13}  {preview:<40}  {relative_time:<10}  {}",
                short_id(&note.id.to_string()),
                note.list
            )
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    NoteListItem {
        id: note.id.to_string(),
        preview: note_preview(note, 80),
        list: note.list.clone(),
        pinned: note.pinned,
        deleted: note.deleted,
        created_at: note.created_at,
        updated_at: note.updated_at,
        version_num: note.version_num,
        relative_time: format_relative_time(note.updated_at, Utc::now().timestamp()),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let text = DocumentContent::plain_text(&note.content);
    let first_line = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Relative age of a Unix-seconds timestamp
pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial("")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    if let Err(error) = std::fs::remove_file(&temp_file) {
        tracing::debug!("Failed to remove {}: {}", temp_file.display(), error);
    }

    launch_result?;
    Ok(normalize_content(&note_content))
}

fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(CliError::EditorFailed("empty EDITOR command".into()));
    };

    let status = Command::new(program).args(parts).arg(file_path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("quire-note-{}-{now}.md", std::process::id()))
}

/// `--db-path`, then the config file, then the platform data directory
pub fn resolve_db_path(cli_db_path: Option<PathBuf>, config: &Config) -> Result<PathBuf, CliError> {
    cli_db_path
        .or_else(|| config.database_path())
        .ok_or(CliError::NoDataDir)
}
