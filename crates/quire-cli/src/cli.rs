use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quire")]
#[command(about = "Local-first notes that sync across devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Quick capture: quire "my thought here"
    #[arg(trailing_var_arg = true)]
    pub note: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "add")]
    New {
        /// Folder to create the note in
        #[arg(long, value_name = "NAME")]
        list: Option<String>,
        /// Note content (stdin or $EDITOR when omitted)
        content: Vec<String>,
    },
    /// List notes
    List {
        /// Only notes in this folder
        #[arg(long, value_name = "NAME")]
        list: Option<String>,
        /// Show Recently Deleted instead
        #[arg(long)]
        deleted: bool,
        /// Number of notes to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List folders
    Lists,
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// Replacement content ($EDITOR when omitted)
        content: Vec<String>,
    },
    /// Pin or unpin a note
    Pin {
        /// Note ID or unique ID prefix
        id: String,
        /// Unpin instead
        #[arg(long)]
        off: bool,
    },
    /// Move a note to another folder
    Move {
        /// Note ID or unique ID prefix
        id: String,
        /// Destination folder
        list: String,
    },
    /// Rename a folder, moving every note in it
    RenameList { old: String, new: String },
    /// Move a note to Recently Deleted
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Bring a note back from Recently Deleted
    Restore {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Delete a note for good, here and remotely
    Purge {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Reconcile local notes with the remote copy
    Sync,
    /// List notes shared with you and by you
    Shared {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Share a note with another user
    Share {
        /// Note ID or unique ID prefix
        id: String,
        /// Recipient user id
        recipient: String,
    },
    /// Stop sharing a note with a user
    Unshare {
        /// Note ID or unique ID prefix
        id: String,
        /// Recipient user id
        recipient: String,
    },
    /// Daily to-do list
    Todo {
        #[command(subcommand)]
        command: Option<TodoCommands>,
    },
    /// Apply a recorded realtime feed (one JSON change per line)
    Replay {
        /// Feed file
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TodoCommands {
    /// Show today's items
    List,
    /// Add an item for today
    Add { text: Vec<String> },
    /// Mark an item done
    Done {
        /// Item ID or unique ID prefix
        id: String,
    },
}
