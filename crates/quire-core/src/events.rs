//! Non-blocking notices the engine raises for the UI layer

use tokio::sync::mpsc;

use crate::content::StorageRefs;
use crate::models::NoteId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedNotice {
    /// One new shared note, named by its owner
    Single { owner_name: String },
    /// Several new shared notes
    Many { count: usize },
}

impl SharedNotice {
    pub fn message(&self) -> String {
        match self {
            Self::Single { owner_name } => format!("{owner_name} shared a note with you"),
            Self::Many { count } => format!("{count} notes were shared with you"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The open note was changed on another device
    NoteChangedElsewhere { id: NoteId },
    /// Notes were shared with the current identity since the last check
    NewSharedNotes(SharedNotice),
    /// A note was deleted for good; its binary assets can be cleaned up
    AssetsOrphaned { note_id: NoteId, refs: StorageRefs },
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the channel the engine reports on
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(sender: &EventSender, event: EngineEvent) {
    if let Err(error) = sender.send(event) {
        tracing::debug!("No listener for engine event: {:?}", error.0);
    }
}
