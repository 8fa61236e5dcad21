//! Data models for Quire

mod note;
mod shared;
mod todo;

pub use note::{Note, NoteId, DEFAULT_LIST};
pub use shared::{Identity, ShareGrant, SharedNoteEntry, SharedWithMe};
pub use todo::{TodoItem, TodoList, TodoRecord};
