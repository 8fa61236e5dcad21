pub mod common;
pub mod notes;
pub mod replay;
pub mod shared;
pub mod sync;
pub mod todo;
