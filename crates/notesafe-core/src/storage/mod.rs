//! Storage layer for folders, notes and authentication state.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::{NoteStore, SecretStore};
pub use types::{
    Attachment, Folder, FolderId, FolderSummary, LockoutRecord, NewNote, Note, NoteId, PinRecord,
    DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME,
};
