//! Storage trait definitions.
//!
//! `NoteStore` covers folders and notes; `SecretStore` covers the key/value
//! state used by authentication. Neither knows anything about keys: note
//! bodies are opaque envelopes.

use super::types::{
    Attachment, Folder, FolderId, FolderSummary, LockoutRecord, NewNote, Note, NoteId, PinRecord,
};
use crate::crypto::Envelope;
use crate::error::Result;

/// Folder and note persistence.
///
/// Implementations must ensure:
/// - Folder ids are never reused
/// - The default folder always exists and cannot be deleted
/// - No note ever references a missing folder
pub trait NoteStore: Send {
    /// Create a folder with a fresh id.
    fn create_folder(&mut self, name: &str) -> Result<Folder>;

    /// Get a folder by id.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(folder))` if found, `Ok(None)` if not found.
    fn get_folder(&self, id: FolderId) -> Result<Option<Folder>>;

    /// List all folders in id order, with their note counts.
    fn list_folders(&self) -> Result<Vec<FolderSummary>>;

    /// Delete a folder and every note in it, atomically.
    ///
    /// # Returns
    ///
    /// Returns the number of notes removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ProtectedFolder` for the default folder and
    /// `StoreError::FolderNotFound` for an unknown id.
    fn delete_folder(&mut self, id: FolderId) -> Result<usize>;

    /// Insert a note.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::FolderNotFound` if the folder does not exist;
    /// nothing is written in that case.
    fn add_note(&mut self, note: &NewNote) -> Result<Note>;

    /// Get a note by id.
    fn get_note(&self, id: NoteId) -> Result<Option<Note>>;

    /// List the notes of one folder in creation order (oldest first).
    fn list_notes(&self, folder_id: FolderId) -> Result<Vec<Note>>;

    /// List every note in the vault in creation order.
    fn list_all_notes(&self) -> Result<Vec<Note>>;

    /// Replace a note's envelope, and its attachment when one is given.
    fn update_note(
        &mut self,
        id: NoteId,
        envelope: &Envelope,
        attachment: Option<&Attachment>,
    ) -> Result<()>;

    /// Delete a single note.
    fn delete_note(&mut self, id: NoteId) -> Result<()>;
}

/// Authentication state persisted outside the folder/note tables.
pub trait SecretStore: Send {
    fn load_pin_record(&self) -> Result<Option<PinRecord>>;

    /// Store the first PIN record and clear lockout state in one
    /// transaction.
    fn set_up_pin(&mut self, record: &PinRecord) -> Result<()>;

    /// Load the lockout record. A vault that never failed returns the default.
    fn load_lockout(&self) -> Result<LockoutRecord>;

    fn save_lockout(&mut self, record: &LockoutRecord) -> Result<()>;

    /// Replace the PIN record and rewrite the given note envelopes in one
    /// transaction. Lockout state is cleared as part of the same unit.
    fn rotate_pin(&mut self, record: &PinRecord, reencrypted: &[(NoteId, Envelope)])
        -> Result<()>;

    /// Remove every note, every non-default folder, the PIN record and the
    /// lockout record in one transaction.
    fn wipe(&mut self) -> Result<()>;
}
