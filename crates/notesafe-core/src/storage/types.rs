//! Core data types for the storage layer.
//!
//! The store never sees plaintext: note bodies travel as [`Envelope`]s and
//! attachments as opaque bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{Envelope, PinHash};

/// Folder identifier. Assigned by the store, never recycled.
pub type FolderId = i64;

/// Note identifier. Assigned by the store.
pub type NoteId = i64;

/// Id of the folder that always exists.
pub const DEFAULT_FOLDER_ID: FolderId = 1;

/// Name of the default folder.
pub const DEFAULT_FOLDER_NAME: &str = "General";

/// Vault format version written to `meta`.
pub const FORMAT_VERSION: &str = "1";

/// A folder of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
}

impl Folder {
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_FOLDER_ID
    }
}

/// A folder together with the number of notes it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSummary {
    #[serde(flatten)]
    pub folder: Folder,
    pub note_count: u64,
}

/// Opaque binary blob attached to a note. Stored unencrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Original file name
    pub name: String,

    /// MIME type, if known
    pub media_type: Option<String>,

    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// A stored note.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,

    /// Folder this note belongs to
    pub folder_id: FolderId,

    /// Encrypted body
    pub envelope: Envelope,

    /// When this note was created
    pub created_at: DateTime<Utc>,

    pub attachment: Option<Attachment>,
}

/// Builder for creating new notes.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub folder_id: FolderId,
    pub envelope: Envelope,
    pub attachment: Option<Attachment>,

    /// Creation time (defaults to now when stored)
    pub created_at: Option<DateTime<Utc>>,
}

impl NewNote {
    pub fn new(folder_id: FolderId, envelope: Envelope) -> Self {
        Self {
            folder_id,
            envelope,
            attachment: None,
            created_at: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Option<Attachment>) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

/// Persisted PIN verification data. Never holds the PIN or the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinRecord {
    pub verification_hash: PinHash,
}

/// Persisted progress toward, or state of, a lockout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutRecord {
    /// Consecutive failed PIN attempts
    pub failed_attempts: u32,

    /// End of the active lockout, if any
    pub lockout_until: Option<DateTime<Utc>>,
}

impl LockoutRecord {
    pub fn is_clear(&self) -> bool {
        self.failed_attempts == 0 && self.lockout_until.is_none()
    }
}
