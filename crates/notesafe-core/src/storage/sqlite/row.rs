//! Note row type for database queries.

use chrono::{DateTime, Utc};

use crate::crypto::Envelope;
use crate::error::{NoteSafeError, Result, StoreError};
use crate::storage::types::{Attachment, FolderId, Note, NoteId};

/// Column list matching [`NoteRow::from_row`].
pub const NOTE_COLUMNS: &str =
    "id, folder_id, ciphertext, nonce, created_at, attachment, attachment_name, attachment_type";

/// Raw row data from the notes table, before parsing into domain types.
#[derive(Debug)]
pub struct NoteRow {
    pub id: NoteId,
    pub folder_id: FolderId,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub created_at: String,
    pub attachment: Option<Vec<u8>>,
    pub attachment_name: Option<String>,
    pub attachment_type: Option<String>,
}

impl NoteRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            folder_id: row.get(1)?,
            ciphertext: row.get(2)?,
            nonce: row.get(3)?,
            created_at: row.get(4)?,
            attachment: row.get(5)?,
            attachment_name: row.get(6)?,
            attachment_type: row.get(7)?,
        })
    }
}

impl TryFrom<NoteRow> for Note {
    type Error = NoteSafeError;

    fn try_from(row: NoteRow) -> Result<Self> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| StoreError::Corrupt(format!("Invalid timestamp on note {}: {}", row.id, e)))?
            .with_timezone(&Utc);

        let attachment = row.attachment.map(|bytes| Attachment {
            name: row
                .attachment_name
                .unwrap_or_else(|| "attachment".to_string()),
            media_type: row.attachment_type,
            bytes,
        });

        Ok(Note {
            id: row.id,
            folder_id: row.folder_id,
            envelope: Envelope {
                ciphertext: row.ciphertext,
                nonce: row.nonce,
            },
            created_at,
            attachment,
        })
    }
}
