//! SQLite storage backend.
//!
//! A single database file holds the `meta` key/value table (PIN verification
//! hash, lockout state, format version) next to the `folders` and `notes`
//! tables. Note bodies arrive already encrypted; this module only moves bytes.

mod row;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::crypto::{Envelope, PinHash};
use crate::error::{Result, StoreError};
use crate::storage::traits::{NoteStore, SecretStore};
use crate::storage::types::{
    Attachment, Folder, FolderId, FolderSummary, LockoutRecord, NewNote, Note, NoteId, PinRecord,
    DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME, FORMAT_VERSION,
};

use row::{NoteRow, NOTE_COLUMNS};

const META_FORMAT_VERSION: &str = "format_version";
const META_VERIFICATION_HASH: &str = "verification_hash";
const META_LOCKOUT_UNTIL: &str = "lockout_until";
const META_FAILED_ATTEMPTS: &str = "failed_attempts";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS folders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        folder_id INTEGER NOT NULL,
        ciphertext BLOB NOT NULL,
        nonce BLOB NOT NULL,
        created_at TEXT NOT NULL,
        attachment BLOB,
        attachment_name TEXT,
        attachment_type TEXT,

        FOREIGN KEY(folder_id) REFERENCES folders(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_notes_folder_id ON notes(folder_id);
"#;

/// SQLite-backed vault store.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a vault database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, Some(path.to_path_buf()))
    }

    /// Open a throwaway in-memory vault.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::bootstrap(&conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Create tables and seed the default folder. Safe to run on every open.
    fn bootstrap(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO folders (id, name) VALUES (?, ?)",
            (DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME),
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?, ?)",
            (META_FORMAT_VERSION, FORMAT_VERSION),
        )?;
        Ok(())
    }

    /// Path of the database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Format version recorded in the vault.
    pub fn format_version(&self) -> Result<String> {
        let conn = self.lock_conn()?;
        get_meta(&conn, META_FORMAT_VERSION)?
            .ok_or_else(|| StoreError::Corrupt("Missing format version".to_string()).into())
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned.into())
    }

    fn folder_exists(conn: &Connection, id: FolderId) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row("SELECT id FROM folders WHERE id = ?", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    fn query_notes(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Note>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, NoteRow::from_row)?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(Note::try_from(row?)?);
        }
        Ok(notes)
    }
}

fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM meta WHERE key = ?", [key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO meta (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, value),
    )?;
    Ok(())
}

fn delete_meta(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM meta WHERE key = ?", [key])?;
    Ok(())
}

fn write_lockout(conn: &Connection, record: &LockoutRecord) -> Result<()> {
    if record.failed_attempts == 0 {
        delete_meta(conn, META_FAILED_ATTEMPTS)?;
    } else {
        set_meta(conn, META_FAILED_ATTEMPTS, &record.failed_attempts.to_string())?;
    }

    match record.lockout_until {
        Some(until) => set_meta(conn, META_LOCKOUT_UNTIL, &until.timestamp_millis().to_string()),
        None => delete_meta(conn, META_LOCKOUT_UNTIL),
    }
}

impl NoteStore for SqliteStore {
    fn create_folder(&mut self, name: &str) -> Result<Folder> {
        let conn = self.lock_conn()?;
        conn.execute("INSERT INTO folders (name) VALUES (?)", [name])?;
        let id = conn.last_insert_rowid();
        debug!(folder_id = id, "Created folder");

        Ok(Folder {
            id,
            name: name.to_string(),
        })
    }

    fn get_folder(&self, id: FolderId) -> Result<Option<Folder>> {
        let conn = self.lock_conn()?;
        let folder = conn
            .query_row("SELECT id, name FROM folders WHERE id = ?", [id], |row| {
                Ok(Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(folder)
    }

    fn list_folders(&self) -> Result<Vec<FolderSummary>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT f.id, f.name, COUNT(n.id)
            FROM folders f
            LEFT JOIN notes n ON n.folder_id = f.id
            GROUP BY f.id, f.name
            ORDER BY f.id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(FolderSummary {
                folder: Folder {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                note_count: row.get::<_, i64>(2)?.max(0) as u64,
            })
        })?;

        let mut folders = Vec::new();
        for row in rows {
            folders.push(row?);
        }
        Ok(folders)
    }

    fn delete_folder(&mut self, id: FolderId) -> Result<usize> {
        if id == DEFAULT_FOLDER_ID {
            return Err(StoreError::ProtectedFolder.into());
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        if !Self::folder_exists(&tx, id)? {
            return Err(StoreError::FolderNotFound(id).into());
        }

        let removed = tx.execute("DELETE FROM notes WHERE folder_id = ?", [id])?;
        tx.execute("DELETE FROM folders WHERE id = ?", [id])?;

        tx.commit()?;
        debug!(folder_id = id, notes_removed = removed, "Deleted folder");
        Ok(removed)
    }

    fn add_note(&mut self, note: &NewNote) -> Result<Note> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        if !Self::folder_exists(&tx, note.folder_id)? {
            return Err(StoreError::FolderNotFound(note.folder_id).into());
        }

        let created_at = note.created_at.unwrap_or_else(Utc::now);
        let attachment = note.attachment.as_ref();

        tx.execute(
            r#"
            INSERT INTO notes (
                folder_id,
                ciphertext,
                nonce,
                created_at,
                attachment,
                attachment_name,
                attachment_type
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            (
                note.folder_id,
                &note.envelope.ciphertext,
                &note.envelope.nonce,
                created_at.to_rfc3339(),
                attachment.map(|a| a.bytes.as_slice()),
                attachment.map(|a| a.name.as_str()),
                attachment.and_then(|a| a.media_type.as_deref()),
            ),
        )?;
        let id = tx.last_insert_rowid();

        tx.commit()?;
        debug!(note_id = id, folder_id = note.folder_id, "Added note");

        Ok(Note {
            id,
            folder_id: note.folder_id,
            envelope: note.envelope.clone(),
            created_at,
            attachment: note.attachment.clone(),
        })
    }

    fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {} FROM notes WHERE id = ?", NOTE_COLUMNS);
        let row = conn.query_row(&sql, [id], NoteRow::from_row).optional()?;
        row.map(Note::try_from).transpose()
    }

    fn list_notes(&self, folder_id: FolderId) -> Result<Vec<Note>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM notes WHERE folder_id = ? ORDER BY id ASC",
            NOTE_COLUMNS
        );
        Self::query_notes(&conn, &sql, [folder_id])
    }

    fn list_all_notes(&self) -> Result<Vec<Note>> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {} FROM notes ORDER BY id ASC", NOTE_COLUMNS);
        Self::query_notes(&conn, &sql, [])
    }

    fn update_note(
        &mut self,
        id: NoteId,
        envelope: &Envelope,
        attachment: Option<&Attachment>,
    ) -> Result<()> {
        let conn = self.lock_conn()?;

        let changed = match attachment {
            Some(attachment) => conn.execute(
                r#"
                UPDATE notes
                SET ciphertext = ?, nonce = ?, attachment = ?, attachment_name = ?, attachment_type = ?
                WHERE id = ?
                "#,
                (
                    &envelope.ciphertext,
                    &envelope.nonce,
                    &attachment.bytes,
                    &attachment.name,
                    attachment.media_type.as_deref(),
                    id,
                ),
            )?,
            None => conn.execute(
                "UPDATE notes SET ciphertext = ?, nonce = ? WHERE id = ?",
                (&envelope.ciphertext, &envelope.nonce, id),
            )?,
        };

        if changed == 0 {
            return Err(StoreError::NoteNotFound(id).into());
        }
        debug!(note_id = id, "Updated note");
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> Result<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute("DELETE FROM notes WHERE id = ?", [id])?;
        if changed == 0 {
            return Err(StoreError::NoteNotFound(id).into());
        }
        debug!(note_id = id, "Deleted note");
        Ok(())
    }
}

impl SecretStore for SqliteStore {
    fn load_pin_record(&self) -> Result<Option<PinRecord>> {
        let conn = self.lock_conn()?;
        get_meta(&conn, META_VERIFICATION_HASH)?
            .map(|value| {
                Ok(PinRecord {
                    verification_hash: PinHash::from_hex(&value)?,
                })
            })
            .transpose()
    }

    fn set_up_pin(&mut self, record: &PinRecord) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        set_meta(&tx, META_VERIFICATION_HASH, &record.verification_hash.to_hex())?;
        write_lockout(&tx, &LockoutRecord::default())?;
        tx.commit()?;
        debug!("Stored PIN record");
        Ok(())
    }

    fn load_lockout(&self) -> Result<LockoutRecord> {
        let conn = self.lock_conn()?;

        let failed_attempts = match get_meta(&conn, META_FAILED_ATTEMPTS)? {
            Some(value) => value.parse::<u32>().map_err(|e| {
                StoreError::Corrupt(format!("Invalid failed attempt count: {}", e))
            })?,
            None => 0,
        };

        let lockout_until = match get_meta(&conn, META_LOCKOUT_UNTIL)? {
            Some(value) => {
                let millis = value
                    .parse::<i64>()
                    .map_err(|e| StoreError::Corrupt(format!("Invalid lockout time: {}", e)))?;
                let until = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
                    StoreError::Corrupt(format!("Lockout time out of range: {}", millis))
                })?;
                Some(until)
            }
            None => None,
        };

        Ok(LockoutRecord {
            failed_attempts,
            lockout_until,
        })
    }

    fn save_lockout(&mut self, record: &LockoutRecord) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        write_lockout(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    fn rotate_pin(
        &mut self,
        record: &PinRecord,
        reencrypted: &[(NoteId, Envelope)],
    ) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        set_meta(&tx, META_VERIFICATION_HASH, &record.verification_hash.to_hex())?;

        {
            let mut stmt = tx.prepare("UPDATE notes SET ciphertext = ?, nonce = ? WHERE id = ?")?;
            for (id, envelope) in reencrypted {
                let changed = stmt.execute((&envelope.ciphertext, &envelope.nonce, id))?;
                if changed == 0 {
                    return Err(StoreError::NoteNotFound(*id).into());
                }
            }
        }

        write_lockout(&tx, &LockoutRecord::default())?;

        tx.commit()?;
        debug!(notes = reencrypted.len(), "Rotated PIN record");
        Ok(())
    }

    fn wipe(&mut self) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM notes", [])?;
        tx.execute("DELETE FROM folders WHERE id != ?", [DEFAULT_FOLDER_ID])?;
        delete_meta(&tx, META_VERIFICATION_HASH)?;
        write_lockout(&tx, &LockoutRecord::default())?;

        tx.commit()?;
        debug!("Wiped vault");
        Ok(())
    }
}
