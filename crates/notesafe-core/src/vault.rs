//! Vault facade: authentication, session and encrypted note operations.
//!
//! A [`Vault`] owns the store, the [`AuthController`] and, while unlocked,
//! a [`Session`] carrying the key. Every note read or write goes through the
//! session key; locking drops the session and with it the key.

use tracing::{debug, info, warn};

use crate::auth::{AuthController, AuthState, Clock, LockoutPolicy, PinOutcome, SystemClock};
use crate::crypto::{decrypt, encrypt, SessionKey};
use crate::error::{AuthError, NoteSafeError, Result, StoreError};
use crate::storage::traits::{NoteStore, SecretStore};
use crate::storage::types::{
    Attachment, Folder, FolderId, FolderSummary, NewNote, Note, NoteId, DEFAULT_FOLDER_ID,
};

/// Volatile state of an unlocked vault.
#[derive(Debug)]
pub struct Session {
    key: SessionKey,
    active_folder: FolderId,
    pending_attachment: Option<Attachment>,
}

impl Session {
    fn new(key: SessionKey) -> Self {
        Self {
            key,
            active_folder: DEFAULT_FOLDER_ID,
            pending_attachment: None,
        }
    }

    pub fn active_folder(&self) -> FolderId {
        self.active_folder
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.pending_attachment.as_ref()
    }
}

/// What happened to a submitted PIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinResponse {
    /// Session started
    Unlocked,
    /// Current PIN confirmed; submit the new PIN next
    AwaitingNewPin,
    /// PIN replaced
    PinChanged {
        /// Notes moved to the new key
        reencrypted: usize,
        /// Notes that were already unreadable and were left as they were
        skipped: usize,
    },
    /// PIN refused, with the message to show
    Rejected(AuthError),
}

/// Decrypted body of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBody {
    Text(String),
    /// Ciphertext did not verify under the session key
    Unreadable,
}

impl NoteBody {
    pub fn text(&self) -> Option<&str> {
        match self {
            NoteBody::Text(text) => Some(text),
            NoteBody::Unreadable => None,
        }
    }
}

/// A note as presented to the user.
#[derive(Debug, Clone)]
pub struct NoteView {
    pub id: NoteId,
    pub folder_id: FolderId,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub body: NoteBody,
    pub attachment: Option<Attachment>,
}

impl NoteView {
    fn decrypt(note: Note, key: &SessionKey) -> Self {
        let body = match decrypt(key, &note.envelope) {
            Ok(plaintext) => match String::from_utf8(plaintext.to_vec()) {
                Ok(text) => NoteBody::Text(text),
                Err(_) => NoteBody::Unreadable,
            },
            Err(e) => {
                warn!(note_id = note.id, error = %e, "Note could not be decrypted");
                NoteBody::Unreadable
            }
        };

        Self {
            id: note.id,
            folder_id: note.folder_id,
            created_at: note.created_at,
            body,
            attachment: note.attachment,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        match &self.body {
            NoteBody::Text(text) => text.to_lowercase().contains(needle),
            NoteBody::Unreadable => false,
        }
    }
}

/// Encrypted note vault.
pub struct Vault<S, C: Clock = SystemClock> {
    store: S,
    auth: AuthController<C>,
    session: Option<Session>,
}

impl<S: NoteStore + SecretStore> Vault<S, SystemClock> {
    pub fn open(store: S, policy: LockoutPolicy) -> Result<Self> {
        Self::open_with_clock(store, policy, SystemClock)
    }
}

impl<S: NoteStore + SecretStore, C: Clock> Vault<S, C> {
    pub fn open_with_clock(mut store: S, policy: LockoutPolicy, clock: C) -> Result<Self> {
        let auth = AuthController::load_with_clock(&mut store, policy, clock)?;
        Ok(Self {
            store,
            auth,
            session: None,
        })
    }

    pub fn state(&self) -> &AuthState {
        self.auth.state()
    }

    pub fn auth(&self) -> &AuthController<C> {
        &self.auth
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Advance the lockout countdown.
    pub fn refresh(&mut self) -> Result<()> {
        self.auth.refresh(&mut self.store)
    }

    pub fn lockout_remaining(&self) -> Option<std::time::Duration> {
        self.auth.lockout_remaining()
    }

    pub fn begin_setup(&mut self) -> Result<()> {
        self.auth.begin_setup()?;
        Ok(())
    }

    /// Submit a complete PIN.
    pub fn submit_pin(&mut self, pin: &str) -> Result<PinResponse> {
        match self.auth.submit_pin(&mut self.store, pin)? {
            PinOutcome::Unlocked(key) => {
                self.session = Some(Session::new(key));
                Ok(PinResponse::Unlocked)
            }
            PinOutcome::ResetVerified => Ok(PinResponse::AwaitingNewPin),
            PinOutcome::NewPin { record, key } => {
                let session = self.session.as_mut().ok_or(AuthError::SessionLocked)?;

                let mut reencrypted = Vec::new();
                let mut skipped = 0;
                for note in self.store.list_all_notes()? {
                    match decrypt(&session.key, &note.envelope) {
                        Ok(plaintext) => {
                            reencrypted.push((note.id, encrypt(&key, &plaintext)?));
                        }
                        Err(_) => skipped += 1,
                    }
                }

                self.store.rotate_pin(&record, &reencrypted)?;
                self.auth.complete_pin_reset()?;
                session.key = key;

                info!(reencrypted = reencrypted.len(), skipped, "Notes moved to new PIN");
                Ok(PinResponse::PinChanged {
                    reencrypted: reencrypted.len(),
                    skipped,
                })
            }
            PinOutcome::Rejected(error) => {
                if let AuthState::LockedOut { .. } = self.auth.state() {
                    self.session = None;
                }
                Ok(PinResponse::Rejected(error))
            }
        }
    }

    /// Lock the vault and discard the session key.
    pub fn request_lock(&mut self) -> Result<()> {
        self.auth.lock()?;
        self.session = None;
        Ok(())
    }

    /// Start a PIN change. The current PIN must be submitted next.
    pub fn request_pin_reset(&mut self) -> Result<()> {
        self.auth.begin_pin_reset()?;
        Ok(())
    }

    pub fn cancel_pin_reset(&mut self) -> Result<()> {
        self.auth.cancel_pin_reset()?;
        Ok(())
    }

    /// Delete everything and return to first-run state.
    pub fn factory_reset(&mut self) -> Result<()> {
        self.session = None;
        self.auth.factory_reset(&mut self.store)
    }

    fn active_session(&self) -> Result<&Session> {
        if !self.auth.is_unlocked() {
            return Err(AuthError::SessionLocked.into());
        }
        self.session
            .as_ref()
            .ok_or_else(|| AuthError::SessionLocked.into())
    }

    fn active_session_mut(&mut self) -> Result<&mut Session> {
        if !self.auth.is_unlocked() {
            return Err(AuthError::SessionLocked.into());
        }
        self.session
            .as_mut()
            .ok_or_else(|| AuthError::SessionLocked.into())
    }

    // --- Folder operations ---

    pub fn create_folder(&mut self, name: &str) -> Result<Folder> {
        self.active_session()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(NoteSafeError::InvalidInput(
                "Folder name cannot be empty".to_string(),
            ));
        }
        self.store.create_folder(name)
    }

    /// Delete a folder and its notes. Returns the number of notes removed.
    pub fn delete_folder(&mut self, id: FolderId) -> Result<usize> {
        self.active_session()?;
        let removed = self.store.delete_folder(id)?;

        let session = self.active_session_mut()?;
        if session.active_folder == id {
            session.active_folder = DEFAULT_FOLDER_ID;
            debug!("Active folder reset to default");
        }
        Ok(removed)
    }

    pub fn switch_folder(&mut self, id: FolderId) -> Result<Folder> {
        self.active_session()?;
        let folder = self
            .store
            .get_folder(id)?
            .ok_or(StoreError::FolderNotFound(id))?;
        self.active_session_mut()?.active_folder = id;
        Ok(folder)
    }

    pub fn folders(&self) -> Result<Vec<FolderSummary>> {
        self.active_session()?;
        self.store.list_folders()
    }

    pub fn active_folder(&self) -> Result<Folder> {
        let id = self.active_session()?.active_folder;
        Ok(self
            .store
            .get_folder(id)?
            .ok_or(StoreError::FolderNotFound(id))?)
    }

    // --- Attachment staging ---

    /// Hold an attachment for the next `add_note`.
    pub fn set_attachment(&mut self, attachment: Attachment) -> Result<()> {
        self.active_session_mut()?.pending_attachment = Some(attachment);
        Ok(())
    }

    pub fn clear_attachment(&mut self) -> Result<Option<Attachment>> {
        Ok(self.active_session_mut()?.pending_attachment.take())
    }

    // --- Note operations ---

    /// Encrypt and store a note in the active folder.
    ///
    /// An explicit attachment wins and leaves the pending one staged.
    /// Without one, the pending attachment is used and consumed.
    pub fn add_note(&mut self, text: &str, attachment: Option<Attachment>) -> Result<NoteView> {
        let session = self.active_session()?;
        let text = text.trim();
        let uses_pending = attachment.is_none();
        let attachment = attachment.or_else(|| session.pending_attachment.clone());

        if text.is_empty() && attachment.is_none() {
            return Err(NoteSafeError::InvalidInput("Note is empty".to_string()));
        }

        let envelope = encrypt(&session.key, text.as_bytes())?;
        let new_note = NewNote::new(session.active_folder, envelope)
            .with_attachment(attachment)
            .created_at(self.auth.now());
        let note = self.store.add_note(&new_note)?;

        if uses_pending {
            self.active_session_mut()?.pending_attachment = None;
        }
        info!(note_id = note.id, folder_id = note.folder_id, "Note added");

        Ok(NoteView {
            id: note.id,
            folder_id: note.folder_id,
            created_at: note.created_at,
            body: NoteBody::Text(text.to_string()),
            attachment: note.attachment,
        })
    }

    /// Re-encrypt a note with new text under a fresh nonce.
    ///
    /// The creation time is kept. The attachment is replaced only when a
    /// new one is given.
    pub fn edit_note(
        &mut self,
        id: NoteId,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<()> {
        let session = self.active_session()?;
        let existing = self
            .store
            .get_note(id)?
            .ok_or(StoreError::NoteNotFound(id))?;

        let text = text.trim();
        if text.is_empty() && attachment.is_none() && existing.attachment.is_none() {
            return Err(NoteSafeError::InvalidInput("Note is empty".to_string()));
        }

        let envelope = encrypt(&session.key, text.as_bytes())?;
        self.store.update_note(id, &envelope, attachment.as_ref())?;
        info!(note_id = id, "Note edited");
        Ok(())
    }

    pub fn delete_note(&mut self, id: NoteId) -> Result<()> {
        self.active_session()?;
        self.store.delete_note(id)?;
        info!(note_id = id, "Note deleted");
        Ok(())
    }

    /// Notes of the active folder, oldest first, decrypted.
    pub fn notes(&self) -> Result<Vec<NoteView>> {
        let session = self.active_session()?;
        let notes = self.store.list_notes(session.active_folder)?;
        Ok(notes
            .into_iter()
            .map(|note| NoteView::decrypt(note, &session.key))
            .collect())
    }

    /// Case-insensitive substring search over the active folder.
    ///
    /// Every note is decrypted before filtering. A blank term returns all
    /// notes.
    pub fn search(&self, term: &str) -> Result<Vec<NoteView>> {
        let needle = term.trim().to_lowercase();
        let notes = self.notes()?;
        if needle.is_empty() {
            return Ok(notes);
        }
        Ok(notes.into_iter().filter(|n| n.matches(&needle)).collect())
    }

    /// One note by id, from any folder.
    pub fn note(&self, id: NoteId) -> Result<NoteView> {
        let session = self.active_session()?;
        let note = self
            .store
            .get_note(id)?
            .ok_or(StoreError::NoteNotFound(id))?;
        Ok(NoteView::decrypt(note, &session.key))
    }
}
