//! Interactive session.
//!
//! One vault stays open for the whole session, so the session key, the
//! active folder and the pending attachment live until `lock` or `quit`.
//! Without a TTY, PINs are read from the input lines through a `PinPad`,
//! which lets a PIN be entered across several lines.

use std::io::{self, BufRead, Write};
use std::path::Path;

use zeroize::Zeroizing;

use notesafe_core::{AuthError, AuthState, NoteBody, PinPad, PinResponse};

use crate::app::{wait_out_lockout, AppContext, CliVault};
use crate::constants::env_vars;
use crate::errors::CliError;
use crate::helpers::{prompt_new_pin, prompt_pin, read_attachment};
use crate::output::{
    attachment_label, folder_rows, note_rows, FOLDER_HEADERS, NOTE_HEADERS, UNREADABLE,
};
use crate::ui::{
    format_countdown, format_datetime, kv, print_error, table, TableStyle, UiContext,
};

const HELP: &str = "\
Commands:
  unlock              Enter the PIN (sets it on a new vault)
  lock                Lock the vault
  status              Show lock state and active folder
  wait                Wait for a lockout to expire
  folders             List folders
  mkdir <name>        Create a folder
  rmdir <id>          Delete a folder and its notes
  cd <id>             Switch to a folder
  ls                  List notes in the active folder
  search <term>       Search notes in the active folder
  show <id>           Show a note
  add <text>          Add a note (uses the pending attachment)
  attach <path>       Hold a file for the next note
  detach              Drop the pending attachment
  edit <id> <text>    Replace a note's text
  rm <id>             Delete a note
  passwd              Change the PIN
  reset               Erase everything and forget the PIN
  quit                Lock and leave";

enum Flow {
    Continue,
    Quit,
}

pub fn handle_shell(ctx: &AppContext) -> anyhow::Result<()> {
    let vault = ctx.open_vault()?;
    let mut shell = Shell {
        vault,
        ui: ctx.ui_context(),
        input: io::stdin().lock().lines(),
        tty: ctx.interactive(),
    };
    shell.run()
}

struct Shell<I> {
    vault: CliVault,
    ui: UiContext,
    input: I,
    tty: bool,
}

impl<I: Iterator<Item = io::Result<String>>> Shell<I> {
    fn run(&mut self) -> anyhow::Result<()> {
        println!("NoteSafe shell. Type `help` for commands.");

        loop {
            self.vault.refresh()?;
            print!("{}", self.prompt());
            io::stdout().flush()?;

            let Some(line) = self.input.next() else {
                println!();
                break;
            };
            let line = line?;

            match self.execute(line.trim()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => print_error(&self.ui, &e.to_string(), None),
            }
        }

        if self.vault.session().is_some() {
            self.vault.request_lock()?;
        }
        Ok(())
    }

    fn prompt(&self) -> String {
        match self.vault.state() {
            AuthState::Unlocked => match self.vault.active_folder() {
                Ok(folder) => format!("notesafe:{}> ", folder.name),
                Err(_) => "notesafe> ".to_string(),
            },
            AuthState::Uninitialized | AuthState::SettingUp => "notesafe (new)> ".to_string(),
            AuthState::LockedOut { .. } => "notesafe (locked out)> ".to_string(),
            _ => "notesafe (locked)> ".to_string(),
        }
    }

    fn execute(&mut self, line: &str) -> anyhow::Result<Flow> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" | "?" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            "status" => self.status()?,
            "unlock" => self.unlock()?,
            "lock" => {
                self.vault.request_lock()?;
                println!("Locked.");
            }
            "wait" => {
                if !wait_out_lockout(&mut self.vault, &self.ui)? {
                    println!("Not locked out.");
                }
            }
            "folders" => {
                let folders = self.vault.folders()?;
                let rows = folder_rows(&folders);
                println!("{}", table(&self.ui, TableStyle::Boxed, &FOLDER_HEADERS, &rows));
            }
            "mkdir" => {
                let folder = self.vault.create_folder(rest)?;
                println!("Created folder {} ({}).", folder.name, folder.id);
            }
            "rmdir" => {
                let removed = self.vault.delete_folder(parse_id(rest)?)?;
                println!("Folder deleted, {} note(s) removed.", removed);
            }
            "cd" => {
                let folder = self.vault.switch_folder(parse_id(rest)?)?;
                println!("Now in {}.", folder.name);
            }
            "ls" => {
                let notes = self.vault.notes()?;
                self.print_notes(&notes)?;
            }
            "search" => {
                let notes = self.vault.search(rest)?;
                self.print_notes(&notes)?;
            }
            "show" => self.show(parse_id(rest)?)?,
            "add" => {
                let note = self.vault.add_note(rest, None)?;
                println!("Added note {}.", note.id);
            }
            "attach" => {
                if rest.is_empty() {
                    return Err(CliError::invalid_input("Usage: attach <path>").into());
                }
                let attachment = read_attachment(Path::new(rest))?;
                let label = attachment_label(Some(&attachment));
                self.vault.set_attachment(attachment)?;
                println!("Holding {} for the next note.", label);
            }
            "detach" => match self.vault.clear_attachment()? {
                Some(attachment) => println!("Dropped {}.", attachment.name),
                None => println!("No pending attachment."),
            },
            "edit" => {
                let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                self.vault.edit_note(parse_id(id)?, text, None)?;
                println!("Note updated.");
            }
            "rm" => {
                let id = parse_id(rest)?;
                self.vault.delete_note(id)?;
                println!("Deleted note {}.", id);
            }
            "passwd" => self.change_pin()?,
            "reset" => self.factory_reset()?,
            other => {
                return Err(CliError::invalid_input(format!(
                    "Unknown command: {}. Type `help` for commands.",
                    other
                ))
                .into());
            }
        }
        Ok(Flow::Continue)
    }

    fn status(&self) -> anyhow::Result<()> {
        let auth = self.vault.auth();
        println!("{}", kv(&self.ui, "State", self.vault.state().name()));
        println!(
            "{}",
            kv(
                &self.ui,
                "Attempts",
                &format!(
                    "{} of {} remaining",
                    auth.attempts_remaining(),
                    auth.policy().max_attempts
                ),
            )
        );
        if let Some(remaining) = self.vault.lockout_remaining() {
            println!("{}", kv(&self.ui, "Lockout", &format_countdown(remaining)));
        }
        if let Some(session) = self.vault.session() {
            let folder = self.vault.active_folder()?;
            println!("{}", kv(&self.ui, "Folder", &folder.name));
            println!(
                "{}",
                kv(
                    &self.ui,
                    "Pending",
                    &attachment_label(session.pending_attachment()),
                )
            );
        }
        Ok(())
    }

    fn unlock(&mut self) -> anyhow::Result<()> {
        self.vault.refresh()?;
        match self.vault.state() {
            AuthState::Unlocked => {
                println!("Already unlocked.");
                Ok(())
            }
            AuthState::LockedOut { .. } => {
                let remaining = self.vault.lockout_remaining().unwrap_or_default();
                Err(CliError::from_rejection(&AuthError::LockedOut { remaining }).into())
            }
            AuthState::Uninitialized | AuthState::SettingUp => {
                self.vault.begin_setup()?;
                let pin = self.read_new_pin()?;
                respond(self.vault.submit_pin(&pin)?)
            }
            _ => {
                let pin = self.read_pin("PIN")?;
                respond(self.vault.submit_pin(&pin)?)
            }
        }
    }

    fn change_pin(&mut self) -> anyhow::Result<()> {
        self.vault.request_pin_reset()?;
        let result = self.complete_pin_change();
        if result.is_err() {
            if let AuthState::ResettingPin(_) = self.vault.state() {
                self.vault.cancel_pin_reset()?;
            }
        }
        result
    }

    fn complete_pin_change(&mut self) -> anyhow::Result<()> {
        let current = self.read_pin("Current PIN")?;
        respond(self.vault.submit_pin(&current)?)?;
        let new_pin = self.read_new_pin()?;
        respond(self.vault.submit_pin(&new_pin)?)
    }

    fn factory_reset(&mut self) -> anyhow::Result<()> {
        print!("Type `yes` to erase every note and folder: ");
        io::stdout().flush()?;
        let answer = self.next_line()?;
        if answer.trim() != "yes" {
            println!("Cancelled.");
            return Ok(());
        }
        self.vault.factory_reset()?;
        println!("Vault erased. Run `unlock` to set a new PIN.");
        Ok(())
    }

    fn show(&self, id: i64) -> anyhow::Result<()> {
        let note = self.vault.note(id)?;
        println!("{}", kv(&self.ui, "ID", &note.id.to_string()));
        println!(
            "{}",
            kv(
                &self.ui,
                "Created",
                &format_datetime(&note.created_at, self.ui.mode.is_pretty()),
            )
        );
        if note.attachment.is_some() {
            println!(
                "{}",
                kv(
                    &self.ui,
                    "Attachment",
                    &attachment_label(note.attachment.as_ref()),
                )
            );
        }
        match &note.body {
            NoteBody::Text(text) => println!("{}", text),
            NoteBody::Unreadable => println!("{}", UNREADABLE),
        }
        Ok(())
    }

    fn print_notes(&self, notes: &[notesafe_core::NoteView]) -> anyhow::Result<()> {
        if notes.is_empty() {
            let folder = self.vault.active_folder()?;
            println!("No notes in {}.", folder.name);
            return Ok(());
        }
        let rows = note_rows(&self.ui, notes);
        println!("{}", table(&self.ui, TableStyle::Bare, &NOTE_HEADERS, &rows));
        Ok(())
    }

    fn next_line(&mut self) -> anyhow::Result<String> {
        match self.input.next() {
            Some(line) => Ok(line?),
            None => Err(anyhow::anyhow!("Input ended unexpectedly")),
        }
    }

    fn read_pin(&mut self, prompt: &str) -> anyhow::Result<Zeroizing<String>> {
        if self.tty {
            return prompt_pin(prompt);
        }

        let mut pad = PinPad::new();
        loop {
            print!("{} {} ", prompt, pad.masked());
            io::stdout().flush()?;
            let line = Zeroizing::new(self.next_line()?);
            match pad.feed(&line) {
                Ok(Some(pin)) => {
                    println!();
                    return Ok(pin);
                }
                Ok(None) => continue,
                Err(e) => return Err(CliError::invalid_input(e.to_string()).into()),
            }
        }
    }

    fn read_new_pin(&mut self) -> anyhow::Result<Zeroizing<String>> {
        if self.tty {
            return prompt_new_pin(env_vars::NEW_PIN, true);
        }
        self.read_pin("New PIN")
    }
}

fn respond(response: PinResponse) -> anyhow::Result<()> {
    match response {
        PinResponse::Unlocked => println!("Unlocked."),
        PinResponse::AwaitingNewPin => println!("Current PIN confirmed."),
        PinResponse::PinChanged {
            reencrypted,
            skipped,
        } => {
            println!(
                "PIN changed. {} note(s) re-encrypted, {} skipped.",
                reencrypted, skipped
            );
        }
        PinResponse::Rejected(e) => return Err(CliError::from_rejection(&e).into()),
    }
    Ok(())
}

fn parse_id(value: &str) -> anyhow::Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| {
            CliError::invalid_input(format!("Expected a numeric id, got \"{}\"", value)).into()
        })
}
