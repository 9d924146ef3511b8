//! Input helper functions for the CLI.

use std::io::{self, IsTerminal, Read};
use std::path::Path;

use dialoguer::{Confirm, Input, Password};
use zeroize::Zeroizing;

use notesafe_core::crypto::PIN_LENGTH;
use notesafe_core::{Attachment, PinPad};

use crate::errors::CliError;

/// Read a PIN from the given environment variable, if set.
pub fn env_pin(var: &str) -> Option<Zeroizing<String>> {
    let value = Zeroizing::new(std::env::var(var).ok()?);
    if value.trim().is_empty() {
        return None;
    }
    Some(value)
}

/// Run raw input through a `PinPad`, accepting exactly one full PIN.
pub fn parse_pin(raw: &str) -> Result<Zeroizing<String>, CliError> {
    let entered = raw.chars().filter(|c| !c.is_whitespace()).count();
    if entered != PIN_LENGTH {
        return Err(CliError::invalid_input(format!(
            "PIN must be exactly {} digits",
            PIN_LENGTH
        )));
    }

    let mut pad = PinPad::new();
    match pad.feed(raw) {
        Ok(Some(pin)) => Ok(pin),
        Ok(None) => Err(CliError::invalid_input(format!(
            "PIN must be exactly {} digits",
            PIN_LENGTH
        ))),
        Err(e) => Err(CliError::invalid_input(e.to_string())),
    }
}

/// Prompt for a PIN with hidden input.
pub fn prompt_pin(prompt: &str) -> anyhow::Result<Zeroizing<String>> {
    let raw = Zeroizing::new(
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read PIN: {}", e))?,
    );
    Ok(parse_pin(&raw)?)
}

/// Prompt for a new PIN with confirmation, or read it from `env_var`.
pub fn prompt_new_pin(env_var: &str, interactive: bool) -> anyhow::Result<Zeroizing<String>> {
    if let Some(pin) = env_pin(env_var) {
        return Ok(parse_pin(&pin)?);
    }
    if !interactive {
        return Err(CliError::invalid_input(format!(
            "No PIN provided and no TTY available. Set {}.",
            env_var
        ))
        .into());
    }
    let raw = Zeroizing::new(
        Password::new()
            .with_prompt(format!("New {}-digit PIN", PIN_LENGTH))
            .with_confirmation("Confirm PIN", "PINs do not match")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read PIN: {}", e))?,
    );
    Ok(parse_pin(&raw)?)
}

/// Resolve note text from an argument, piped stdin, or an interactive prompt.
pub fn read_note_text(text: Option<String>, interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = text {
        return Ok(value);
    }

    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        return Ok(buffer.trim_end().to_string());
    }

    if !interactive {
        return Err(CliError::invalid_input("--no-input requires note text or stdin").into());
    }

    Input::<String>::new()
        .with_prompt("Note")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read note: {}", e))
}

/// Load a file as a note attachment.
pub fn read_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read attachment {}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "attachment".to_string());

    let attachment = Attachment::new(name, bytes);
    Ok(match guess_media_type(path) {
        Some(media_type) => attachment.with_media_type(media_type),
        None => attachment,
    })
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        _ => return None,
    };
    Some(media_type)
}

/// Ask before a destructive action. `--yes` skips the prompt.
pub fn confirm(prompt: &str, yes: bool, interactive: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    if !interactive {
        return Err(CliError::invalid_input("Refusing to continue without --yes").into());
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_parse_pin_accepts_four_digits() {
        assert_eq!(parse_pin("1234").unwrap().as_str(), "1234");
        assert_eq!(parse_pin(" 12 34 ").unwrap().as_str(), "1234");
    }

    #[test]
    fn test_parse_pin_rejects_wrong_length() {
        assert!(parse_pin("123").is_err());
        assert!(parse_pin("12345").is_err());
        assert!(parse_pin("").is_err());
    }

    #[test]
    fn test_parse_pin_rejects_letters() {
        let err = parse_pin("12a4").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_read_attachment_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PNG");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let attachment = read_attachment(&path).unwrap();
        assert_eq!(attachment.name, "scan.PNG");
        assert_eq!(attachment.media_type.as_deref(), Some("image/png"));
        assert_eq!(attachment.size(), 3);
    }

    #[test]
    fn test_read_attachment_unknown_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob");
        std::fs::write(&path, b"data").unwrap();
        assert!(read_attachment(&path).unwrap().media_type.is_none());
    }

    #[test]
    fn test_confirm_requires_yes_without_tty() {
        assert!(confirm("Delete?", true, false).unwrap());
        assert!(confirm("Delete?", false, false).is_err());
    }
}
