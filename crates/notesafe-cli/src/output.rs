//! JSON and table conversions for vault data.

use notesafe_core::{Attachment, FolderSummary, NoteBody, NoteView};

use crate::ui::{format_bytes, format_datetime, single_line, truncate, UiContext};

/// Placeholder shown for notes that cannot be decrypted.
pub const UNREADABLE: &str = "<unreadable>";

const PREVIEW_WIDTH: usize = 60;

pub const NOTE_HEADERS: [&str; 4] = ["ID", "CREATED", "NOTE", "ATTACHMENT"];
pub const FOLDER_HEADERS: [&str; 3] = ["ID", "NAME", "NOTES"];

pub fn attachment_json(attachment: &Attachment) -> serde_json::Value {
    serde_json::json!({
        "name": attachment.name,
        "media_type": attachment.media_type,
        "size": attachment.size(),
    })
}

pub fn note_json(note: &NoteView) -> serde_json::Value {
    serde_json::json!({
        "id": note.id,
        "folder_id": note.folder_id,
        "created_at": note.created_at.to_rfc3339(),
        "readable": matches!(note.body, NoteBody::Text(_)),
        "text": note.body.text(),
        "attachment": note.attachment.as_ref().map(attachment_json),
    })
}

pub fn notes_json(notes: &[NoteView]) -> serde_json::Value {
    serde_json::Value::Array(notes.iter().map(note_json).collect())
}

pub fn folder_json(summary: &FolderSummary) -> serde_json::Value {
    serde_json::json!({
        "id": summary.folder.id,
        "name": summary.folder.name,
        "note_count": summary.note_count,
    })
}

/// One-line preview of a note body.
pub fn preview(note: &NoteView) -> String {
    match &note.body {
        NoteBody::Text(text) => truncate(&single_line(text), PREVIEW_WIDTH),
        NoteBody::Unreadable => UNREADABLE.to_string(),
    }
}

/// Short attachment label, e.g. `scan.png (2.0 KB)`.
pub fn attachment_label(attachment: Option<&Attachment>) -> String {
    match attachment {
        Some(a) => format!("{} ({})", a.name, format_bytes(a.size() as u64)),
        None => "-".to_string(),
    }
}

pub fn note_rows(ui: &UiContext, notes: &[NoteView]) -> Vec<Vec<String>> {
    notes
        .iter()
        .map(|note| {
            vec![
                note.id.to_string(),
                format_datetime(&note.created_at, ui.mode.is_pretty()),
                preview(note),
                attachment_label(note.attachment.as_ref()),
            ]
        })
        .collect()
}

pub fn folder_rows(folders: &[FolderSummary]) -> Vec<Vec<String>> {
    folders
        .iter()
        .map(|summary| {
            vec![
                summary.folder.id.to_string(),
                summary.folder.name.clone(),
                summary.note_count.to_string(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use notesafe_core::Folder;

    fn view(body: NoteBody, attachment: Option<Attachment>) -> NoteView {
        NoteView {
            id: 7,
            folder_id: 1,
            created_at: Utc::now(),
            body,
            attachment,
        }
    }

    #[test]
    fn test_note_json_readable() {
        let note = view(
            NoteBody::Text("hello".to_string()),
            Some(Attachment::new("a.txt", vec![0; 4]).with_media_type("text/plain")),
        );
        let value = note_json(&note);
        assert_eq!(value["id"], 7);
        assert_eq!(value["readable"], true);
        assert_eq!(value["text"], "hello");
        assert_eq!(value["attachment"]["size"], 4);
        assert_eq!(value["attachment"]["media_type"], "text/plain");
    }

    #[test]
    fn test_note_json_unreadable_has_null_text() {
        let value = note_json(&view(NoteBody::Unreadable, None));
        assert_eq!(value["readable"], false);
        assert!(value["text"].is_null());
        assert!(value["attachment"].is_null());
    }

    #[test]
    fn test_preview_flattens_and_truncates() {
        let long = format!("first line\n{}", "x".repeat(100));
        let text = preview(&view(NoteBody::Text(long), None));
        assert!(text.starts_with("first line x"));
        assert_eq!(text.chars().count(), PREVIEW_WIDTH);
        assert_eq!(preview(&view(NoteBody::Unreadable, None)), UNREADABLE);
    }

    #[test]
    fn test_folder_json() {
        let summary = FolderSummary {
            folder: Folder {
                id: 2,
                name: "Work".to_string(),
            },
            note_count: 3,
        };
        let value = folder_json(&summary);
        assert_eq!(value["name"], "Work");
        assert_eq!(value["note_count"], 3);
        assert_eq!(folder_rows(&[summary])[0], vec!["2", "Work", "3"]);
    }
}
