//! Note command handlers.

use std::path::Path;

use notesafe_core::{NoteBody, NoteView};

use crate::app::{AppContext, CliVault};
use crate::cli::{AddArgs, DeleteArgs, EditArgs, ListArgs, SearchArgs, ShowArgs};
use crate::errors::CliError;
use crate::helpers::{confirm, read_attachment, read_note_text};
use crate::output::{
    attachment_label, note_json, note_rows, notes_json, NOTE_HEADERS, UNREADABLE,
};
use crate::ui::{
    blank_line, format_datetime, header, hint, kv, print, receipt, table, TableStyle, UiContext,
};

/// Unlock the vault and make `folder` active, if given.
fn unlock_in_folder(ctx: &AppContext, folder: Option<i64>) -> anyhow::Result<CliVault> {
    let mut vault = ctx.unlock_vault()?;
    if let Some(id) = folder {
        vault.switch_folder(id)?;
    }
    Ok(vault)
}

pub fn handle_add(ctx: &AppContext, args: &AddArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = unlock_in_folder(ctx, args.folder)?;
    let text = read_note_text(args.text.clone(), ctx.interactive())?;
    let attachment = args
        .attach
        .as_deref()
        .map(|path| read_attachment(Path::new(path)))
        .transpose()?;

    let note = vault.add_note(&text, attachment)?;
    let folder = vault.active_folder()?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&note_json(&note))?);
    } else if ctx.quiet() {
        println!("{}", note.id);
    } else {
        let id = note.id.to_string();
        let mut items = vec![("ID", id.as_str()), ("Folder", folder.name.as_str())];
        let label = attachment_label(note.attachment.as_ref());
        if note.attachment.is_some() {
            items.push(("Attachment", label.as_str()));
        }
        print(&ui, &receipt(&ui, "Note added", &items));
    }
    Ok(())
}

pub fn handle_list(ctx: &AppContext, args: &ListArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let vault = unlock_in_folder(ctx, args.folder)?;
    let folder = vault.active_folder()?;
    let notes = vault.notes()?;

    render_notes(ctx, &ui, "list", &folder.name, &notes, || {
        format!("No notes in {}.", folder.name)
    })
}

pub fn handle_search(ctx: &AppContext, args: &SearchArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let vault = unlock_in_folder(ctx, args.folder)?;
    let folder = vault.active_folder()?;
    let notes = vault.search(&args.term)?;

    render_notes(ctx, &ui, "search", &args.term, &notes, || {
        format!("No notes in {} match \"{}\".", folder.name, args.term)
    })
}

fn render_notes(
    ctx: &AppContext,
    ui: &UiContext,
    command: &str,
    context: &str,
    notes: &[NoteView],
    empty_message: impl FnOnce() -> String,
) -> anyhow::Result<()> {
    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&notes_json(notes))?);
        return Ok(());
    }

    if notes.is_empty() {
        if !ctx.quiet() {
            print(ui, &empty_message());
        }
        return Ok(());
    }

    if !ctx.quiet() {
        print(ui, &header(ui, command, Some(context)));
        blank_line(ui);
    }
    let rows = note_rows(ui, notes);
    print(ui, &table(ui, TableStyle::Bare, &NOTE_HEADERS, &rows));
    Ok(())
}

pub fn handle_show(ctx: &AppContext, args: &ShowArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let vault = ctx.unlock_vault()?;
    let note = vault.note(args.id)?;

    if let Some(dest) = args.save_attachment.as_deref() {
        let attachment = note.attachment.as_ref().ok_or_else(|| {
            CliError::not_found(
                format!("Note {} has no attachment", note.id),
                "Hint: Run `notesafe list` to see which notes have attachments.",
            )
        })?;
        std::fs::write(dest, &attachment.bytes)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", dest, e))?;
    }

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&note_json(&note))?);
        return Ok(());
    }

    if !ctx.quiet() {
        print(&ui, &kv(&ui, "ID", &note.id.to_string()));
        print(&ui, &kv(&ui, "Folder", &note.folder_id.to_string()));
        print(
            &ui,
            &kv(&ui, "Created", &format_datetime(&note.created_at, ui.mode.is_pretty())),
        );
        if note.attachment.is_some() {
            print(
                &ui,
                &kv(&ui, "Attachment", &attachment_label(note.attachment.as_ref())),
            );
        }
        if let Some(dest) = args.save_attachment.as_deref() {
            print(&ui, &kv(&ui, "Saved to", dest));
        }
        println!();
    }
    match &note.body {
        NoteBody::Text(text) => println!("{}", text),
        NoteBody::Unreadable => {
            println!("{}", UNREADABLE);
            print(
                &ui,
                &hint(&ui, "This note was encrypted under a different key."),
            );
        }
    }
    Ok(())
}

pub fn handle_edit(ctx: &AppContext, args: &EditArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = ctx.unlock_vault()?;
    // Fail on a bad id before asking for text
    vault.note(args.id)?;

    let text = read_note_text(args.text.clone(), ctx.interactive())?;
    let attachment = args
        .attach
        .as_deref()
        .map(|path| read_attachment(Path::new(path)))
        .transpose()?;
    vault.edit_note(args.id, &text, attachment)?;

    if ui.mode.is_json() {
        let note = vault.note(args.id)?;
        println!("{}", serde_json::to_string_pretty(&note_json(&note))?);
    } else if !ctx.quiet() {
        let id = args.id.to_string();
        print(&ui, &receipt(&ui, "Note updated", &[("ID", &id)]));
    }
    Ok(())
}

pub fn handle_delete(ctx: &AppContext, args: &DeleteArgs) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = ctx.unlock_vault()?;
    vault.note(args.id)?;

    if !confirm(&format!("Delete note {}?", args.id), args.yes, ctx.interactive())? {
        print(&ui, "Cancelled.");
        return Ok(());
    }
    vault.delete_note(args.id)?;

    if ui.mode.is_json() {
        let output = serde_json::json!({ "status": "ok", "id": args.id });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet() {
        let id = args.id.to_string();
        print(&ui, &receipt(&ui, "Note deleted", &[("ID", &id)]));
    }
    Ok(())
}
