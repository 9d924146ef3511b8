//! Folder command handlers.

use notesafe_core::{NoteSafeError, StoreError};

use crate::app::AppContext;
use crate::cli::FolderSubcommand;
use crate::helpers::confirm;
use crate::output::{folder_json, folder_rows, FOLDER_HEADERS};
use crate::ui::{header, print, receipt, table, TableStyle};

pub fn handle_folder(ctx: &AppContext, command: &FolderSubcommand) -> anyhow::Result<()> {
    match command {
        FolderSubcommand::Create { name } => handle_create(ctx, name),
        FolderSubcommand::List => handle_list(ctx),
        FolderSubcommand::Delete { id, yes } => handle_delete(ctx, *id, *yes),
    }
}

fn handle_create(ctx: &AppContext, name: &str) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = ctx.unlock_vault()?;
    let folder = vault.create_folder(name)?;

    if ui.mode.is_json() {
        println!("{}", serde_json::to_string_pretty(&folder)?);
    } else if ctx.quiet() {
        println!("{}", folder.id);
    } else {
        let id = folder.id.to_string();
        print(
            &ui,
            &receipt(&ui, "Folder created", &[("ID", &id), ("Name", &folder.name)]),
        );
    }
    Ok(())
}

fn handle_list(ctx: &AppContext) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let vault = ctx.unlock_vault()?;
    let folders = vault.folders()?;

    if ui.mode.is_json() {
        let values: Vec<_> = folders.iter().map(folder_json).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if !ctx.quiet() {
        print(&ui, &header(&ui, "folders", None));
    }
    let rows = folder_rows(&folders);
    print(&ui, &table(&ui, TableStyle::Boxed, &FOLDER_HEADERS, &rows));
    Ok(())
}

fn handle_delete(ctx: &AppContext, id: i64, yes: bool) -> anyhow::Result<()> {
    let ui = ctx.ui_context();
    let mut vault = ctx.unlock_vault()?;
    let folder = vault.switch_folder(id)?;
    if folder.is_default() {
        return Err(NoteSafeError::from(StoreError::ProtectedFolder).into());
    }

    let prompt = format!("Delete folder \"{}\" and all its notes?", folder.name);
    if !confirm(&prompt, yes, ctx.interactive())? {
        print(&ui, "Cancelled.");
        return Ok(());
    }

    let removed = vault.delete_folder(id)?;

    if ui.mode.is_json() {
        let output = serde_json::json!({
            "status": "ok",
            "folder_id": id,
            "notes_removed": removed,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet() {
        let removed = removed.to_string();
        print(
            &ui,
            &receipt(
                &ui,
                "Folder deleted",
                &[("Name", &folder.name), ("Notes removed", &removed)],
            ),
        );
    }
    Ok(())
}
