//! NoteSafe CLI - PIN-protected encrypted notes
//!
//! This is the command-line interface for NoteSafe. It provides one-shot
//! commands and an interactive shell on top of the core library.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod ui;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{folders, init, misc, notes, pin, shell, status};
use crate::constants::{env_vars, DEFAULT_LOG_FILTER};
use crate::errors::exit_code_for;
use crate::ui::print_error;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli) {
        let ui_ctx = ctx.ui_context();

        let error_msg = format!("{:#}", e);
        let (message, hint) = split_error_hint(&error_msg);
        let hint = hint.or_else(|| contextual_hint(&error_msg));

        print_error(&ui_ctx, message, hint.as_deref());
        std::process::exit(exit_code_for(&e));
    }
}

/// Log to stderr, filtered by NOTESAFE_LOG, so stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(env_vars::LOG)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Split a trailing "Hint: ..." line off an error message.
fn split_error_hint(error: &str) -> (&str, Option<String>) {
    for marker in ["\nHint:", "\nhint:"] {
        if let Some(idx) = error.find(marker) {
            return (&error[..idx], Some(error[idx + 1..].to_string()));
        }
    }
    (error, None)
}

/// Provide hints for common error patterns.
fn contextual_hint(error: &str) -> Option<String> {
    let error_lower = error.to_lowercase();

    if error_lower.contains("note not found") {
        return Some("Hint: Run `notesafe list` to find note IDs.".to_string());
    }

    if error_lower.contains("folder not found") {
        return Some("Hint: Run `notesafe folder list` to see folder IDs.".to_string());
    }

    if error_lower.contains("default folder") {
        return Some("Hint: The General folder always exists; delete its notes instead.".to_string());
    }

    if error_lower.contains("incorrect pin") {
        return Some(
            "Hint: Forgot the PIN? `notesafe reset` erases the vault so you can start over."
                .to_string(),
        );
    }

    if error_lower.contains("vault is locked") {
        return Some("Hint: Set NOTESAFE_PIN or run the command from a terminal.".to_string());
    }

    None
}

fn run(ctx: &AppContext, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args),
        Some(Commands::Status(args)) => status::handle_status(ctx, args),
        Some(Commands::Folder { command }) => folders::handle_folder(ctx, command),
        Some(Commands::Add(args)) => notes::handle_add(ctx, args),
        Some(Commands::List(args)) => notes::handle_list(ctx, args),
        Some(Commands::Search(args)) => notes::handle_search(ctx, args),
        Some(Commands::Show(args)) => notes::handle_show(ctx, args),
        Some(Commands::Edit(args)) => notes::handle_edit(ctx, args),
        Some(Commands::Delete(args)) => notes::handle_delete(ctx, args),
        Some(Commands::ChangePin) => pin::handle_change_pin(ctx),
        Some(Commands::Reset(args)) => pin::handle_reset(ctx, args.yes),
        Some(Commands::Shell) => shell::handle_shell(ctx),
        Some(Commands::Completions { shell }) => misc::handle_completions(*shell),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}
