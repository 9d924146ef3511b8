use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use notesafe_core::VERSION;

use crate::ui::mode::FormatFlag;

/// NoteSafe - PIN-protected encrypted notes
#[derive(Parser)]
#[command(name = "notesafe")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the vault file
    #[arg(short, long, global = true, env = "NOTESAFE_VAULT")]
    pub vault: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Output format
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    pub format: Option<FormatFlag>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols only
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the vault will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Failed attempts allowed before a lockout
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Lockout duration in seconds
    #[arg(long, value_name = "SECONDS")]
    pub lockout_seconds: Option<u64>,
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    /// Wait for an active lockout to expire, showing a countdown
    #[arg(long)]
    pub wait: bool,
}

/// Arguments for the `add` command
#[derive(Args)]
pub struct AddArgs {
    /// Note text (read from stdin when omitted)
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    /// Folder to add the note to
    #[arg(long, value_name = "ID")]
    pub folder: Option<i64>,

    /// Attach a file to the note
    #[arg(long, value_name = "PATH")]
    pub attach: Option<String>,
}

/// Arguments for the `list` command
#[derive(Args)]
pub struct ListArgs {
    /// Folder to list (defaults to General)
    #[arg(long, value_name = "ID")]
    pub folder: Option<i64>,
}

/// Arguments for the `search` command
#[derive(Args)]
pub struct SearchArgs {
    /// Text to look for (case-insensitive)
    #[arg(value_name = "TERM")]
    pub term: String,

    /// Folder to search (defaults to General)
    #[arg(long, value_name = "ID")]
    pub folder: Option<i64>,
}

/// Arguments for the `show` command
#[derive(Args)]
pub struct ShowArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Write the note's attachment to this path
    #[arg(long, value_name = "PATH")]
    pub save_attachment: Option<String>,
}

/// Arguments for the `edit` command
#[derive(Args)]
pub struct EditArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Replacement text (read from stdin when omitted)
    #[arg(value_name = "TEXT")]
    pub text: Option<String>,

    /// Replace the attachment with this file
    #[arg(long, value_name = "PATH")]
    pub attach: Option<String>,
}

/// Arguments for the `delete` command
#[derive(Args)]
pub struct DeleteArgs {
    /// Note ID
    #[arg(value_name = "ID")]
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `reset` command
#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum FolderSubcommand {
    /// Create a folder
    Create {
        /// Folder name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List folders with note counts
    List,

    /// Delete a folder and every note in it
    Delete {
        /// Folder ID
        #[arg(value_name = "ID")]
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new vault and set its PIN
    Init(InitArgs),

    /// Show whether the vault is set up, locked out, or ready
    Status(StatusArgs),

    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: FolderSubcommand,
    },

    /// Add a note
    Add(AddArgs),

    /// List notes in a folder
    List(ListArgs),

    /// Search notes in a folder
    Search(SearchArgs),

    /// Show a note by ID
    Show(ShowArgs),

    /// Replace a note's text
    Edit(EditArgs),

    /// Delete a note
    Delete(DeleteArgs),

    /// Change the PIN and re-encrypt every note
    ChangePin,

    /// Erase all notes and folders and forget the PIN
    Reset(ResetArgs),

    /// Start an interactive session
    Shell,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
