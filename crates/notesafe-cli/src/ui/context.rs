//! Per-invocation display settings.

use std::io::IsTerminal;

use super::mode::{FormatFlag, OutputMode, Terminal};

const DEFAULT_WIDTH: usize = 80;

/// Display flags taken from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayFlags {
    pub json: bool,
    pub format: Option<FormatFlag>,
    pub no_color: bool,
    pub ascii: bool,
}

#[derive(Debug, Clone)]
pub struct UiContext {
    pub terminal: Terminal,
    pub color: bool,
    pub unicode: bool,
    pub width: usize,
    pub mode: OutputMode,
}

impl UiContext {
    /// Read the terminal and environment (`NO_COLOR`, `COLUMNS`).
    pub fn detect(flags: DisplayFlags) -> Self {
        let no_color_env = std::env::var_os("NO_COLOR").is_some();
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|cols| cols.trim().parse().ok());
        Self::build(flags, Terminal::detect(), no_color_env, columns)
    }

    fn build(
        flags: DisplayFlags,
        terminal: Terminal,
        no_color_env: bool,
        columns: Option<usize>,
    ) -> Self {
        Self {
            terminal,
            color: terminal.styled() && !flags.no_color && !no_color_env,
            unicode: !flags.ascii,
            width: columns.filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH),
            mode: OutputMode::pick(flags.json, flags.format, terminal),
        }
    }

    /// Fixed settings for unit tests.
    #[cfg(test)]
    pub fn fixed(mode: OutputMode) -> Self {
        Self {
            terminal: Terminal {
                tty: mode.is_pretty(),
                dumb: false,
            },
            color: false,
            unicode: mode.is_pretty(),
            width: DEFAULT_WIDTH,
            mode,
        }
    }

    /// Prompts need a terminal on both ends.
    pub fn is_interactive(&self) -> bool {
        self.terminal.tty && std::io::stdin().is_terminal()
    }
}
