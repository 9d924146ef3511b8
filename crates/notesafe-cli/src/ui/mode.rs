//! Picking how a command prints its results.

use clap::ValueEnum;

/// Value of `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatFlag {
    /// Tables and badges when the terminal allows it
    Table,
    /// key=value and tab-separated lines
    Plain,
    /// Same as --json
    Json,
}

/// What stdout is attached to.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminal {
    pub tty: bool,
    pub dumb: bool,
}

impl Terminal {
    pub fn detect() -> Self {
        use std::io::IsTerminal;

        Self {
            tty: std::io::stdout().is_terminal(),
            dumb: std::env::var("TERM").is_ok_and(|term| term == "dumb"),
        }
    }

    /// Styled output needs a real terminal.
    pub fn styled(&self) -> bool {
        self.tty && !self.dumb
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    Json,
    /// Stable for logs and scripts
    #[default]
    Plain,
    Pretty,
}

impl OutputMode {
    /// `--json` beats `--format`. Pretty output is only ever chosen for a
    /// styled terminal, even with `--format table`.
    pub fn pick(json: bool, format: Option<FormatFlag>, terminal: Terminal) -> Self {
        match (json, format) {
            (true, _) | (_, Some(FormatFlag::Json)) => Self::Json,
            (_, Some(FormatFlag::Plain)) => Self::Plain,
            _ if terminal.styled() => Self::Pretty,
            _ => Self::Plain,
        }
    }

    pub fn is_json(&self) -> bool {
        *self == Self::Json
    }

    pub fn is_pretty(&self) -> bool {
        *self == Self::Pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTY: Terminal = Terminal {
        tty: true,
        dumb: false,
    };
    const PIPE: Terminal = Terminal {
        tty: false,
        dumb: false,
    };

    #[test]
    fn test_json_flag_beats_format() {
        let mode = OutputMode::pick(true, Some(FormatFlag::Plain), TTY);
        assert_eq!(mode, OutputMode::Json);
        assert_eq!(OutputMode::pick(false, Some(FormatFlag::Json), PIPE), OutputMode::Json);
    }

    #[test]
    fn test_tty_defaults_to_pretty() {
        assert_eq!(OutputMode::pick(false, None, TTY), OutputMode::Pretty);
        assert_eq!(OutputMode::pick(false, Some(FormatFlag::Plain), TTY), OutputMode::Plain);
    }

    #[test]
    fn test_pipes_and_dumb_terminals_get_plain() {
        assert_eq!(OutputMode::pick(false, Some(FormatFlag::Table), PIPE), OutputMode::Plain);

        let dumb = Terminal {
            tty: true,
            dumb: true,
        };
        assert_eq!(OutputMode::pick(false, None, dumb), OutputMode::Plain);
    }
}
