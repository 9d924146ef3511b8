//! Theme definitions for colors, symbols, and badges.

use owo_colors::{OwoColorize, Style};

/// Badge types for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ok,
    Warn,
    Err,
    Info,
}

impl Badge {
    /// Get badge with symbol for display.
    pub fn display(&self, unicode: bool) -> &'static str {
        match (self, unicode) {
            (Self::Ok, true) => "[\u{2713}]",   // [✓]
            (Self::Ok, false) => "[OK]",
            (Self::Warn, true) => "[\u{26A0}]", // [⚠]
            (Self::Warn, false) => "[WARN]",
            (Self::Err, true) => "[\u{2717}]",  // [✗]
            (Self::Err, false) => "[ERR]",
            (Self::Info, true) => "[\u{2139}]", // [ℹ]
            (Self::Info, false) => "[INFO]",
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Self::Ok => Style::new().green(),
            Self::Warn => Style::new().yellow(),
            Self::Err => Style::new().red(),
            Self::Info => Style::new().cyan(),
        }
    }
}

/// Named text styles.
pub mod styles {
    use owo_colors::Style;

    /// Labels and metadata
    pub fn dim() -> Style {
        Style::new().dimmed()
    }

    /// Titles and emphasized values
    pub fn bold() -> Style {
        Style::new().bold()
    }

    /// Countdown and lockout warnings
    pub fn warning() -> Style {
        Style::new().yellow().bold()
    }
}

/// Apply a style when color is enabled, otherwise return the text as is.
pub fn styled(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_display_ascii() {
        assert_eq!(Badge::Ok.display(false), "[OK]");
        assert_eq!(Badge::Err.display(false), "[ERR]");
    }

    #[test]
    fn test_badge_display_unicode() {
        assert_eq!(Badge::Ok.display(true), "[\u{2713}]");
    }

    #[test]
    fn test_styled_without_color_is_plain() {
        assert_eq!(styled("locked", styles::warning(), false), "locked");
    }

    #[test]
    fn test_styled_with_color_adds_escapes() {
        let out = styled("locked", styles::bold(), true);
        assert!(out.contains("locked"));
        assert!(out.contains('\u{1b}'));
    }
}
