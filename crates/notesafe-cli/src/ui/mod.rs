//! UI primitives for the NoteSafe CLI.
//!
//! This module provides:
//! - **Context**: Environment detection (TTY, width, color, unicode)
//! - **Mode**: Output mode resolution (json, plain, pretty)
//! - **Theme**: Badge tokens and text styles
//! - **Render**: Tables, headers, receipts, hints
//! - **Format**: String utilities (truncate, dates, sizes, countdowns)

mod context;
pub mod format;
pub mod mode;
pub mod render;
pub mod theme;

pub use context::{DisplayFlags, UiContext};
pub use theme::Badge;

pub use render::{
    badge, blank_line, header, hint, kv, print, print_error, receipt, table, TableStyle,
};

pub use format::{format_bytes, format_countdown, format_datetime, single_line, truncate};
