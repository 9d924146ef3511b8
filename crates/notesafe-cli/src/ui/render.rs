//! Building output text for each mode.
//!
//! Pretty output is styled for a terminal. Plain output is `key=value`
//! lines and tab-separated rows so scripts can cut it apart. Nothing here
//! prints in JSON mode; commands serialize their own JSON.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, NOTHING, UTF8_FULL};
use comfy_table::{Attribute, Cell, ContentArrangement, Table};

use super::context::UiContext;
use super::mode::OutputMode;
use super::theme::{styled, styles, Badge};

/// Table borders for pretty output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStyle {
    /// Full borders, for short listings like folders
    Boxed,
    /// No borders and dim headers, for note listings
    Bare,
}

pub fn header(ctx: &UiContext, command: &str, context: Option<&str>) -> String {
    let title = match ctx.mode {
        OutputMode::Json => return String::new(),
        OutputMode::Plain => return format!("notesafe {}", command),
        OutputMode::Pretty => styled("NoteSafe", styles::bold(), ctx.color),
    };
    let mut line = format!("{} \u{00B7} {}", title, command);
    if let Some(context) = context {
        line.push_str(&format!(" ({})", context));
    }
    line
}

pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let mark = styled(kind.display(ctx.unicode), kind.style(), ctx.color);
    if message.is_empty() {
        mark
    } else {
        format!("{} {}", mark, message)
    }
}

/// "Key: value" when pretty, "key=value" otherwise.
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    if !ctx.mode.is_pretty() {
        return format!("{}={}", plain_key(key), value);
    }
    format!("{} {}", styled(&format!("{}:", key), styles::dim(), ctx.color), value)
}

fn plain_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "_")
}

pub fn hint(ctx: &UiContext, text: &str) -> String {
    let text = strip_hint_label(text);
    if ctx.mode.is_pretty() {
        format!("{} {}", styled("Hint:", styles::dim(), ctx.color), text)
    } else {
        format!("hint={}", text)
    }
}

fn strip_hint_label(text: &str) -> &str {
    let trimmed = text.trim_start();
    trimmed
        .strip_prefix("Hint:")
        .or_else(|| trimmed.strip_prefix("hint:"))
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

/// Summary printed after a successful change.
pub fn receipt(ctx: &UiContext, title: &str, items: &[(&str, &str)]) -> String {
    let (first, indent) = if ctx.mode.is_pretty() {
        (badge(ctx, Badge::Ok, title), "  ")
    } else {
        ("status=ok".to_string(), "")
    };

    std::iter::once(first)
        .chain(
            items
                .iter()
                .map(|(key, value)| format!("{}{}", indent, kv(ctx, key, value))),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty mode draws a table. Plain mode drops the header and joins each
/// row's cells with tabs.
pub fn table(ctx: &UiContext, style: TableStyle, headers: &[&str], rows: &[Vec<String>]) -> String {
    if !ctx.mode.is_pretty() {
        return rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(u16::try_from(ctx.width).unwrap_or(u16::MAX));

    match style {
        TableStyle::Boxed => {
            if ctx.unicode {
                table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
            } else {
                table.load_preset(ASCII_MARKDOWN);
            }
            table.set_header(headers.to_vec());
        }
        TableStyle::Bare => {
            table.load_preset(NOTHING);
            table.set_header(headers.iter().map(|h| {
                let cell = Cell::new(h);
                if ctx.color {
                    cell.add_attribute(Attribute::Dim)
                } else {
                    cell
                }
            }));
            for column in table.column_iter_mut() {
                column.set_padding((0, 2));
            }
        }
    }

    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}

/// Print to stdout unless the command is producing JSON.
pub fn print(ctx: &UiContext, message: &str) {
    if !ctx.mode.is_json() {
        println!("{}", message);
    }
}

pub fn blank_line(ctx: &UiContext) {
    if ctx.mode.is_pretty() {
        println!();
    }
}

fn error_message(ctx: &UiContext, message: &str, error_hint: Option<&str>) -> String {
    let first = if ctx.mode.is_pretty() {
        badge(ctx, Badge::Err, message)
    } else {
        format!("error={}", message)
    };
    match error_hint {
        Some(text) => format!("{}\n{}", first, hint(ctx, text)),
        None => first,
    }
}

/// Errors go to stderr in every mode, JSON included.
pub fn print_error(ctx: &UiContext, message: &str, error_hint: Option<&str>) {
    eprintln!("{}", error_message(ctx, message, error_hint));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_ctx() -> UiContext {
        UiContext::fixed(OutputMode::Plain)
    }

    fn pretty_ctx() -> UiContext {
        UiContext::fixed(OutputMode::Pretty)
    }

    #[test]
    fn test_header() {
        let pretty = header(&pretty_ctx(), "list", Some("General"));
        assert!(pretty.starts_with("NoteSafe"));
        assert!(pretty.ends_with("list (General)"));
        assert_eq!(header(&plain_ctx(), "list", None), "notesafe list");
        assert!(header(&UiContext::fixed(OutputMode::Json), "list", None).is_empty());
    }

    #[test]
    fn test_kv() {
        assert_eq!(kv(&plain_ctx(), "Notes removed", "3"), "notes_removed=3");
        assert_eq!(kv(&pretty_ctx(), "Folder", "Work"), "Folder: Work");
    }

    #[test]
    fn test_receipt() {
        let out = receipt(&plain_ctx(), "Note added", &[("ID", "4"), ("Folder", "General")]);
        assert_eq!(out, "status=ok\nid=4\nfolder=General");

        let out = receipt(&pretty_ctx(), "Note added", &[("ID", "4")]);
        assert!(out.contains("Note added"));
        assert!(out.ends_with("\n  ID: 4"));
    }

    #[test]
    fn test_plain_table_is_tab_separated() {
        let rows = vec![
            vec!["1".to_string(), "General".to_string()],
            vec!["2".to_string(), "Work".to_string()],
        ];
        for style in [TableStyle::Boxed, TableStyle::Bare] {
            let out = table(&plain_ctx(), style, &["ID", "NAME"], &rows);
            assert_eq!(out, "1\tGeneral\n2\tWork");
        }
    }

    #[test]
    fn test_pretty_table_has_headers() {
        let rows = vec![vec!["1".to_string(), "General".to_string()]];
        let out = table(&pretty_ctx(), TableStyle::Boxed, &["ID", "NAME"], &rows);
        assert!(out.contains("NAME"));
        assert!(out.contains("General"));
    }

    #[test]
    fn test_hint_label_not_doubled() {
        assert_eq!(
            error_message(&plain_ctx(), "Vault is locked", Some("Hint: Set NOTESAFE_PIN")),
            "error=Vault is locked\nhint=Set NOTESAFE_PIN"
        );
        assert_eq!(hint(&pretty_ctx(), "notesafe init"), "Hint: notesafe init");
    }
}
