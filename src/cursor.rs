//! Terminal cursor helpers for composing ANSI sequences.
//!
//! The renderer writes zones with absolute positioning; these helpers keep
//! the escape codes in one place. Rows and columns are 0-based here and
//! converted to the 1-based form terminals expect.

const CSI: &str = "\x1b[";

/// Move the cursor to a 0-based `row` and `column`.
pub fn move_to(row: u16, column: u16) -> String {
    format!(
        "{CSI}{};{}H",
        row.saturating_add(1),
        column.saturating_add(1)
    )
}

/// Hide the cursor.
pub fn hide() -> &'static str {
    "\x1b[?25l"
}

/// Show the cursor.
pub fn show() -> &'static str {
    "\x1b[?25h"
}

/// Reset all text attributes.
pub fn reset_style() -> &'static str {
    "\x1b[0m"
}

/// Reverse video, used for the caret and selections.
pub fn reverse() -> &'static str {
    "\x1b[7m"
}

/// Dim text, used for line numbers and hints.
pub fn dim() -> &'static str {
    "\x1b[2m"
}

/// Bold text, used for pane titles.
pub fn bold() -> &'static str {
    "\x1b[1m"
}
