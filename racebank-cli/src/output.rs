//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled key/value table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Verdict cell: red when corrupted, green otherwise
pub fn verdict_cell(corrupted: bool) -> Cell {
    if corrupted {
        Cell::new("CORRUPTED").fg(Color::Red)
    } else {
        Cell::new("CONSISTENT").fg(Color::Green)
    }
}

/// Print a scenario verdict line
pub fn verdict(corrupted: bool, detail: &str) {
    if corrupted {
        warning(&format!("Race detected: {}", detail));
    } else {
        success(&format!("No race observed: {}", detail));
    }
}
