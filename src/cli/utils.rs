//! Shared utilities for CLI commands

use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::error::CliResult;

pub const JSON: &str = "json";

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Placeholder for absent optional values.
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}

/// A styled table, or `empty` when there are no rows.
pub fn render_rows<T: Tabled>(rows: Vec<T>, empty: &str) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }
    let mut table = Table::new(rows);
    apply_table_style(&mut table);
    table.to_string()
}

/// Two-column key/value table for a single entity.
pub fn render_detail<'a>(fields: impl IntoIterator<Item = (&'a str, String)>) -> String {
    let mut builder = Builder::default();
    for (label, value) in fields {
        builder.push_record([label.to_string(), value]);
    }
    let mut table = builder.build();
    apply_table_style(&mut table);
    table.to_string()
}

/// Pretty JSON when `format` asks for it, otherwise the table `render` builds.
pub fn render<T: Serialize + ?Sized>(
    format: &str,
    value: &T,
    render: impl FnOnce() -> String,
) -> CliResult<String> {
    match format {
        JSON => Ok(serde_json::to_string_pretty(value)?),
        _ => Ok(render()),
    }
}
