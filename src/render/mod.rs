//! Result Rendering
//!
//! Result sets arrive from the connection as column names plus rows of JSON
//! values. Two renderers exist: a bordered table for the interactive prompt
//! and flat comma-delimited output for batch and file-multiplexed modes.

use std::io::{self, Write};

use comfy_table::{presets, Cell, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rows returned by a single query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column names in result order
    pub columns: Vec<String>,

    /// Result rows, one value per column
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// A result with no columns (e.g. a write without RETURN)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Output format used when rendering results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// Bordered table
    Table,
    /// Comma separated values with a header line
    Csv,
}

impl RenderFormat {
    /// Parse a `:format` argument
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

/// Rendering options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlags {
    /// Print `NULL` for null values instead of leaving the cell empty
    pub show_nulls: bool,
}

/// Render a result set to `out`
pub fn render(
    result: &ResultSet,
    out: &mut dyn Write,
    format: RenderFormat,
    flags: RenderFlags,
) -> io::Result<()> {
    if result.is_empty() {
        return Ok(());
    }
    match format {
        RenderFormat::Table => render_table(result, out, flags),
        RenderFormat::Csv => render_csv(result, out, flags),
    }
}

fn render_table(result: &ResultSet, out: &mut dyn Write, flags: RenderFlags) -> io::Result<()> {
    let mut table = Table::new();
    table
        .load_preset(presets::ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(result.columns.iter().map(Cell::new));

    for row in &result.rows {
        table.add_row(row.iter().map(|v| Cell::new(display_value(v, flags))));
    }

    writeln!(out, "{table}")?;
    let count = result.rows.len();
    writeln!(out, "{count} row{}", if count == 1 { "" } else { "s" })
}

fn render_csv(result: &ResultSet, out: &mut dyn Write, flags: RenderFlags) -> io::Result<()> {
    let header: Vec<String> = result.columns.iter().map(|c| escape_csv(c)).collect();
    writeln!(out, "{}", header.join(","))?;

    for row in &result.rows {
        let fields: Vec<String> =
            row.iter().map(|v| escape_csv(&display_value(v, flags))).collect();
        writeln!(out, "{}", fields.join(","))?;
    }
    Ok(())
}

/// Text shown for a single value
fn display_value(value: &Value, flags: RenderFlags) -> String {
    match value {
        Value::Null if flags.show_nulls => "NULL".to_string(),
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
