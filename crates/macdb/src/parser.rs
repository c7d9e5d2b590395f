//! Positional parser for tabular CLI output.
//!
//! Switch CLIs print MAC, ARP and interface tables as whitespace-aligned
//! text. Each table is described by a [`TableSpec`]: how many banner lines
//! precede the data, which column each token belongs to, and which lines to
//! ignore. Parsing is then a whitespace split zipped against the column list.
//!
//! ```text
//!   command output ──> rewrite ──> drop blank lines ──> skip header
//!                                                         │
//!                     RawRecord <── zip(columns) <── split_whitespace
//! ```

use crate::error::{MacdbError, Result};
use crate::record::RawRecord;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// Column names shared across vendors.
pub const COL_MAC: &str = "mac";
pub const COL_PORT: &str = "port";
pub const COL_TYPE: &str = "type";
pub const COL_IP: &str = "ip";
pub const COL_DESCRIPTION: &str = "description";

/// Layout of one device table.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Table name used in logs
    pub name: &'static str,
    /// Non-blank banner lines before the first data row
    pub header_lines: usize,
    /// Column names, in print order
    pub columns: &'static [&'static str],
    /// Last column takes every remaining token (free text with spaces)
    pub rest_column: bool,
    /// Whole-text rewrite applied before splitting
    pub rewrite: Option<fn(&str) -> Cow<'_, str>>,
    /// Data lines matching this predicate are ignored
    pub skip_line: fn(&str) -> bool,
}

/// Default line filter: separator rules such as `----  --------`.
pub fn is_rule_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '+' | '=' | ' '))
}

/// Parse `text` into one record per data line.
pub fn parse_table(text: &str, spec: &TableSpec) -> Vec<RawRecord> {
    let text = match spec.rewrite {
        Some(rewrite) => rewrite(text),
        None => Cow::Borrowed(text),
    };

    let records: Vec<RawRecord> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .skip(spec.header_lines)
        .filter(|line| !(spec.skip_line)(line))
        .map(|line| split_row(line, spec))
        .collect();

    debug!(table = spec.name, rows = records.len(), "Parsed table");
    records
}

fn split_row(line: &str, spec: &TableSpec) -> RawRecord {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let columns = spec.columns;

    if spec.rest_column && tokens.len() > columns.len() && !columns.is_empty() {
        let fixed = columns.len() - 1;
        let mut record: RawRecord = columns[..fixed]
            .iter()
            .copied()
            .zip(tokens[..fixed].iter().copied())
            .collect();
        record.insert(columns[fixed], tokens[fixed..].join(" "));
        return record;
    }

    columns.iter().copied().zip(tokens).collect()
}

/// Port name to description, built from an interface description table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortDescriptions {
    by_port: HashMap<String, String>,
}

impl PortDescriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `port` / `description` pairs; a port row without a
    /// description maps to the empty string.
    pub fn from_records(records: &[RawRecord]) -> Self {
        let mut descriptions = Self::new();
        for record in records {
            if let Some(port) = record.get(COL_PORT) {
                descriptions.insert(port, record.get(COL_DESCRIPTION).unwrap_or_default());
            }
        }
        descriptions
    }

    pub fn insert(&mut self, port: impl Into<String>, description: impl Into<String>) {
        self.by_port.insert(port.into(), description.into());
    }

    /// Description for an exact port-name match.
    pub fn describe(&self, port: &str) -> Result<String> {
        self.by_port
            .get(port)
            .cloned()
            .ok_or_else(|| MacdbError::PortNotFound(port.to_string()))
    }

    pub fn len(&self) -> usize {
        self.by_port.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_port.is_empty()
    }
}
