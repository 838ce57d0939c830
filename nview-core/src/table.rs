//! In-memory result table
//!
//! Rows are stored under the active data-column schema. Building the output
//! always runs in the same order: filter, project, de-duplicate, serialize.
//! Projection comes after filtering, so a filter may reference a column that
//! is not displayed.

use crate::error::Result;
use crate::filter::Filter;
use crate::types::{Column, FlatRow};
use std::collections::HashSet;
use tracing::debug;

/// Default output field separator
pub const DEFAULT_CSV_SEPARATOR: char = '\t';

/// Ordered rows sharing one column schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<FlatRow>,
}

impl Table {
    /// Creates a table; every row must have one value per column
    pub fn new(columns: Vec<Column>, rows: Vec<FlatRow>) -> Self {
        debug_assert!(
            rows.iter().all(|r| r.len() == columns.len()),
            "row width does not match the {}-column schema",
            columns.len()
        );
        Self { columns, rows }
    }

    /// Column schema
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only rows matching `filter`
    ///
    /// The filter must have been parsed against this table's columns.
    pub fn filter(mut self, filter: &Filter) -> Self {
        self.rows.retain(|row| filter.matches(row));
        self
    }

    /// Keeps only `columns`, in the given order
    ///
    /// Columns not present in the table are ignored.
    pub fn project(self, columns: &[Column]) -> Self {
        let indices: Vec<(Column, usize)> = columns
            .iter()
            .filter_map(|c| self.columns.iter().position(|own| own == c).map(|i| (*c, i)))
            .collect();

        let rows: Vec<FlatRow> = self
            .rows
            .into_iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|(_, i)| row.values()[*i].clone())
                    .collect::<FlatRow>()
            })
            .collect();

        Self {
            columns: indices.into_iter().map(|(c, _)| c).collect(),
            rows,
        }
    }

    /// Removes exact duplicate rows, keeping the first occurrence
    pub fn drop_duplicates(mut self) -> Self {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
        self
    }

    /// Serializes as delimited text with a header row
    ///
    /// Fields containing the separator, quotes or line breaks are quoted.
    /// Lines end with `\n`.
    pub fn to_csv(&self, separator: u8) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(separator)
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.columns.iter().map(|c| c.name()))?;
        for row in &self.rows {
            writer.write_record(row.values())?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Builds the output text from collected rows
///
/// `filter` must have been parsed against `data_columns`.
pub fn build(
    rows: Vec<FlatRow>,
    data_columns: &[Column],
    view_columns: &[Column],
    filter: Option<&Filter>,
    separator: u8,
) -> Result<String> {
    let mut table = Table::new(data_columns.to_vec(), rows);
    debug!("table: {} row(s) collected", table.len());

    if let Some(filter) = filter {
        table = table.filter(filter);
        debug!("table: {} row(s) after filter", table.len());
    }

    let table = table.project(view_columns).drop_duplicates();
    debug!("table: {} row(s) after de-duplication", table.len());

    table.to_csv(separator)
}
