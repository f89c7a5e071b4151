//! In-memory table with named columns.

use std::path::{Path, PathBuf};

use crate::LoadError;

/// A loaded table: a header row plus string cells.
///
/// Rows may be shorter than the header; missing trailing cells read as
/// empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table. `path` is only used in error messages.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            path: path.into(),
            headers,
            rows,
        }
    }

    /// The file this table was read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumn`] if no header matches.
    pub fn column_index(&self, name: &str) -> Result<usize, LoadError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: self.path.clone(),
                column: name.to_owned(),
            })
    }

    /// Cell text at `(row, column)`, or `""` when the row is short.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    /// Builds the [`LoadError::InvalidValue`] for a cell that failed to parse.
    #[must_use]
    pub fn invalid_value(&self, row: usize, column: usize, expected: &'static str) -> LoadError {
        LoadError::InvalidValue {
            path: self.path.clone(),
            row: row + 1,
            column: self.headers.get(column).cloned().unwrap_or_default(),
            value: self.cell(row, column).to_owned(),
            expected,
        }
    }
}
