#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input loading for the district safety report.
//!
//! A [`TableLoader`] turns a file path into a [`Table`] of named string
//! columns. [`CsvLoader`] reads delimited text in UTF-8 or a legacy Korean
//! encoding, [`XlsxLoader`] reads the first worksheet of a spreadsheet
//! workbook, and [`FileLoader`] picks between them by file extension.
//! [`CachedLoader`] wraps any loader and memoizes tables by path for the
//! lifetime of the process. The [`records`] module converts tables into the typed records
//! from [`safety_map_models`].
//!
//! There is no retry and no partial loading: a missing file, a missing
//! column, or an unparseable cell fails the whole load with a [`LoadError`].

pub mod cache;
pub mod csv_file;
pub mod file;
pub mod parsing;
pub mod records;
pub mod table;
pub mod xlsx;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use safety_map_models::RowShapeError;

pub use cache::CachedLoader;
pub use csv_file::{CsvLoader, encoding_for_label};
pub use file::FileLoader;
pub use records::ColumnNames;
pub use table::Table;
pub use xlsx::XlsxLoader;

/// Errors that can occur while loading an input table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid delimited text.
    #[error("failed to parse {}: {source}", .path.display())]
    Csv {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The file is not valid text in the configured encoding.
    #[error("{} is not valid {encoding} text", .path.display())]
    Encoding {
        /// File being decoded.
        path: PathBuf,
        /// Name of the configured encoding.
        encoding: &'static str,
    },

    /// The workbook could not be opened or its worksheet could not be read.
    #[error("failed to read workbook {}: {source}", .path.display())]
    Spreadsheet {
        /// Workbook path.
        path: PathBuf,
        /// Underlying workbook error.
        source: calamine::Error,
    },

    /// The workbook has no worksheets.
    #[error("{} has no worksheets", .path.display())]
    EmptyWorkbook {
        /// Workbook path.
        path: PathBuf,
    },

    /// The file has no header row.
    #[error("{} has no header row", .path.display())]
    MissingHeader {
        /// File without headers.
        path: PathBuf,
    },

    /// A required column is absent from the header row.
    #[error("{} has no column named '{column}'", .path.display())]
    MissingColumn {
        /// File being read.
        path: PathBuf,
        /// The missing column name.
        column: String,
    },

    /// A cell could not be parsed into the expected type.
    #[error(
        "{} row {row}, column '{column}': cannot parse '{value}' as {expected}",
        .path.display()
    )]
    InvalidValue {
        /// File being read.
        path: PathBuf,
        /// One-based data row number (the header row is not counted).
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell text.
        value: String,
        /// What the cell was expected to contain.
        expected: &'static str,
    },

    /// A row of the hourly table does not have one count per hour bucket.
    #[error("{} row {row}: {source}", .path.display())]
    RowShape {
        /// File being read.
        path: PathBuf,
        /// One-based data row number.
        row: usize,
        /// The rejected row's shape.
        #[source]
        source: RowShapeError,
    },
}

/// Loads a file into a [`Table`].
///
/// Implementations must be `Send + Sync` so a single loader (and its cache)
/// can be shared across server workers.
pub trait TableLoader: Send + Sync {
    /// Loads the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file is missing or malformed.
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError>;
}

impl<L: TableLoader + ?Sized> TableLoader for Arc<L> {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        (**self).load(path)
    }
}

impl<L: TableLoader + ?Sized> TableLoader for &L {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        (**self).load(path)
    }
}
