//! Delimited-text file loader.
//!
//! Reads the whole file, decodes it from the configured text encoding,
//! parses it with the first row as headers, and returns every row as
//! trimmed strings.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use encoding_rs::{EUC_KR, Encoding, UTF_8};

use crate::{LoadError, Table, TableLoader};

/// Looks up a text encoding by label.
///
/// Accepts the WHATWG labels (`utf-8`, `euc-kr`, `windows-949`, ...) plus
/// `cp949`, the name Korean public-data portals use for their exports.
#[must_use]
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    if label.eq_ignore_ascii_case("cp949") {
        Some(EUC_KR)
    } else {
        Encoding::for_label(label.as_bytes())
    }
}

/// Loader that reads a CSV file from disk on every call.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    /// Field delimiter byte (defaults to `,`).
    delimiter: u8,
    /// Text encoding of the file (defaults to UTF-8).
    encoding: &'static Encoding,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    /// Creates a comma-delimited UTF-8 loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            encoding: UTF_8,
        }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the text encoding, e.g. [`encoding_rs::EUC_KR`] for cp949
    /// exports.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn decode<'a>(&self, path: &Path, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>, LoadError> {
        if self.encoding == UTF_8 {
            return Ok(Cow::Borrowed(bytes));
        }
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| Cow::Owned(text.into_owned().into_bytes()))
            .ok_or_else(|| LoadError::Encoding {
                path: path.to_path_buf(),
                encoding: self.encoding.name(),
            })
    }

    /// Parses an in-memory CSV document. `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Encoding`] if the bytes are not valid in the
    /// configured encoding, [`LoadError::Csv`] if they are not valid CSV, or
    /// [`LoadError::MissingHeader`] if there is no header row.
    pub fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Table, LoadError> {
        let bytes = self.decode(path, bytes)?;
        let csv_err = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(bytes.as_ref());

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                // Spreadsheet exports often start with a UTF-8 BOM.
                let h = if i == 0 {
                    h.trim_start_matches('\u{feff}')
                } else {
                    h
                };
                h.trim().to_owned()
            })
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(LoadError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_err)?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(|cell| cell.trim().to_owned()).collect());
        }

        log::debug!(
            "Parsed {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            path.display()
        );

        Ok(Table::new(path, headers, rows))
    }
}

impl TableLoader for CsvLoader {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Read {} bytes from {}", bytes.len(), path.display());

        let table = self.parse(path, &bytes)?;
        log::info!("Loaded {} rows from {}", table.len(), path.display());
        Ok(Arc::new(table))
    }
}
