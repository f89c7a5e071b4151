//! Spreadsheet workbook loader.
//!
//! Reads one worksheet (the first unless a name is given) with its first
//! non-empty row as headers. Cells are rendered to text so the record
//! extractors parse spreadsheet and CSV inputs the same way.

use std::path::Path;
use std::sync::Arc;

use calamine::{Data, Reader as _, open_workbook_auto};

use crate::{LoadError, Table, TableLoader};

/// Loader that reads `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` files.
#[derive(Debug, Clone, Default)]
pub struct XlsxLoader {
    sheet: Option<String>,
}

impl XlsxLoader {
    /// Creates a loader that reads the first worksheet.
    #[must_use]
    pub const fn new() -> Self {
        Self { sheet: None }
    }

    /// Reads the worksheet named `sheet` instead of the first one.
    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_owned(),
        other => other.to_string().trim().to_owned(),
    }
}

impl TableLoader for XlsxLoader {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        let sheet_err = |source| LoadError::Spreadsheet {
            path: path.to_path_buf(),
            source,
        };

        let mut workbook = open_workbook_auto(path).map_err(sheet_err)?;
        let range = match &self.sheet {
            Some(name) => workbook.worksheet_range(name).map_err(sheet_err)?,
            None => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| LoadError::EmptyWorkbook {
                    path: path.to_path_buf(),
                })?
                .map_err(sheet_err)?,
        };

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.is_empty()));

        let headers = rows.next().ok_or_else(|| LoadError::MissingHeader {
            path: path.to_path_buf(),
        })?;
        let rows: Vec<Vec<String>> = rows.collect();

        log::info!(
            "Loaded {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            path.display()
        );
        Ok(Arc::new(Table::new(path, headers, rows)))
    }
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::*;

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("grades").unwrap();
        sheet.write_string(0, 0, "행정동").unwrap();
        sheet.write_string(0, 1, "위험등급").unwrap();
        sheet.write_string(1, 0, " 중앙동 ").unwrap();
        sheet.write_number(1, 1, 7).unwrap();
        sheet.write_string(3, 0, "상봉동").unwrap();
        sheet.write_number(3, 1, 9.5).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn reads_first_sheet_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.xlsx");
        write_workbook(&path);

        let table = XlsxLoader::new().load(&path).unwrap();
        assert_eq!(table.headers(), ["행정동", "위험등급"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), "중앙동");
        assert_eq!(table.cell(0, 1), "7");
        assert_eq!(table.cell(1, 1), "9.5");
    }

    #[test]
    fn reads_named_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grades.xlsx");
        write_workbook(&path);

        let table = XlsxLoader::new().with_sheet("grades").load(&path).unwrap();
        assert_eq!(table.len(), 2);

        let err = XlsxLoader::new().with_sheet("missing").load(&path).unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet { .. }));
    }

    #[test]
    fn missing_workbook_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = XlsxLoader::new()
            .load(&dir.path().join("nope.xlsx"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Spreadsheet { .. }));
        assert!(err.to_string().contains("nope.xlsx"));
    }
}
