//! Extension-based loader selection.

use std::path::Path;
use std::sync::Arc;

use crate::{CsvLoader, LoadError, Table, TableLoader, XlsxLoader};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Loader that reads spreadsheet workbooks with an [`XlsxLoader`] and
/// everything else with a [`CsvLoader`].
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    csv: CsvLoader,
    spreadsheet: XlsxLoader,
}

impl FileLoader {
    /// Creates a loader from its two halves.
    #[must_use]
    pub const fn new(csv: CsvLoader, spreadsheet: XlsxLoader) -> Self {
        Self { csv, spreadsheet }
    }

    /// Whether `path` names a spreadsheet workbook.
    #[must_use]
    pub fn is_spreadsheet(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                SPREADSHEET_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
    }
}

impl TableLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Arc<Table>, LoadError> {
        if Self::is_spreadsheet(path) {
            self.spreadsheet.load(path)
        } else {
            self.csv.load(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::*;

    #[test]
    fn recognizes_spreadsheet_extensions() {
        assert!(FileLoader::is_spreadsheet(Path::new("grades.xlsx")));
        assert!(FileLoader::is_spreadsheet(Path::new("GRADES.XLS")));
        assert!(FileLoader::is_spreadsheet(Path::new("data/grades.ods")));
        assert!(!FileLoader::is_spreadsheet(Path::new("grades.csv")));
        assert!(!FileLoader::is_spreadsheet(Path::new("grades")));
    }

    #[test]
    fn dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let xlsx = dir.path().join("cctv.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "위도").unwrap();
        sheet.write_string(0, 1, "경도").unwrap();
        sheet.write_number(1, 0, 35.18).unwrap();
        sheet.write_number(1, 1, 128.1).unwrap();
        workbook.save(&xlsx).unwrap();

        let csv = dir.path().join("lamp.csv");
        std::fs::write(&csv, "위도,경도\n35.17,128.09\n35.19,128.11\n").unwrap();

        let loader = FileLoader::default();
        let from_xlsx = loader.load(&xlsx).unwrap();
        assert_eq!(from_xlsx.headers(), ["위도", "경도"]);
        assert_eq!(from_xlsx.cell(0, 0), "35.18");

        let from_csv = loader.load(&csv).unwrap();
        assert_eq!(from_csv.len(), 2);
    }
}
