//! Report configuration.
//!
//! Every field has a default, so an empty TOML file describes the Jinju
//! report with its standard input file names.

use std::path::{Path, PathBuf};

use safety_map_analytics::{DuplicateZonePolicy, HourlyOrder};
use safety_map_loader::{ColumnNames, CsvLoader, FileLoader, XlsxLoader, encoding_for_label};
use safety_map_render::{ChartOptions, MapOptions, PageContent};
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading a [`ReportConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The CSV delimiter is not a single-byte character.
    #[error("CSV delimiter must be a single ASCII character, got '{0}'")]
    Delimiter(char),

    /// The CSV encoding label is not recognized.
    #[error("unknown CSV encoding '{0}'")]
    Encoding(String),
}

/// Input file names, relative to [`ReportConfig::data_dir`] unless absolute.
///
/// Files ending in `.xlsx`, `.xlsm`, `.xlsb`, `.xls` or `.ods` are read as
/// spreadsheet workbooks; anything else is read as delimited text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    /// Zone risk grades.
    pub risk: PathBuf,
    /// Zone facility counts.
    pub facilities: PathBuf,
    /// Crime counts per category and hour bucket.
    pub hourly: PathBuf,
    /// CCTV coordinates.
    pub cctv_locations: PathBuf,
    /// Streetlight coordinates.
    pub lamp_locations: PathBuf,
    /// Field delimiter shared by every delimited-text input.
    pub delimiter: char,
    /// Text encoding shared by every delimited-text input, e.g. `utf-8` or
    /// `cp949`.
    pub encoding: String,
    /// Worksheet read from spreadsheet inputs. Defaults to the first one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            risk: PathBuf::from("jinju_crime_grade.csv"),
            facilities: PathBuf::from("jinju_cctv_lamp.csv"),
            hourly: PathBuf::from("crime_time.csv"),
            cctv_locations: PathBuf::from("jinju_cctv.csv"),
            lamp_locations: PathBuf::from("jinju_lamp.csv"),
            delimiter: ',',
            encoding: "utf-8".to_owned(),
            sheet: None,
        }
    }
}

/// Zone selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneSettings {
    /// Zones shown in the charts. Empty keeps every joined zone.
    pub allow_list: Vec<String>,
    /// Handling of zone names repeated within one table.
    pub duplicate_policy: DuplicateZonePolicy,
}

impl Default for ZoneSettings {
    fn default() -> Self {
        Self {
            allow_list: [
                "중앙동", "상봉동", "상대동", "하대동", "상평동", "초장동", "평거동", "신안동",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            duplicate_policy: DuplicateZonePolicy::default(),
        }
    }
}

/// Chart settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Size and axis scaling.
    #[serde(flatten)]
    pub options: ChartOptions,
    /// Order of the hourly chart's buckets.
    pub hourly_order: HourlyOrder,
}

/// Full report configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Page title.
    pub title: String,
    /// Directory the input file names are resolved against.
    pub data_dir: PathBuf,
    /// Directory holding intro images and marker icons.
    pub assets_dir: PathBuf,
    /// Input file names.
    pub inputs: InputFiles,
    /// Column names in the input files.
    pub columns: ColumnNames,
    /// Zone selection.
    pub zones: ZoneSettings,
    /// Chart settings.
    pub charts: ChartSettings,
    /// Map viewport and markers.
    pub map: MapOptions,
    /// Narrative text.
    pub page: PageContent,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "진주시 범죄".to_owned(),
            data_dir: PathBuf::from("data"),
            assets_dir: PathBuf::from("assets"),
            inputs: InputFiles::default(),
            columns: ColumnNames::default(),
            zones: ZoneSettings::default(),
            charts: ChartSettings::default(),
            map: MapOptions::default(),
            page: PageContent::default(),
        }
    }
}

impl ReportConfig {
    /// Parses a config from TOML text. Relative directories are kept as
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown value
    /// types, [`ConfigError::Delimiter`] for a multi-byte delimiter, and
    /// [`ConfigError::Encoding`] for an unknown encoding label.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.file_loader()?;
        Ok(config)
    }

    /// Reads a config file. Relative `data_dir` and `assets_dir` are
    /// resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(base) = path.parent() {
            config.data_dir = base.join(&config.data_dir);
            config.assets_dir = base.join(&config.assets_dir);
        }

        log::debug!(
            "Loaded config {} (data_dir={})",
            path.display(),
            config.data_dir.display()
        );
        Ok(config)
    }

    /// Resolves an input file name against [`Self::data_dir`].
    #[must_use]
    pub fn input_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.data_dir.join(file)
        }
    }

    /// The configured delimiter as a byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Delimiter`] if it is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        let c = self.inputs.delimiter;
        if c.is_ascii() {
            u8::try_from(c).map_err(|_| ConfigError::Delimiter(c))
        } else {
            Err(ConfigError::Delimiter(c))
        }
    }

    /// A [`FileLoader`] using the configured delimiter, encoding, and
    /// worksheet.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Delimiter`] if the delimiter is not ASCII, or
    /// [`ConfigError::Encoding`] if the encoding label is unknown.
    pub fn file_loader(&self) -> Result<FileLoader, ConfigError> {
        let encoding = encoding_for_label(&self.inputs.encoding)
            .ok_or_else(|| ConfigError::Encoding(self.inputs.encoding.clone()))?;
        let csv = CsvLoader::new()
            .with_delimiter(self.delimiter_byte()?)
            .with_encoding(encoding);
        let spreadsheet = match &self.inputs.sheet {
            Some(sheet) => XlsxLoader::new().with_sheet(sheet.clone()),
            None => XlsxLoader::new(),
        };
        Ok(FileLoader::new(csv, spreadsheet))
    }
}
