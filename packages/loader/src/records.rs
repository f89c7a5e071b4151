//! Typed record extraction.
//!
//! Each `*_from_table` function converts a loaded [`Table`] into model
//! records using the configured [`ColumnNames`]; each `load_*` function
//! loads the file through a [`TableLoader`] first.

use std::path::Path;

use safety_map_models::{
    FacilityKind, FacilityLocation, HourlyCrimeTable, ZoneFacilityRecord, ZoneRiskRecord,
};
use serde::{Deserialize, Serialize};

use crate::parsing::{parse_count, parse_lat_lng, parse_number};
use crate::{LoadError, Table, TableLoader};

/// Column names expected in the input files.
///
/// Defaults match the Korean public-data exports the report was built
/// against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Administrative-zone name; the join key of the risk and facility
    /// tables.
    pub zone: String,
    /// Risk grade in the risk table.
    pub risk_grade: String,
    /// CCTV count in the facility table.
    pub cctv: String,
    /// Streetlight count in the facility table.
    pub lamp: String,
    /// Crime category label in the hourly table. Every other column of that
    /// table is an hour bucket.
    pub hourly_category: String,
    /// Latitude in the location tables.
    pub latitude: String,
    /// Longitude in the location tables.
    pub longitude: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            zone: "행정동".to_owned(),
            risk_grade: "위험등급".to_owned(),
            cctv: "CCTV".to_owned(),
            lamp: "가로등".to_owned(),
            hourly_category: "범죄분류".to_owned(),
            latitude: "위도".to_owned(),
            longitude: "경도".to_owned(),
        }
    }
}

/// Iterates `(row_index, zone_name)` for rows with a non-empty zone name.
fn zone_rows(table: &Table, zone_col: usize) -> impl Iterator<Item = (usize, &str)> {
    (0..table.len()).filter_map(move |row| {
        let zone = table.cell(row, zone_col);
        if zone.is_empty() {
            log::warn!(
                "{} row {}: empty zone name, skipping",
                table.path().display(),
                row + 1
            );
            None
        } else {
            Some((row, zone))
        }
    })
}

/// Extracts risk grades from a table.
///
/// # Errors
///
/// Returns [`LoadError`] if a column is missing or a grade is not a number.
pub fn zone_risk_from_table(
    table: &Table,
    columns: &ColumnNames,
) -> Result<Vec<ZoneRiskRecord>, LoadError> {
    let zone_col = table.column_index(&columns.zone)?;
    let grade_col = table.column_index(&columns.risk_grade)?;

    zone_rows(table, zone_col)
        .map(|(row, zone)| {
            let risk_grade = parse_number(table.cell(row, grade_col))
                .ok_or_else(|| table.invalid_value(row, grade_col, "a risk grade"))?;
            Ok(ZoneRiskRecord {
                zone_name: zone.to_owned(),
                risk_grade,
            })
        })
        .collect()
}

/// Extracts facility counts from a table.
///
/// # Errors
///
/// Returns [`LoadError`] if a column is missing or a count is not a
/// non-negative integer.
pub fn zone_facilities_from_table(
    table: &Table,
    columns: &ColumnNames,
) -> Result<Vec<ZoneFacilityRecord>, LoadError> {
    let zone_col = table.column_index(&columns.zone)?;
    let cctv_col = table.column_index(&columns.cctv)?;
    let lamp_col = table.column_index(&columns.lamp)?;

    let count = |row: usize, col: usize| {
        parse_count(table.cell(row, col)).ok_or_else(|| table.invalid_value(row, col, "a count"))
    };

    zone_rows(table, zone_col)
        .map(|(row, zone)| {
            Ok(ZoneFacilityRecord {
                zone_name: zone.to_owned(),
                cctv_count: count(row, cctv_col)?,
                lamp_count: count(row, lamp_col)?,
            })
        })
        .collect()
}

/// Extracts the per-category hourly table.
///
/// The category column labels each row; every other column is an hour
/// bucket, kept in file order.
///
/// # Errors
///
/// Returns [`LoadError`] if the category column is missing or a count is
/// not a non-negative integer, and [`LoadError::RowShape`] if a row cannot
/// be added to the table.
pub fn hourly_crime_from_table(
    table: &Table,
    columns: &ColumnNames,
) -> Result<HourlyCrimeTable, LoadError> {
    let category_col = table.column_index(&columns.hourly_category)?;
    let bucket_cols: Vec<usize> = (0..table.headers().len())
        .filter(|col| *col != category_col && !table.headers()[*col].is_empty())
        .collect();

    let mut hourly = HourlyCrimeTable::new(
        bucket_cols
            .iter()
            .map(|col| table.headers()[*col].clone())
            .collect(),
    );

    for row in 0..table.len() {
        let counts = bucket_cols
            .iter()
            .map(|col| {
                parse_count(table.cell(row, *col))
                    .ok_or_else(|| table.invalid_value(row, *col, "a count"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        hourly
            .push_row(table.cell(row, category_col), counts)
            .map_err(|source| LoadError::RowShape {
                path: table.path().to_path_buf(),
                row: row + 1,
                source,
            })?;
    }

    Ok(hourly)
}

/// Extracts facility coordinates, tagging every row with `kind`.
///
/// # Errors
///
/// Returns [`LoadError`] if a coordinate column is missing or a row does
/// not hold a valid, non-zero latitude/longitude pair.
pub fn facility_locations_from_table(
    table: &Table,
    columns: &ColumnNames,
    kind: FacilityKind,
) -> Result<Vec<FacilityLocation>, LoadError> {
    let lat_col = table.column_index(&columns.latitude)?;
    let lng_col = table.column_index(&columns.longitude)?;

    (0..table.len())
        .map(|row| {
            let (latitude, longitude) =
                parse_lat_lng(table.cell(row, lat_col), table.cell(row, lng_col)).ok_or_else(
                    || {
                        let bad_col = if parse_lat_lng(table.cell(row, lat_col), "1").is_none() {
                            lat_col
                        } else {
                            lng_col
                        };
                        table.invalid_value(row, bad_col, "a coordinate")
                    },
                )?;
            Ok(FacilityLocation {
                latitude,
                longitude,
                kind,
            })
        })
        .collect()
}

/// Loads risk grades from `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be loaded or parsed.
pub fn load_zone_risk(
    loader: &(impl TableLoader + ?Sized),
    path: &Path,
    columns: &ColumnNames,
) -> Result<Vec<ZoneRiskRecord>, LoadError> {
    zone_risk_from_table(&*loader.load(path)?, columns)
}

/// Loads facility counts from `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be loaded or parsed.
pub fn load_zone_facilities(
    loader: &(impl TableLoader + ?Sized),
    path: &Path,
    columns: &ColumnNames,
) -> Result<Vec<ZoneFacilityRecord>, LoadError> {
    zone_facilities_from_table(&*loader.load(path)?, columns)
}

/// Loads the hourly crime table from `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be loaded or parsed.
pub fn load_hourly_crime(
    loader: &(impl TableLoader + ?Sized),
    path: &Path,
    columns: &ColumnNames,
) -> Result<HourlyCrimeTable, LoadError> {
    hourly_crime_from_table(&*loader.load(path)?, columns)
}

/// Loads facility coordinates of one `kind` from `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be loaded or parsed.
pub fn load_facility_locations(
    loader: &(impl TableLoader + ?Sized),
    path: &Path,
    columns: &ColumnNames,
    kind: FacilityKind,
) -> Result<Vec<FacilityLocation>, LoadError> {
    facility_locations_from_table(&*loader.load(path)?, columns, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            "test.csv",
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| (*c).to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn extracts_risk_grades() {
        let t = table(
            &["행정동", "위험등급"],
            &[&["중앙동", "7"], &["", "3"], &["상봉동", "9.5"]],
        );
        let records = zone_risk_from_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].zone_name, "중앙동");
        assert!((records[1].risk_grade - 9.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_risk_column_fails() {
        let t = table(&["행정동", "등급"], &[&["중앙동", "7"]]);
        let err = zone_risk_from_table(&t, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "위험등급"));
    }

    #[test]
    fn non_numeric_grade_fails_with_position() {
        let t = table(&["행정동", "위험등급"], &[&["중앙동", "high"]]);
        let err = zone_risk_from_table(&t, &ColumnNames::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { row: 1, ref value, .. } if value == "high"
        ));
    }

    #[test]
    fn decimal_comma_grade_is_invalid() {
        let t = table(&["행정동", "위험등급"], &[&["중앙동", "7,5"]]);
        let err = zone_risk_from_table(&t, &ColumnNames::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { ref value, .. } if value == "7,5"
        ));
    }

    #[test]
    fn extracts_facility_counts() {
        let t = table(
            &["행정동", "CCTV", "가로등"],
            &[&["중앙동", "1,204", "330"], &["상봉동", "", "12.0"]],
        );
        let records = zone_facilities_from_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(
            records[0],
            ZoneFacilityRecord {
                zone_name: "중앙동".to_string(),
                cctv_count: 1204,
                lamp_count: 330,
            }
        );
        assert_eq!(records[1].cctv_count, 0);
        assert_eq!(records[1].lamp_count, 12);
    }

    #[test]
    fn hourly_buckets_are_every_other_column() {
        let t = table(
            &["00-03", "범죄분류", "03-06", "06-09"],
            &[&["1", "절도", "2", "3"], &["4", "폭력", "5", ""]],
        );
        let hourly = hourly_crime_from_table(&t, &ColumnNames::default()).unwrap();
        assert_eq!(hourly.hour_buckets(), ["00-03", "03-06", "06-09"]);
        assert_eq!(hourly.rows()[0].category, "절도");
        assert_eq!(hourly.rows()[0].counts, vec![1, 2, 3]);
        assert_eq!(hourly.rows()[1].counts, vec![4, 5, 0]);
    }

    #[test]
    fn extracts_locations_with_kind() {
        let t = table(
            &["번호", "위도", "경도"],
            &[&["1", "35.18", "128.10"], &["2", "35.19", "128.11"]],
        );
        let locations =
            facility_locations_from_table(&t, &ColumnNames::default(), FacilityKind::Lamp)
                .unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.kind == FacilityKind::Lamp));
    }

    #[test]
    fn bad_longitude_is_reported_on_longitude_column() {
        let t = table(&["위도", "경도"], &[&["35.18", "east"]]);
        let err = facility_locations_from_table(&t, &ColumnNames::default(), FacilityKind::Cctv)
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { ref column, .. } if column == "경도"
        ));
    }
}
