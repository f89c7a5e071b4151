#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for the district safety report.
//!
//! Every type here is an immutable snapshot loaded from the input files for a
//! single render. Zone records are keyed by the administrative-zone name
//! (행정동); facility locations are an independent point dataset that is never
//! joined to the zone tables.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Risk grade for one administrative zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRiskRecord {
    /// Administrative-zone name (join key).
    pub zone_name: String,
    /// Crime risk grade. Higher is riskier.
    pub risk_grade: f64,
}

/// Crime-prevention facility counts for one administrative zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneFacilityRecord {
    /// Administrative-zone name (join key).
    pub zone_name: String,
    /// Number of installed CCTV cameras.
    pub cctv_count: u64,
    /// Number of installed streetlights.
    pub lamp_count: u64,
}

/// A zone present in both the risk and the facility tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedZoneRecord {
    /// Administrative-zone name.
    pub zone_name: String,
    /// Crime risk grade.
    pub risk_grade: f64,
    /// Number of installed CCTV cameras.
    pub cctv_count: u64,
    /// Number of installed streetlights.
    pub lamp_count: u64,
}

impl MergedZoneRecord {
    /// Combines a risk row and a facility row for the same zone.
    #[must_use]
    pub fn from_parts(risk: &ZoneRiskRecord, facility: &ZoneFacilityRecord) -> Self {
        Self {
            zone_name: risk.zone_name.clone(),
            risk_grade: risk.risk_grade,
            cctv_count: facility.cctv_count,
            lamp_count: facility.lamp_count,
        }
    }

    /// Returns the count for the given facility kind.
    #[must_use]
    pub const fn facility_count(&self, kind: FacilityKind) -> u64 {
        match kind {
            FacilityKind::Cctv => self.cctv_count,
            FacilityKind::Lamp => self.lamp_count,
        }
    }
}

/// Crime count for one time-of-day bucket, summed over all crime categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCrimeRecord {
    /// Time-of-day bucket label as it appears in the source header
    /// (e.g. `"00:00-02:59"`).
    pub hour_bucket: String,
    /// Total crimes in this bucket.
    pub count: u64,
}

/// One crime category row of the raw hourly table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCategoryRow {
    /// Crime category label (e.g. `"강력범죄"`).
    pub category: String,
    /// One count per hour bucket, in the table's bucket order.
    pub counts: Vec<u64>,
}

/// The raw time-of-day table: one row per crime category, one column per
/// hour bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyCrimeTable {
    hour_buckets: Vec<String>,
    rows: Vec<HourlyCategoryRow>,
}

impl HourlyCrimeTable {
    /// Creates an empty table with the given bucket columns.
    #[must_use]
    pub const fn new(hour_buckets: Vec<String>) -> Self {
        Self {
            hour_buckets,
            rows: Vec::new(),
        }
    }

    /// Appends a category row.
    ///
    /// # Errors
    ///
    /// Returns [`RowShapeError`] if `counts` does not have exactly one value
    /// per hour bucket.
    pub fn push_row(
        &mut self,
        category: impl Into<String>,
        counts: Vec<u64>,
    ) -> Result<(), RowShapeError> {
        if counts.len() != self.hour_buckets.len() {
            return Err(RowShapeError {
                expected: self.hour_buckets.len(),
                actual: counts.len(),
            });
        }
        self.rows.push(HourlyCategoryRow {
            category: category.into(),
            counts,
        });
        Ok(())
    }

    /// Hour bucket labels in column order.
    #[must_use]
    pub fn hour_buckets(&self) -> &[String] {
        &self.hour_buckets
    }

    /// Category rows in source order.
    #[must_use]
    pub fn rows(&self) -> &[HourlyCategoryRow] {
        &self.rows
    }
}

/// Error returned when a category row does not match the table's bucket
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("row has {actual} counts but the table has {expected} hour buckets")]
pub struct RowShapeError {
    /// Number of hour buckets in the table.
    pub expected: usize,
    /// Number of counts in the rejected row.
    pub actual: usize,
}

/// Kind of crime-prevention facility plotted on the map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FacilityKind {
    /// Closed-circuit security camera
    Cctv,
    /// Streetlight
    Lamp,
}

impl FacilityKind {
    /// Human-readable label shown in tooltips and legends.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cctv => "CCTV",
            Self::Lamp => "가로등",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Cctv, Self::Lamp]
    }
}

/// Location of a single facility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityLocation {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Facility kind.
    pub kind: FacilityKind,
}

/// Which facility kinds are shown on the map.
///
/// Both kinds are hidden by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityVisibility {
    /// Show CCTV markers.
    pub cctv: bool,
    /// Show streetlight markers.
    pub lamp: bool,
}

impl FacilityVisibility {
    /// Everything visible.
    pub const ALL: Self = Self {
        cctv: true,
        lamp: true,
    };

    /// Whether markers of `kind` should be drawn.
    #[must_use]
    pub const fn is_visible(self, kind: FacilityKind) -> bool {
        match kind {
            FacilityKind::Cctv => self.cctv,
            FacilityKind::Lamp => self.lamp,
        }
    }

    /// The visible kinds, in [`FacilityKind::all`] order.
    #[must_use]
    pub fn visible_kinds(self) -> Vec<FacilityKind> {
        FacilityKind::all()
            .iter()
            .copied()
            .filter(|kind| self.is_visible(*kind))
            .collect()
    }
}
