#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safety map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the report models to allow independent evolution of the API
//! contract.

use safety_map_models::{FacilityVisibility, HourlyCrimeRecord, MergedZoneRecord};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned by the API routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Query parameters selecting which facility kinds are shown.
///
/// Matches the page's checkbox form: an unchecked box is simply absent from
/// the query string, so a missing flag means hidden.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct FacilityQueryParams {
    /// Show CCTV markers.
    pub cctv: Option<bool>,
    /// Show streetlight markers.
    pub lamp: Option<bool>,
}

impl FacilityQueryParams {
    /// Converts the query into visibility flags.
    #[must_use]
    pub fn visibility(self) -> FacilityVisibility {
        FacilityVisibility {
            cctv: self.cctv.unwrap_or(false),
            lamp: self.lamp.unwrap_or(false),
        }
    }
}

/// A zone row as returned by `GET /api/zones`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZone {
    /// Administrative-zone name.
    pub zone_name: String,
    /// Crime risk grade.
    pub risk_grade: f64,
    /// Installed CCTV cameras.
    pub cctv_count: u64,
    /// Installed streetlights.
    pub lamp_count: u64,
    /// Position in the risk ranking, starting at 1.
    pub rank: usize,
}

impl ApiZone {
    /// Converts sorted zones into ranked API rows.
    #[must_use]
    pub fn ranked(zones: Vec<MergedZoneRecord>) -> Vec<Self> {
        zones
            .into_iter()
            .enumerate()
            .map(|(i, zone)| Self {
                zone_name: zone.zone_name,
                risk_grade: zone.risk_grade,
                cctv_count: zone.cctv_count,
                lamp_count: zone.lamp_count,
                rank: i + 1,
            })
            .collect()
    }
}

/// Response of `GET /api/hourly`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHourly {
    /// Sum over every bucket.
    pub total: u64,
    /// Per-bucket totals in chart order.
    pub buckets: Vec<HourlyCrimeRecord>,
}

impl From<Vec<HourlyCrimeRecord>> for ApiHourly {
    fn from(buckets: Vec<HourlyCrimeRecord>) -> Self {
        Self {
            total: buckets
                .iter()
                .fold(0_u64, |acc, r| acc.saturating_add(r.count)),
            buckets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_flags_are_hidden() {
        let params: FacilityQueryParams = serde_json::from_str(r#"{"cctv":true}"#).unwrap();
        assert_eq!(
            params.visibility(),
            FacilityVisibility {
                cctv: true,
                lamp: false
            }
        );
        assert_eq!(
            FacilityQueryParams::default().visibility(),
            FacilityVisibility::default()
        );
    }

    #[test]
    fn zones_are_ranked_in_order() {
        let zones = vec![
            MergedZoneRecord {
                zone_name: "B".to_string(),
                risk_grade: 9.0,
                cctv_count: 1,
                lamp_count: 2,
            },
            MergedZoneRecord {
                zone_name: "A".to_string(),
                risk_grade: 7.0,
                cctv_count: 3,
                lamp_count: 4,
            },
        ];
        let ranked = ApiZone::ranked(zones);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].zone_name, "A");
        assert_eq!(ranked[1].rank, 2);

        let json = serde_json::to_value(&ranked[0]).unwrap();
        assert_eq!(json["zoneName"], "B");
        assert_eq!(json["cctvCount"], 1);
    }

    #[test]
    fn hourly_total_sums_buckets() {
        let hourly = ApiHourly::from(vec![
            HourlyCrimeRecord {
                hour_bucket: "00-03".to_string(),
                count: 9,
            },
            HourlyCrimeRecord {
                hour_bucket: "03-06".to_string(),
                count: 1,
            },
        ]);
        assert_eq!(hourly.total, 10);
        assert_eq!(hourly.buckets.len(), 2);
    }
}
