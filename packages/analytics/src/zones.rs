//! Zone join and allow-list view.

use std::collections::{BTreeMap, BTreeSet};

use safety_map_models::{MergedZoneRecord, ZoneFacilityRecord, ZoneRiskRecord};
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// What to do when a zone name repeats within one input table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateZonePolicy {
    /// Fail the join with [`AnalyticsError::DuplicateZone`].
    #[default]
    Error,
    /// Keep the first row for the zone and ignore later ones.
    KeepFirst,
}

/// Indexes rows by zone name, applying `policy` to repeats. Returns the
/// kept rows in their original order.
fn dedup_by_zone<'a, T>(
    rows: &'a [T],
    zone_of: impl Fn(&T) -> &str,
    table: &'static str,
    policy: DuplicateZonePolicy,
) -> Result<Vec<&'a T>, AnalyticsError> {
    let mut seen = BTreeSet::new();
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        let zone = zone_of(row);
        if seen.insert(zone) {
            kept.push(row);
            continue;
        }
        match policy {
            DuplicateZonePolicy::Error => {
                return Err(AnalyticsError::DuplicateZone {
                    zone: zone.to_owned(),
                    table,
                });
            }
            DuplicateZonePolicy::KeepFirst => {
                log::warn!("Duplicate zone '{zone}' in {table} table; keeping first row");
            }
        }
    }

    Ok(kept)
}

/// Inner-joins risk grades with facility counts on the zone name.
///
/// Only zones present in both tables survive. The result follows the risk
/// table's row order.
///
/// # Errors
///
/// Returns [`AnalyticsError::DuplicateZone`] if a zone repeats within
/// either table and `policy` is [`DuplicateZonePolicy::Error`].
pub fn join_zones(
    risk: &[ZoneRiskRecord],
    facilities: &[ZoneFacilityRecord],
    policy: DuplicateZonePolicy,
) -> Result<Vec<MergedZoneRecord>, AnalyticsError> {
    let risk = dedup_by_zone(risk, |r| r.zone_name.as_str(), "risk", policy)?;
    let facilities: BTreeMap<&str, &ZoneFacilityRecord> =
        dedup_by_zone(facilities, |f| f.zone_name.as_str(), "facility", policy)?
            .into_iter()
            .map(|f| (f.zone_name.as_str(), f))
            .collect();

    let merged: Vec<MergedZoneRecord> = risk
        .iter()
        .filter_map(|r| {
            facilities
                .get(r.zone_name.as_str())
                .map(|f| MergedZoneRecord::from_parts(r, f))
        })
        .collect();

    log::debug!(
        "Joined {} risk rows with {} facility rows into {} zones",
        risk.len(),
        facilities.len(),
        merged.len()
    );
    if merged.is_empty() && !risk.is_empty() && !facilities.is_empty() {
        log::warn!("Zone join produced no rows; check that both tables use the same zone names");
    }

    Ok(merged)
}

/// Keeps only zones in `allow_list` and sorts them by risk grade, highest
/// first.
///
/// The sort is stable, so zones with equal grades keep their join order. An
/// empty allow-list keeps every zone.
#[must_use]
pub fn filter_and_sort(merged: &[MergedZoneRecord], allow_list: &[String]) -> Vec<MergedZoneRecord> {
    let allowed: BTreeSet<&str> = allow_list.iter().map(String::as_str).collect();

    let mut view: Vec<MergedZoneRecord> = merged
        .iter()
        .filter(|z| allowed.is_empty() || allowed.contains(z.zone_name.as_str()))
        .cloned()
        .collect();

    view.sort_by(|a, b| b.risk_grade.total_cmp(&a.risk_grade));
    view
}
