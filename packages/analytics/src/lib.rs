#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Table operations behind the safety report charts.
//!
//! [`zones`] joins the risk-grade and facility-count tables on the zone name
//! and narrows the result to an allow-list sorted by risk. [`hourly`] sums
//! the per-category time-of-day table into one count per hour bucket.

pub mod hourly;
pub mod zones;

use thiserror::Error;

pub use hourly::{HourlyOrder, aggregate_hourly, total_crimes};
pub use zones::{DuplicateZonePolicy, filter_and_sort, join_zones};

/// Errors that can occur while combining zone tables.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A zone name appears more than once in one input table.
    #[error("Zone '{zone}' appears more than once in the {table} table")]
    DuplicateZone {
        /// The repeated zone name.
        zone: String,
        /// Which input table (`"risk"` or `"facility"`).
        table: &'static str,
    },
}
