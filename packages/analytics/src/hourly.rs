//! Time-of-day aggregation.

use safety_map_models::{HourlyCrimeRecord, HourlyCrimeTable};
use serde::{Deserialize, Serialize};

/// Ordering of the aggregated hour buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourlyOrder {
    /// Bucket order as in the source file's columns.
    Source,
    /// Highest count first; equal counts keep source order.
    #[default]
    CountDescending,
}

/// Sums the per-category table into one record per hour bucket.
#[must_use]
pub fn aggregate_hourly(table: &HourlyCrimeTable, order: HourlyOrder) -> Vec<HourlyCrimeRecord> {
    let mut totals = vec![0_u64; table.hour_buckets().len()];
    for row in table.rows() {
        for (total, count) in totals.iter_mut().zip(&row.counts) {
            *total = total.saturating_add(*count);
        }
    }

    let mut records: Vec<HourlyCrimeRecord> = table
        .hour_buckets()
        .iter()
        .zip(totals)
        .map(|(bucket, count)| HourlyCrimeRecord {
            hour_bucket: bucket.clone(),
            count,
        })
        .collect();

    if order == HourlyOrder::CountDescending {
        records.sort_by(|a, b| b.count.cmp(&a.count));
    }

    records
}

/// Total of every cell in the table.
#[must_use]
pub fn total_crimes(table: &HourlyCrimeTable) -> u64 {
    table
        .rows()
        .iter()
        .flat_map(|row| row.counts.iter())
        .fold(0_u64, |acc, count| acc.saturating_add(*count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HourlyCrimeTable {
        let mut table = HourlyCrimeTable::new(vec![
            "00-03".to_string(),
            "03-06".to_string(),
            "06-09".to_string(),
            "09-12".to_string(),
        ]);
        table.push_row("절도", vec![5, 1, 7, 2]).unwrap();
        table.push_row("폭력", vec![4, 0, 2, 7]).unwrap();
        table.push_row("강력", vec![0, 1, 0, 0]).unwrap();
        table
    }

    #[test]
    fn sums_across_categories_in_source_order() {
        let records = aggregate_hourly(&sample(), HourlyOrder::Source);
        let counts: Vec<u64> = records.iter().map(|r| r.count).collect();
        assert_eq!(counts, [9, 2, 9, 9]);
        assert_eq!(records[0].hour_bucket, "00-03");
    }

    #[test]
    fn descending_order_is_stable() {
        let records = aggregate_hourly(&sample(), HourlyOrder::CountDescending);
        let buckets: Vec<&str> = records.iter().map(|r| r.hour_bucket.as_str()).collect();
        assert_eq!(buckets, ["00-03", "06-09", "09-12", "03-06"]);
    }

    #[test]
    fn aggregate_sum_equals_cell_sum() {
        let table = sample();
        for order in [HourlyOrder::Source, HourlyOrder::CountDescending] {
            let sum: u64 = aggregate_hourly(&table, order).iter().map(|r| r.count).sum();
            assert_eq!(sum, total_crimes(&table));
        }
        assert_eq!(total_crimes(&table), 29);
    }

    #[test]
    fn empty_table_aggregates_to_nothing() {
        let table = HourlyCrimeTable::default();
        assert!(aggregate_hourly(&table, HourlyOrder::default()).is_empty());
        assert_eq!(total_crimes(&table), 0);
    }

    #[test]
    fn buckets_without_rows_are_zero() {
        let table = HourlyCrimeTable::new(vec!["00-03".to_string()]);
        let records = aggregate_hourly(&table, HourlyOrder::Source);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].count, 0);
    }
}
