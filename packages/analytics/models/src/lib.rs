#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Region aggregate, ranking, and risk summary types.
//!
//! [`RegionStats`] is the running accumulator owned by one aggregation
//! pass. Everything else here is a read-only projection handed to the
//! presentation layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Running totals for one region key.
///
/// Means are derived on read and are `0.0` while `count == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    /// Region key the totals belong to.
    pub region_key: String,
    /// Number of retained events.
    pub count: u64,
    /// Sum of retained magnitudes.
    pub magnitude_sum: f64,
    /// Sum of retained latitudes.
    pub latitude_sum: f64,
    /// Sum of retained longitudes.
    pub longitude_sum: f64,
}

impl RegionStats {
    /// Creates a zero-valued accumulator for `region_key`.
    #[must_use]
    pub fn new(region_key: impl Into<String>) -> Self {
        Self {
            region_key: region_key.into(),
            count: 0,
            magnitude_sum: 0.0,
            latitude_sum: 0.0,
            longitude_sum: 0.0,
        }
    }

    /// Folds one retained event into the totals.
    pub fn record(&mut self, magnitude: f64, latitude: f64, longitude: f64) {
        self.count += 1;
        self.magnitude_sum += magnitude;
        self.latitude_sum += latitude;
        self.longitude_sum += longitude;
    }

    /// Mean magnitude, `0.0` for an empty region.
    #[must_use]
    pub fn mean_magnitude(&self) -> f64 {
        self.mean_of(self.magnitude_sum)
    }

    /// Mean latitude, `0.0` for an empty region.
    #[must_use]
    pub fn mean_latitude(&self) -> f64 {
        self.mean_of(self.latitude_sum)
    }

    /// Mean longitude, `0.0` for an empty region.
    #[must_use]
    pub fn mean_longitude(&self) -> f64 {
        self.mean_of(self.longitude_sum)
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean_of(&self, sum: f64) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            sum / self.count as f64
        }
    }
}

/// A region's aggregate statistics as placed in a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRegion {
    /// Region key.
    pub region_key: String,
    /// Number of retained events.
    pub count: u64,
    /// Mean magnitude of retained events.
    pub mean_magnitude: f64,
    /// Mean latitude of retained events.
    pub mean_latitude: f64,
    /// Mean longitude of retained events.
    pub mean_longitude: f64,
}

impl From<&RegionStats> for RankedRegion {
    fn from(stats: &RegionStats) -> Self {
        Self {
            region_key: stats.region_key.clone(),
            count: stats.count,
            mean_magnitude: stats.mean_magnitude(),
            mean_latitude: stats.mean_latitude(),
            mean_longitude: stats.mean_longitude(),
        }
    }
}

/// Outcome of one aggregation pass, including what was left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationReport {
    /// Per-region totals, keyed and ordered by region key.
    pub regions: BTreeMap<String, RegionStats>,
    /// Events folded into `regions`.
    pub retained: u64,
    /// Events skipped because they carry no magnitude.
    pub skipped_missing_magnitude: u64,
    /// Events skipped because their magnitude is below the threshold.
    pub skipped_below_threshold: u64,
    /// Events dropped because of non-finite coordinates or magnitude.
    pub dropped_malformed: u64,
}

impl AggregationReport {
    /// Total number of events the pass looked at.
    #[must_use]
    pub const fn seen(&self) -> u64 {
        self.retained
            + self.skipped_missing_magnitude
            + self.skipped_below_threshold
            + self.dropped_malformed
    }
}

/// Scalar summary over a whole event batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskSummary {
    /// Mean of all known magnitudes, rounded to two decimals (`0` when none).
    pub average_magnitude: f64,
    /// Events at or above the high-risk magnitude.
    pub high_risk_count: u64,
    /// Capture time (ISO 8601, UTC).
    pub timestamp: String,
}

impl RiskSummary {
    /// `average_magnitude` formatted with exactly two decimals.
    #[must_use]
    pub fn average_magnitude_display(&self) -> String {
        format!("{:.2}", self.average_magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_means_are_zero() {
        let stats = RegionStats::new("Nowhere");
        assert_eq!(stats.count, 0);
        assert!(stats.mean_magnitude().abs() < f64::EPSILON);
        assert!(stats.mean_latitude().abs() < f64::EPSILON);
        assert!(stats.mean_longitude().abs() < f64::EPSILON);
        assert!(!stats.mean_magnitude().is_nan());
    }

    #[test]
    fn means_are_sum_over_count() {
        let mut stats = RegionStats::new("Nevada");
        stats.record(4.2, 39.5, -119.8);
        stats.record(5.1, 39.3, -119.7);
        assert_eq!(stats.count, 2);
        assert!((stats.mean_magnitude() - stats.magnitude_sum / 2.0).abs() < f64::EPSILON);
        assert!((stats.mean_latitude() - 39.4).abs() < 1e-9);
        assert!((stats.mean_longitude() - -119.75).abs() < 1e-9);
    }

    #[test]
    fn ranked_region_projects_means() {
        let mut stats = RegionStats::new("Japan");
        stats.record(3.0, 35.7, 139.7);
        let ranked = RankedRegion::from(&stats);
        assert_eq!(ranked.region_key, "Japan");
        assert_eq!(ranked.count, 1);
        assert!((ranked.mean_magnitude - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_seen_adds_every_bucket() {
        let report = AggregationReport {
            regions: BTreeMap::new(),
            retained: 3,
            skipped_missing_magnitude: 2,
            skipped_below_threshold: 4,
            dropped_malformed: 1,
        };
        assert_eq!(report.seen(), 10);
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = RiskSummary {
            average_magnitude: 4.1,
            high_risk_count: 1,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(summary.average_magnitude_display(), "4.10");
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["highRiskCount"], 1);
        assert_eq!(json["averageMagnitude"], 4.1);
    }
}
