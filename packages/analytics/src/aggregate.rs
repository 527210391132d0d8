//! Per-region aggregation of event batches.
//!
//! A single pass folds events into per-region [`RegionStats`]. Only events
//! with a known magnitude at or above the threshold are retained; regions
//! with no retained events never appear in the output.

use std::collections::BTreeMap;

use quake_map_analytics_models::{AggregationReport, RegionStats};
use quake_map_event_models::{Event, HIGH_RISK_MAGNITUDE};

use crate::region::extract;

/// Threshold used by the historical ("predictive") pass.
pub const HISTORICAL_MIN_MAGNITUDE: f64 = HIGH_RISK_MAGNITUDE;

/// Aggregates `events` per region, keeping those with
/// `magnitude >= min_magnitude`.
#[must_use]
pub fn aggregate(events: &[Event], min_magnitude: f64) -> BTreeMap<String, RegionStats> {
    aggregate_with_report(events, min_magnitude).regions
}

/// Aggregates every event that has a magnitude.
#[must_use]
pub fn aggregate_all(events: &[Event]) -> BTreeMap<String, RegionStats> {
    aggregate(events, f64::NEG_INFINITY)
}

/// Aggregates `events` and reports how many were skipped or dropped.
///
/// Events whose magnitude or coordinates are not finite numbers are
/// malformed: they are dropped and counted instead of poisoning the sums.
#[must_use]
pub fn aggregate_with_report(events: &[Event], min_magnitude: f64) -> AggregationReport {
    let report = events
        .iter()
        .fold(AggregationReport::default(), |mut report, event| {
            let Some(magnitude) = event.magnitude else {
                report.skipped_missing_magnitude += 1;
                return report;
            };
            if !magnitude.is_finite() || !event.has_valid_coordinates() {
                report.dropped_malformed += 1;
                return report;
            }
            if magnitude < min_magnitude {
                report.skipped_below_threshold += 1;
                return report;
            }

            let key = extract(event.place.as_deref());
            report
                .regions
                .entry(key)
                .or_insert_with_key(|key| RegionStats::new(key.as_str()))
                .record(magnitude, event.latitude, event.longitude);
            report.retained += 1;
            report
        });

    debug_assert_eq!(
        report.regions.values().map(|s| s.count).sum::<u64>(),
        report.retained,
        "region counts must add up to retained events"
    );
    if report.dropped_malformed > 0 {
        log::warn!(
            "Dropped {} malformed event(s) during aggregation",
            report.dropped_malformed
        );
    }
    log::debug!(
        "Aggregated {} of {} events into {} regions (min magnitude {min_magnitude})",
        report.retained,
        report.seen(),
        report.regions.len()
    );

    report
}
