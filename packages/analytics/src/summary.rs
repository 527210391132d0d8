//! Batch-wide risk summary.

use chrono::{DateTime, SecondsFormat, Utc};
use quake_map_analytics_models::RiskSummary;
use quake_map_event_models::Event;

/// Summarizes `events`, stamped with the current time.
#[must_use]
pub fn summarize(events: &[Event]) -> RiskSummary {
    summarize_at(events, Utc::now())
}

/// Summarizes `events`, stamped with `now`.
///
/// The average covers every event with a finite magnitude and is rounded
/// to two decimals; it is `0` when no event has one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize_at(events: &[Event], now: DateTime<Utc>) -> RiskSummary {
    let magnitudes = events
        .iter()
        .filter_map(|event| event.magnitude)
        .filter(|magnitude| magnitude.is_finite())
        .collect::<Vec<_>>();

    let average_magnitude = if magnitudes.is_empty() {
        0.0
    } else {
        round_to_hundredths(magnitudes.iter().sum::<f64>() / magnitudes.len() as f64)
    };

    let high_risk_count = events.iter().filter(|event| event.is_high_risk()).count() as u64;

    RiskSummary {
        average_magnitude,
        high_risk_count,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
    }
}

/// Rounds through the exact decimal expansion so ties go to the even
/// digit (`4.125` becomes `4.12`).
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
