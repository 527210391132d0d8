//! Cached dataset payloads and state snapshots.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use quake_map_analytics::{DEFAULT_TOP_K, aggregate_with_report, narrate, rank, summarize_at};
use quake_map_analytics_models::{AggregationReport, RankedRegion, RiskSummary};
use quake_map_event_models::{Event, Feed};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::Dataset;

/// Everything computed for a dataset once its fetch succeeds.
///
/// Built once per fetch and shared read-only by every reader until the
/// dataset is refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetView {
    pub dataset: Dataset,
    pub feed: Feed,
    /// Threshold the aggregation used, `None` for none.
    pub min_magnitude: Option<f64>,
    /// Every fetched event, including those without a magnitude.
    pub events: Vec<Event>,
    pub report: AggregationReport,
    pub ranked: Vec<RankedRegion>,
    pub narrative: String,
    /// Summary over all fetched events, regardless of threshold.
    pub summary: RiskSummary,
    pub fetched_at: DateTime<Utc>,
}

impl DatasetView {
    /// Runs the full analysis pipeline over freshly fetched `events`.
    #[must_use]
    pub fn build(dataset: Dataset, events: Vec<Event>, fetched_at: DateTime<Utc>) -> Self {
        let min_magnitude = dataset.min_magnitude();
        let report = aggregate_with_report(&events, min_magnitude.unwrap_or(f64::NEG_INFINITY));
        let ranked = rank(&report.regions);
        let narrative = narrate(&ranked, DEFAULT_TOP_K);
        let summary = summarize_at(&events, fetched_at);

        Self {
            dataset,
            feed: dataset.feed(),
            min_magnitude,
            events,
            report,
            ranked,
            narrative,
            summary,
            fetched_at,
        }
    }
}

/// Lifecycle position of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewStatus {
    NotFetched,
    Fetching,
    Ready,
    Failed,
}

/// Point-in-time snapshot of one dataset's state.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub dataset: Dataset,
    pub status: ViewStatus,
    /// Present only when `status` is [`ViewStatus::Ready`].
    pub data: Option<Arc<DatasetView>>,
    /// Present only when `status` is [`ViewStatus::Failed`].
    pub error: Option<String>,
}

impl ViewState {
    pub(crate) const fn new(dataset: Dataset, status: ViewStatus) -> Self {
        Self {
            dataset,
            status,
            data: None,
            error: None,
        }
    }
}
