#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the quake map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the analysis types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use quake_map_analytics::extract;
use quake_map_analytics_models::{RankedRegion, RiskSummary};
use quake_map_event_models::{Event, Feed, MagnitudeClass};
use quake_map_view::{Dataset, DatasetView, View, ViewState, ViewStatus};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
    /// Identifier of the upstream event source.
    pub source: String,
}

/// Query parameters selecting a feed. Defaults to the realtime feed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    /// `realtime` or `historical_month`.
    pub feed: Option<Feed>,
}

impl FeedQueryParams {
    /// The requested feed, or [`Feed::Realtime`].
    #[must_use]
    pub fn feed(&self) -> Feed {
        self.feed.unwrap_or(Feed::Realtime)
    }
}

/// Query parameters for the regions endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionQueryParams {
    /// `realtime` or `historical_month`.
    pub feed: Option<Feed>,
    /// Overrides the feed's default magnitude threshold.
    pub min_magnitude: Option<f64>,
    /// Maximum number of regions to return.
    pub limit: Option<usize>,
}

impl RegionQueryParams {
    /// The requested feed, or [`Feed::Realtime`].
    #[must_use]
    pub fn feed(&self) -> Feed {
        self.feed.unwrap_or(Feed::Realtime)
    }
}

/// Batch summary for one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    pub feed: Feed,
    pub average_magnitude: f64,
    /// `average_magnitude` with exactly two decimals (e.g. `"4.10"`).
    pub average_magnitude_display: String,
    pub high_risk_count: u64,
    pub timestamp: String,
}

impl ApiSummary {
    /// Builds the response for `feed`.
    #[must_use]
    pub fn new(feed: Feed, summary: &RiskSummary) -> Self {
        Self {
            feed,
            average_magnitude: summary.average_magnitude,
            average_magnitude_display: summary.average_magnitude_display(),
            high_risk_count: summary.high_risk_count,
            timestamp: summary.timestamp.clone(),
        }
    }
}

/// Ranked regions for one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRegions {
    pub feed: Feed,
    /// Threshold the ranking was built at; `None` means no threshold.
    pub min_magnitude: Option<f64>,
    pub regions: Vec<RankedRegion>,
}

/// Risk outlook text for one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNarrative {
    pub feed: Feed,
    pub narrative: String,
}

/// A seismic event as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    /// Upstream event ID.
    pub id: Option<String>,
    /// Free-text place label.
    pub place: Option<String>,
    /// Region key derived from `place`.
    pub region: String,
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
    /// Depth in kilometers.
    pub depth_km: Option<f64>,
    /// Magnitude, absent for unrated events.
    pub magnitude: Option<f64>,
    /// Magnitude band.
    pub magnitude_class: Option<MagnitudeClass>,
    /// Whether the magnitude is at or above the high-risk threshold.
    pub high_risk: bool,
    /// Origin time (ISO 8601).
    pub time: Option<DateTime<Utc>>,
}

impl From<&Event> for ApiEvent {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            place: event.place.clone(),
            region: extract(event.place.as_deref()),
            longitude: event.longitude,
            latitude: event.latitude,
            depth_km: event.depth_km,
            magnitude: event.magnitude,
            magnitude_class: event.magnitude_class(),
            high_risk: event.is_high_risk(),
            time: event.time,
        }
    }
}

/// Raw event listing for one feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvents {
    pub feed: Feed,
    pub count: usize,
    pub events: Vec<ApiEvent>,
}

/// Aggregation bookkeeping for a cached dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAggregation {
    pub retained: u64,
    pub skipped_missing_magnitude: u64,
    pub skipped_below_threshold: u64,
    pub dropped_malformed: u64,
}

/// The payload of a `ready` dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDatasetView {
    pub feed: Feed,
    pub min_magnitude: Option<f64>,
    pub event_count: usize,
    pub aggregation: ApiAggregation,
    pub regions: Vec<RankedRegion>,
    pub narrative: String,
    pub summary: ApiSummary,
    pub fetched_at: DateTime<Utc>,
}

impl From<&DatasetView> for ApiDatasetView {
    fn from(view: &DatasetView) -> Self {
        Self {
            feed: view.feed,
            min_magnitude: view.min_magnitude,
            event_count: view.events.len(),
            aggregation: ApiAggregation {
                retained: view.report.retained,
                skipped_missing_magnitude: view.report.skipped_missing_magnitude,
                skipped_below_threshold: view.report.skipped_below_threshold,
                dropped_malformed: view.report.dropped_malformed,
            },
            regions: view.ranked.clone(),
            narrative: view.narrative.clone(),
            summary: ApiSummary::new(view.feed, &view.summary),
            fetched_at: view.fetched_at,
        }
    }
}

/// Snapshot of one dataset's view state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewState {
    pub dataset: Dataset,
    pub status: ViewStatus,
    pub data: Option<ApiDatasetView>,
    pub error: Option<String>,
}

impl From<&ViewState> for ApiViewState {
    fn from(state: &ViewState) -> Self {
        Self {
            dataset: state.dataset,
            status: state.status,
            data: state.data.as_deref().map(ApiDatasetView::from),
            error: state.error.clone(),
        }
    }
}

/// Body of `POST /api/view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSwitchRequest {
    pub view: View,
}

/// Response to a view switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiViewSwitch {
    pub view: View,
    pub state: ApiViewState,
}

/// Analysis block of the combined `/api/earthquakes` payload.
///
/// Field names are `snake_case` to match existing map clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEarthquakeAnalysis {
    pub average_magnitude: f64,
    pub high_risk_count: u64,
    pub timestamp: String,
}

impl From<&RiskSummary> for ApiEarthquakeAnalysis {
    fn from(summary: &RiskSummary) -> Self {
        Self {
            average_magnitude: summary.average_magnitude,
            high_risk_count: summary.high_risk_count,
            timestamp: summary.timestamp.clone(),
        }
    }
}

/// Combined realtime events and analysis for map clients.
#[derive(Debug, Clone, Serialize)]
pub struct ApiEarthquakes {
    /// Events as a USGS-style `GeoJSON` `FeatureCollection`.
    pub data: geojson::FeatureCollection,
    pub analysis: ApiEarthquakeAnalysis,
}
