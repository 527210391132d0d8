#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Seismic event source trait and feed adapters.
//!
//! Each upstream provider implements the [`EventSource`] trait to define
//! how a [`Feed`] is fetched and mapped into canonical [`Event`]s. The
//! analytics core never talks to the network itself; it only consumes
//! whatever an [`EventSource`] hands back.

pub mod memory;
pub mod registry;
pub mod retry;
pub mod usgs;

use std::time::Duration;

use async_trait::async_trait;
use quake_map_event_models::{Event, Feed};

/// Errors that can occur while fetching events from an upstream feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response body was JSON but not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// I/O error (fixture file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The fetch did not settle within the configured timeout.
    #[error("Fetch of {feed} feed timed out after {after:?}")]
    Timeout {
        /// Feed that was being fetched.
        feed: Feed,
        /// Configured timeout.
        after: Duration,
    },

    /// No feed definition is configured for the requested feed.
    #[error("No source configured for the {feed} feed")]
    UnknownFeed {
        /// Requested feed.
        feed: Feed,
    },

    /// Upstream payload was structurally unusable.
    #[error("Upstream error: {message}")]
    Upstream {
        /// Description of what went wrong.
        message: String,
    },
}

/// A single upstream record that could not be turned into an [`Event`].
///
/// Malformed records are dropped from the batch rather than failing the
/// whole fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Malformed event {}: {reason}", id.as_deref().unwrap_or("<no id>"))]
pub struct MalformedEventError {
    /// Upstream identifier of the offending record, if any.
    pub id: Option<String>,
    /// Why the record was rejected.
    pub reason: String,
}

impl MalformedEventError {
    /// Creates a new malformed-record error.
    #[must_use]
    pub fn new(id: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

/// Trait that all seismic event sources must implement.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Returns a unique identifier for this source (e.g., `"usgs"`).
    fn id(&self) -> &str;

    /// Fetches every event currently published for `feed`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the feed cannot be fetched or parsed.
    async fn fetch_events(&self, feed: Feed) -> Result<Vec<Event>, FetchError>;
}
