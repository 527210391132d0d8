//! In-memory event source.
//!
//! Serves pre-loaded events per feed. Used for offline runs against
//! `GeoJSON` fixture files and as the test double for everything that
//! sits on top of [`EventSource`]. Every call is counted so callers can
//! assert how many fetches actually happened.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use quake_map_event_models::{Event, Feed};

use crate::usgs::parse_feature_collection;
use crate::{EventSource, FetchError};

/// What a feed should answer with.
#[derive(Debug, Clone)]
enum Canned {
    Events(Vec<Event>),
    Failure(String),
}

/// [`EventSource`] that answers from memory.
#[derive(Debug, Default)]
pub struct StaticSource {
    feeds: BTreeMap<Feed, Canned>,
    delay: Option<Duration>,
    calls: Mutex<BTreeMap<Feed, usize>>,
}

impl StaticSource {
    /// Creates a source with no feeds configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `events` for `feed`.
    #[must_use]
    pub fn with_events(mut self, feed: Feed, events: Vec<Event>) -> Self {
        self.feeds.insert(feed, Canned::Events(events));
        self
    }

    /// Fails every fetch of `feed` with [`FetchError::Upstream`].
    #[must_use]
    pub fn with_failure(mut self, feed: Feed, message: impl Into<String>) -> Self {
        self.feeds.insert(feed, Canned::Failure(message.into()));
        self
    }

    /// Sleeps for `delay` before answering each fetch.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serves the events parsed from a USGS-style `GeoJSON` document.
    ///
    /// Malformed features are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if `text` is not a `GeoJSON` `FeatureCollection`.
    pub fn with_geojson(self, feed: Feed, text: &str) -> Result<Self, FetchError> {
        let parsed = parse_feature_collection(text)?;
        if !parsed.dropped.is_empty() {
            log::warn!(
                "{feed} fixture: dropped {} malformed feature(s)",
                parsed.dropped.len()
            );
        }
        Ok(self.with_events(feed, parsed.events))
    }

    /// Number of times `feed` has been fetched.
    #[must_use]
    pub fn fetch_count(&self, feed: Feed) -> usize {
        self.calls
            .lock()
            .map_or(0, |calls| calls.get(&feed).copied().unwrap_or(0))
    }

    fn record_call(&self, feed: Feed) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(feed).or_insert(0) += 1;
        }
    }
}

#[async_trait]
impl EventSource for StaticSource {
    fn id(&self) -> &'static str {
        "static"
    }

    async fn fetch_events(&self, feed: Feed) -> Result<Vec<Event>, FetchError> {
        self.record_call(feed);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.feeds.get(&feed) {
            Some(Canned::Events(events)) => Ok(events.clone()),
            Some(Canned::Failure(message)) => Err(FetchError::Upstream {
                message: message.clone(),
            }),
            None => Err(FetchError::UnknownFeed { feed }),
        }
    }
}
