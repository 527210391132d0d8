//! USGS earthquake summary feed adapter.
//!
//! The USGS publishes rolling `GeoJSON` `FeatureCollection`s (`all_day`,
//! `all_month`, ...). Each feature carries `properties.place`,
//! `properties.mag`, `properties.time` (epoch milliseconds) and a point
//! geometry of `[longitude, latitude, depth_km]`.
//!
//! See <https://earthquake.usgs.gov/earthquakes/feed/v1.0/geojson.php>

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use quake_map_event_models::{Event, Feed};

use crate::registry::{FeedDefinition, enabled_feeds, find_feed};
use crate::{EventSource, FetchError, MalformedEventError, retry};

/// Per-request timeout applied to the shared HTTP client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of parsing one feed payload.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Successfully parsed events, in payload order.
    pub events: Vec<Event>,
    /// Records that were dropped.
    pub dropped: Vec<MalformedEventError>,
}

/// [`EventSource`] backed by the public USGS summary feeds.
pub struct UsgsSource {
    client: reqwest::Client,
    feeds: Vec<FeedDefinition>,
}

impl UsgsSource {
    /// Creates a source using the embedded feed registry.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("quake-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, enabled_feeds()))
    }

    /// Creates a source with an explicit client and feed definitions.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, feeds: Vec<FeedDefinition>) -> Self {
        Self { client, feeds }
    }

    /// Returns the definition serving `feed`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownFeed`] if no enabled definition exists.
    pub fn definition(&self, feed: Feed) -> Result<&FeedDefinition, FetchError> {
        find_feed(&self.feeds, feed).ok_or(FetchError::UnknownFeed { feed })
    }
}

#[async_trait]
impl EventSource for UsgsSource {
    fn id(&self) -> &'static str {
        "usgs"
    }

    async fn fetch_events(&self, feed: Feed) -> Result<Vec<Event>, FetchError> {
        let def = self.definition(feed)?;
        log::info!("Fetching {} ({})", def.name, def.url);

        let body = retry::send_text(|| self.client.get(&def.url), def.max_retries).await?;
        let parsed = parse_feature_collection(&body)?;

        if !parsed.dropped.is_empty() {
            log::warn!(
                "{}: dropped {} malformed feature(s), first: {}",
                def.id,
                parsed.dropped.len(),
                parsed.dropped[0]
            );
        }
        log::info!("{}: {} events", def.id, parsed.events.len());

        Ok(parsed.events)
    }
}

/// Parses a USGS `GeoJSON` `FeatureCollection` into events.
///
/// Features without a usable point geometry are dropped and reported in
/// [`ParsedFeed::dropped`] instead of failing the whole payload.
///
/// # Errors
///
/// Returns [`FetchError`] if the text is not `GeoJSON` or is not a
/// `FeatureCollection`.
pub fn parse_feature_collection(text: &str) -> Result<ParsedFeed, FetchError> {
    let geojson: GeoJson = text.parse()?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(FetchError::Upstream {
            message: "expected a GeoJSON FeatureCollection".to_string(),
        });
    };

    let mut parsed = ParsedFeed::default();
    for feature in &collection.features {
        match parse_feature(feature) {
            Ok(event) => parsed.events.push(event),
            Err(e) => parsed.dropped.push(e),
        }
    }
    Ok(parsed)
}

/// Converts one feature into an [`Event`].
fn parse_feature(feature: &Feature) -> Result<Event, MalformedEventError> {
    let id = feature.id.as_ref().map(|id| match id {
        geojson::feature::Id::String(s) => s.clone(),
        geojson::feature::Id::Number(n) => n.to_string(),
    });

    let Some(geometry) = feature.geometry.as_ref() else {
        return Err(MalformedEventError::new(id, "missing geometry"));
    };
    let geojson::Value::Point(coords) = &geometry.value else {
        return Err(MalformedEventError::new(id, "geometry is not a point"));
    };
    let (Some(&longitude), Some(&latitude)) = (coords.first(), coords.get(1)) else {
        return Err(MalformedEventError::new(
            id,
            "point has fewer than two coordinates",
        ));
    };
    if !longitude.is_finite() || !latitude.is_finite() {
        return Err(MalformedEventError::new(id, "non-finite coordinates"));
    }

    let place = feature
        .property("place")
        .and_then(serde_json::Value::as_str)
        .map(String::from);
    let magnitude = feature.property("mag").and_then(serde_json::Value::as_f64);
    let time = feature
        .property("time")
        .and_then(serde_json::Value::as_i64)
        .and_then(DateTime::from_timestamp_millis);

    Ok(Event {
        id,
        place,
        longitude,
        latitude,
        depth_km: coords.get(2).copied(),
        magnitude,
        time,
    })
}

/// Renders events as a USGS-style `FeatureCollection`.
#[must_use]
pub fn to_feature_collection(events: &[Event]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: events.iter().map(to_feature).collect(),
        foreign_members: None,
    }
}

fn to_feature(event: &Event) -> Feature {
    let mut coordinates = vec![event.longitude, event.latitude];
    coordinates.extend(event.depth_km);

    let mut properties = serde_json::Map::new();
    properties.insert("place".to_string(), serde_json::json!(event.place));
    properties.insert("mag".to_string(), serde_json::json!(event.magnitude));
    properties.insert(
        "time".to_string(),
        serde_json::json!(event.time.map(|time| time.timestamp_millis())),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::Point(coordinates))),
        id: event.id.clone().map(geojson::feature::Id::String),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "metadata": { "generated": 1700000000000, "count": 4 },
        "features": [
            {
                "type": "Feature",
                "id": "nc1",
                "properties": { "mag": 4.2, "place": "5km N of Reno, Nevada", "time": 1700000000000 },
                "geometry": { "type": "Point", "coordinates": [-119.8, 39.5, 7.1] }
            },
            {
                "type": "Feature",
                "id": "us2",
                "properties": { "mag": null, "place": null, "time": 1700000100000 },
                "geometry": { "type": "Point", "coordinates": [139.7, 35.7, 10.0] }
            },
            {
                "type": "Feature",
                "id": "bad3",
                "properties": { "mag": 2.0, "place": "Nowhere" },
                "geometry": null
            },
            {
                "type": "Feature",
                "id": "bad4",
                "properties": { "mag": 2.0, "place": "Fault trace" },
                "geometry": { "type": "LineString", "coordinates": [[12.0, 1.0], [13.0, 2.0]] }
            }
        ]
    }"#;

    #[test]
    fn parses_usgs_features() {
        let parsed = parse_feature_collection(SAMPLE).unwrap();
        assert_eq!(parsed.events.len(), 2);

        let reno = &parsed.events[0];
        assert_eq!(reno.id.as_deref(), Some("nc1"));
        assert_eq!(reno.place.as_deref(), Some("5km N of Reno, Nevada"));
        assert!((reno.longitude - -119.8).abs() < f64::EPSILON);
        assert!((reno.latitude - 39.5).abs() < f64::EPSILON);
        assert_eq!(reno.depth_km, Some(7.1));
        assert_eq!(reno.magnitude, Some(4.2));
        assert_eq!(
            reno.time.unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }

    #[test]
    fn keeps_null_magnitude_and_place() {
        let parsed = parse_feature_collection(SAMPLE).unwrap();
        let tokyo = &parsed.events[1];
        assert!(tokyo.place.is_none());
        assert!(tokyo.magnitude.is_none());
    }

    #[test]
    fn drops_features_without_point_geometry() {
        let parsed = parse_feature_collection(SAMPLE).unwrap();
        let ids: Vec<_> = parsed.dropped.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![Some("bad3".to_string()), Some("bad4".to_string())]);
    }

    #[test]
    fn rejects_non_collection() {
        let err = parse_feature_collection(
            r#"{ "type": "Point", "coordinates": [1.0, 2.0] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Upstream { .. }));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_feature_collection("not json").is_err());
    }

    #[test]
    fn renders_events_back_to_geojson() {
        let parsed = parse_feature_collection(SAMPLE).unwrap();
        let collection = to_feature_collection(&parsed.events);
        assert_eq!(collection.features.len(), 2);

        let text = GeoJson::FeatureCollection(collection).to_string();
        let reparsed = parse_feature_collection(&text).unwrap();
        assert!(reparsed.dropped.is_empty());
        assert_eq!(reparsed.events, parsed.events);
    }

    #[test]
    fn unknown_feed_without_definition() {
        let source = UsgsSource::with_client(reqwest::Client::new(), Vec::new());
        assert!(matches!(
            source.definition(Feed::Realtime),
            Err(FetchError::UnknownFeed {
                feed: Feed::Realtime
            })
        ));
    }
}
