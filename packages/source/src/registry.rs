//! Compile-time registry of upstream feed definitions.
//!
//! Each feed is defined in a TOML file under `feeds/`. The registry embeds
//! these at compile time and exposes them via [`all_feeds`] and
//! [`enabled_feeds`].

use quake_map_event_models::Feed;
use serde::Deserialize;

/// An upstream feed configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedDefinition {
    /// Unique identifier (e.g., `"usgs_all_day"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Which logical feed this definition serves.
    pub feed: Feed,
    /// `GeoJSON` endpoint URL.
    pub url: String,
    /// Whether this definition is active.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Transport-level retry attempts for transient HTTP failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

const fn default_true() -> bool {
    true
}

const fn default_max_retries() -> u32 {
    3
}

// ── Compile-time embedded TOML files ────────────────────────────────

const FEED_TOMLS: &[(&str, &str)] = &[
    ("realtime", include_str!("../feeds/realtime.toml")),
    (
        "historical_month",
        include_str!("../feeds/historical_month.toml"),
    ),
];

/// Parses a single feed definition from TOML text.
///
/// # Errors
///
/// Returns a [`toml::de::Error`] if the text is not a valid definition.
pub fn parse_feed_toml(text: &str) -> Result<FeedDefinition, toml::de::Error> {
    toml::de::from_str(text)
}

/// Returns all feed definitions (enabled and disabled).
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_feeds() -> Vec<FeedDefinition> {
    FEED_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            parse_feed_toml(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse feed definition '{name}': {e}"))
        })
        .collect()
}

/// Returns only enabled feed definitions.
#[must_use]
pub fn enabled_feeds() -> Vec<FeedDefinition> {
    all_feeds().into_iter().filter(|f| f.enabled).collect()
}

/// Finds the first enabled definition serving `feed`.
#[must_use]
pub fn find_feed(definitions: &[FeedDefinition], feed: Feed) -> Option<&FeedDefinition> {
    definitions.iter().find(|d| d.enabled && d.feed == feed)
}
