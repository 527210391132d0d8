#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Seismic event, feed, and magnitude class types.
//!
//! These are the canonical types shared across the quake-map workspace.
//! Every event source (USGS GeoJSON feeds, in-memory fixtures) produces
//! [`Event`] records, and every analytics pass consumes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Magnitude at or above which an event counts as high risk.
pub const HIGH_RISK_MAGNITUDE: f64 = 5.0;

/// A single geolocated seismic event as delivered by an upstream feed.
///
/// Events are immutable once fetched. The magnitude may be missing, in
/// which case the event still shows up in raw listings but is excluded
/// from every aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Upstream event identifier, if the feed provides one.
    pub id: Option<String>,
    /// Free-text place label (e.g. `"10km SE of Example City, Nevada"`).
    pub place: Option<String>,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Hypocenter depth in kilometers.
    pub depth_km: Option<f64>,
    /// Event magnitude.
    pub magnitude: Option<f64>,
    /// Origin time.
    pub time: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates an event with only the fields the analytics core reads.
    #[must_use]
    pub fn new(
        place: Option<&str>,
        longitude: f64,
        latitude: f64,
        magnitude: Option<f64>,
    ) -> Self {
        Self {
            id: None,
            place: place.map(String::from),
            longitude,
            latitude,
            depth_km: None,
            magnitude,
            time: None,
        }
    }

    /// Returns `true` if both coordinates are finite numbers.
    #[must_use]
    pub const fn has_valid_coordinates(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }

    /// Returns `true` if the magnitude is present and at least
    /// [`HIGH_RISK_MAGNITUDE`].
    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.magnitude.is_some_and(|m| m >= HIGH_RISK_MAGNITUDE)
    }

    /// Descriptive magnitude band, if the magnitude is known.
    #[must_use]
    pub fn magnitude_class(&self) -> Option<MagnitudeClass> {
        self.magnitude.and_then(MagnitudeClass::from_magnitude)
    }
}

/// Upstream feed windows.
///
/// The actual time windows are defined by the provider, not by this
/// workspace.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Feed {
    /// Events observed in roughly the last day.
    Realtime,
    /// Events observed in roughly the last 30 days.
    HistoricalMonth,
}

impl Feed {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Realtime, Self::HistoricalMonth]
    }
}

/// Descriptive magnitude band used in raw event listings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MagnitudeClass {
    /// Below 4.0
    Minor,
    /// 4.0 up to 5.0
    Light,
    /// 5.0 up to 6.0
    Moderate,
    /// 6.0 up to 7.0
    Strong,
    /// 7.0 up to 8.0
    Major,
    /// 8.0 and above
    Great,
}

impl MagnitudeClass {
    /// Classifies a magnitude. Returns `None` for NaN.
    #[must_use]
    pub fn from_magnitude(magnitude: f64) -> Option<Self> {
        if magnitude.is_nan() {
            return None;
        }
        Some(if magnitude >= 8.0 {
            Self::Great
        } else if magnitude >= 7.0 {
            Self::Major
        } else if magnitude >= 6.0 {
            Self::Strong
        } else if magnitude >= HIGH_RISK_MAGNITUDE {
            Self::Moderate
        } else if magnitude >= 4.0 {
            Self::Light
        } else {
            Self::Minor
        })
    }

    /// Returns `true` for bands at or above [`HIGH_RISK_MAGNITUDE`].
    #[must_use]
    pub const fn is_high_risk(self) -> bool {
        matches!(
            self,
            Self::Moderate | Self::Strong | Self::Major | Self::Great
        )
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Minor,
            Self::Light,
            Self::Moderate,
            Self::Strong,
            Self::Major,
            Self::Great,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_class_boundaries() {
        assert_eq!(MagnitudeClass::from_magnitude(3.99), Some(MagnitudeClass::Minor));
        assert_eq!(MagnitudeClass::from_magnitude(4.0), Some(MagnitudeClass::Light));
        assert_eq!(MagnitudeClass::from_magnitude(5.0), Some(MagnitudeClass::Moderate));
        assert_eq!(MagnitudeClass::from_magnitude(6.5), Some(MagnitudeClass::Strong));
        assert_eq!(MagnitudeClass::from_magnitude(7.2), Some(MagnitudeClass::Major));
        assert_eq!(MagnitudeClass::from_magnitude(9.1), Some(MagnitudeClass::Great));
        assert_eq!(MagnitudeClass::from_magnitude(-0.4), Some(MagnitudeClass::Minor));
        assert_eq!(MagnitudeClass::from_magnitude(f64::NAN), None);
    }

    #[test]
    fn high_risk_class_matches_threshold() {
        for class in MagnitudeClass::all() {
            let lower = match class {
                MagnitudeClass::Minor => 0.0,
                MagnitudeClass::Light => 4.0,
                MagnitudeClass::Moderate => 5.0,
                MagnitudeClass::Strong => 6.0,
                MagnitudeClass::Major => 7.0,
                MagnitudeClass::Great => 8.0,
            };
            assert_eq!(
                class.is_high_risk(),
                lower >= HIGH_RISK_MAGNITUDE,
                "{class:?} high-risk flag disagrees with threshold"
            );
        }
    }

    #[test]
    fn event_high_risk_requires_magnitude() {
        assert!(Event::new(Some("a"), 0.0, 0.0, Some(5.0)).is_high_risk());
        assert!(!Event::new(Some("a"), 0.0, 0.0, Some(4.99)).is_high_risk());
        assert!(!Event::new(Some("a"), 0.0, 0.0, None).is_high_risk());
    }

    #[test]
    fn feed_parses_case_insensitively() {
        assert_eq!("realtime".parse::<Feed>().unwrap(), Feed::Realtime);
        assert_eq!("HISTORICAL_MONTH".parse::<Feed>().unwrap(), Feed::HistoricalMonth);
        assert_eq!(Feed::HistoricalMonth.to_string(), "historical_month");
        assert!("weekly".parse::<Feed>().is_err());
    }

    #[test]
    fn event_serializes_camel_case() {
        let event = Event::new(Some("Tokyo, Japan"), 139.7, 35.7, Some(3.0));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["place"], "Tokyo, Japan");
        assert!(json.get("depthKm").is_some());
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        assert!(Event::new(None, 1.0, 2.0, None).has_valid_coordinates());
        assert!(!Event::new(None, f64::NAN, 2.0, None).has_valid_coordinates());
        assert!(!Event::new(None, 1.0, f64::INFINITY, None).has_valid_coordinates());
    }
}
