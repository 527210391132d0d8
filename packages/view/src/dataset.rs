//! Named datasets and the views bound to them.

use quake_map_analytics::HISTORICAL_MIN_MAGNITUDE;
use quake_map_event_models::Feed;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A cached unit of fetched-and-analyzed data.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Dataset {
    /// Raw realtime events for the map.
    Realtime,
    /// Realtime events aggregated by region.
    Aggregated,
    /// Month of events aggregated by region, high-magnitude only.
    HistoricalAggregated,
}

impl Dataset {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Realtime, Self::Aggregated, Self::HistoricalAggregated]
    }

    /// Upstream feed the dataset is built from.
    #[must_use]
    pub const fn feed(self) -> Feed {
        match self {
            Self::Realtime | Self::Aggregated => Feed::Realtime,
            Self::HistoricalAggregated => Feed::HistoricalMonth,
        }
    }

    /// Magnitude threshold applied when aggregating, `None` for no threshold.
    #[must_use]
    pub const fn min_magnitude(self) -> Option<f64> {
        match self {
            Self::Realtime | Self::Aggregated => None,
            Self::HistoricalAggregated => Some(HISTORICAL_MIN_MAGNITUDE),
        }
    }

    /// Dataset that answers the region, summary, and narrative queries
    /// for `feed`.
    #[must_use]
    pub const fn analysis_for(feed: Feed) -> Self {
        match feed {
            Feed::Realtime => Self::Aggregated,
            Feed::HistoricalMonth => Self::HistoricalAggregated,
        }
    }

    /// Dataset that answers raw event listings for `feed`.
    #[must_use]
    pub const fn listing_for(feed: Feed) -> Self {
        match feed {
            Feed::Realtime => Self::Realtime,
            Feed::HistoricalMonth => Self::HistoricalAggregated,
        }
    }
}

/// Presentation views. Switching to a view requests its dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum View {
    /// Realtime event map.
    #[default]
    Map,
    /// Risk-by-location analysis.
    RiskAnalysis,
    /// Historical outlook.
    Predictive,
}

impl View {
    /// Dataset the view renders.
    #[must_use]
    pub const fn dataset(self) -> Dataset {
        match self {
            Self::Map => Dataset::Realtime,
            Self::RiskAnalysis => Dataset::Aggregated,
            Self::Predictive => Dataset::HistoricalAggregated,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn dataset_names_are_kebab_case() {
        assert_eq!(Dataset::Realtime.to_string(), "realtime");
        assert_eq!(Dataset::Aggregated.as_ref(), "aggregated");
        assert_eq!(
            Dataset::HistoricalAggregated.to_string(),
            "historical-aggregated"
        );
        assert_eq!(
            Dataset::from_str("Historical-Aggregated").unwrap(),
            Dataset::HistoricalAggregated
        );
        assert!(Dataset::from_str("predictive").is_err());
    }

    #[test]
    fn views_bind_to_datasets() {
        assert_eq!(View::Map.dataset(), Dataset::Realtime);
        assert_eq!(View::RiskAnalysis.dataset(), Dataset::Aggregated);
        assert_eq!(View::Predictive.dataset(), Dataset::HistoricalAggregated);
        assert_eq!(View::from_str("risk_analysis").unwrap(), View::RiskAnalysis);
    }

    #[test]
    fn feeds_bind_to_datasets() {
        assert_eq!(Dataset::analysis_for(Feed::Realtime), Dataset::Aggregated);
        assert_eq!(
            Dataset::analysis_for(Feed::HistoricalMonth),
            Dataset::HistoricalAggregated
        );
        assert_eq!(Dataset::listing_for(Feed::Realtime), Dataset::Realtime);
        for &dataset in Dataset::all() {
            assert_eq!(Dataset::analysis_for(dataset.feed()).feed(), dataset.feed());
        }
    }

    #[test]
    fn only_historical_dataset_is_thresholded() {
        assert_eq!(Dataset::Realtime.min_magnitude(), None);
        assert_eq!(Dataset::Aggregated.min_magnitude(), None);
        assert_eq!(Dataset::HistoricalAggregated.min_magnitude(), Some(5.0));
    }
}
