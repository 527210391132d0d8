//! Presentation queries keyed by feed.
//!
//! Each query resolves its feed to a dataset, requests it through the
//! state machine (so it shares the cache and the single in-flight fetch),
//! and projects the cached [`DatasetView`](crate::DatasetView).

use quake_map_analytics::{aggregate, rank, rank_top};
use quake_map_analytics_models::{RankedRegion, RiskSummary};
use quake_map_event_models::{Event, Feed};

use crate::{Dataset, ViewError, ViewStateMachine};

impl ViewStateMachine {
    /// Summary for `feed`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the feed's dataset cannot be fetched.
    pub async fn get_summary(&self, feed: Feed) -> Result<RiskSummary, ViewError> {
        let view = self.request(Dataset::analysis_for(feed)).await?;
        Ok(view.summary.clone())
    }

    /// Ranked regions for `feed`.
    ///
    /// `None` uses the dataset's own threshold and answers from the cache.
    /// Any other threshold re-aggregates the cached events without
    /// fetching again.
    ///
    /// # Errors
    ///
    /// * [`ViewError::InvalidThreshold`] if `min_magnitude` is not finite
    /// * any other [`ViewError`] if the feed's dataset cannot be fetched
    pub async fn get_ranked_regions(
        &self,
        feed: Feed,
        min_magnitude: Option<f64>,
    ) -> Result<Vec<RankedRegion>, ViewError> {
        let view = self.request(Dataset::analysis_for(feed)).await?;

        Ok(match rerank_threshold(view.min_magnitude, min_magnitude)? {
            None => view.ranked.clone(),
            Some(threshold) => {
                log::debug!("Re-ranking {feed} events at min magnitude {threshold}");
                rank(&aggregate(&view.events, threshold))
            }
        })
    }

    /// The first `limit` entries of [`Self::get_ranked_regions`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_ranked_regions`].
    pub async fn get_top_regions(
        &self,
        feed: Feed,
        min_magnitude: Option<f64>,
        limit: usize,
    ) -> Result<Vec<RankedRegion>, ViewError> {
        let view = self.request(Dataset::analysis_for(feed)).await?;

        Ok(match rerank_threshold(view.min_magnitude, min_magnitude)? {
            None => view.ranked.iter().take(limit).cloned().collect(),
            Some(threshold) => rank_top(&aggregate(&view.events, threshold), limit),
        })
    }

    /// Risk outlook text for `feed`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the feed's dataset cannot be fetched.
    pub async fn get_narrative(&self, feed: Feed) -> Result<String, ViewError> {
        let view = self.request(Dataset::analysis_for(feed)).await?;
        Ok(view.narrative.clone())
    }

    /// Raw events for `feed`, including those without a magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the feed's dataset cannot be fetched.
    pub async fn get_events(&self, feed: Feed) -> Result<Vec<Event>, ViewError> {
        let view = self.request(Dataset::listing_for(feed)).await?;
        Ok(view.events.clone())
    }
}

/// `None` when the cached ranking already answers for `requested`;
/// otherwise the threshold to re-aggregate at.
fn rerank_threshold(
    cached: Option<f64>,
    requested: Option<f64>,
) -> Result<Option<f64>, ViewError> {
    match requested {
        Some(value) if !value.is_finite() => Err(ViewError::InvalidThreshold { value }),
        Some(value) if Some(value) != cached => Ok(Some(value)),
        _ => Ok(None),
    }
}
