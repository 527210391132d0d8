//! Ordering of aggregated regions.

use std::collections::BTreeMap;

use quake_map_analytics_models::{RankedRegion, RegionStats};

/// Orders regions by event count, highest first.
///
/// Ties are broken by ascending region key so the result does not depend
/// on map iteration order or on the order events arrived in.
#[must_use]
pub fn rank(stats: &BTreeMap<String, RegionStats>) -> Vec<RankedRegion> {
    let mut ranked: Vec<RankedRegion> = stats
        .iter()
        .map(|(key, region)| {
            debug_assert_eq!(key, &region.region_key, "stats keyed by region");
            RankedRegion::from(region)
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.region_key.cmp(&b.region_key))
    });

    ranked
}

/// The first `limit` entries of [`rank`].
#[must_use]
pub fn rank_top(stats: &BTreeMap<String, RegionStats>, limit: usize) -> Vec<RankedRegion> {
    let mut ranked = rank(stats);
    ranked.truncate(limit);
    ranked
}
