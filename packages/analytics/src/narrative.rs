//! Templated risk outlook text.
//!
//! The text is plain string substitution over a ranked list; there is no
//! model behind it. The same ranking always produces byte-identical text.

use quake_map_analytics_models::RankedRegion;

/// Number of regions named in the default outlook.
pub const DEFAULT_TOP_K: usize = 3;

/// Sentence returned when there is nothing to rank.
pub const INSUFFICIENT_DATA: &str = "Insufficient data to generate a regional risk outlook.";

const LEAD: &str = "Based on recent activity, the regions with the most recorded earthquakes are";
const ADVISORY: &str =
    "These regions may face elevated seismic risk; follow local advisories and review preparedness plans.";
const PLACEHOLDER_REGION: &str = "N/A";

/// Renders the outlook for the first `top_k` entries of `ranked`.
///
/// When fewer than `top_k` regions exist the missing slots are rendered
/// as `N/A (0 events)`, padding the list to at most [`DEFAULT_TOP_K`]
/// entries. An empty ranking, or `top_k == 0`, yields
/// [`INSUFFICIENT_DATA`].
#[must_use]
pub fn narrate(ranked: &[RankedRegion], top_k: usize) -> String {
    if ranked.is_empty() || top_k == 0 {
        return INSUFFICIENT_DATA.to_string();
    }

    let slots = top_k.min(ranked.len().max(DEFAULT_TOP_K));
    let entries = (0..slots)
        .map(|slot| {
            ranked.get(slot).map_or_else(
                || format!("{PLACEHOLDER_REGION} (0 events)"),
                |region| format!("{} ({} events)", region.region_key, region.count),
            )
        })
        .collect::<Vec<_>>();

    format!("{LEAD} {}. {ADVISORY}", join_list(&entries))
}

fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
