//! Region key extraction from free-text place labels.
//!
//! USGS place labels look like `"10km SE of Example City, Nevada"`; the
//! text after the last comma is used as a coarse region. This is a
//! heuristic, not a gazetteer lookup: no case folding or punctuation
//! stripping is applied, so `"Nevada"` and `"nevada"` are distinct keys.

/// Key assigned to events with a missing or empty place label.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Derives the region key for a place label.
///
/// * `None` or `""` → [`UNKNOWN_REGION`]
/// * contains a comma → trimmed text after the last comma
/// * otherwise → the whole label, trimmed
#[must_use]
pub fn extract(place: Option<&str>) -> String {
    match place {
        None | Some("") => UNKNOWN_REGION.to_string(),
        Some(place) => place
            .rsplit(',')
            .next()
            .unwrap_or(place)
            .trim()
            .to_string(),
    }
}
