//! Plain-text rendering of query results.

use std::fmt::Write as _;

use quake_map_analytics_models::{RankedRegion, RiskSummary};
use quake_map_event_models::{Event, Feed, HIGH_RISK_MAGNITUDE};
use quake_map_view::ViewState;

pub fn summary(feed: Feed, summary: &RiskSummary) -> String {
    format!(
        "Feed: {feed}\n\
         Average magnitude: {}\n\
         High-risk events (M{HIGH_RISK_MAGNITUDE:.1}+): {}\n\
         Captured at: {}\n",
        summary.average_magnitude_display(),
        summary.high_risk_count,
        summary.timestamp,
    )
}

pub fn regions(regions: &[RankedRegion]) -> String {
    if regions.is_empty() {
        return "No regions with qualifying events.\n".to_string();
    }

    let mut out = format!(
        "{:>4}  {:<32} {:>6} {:>7} {:>9} {:>10}\n{}\n",
        "RANK",
        "REGION",
        "EVENTS",
        "MEAN M",
        "LAT",
        "LON",
        "-".repeat(73)
    );
    for (rank, region) in regions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<32} {:>6} {:>7.2} {:>9.3} {:>10.3}",
            rank + 1,
            region.region_key,
            region.count,
            region.mean_magnitude,
            region.mean_latitude,
            region.mean_longitude,
        );
    }
    out
}

pub fn events(events: &[Event], limit: Option<usize>) -> String {
    let shown = limit.unwrap_or(events.len()).min(events.len());

    let mut out = String::new();
    for event in &events[..shown] {
        let magnitude = event
            .magnitude
            .map_or_else(|| "-".to_string(), |m| format!("{m:.1}"));
        let class = event
            .magnitude_class()
            .map_or_else(String::new, |class| class.to_string());
        let _ = writeln!(
            out,
            "{magnitude:>5}  {class:<8}  {}",
            event.place.as_deref().unwrap_or("(no place)")
        );
    }
    if shown < events.len() {
        let _ = writeln!(out, "... and {} more", events.len() - shown);
    }
    out
}

pub fn view_states(states: &[ViewState]) -> String {
    let mut out = String::new();
    for state in states {
        let detail = match (&state.data, &state.error) {
            (Some(view), _) => format!(
                "{} events, {} regions",
                view.events.len(),
                view.ranked.len()
            ),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        let _ = writeln!(
            out,
            "{:<22} {:<12} {detail}",
            state.dataset.as_ref(),
            state.status.as_ref()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(key: &str, count: u64) -> RankedRegion {
        RankedRegion {
            region_key: key.to_string(),
            count,
            mean_magnitude: 4.65,
            mean_latitude: 39.4,
            mean_longitude: -119.75,
        }
    }

    #[test]
    fn summary_uses_two_decimals() {
        let text = summary(
            Feed::Realtime,
            &RiskSummary {
                average_magnitude: 4.1,
                high_risk_count: 1,
                timestamp: "2026-01-01T00:00:00.000000Z".to_string(),
            },
        );
        assert!(text.contains("Feed: realtime\n"));
        assert!(text.contains("Average magnitude: 4.10\n"));
        assert!(text.contains("High-risk events (M5.0+): 1\n"));
    }

    #[test]
    fn regions_are_numbered_in_order() {
        let text = regions(&[ranked("Nevada", 2), ranked("Japan", 1)]);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].trim_start().starts_with("1  Nevada"));
        assert!(lines[3].trim_start().starts_with("2  Japan"));
        assert!(lines[2].contains("4.65"));
    }

    #[test]
    fn empty_regions_message() {
        assert_eq!(regions(&[]), "No regions with qualifying events.\n");
    }

    #[test]
    fn events_truncate_with_remainder() {
        let list = vec![
            Event::new(Some("Tokyo, Japan"), 139.7, 35.7, Some(3.0)),
            Event::new(None, 0.0, 0.0, None),
            Event::new(Some("Off the coast, Chile"), -72.0, -33.0, Some(6.1)),
        ];
        let text = events(&list, Some(2));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("3.0") && lines[0].contains("MINOR"));
        assert!(lines[1].contains("(no place)"));
        assert_eq!(lines[2], "... and 1 more");

        assert_eq!(events(&list, None).lines().count(), 3);
        assert_eq!(events(&list, Some(10)).lines().count(), 3);
    }
}
