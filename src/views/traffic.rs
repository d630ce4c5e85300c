use std::collections::BTreeMap;

use serde::Serialize;

use super::Panel;
use crate::data::filter::FilteredView;

/// One slice of the sessions-by-source pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficShare {
    pub source: String,
    pub sessions: u64,
    /// Share of all filtered sessions, in percent.
    pub share_pct: f64,
}

/// Sessions per traffic source, sources in alphabetical order.
pub fn aggregate(view: &FilteredView<'_>) -> Panel<Vec<TrafficShare>> {
    if view.is_empty() {
        return Panel::NoData;
    }

    let mut by_source: BTreeMap<&str, u64> = BTreeMap::new();
    for r in view.records() {
        let sessions = by_source.entry(r.traffic_source.as_str()).or_default();
        *sessions = sessions.saturating_add(r.sessions);
    }
    let all_sessions = by_source.values().fold(0u64, |acc, &s| acc.saturating_add(s));

    let shares = by_source
        .into_iter()
        .map(|(source, sessions)| TrafficShare {
            source: source.to_string(),
            sessions,
            share_pct: if all_sessions > 0 {
                sessions as f64 / all_sessions as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    Panel::Ready(shares)
}
