use serde::Serialize;

use super::Panel;
use crate::data::filter::FilteredView;
use crate::format::{format_count, format_money, format_pct};

/// Headline KPI cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewKpis {
    pub total_revenue: f64,
    pub total_orders: u64,
    pub total_units_sold: u64,
    pub total_sessions: u64,
    /// Arithmetic mean of the per-row conversion rates, in percent. Not
    /// recomputed from the totals.
    pub avg_conversion_rate: f64,
}

impl OverviewKpis {
    /// `(title, value)` pairs as shown on the cards.
    pub fn cards(&self) -> [(&'static str, String); 5] {
        [
            ("Total Revenue", format_money(self.total_revenue)),
            ("Total Orders", format_count(self.total_orders)),
            ("Units Sold", format_count(self.total_units_sold)),
            ("Sessions", format_count(self.total_sessions)),
            ("Conversion Rate", format_pct(self.avg_conversion_rate)),
        ]
    }
}

pub fn aggregate(view: &FilteredView<'_>) -> Panel<OverviewKpis> {
    if view.is_empty() {
        return Panel::NoData;
    }

    let mut kpis = OverviewKpis {
        total_revenue: 0.0,
        total_orders: 0,
        total_units_sold: 0,
        total_sessions: 0,
        avg_conversion_rate: 0.0,
    };
    let mut conversion_sum = 0.0;
    // Counts saturate at u64::MAX instead of wrapping.
    for r in view.records() {
        kpis.total_revenue += r.revenue;
        kpis.total_orders = kpis.total_orders.saturating_add(r.orders);
        kpis.total_units_sold = kpis.total_units_sold.saturating_add(r.units_sold);
        kpis.total_sessions = kpis.total_sessions.saturating_add(r.sessions);
        conversion_sum += r.conversion_rate;
    }
    kpis.avg_conversion_rate = conversion_sum / view.len() as f64;

    Panel::Ready(kpis)
}
