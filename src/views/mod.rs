//! The five dashboard pages. Each aggregator takes the filtered rows and
//! returns either [`Panel::NoData`] or the typed shape its page renders.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::filter::FilteredView;
use crate::data::model::SalesRecord;

pub mod finance;
pub mod overview;
pub mod products;
pub mod sales;
pub mod traffic;

pub use finance::FinanceSummary;
pub use overview::OverviewKpis;
pub use products::ProductRow;
pub use sales::SalesCharts;
pub use traffic::TrafficShare;

pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Page {
    #[default]
    Overview,
    Sales,
    Products,
    Traffic,
    Finance,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Overview,
        Page::Sales,
        Page::Products,
        Page::Traffic,
        Page::Finance,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Sales => "Sales",
            Page::Products => "Products",
            Page::Traffic => "Traffic",
            Page::Finance => "Finance",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page '{0}' (expected one of Overview, Sales, Products, Traffic, Finance)")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.title().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPage(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

/// Result of one aggregator: a distinct empty state, or data to chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Panel<T> {
    NoData,
    Ready(T),
}

impl<T> Panel<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Panel::NoData)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Panel::Ready(v) => Some(v),
            Panel::NoData => None,
        }
    }
}

/// One point of a daily trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One bar / slice of a categorical chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelledTotal {
    pub label: String,
    pub value: f64,
}

/// What the presentation layer receives for the active page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageView {
    NoData { page: Page, message: String },
    Overview { kpis: OverviewKpis },
    Sales { charts: SalesCharts },
    Products { rows: Vec<ProductRow> },
    Traffic { shares: Vec<TrafficShare> },
    Finance { summary: FinanceSummary },
}

impl PageView {
    fn no_data(page: Page) -> Self {
        PageView::NoData {
            page,
            message: NO_DATA_MESSAGE.to_string(),
        }
    }
}

/// Run the aggregator for `page` over the filtered rows.
pub fn render_page(page: Page, view: &FilteredView<'_>) -> PageView {
    let rendered = match page {
        Page::Overview => overview::aggregate(view).ready().map(|kpis| PageView::Overview { kpis }),
        Page::Sales => sales::aggregate(view).ready().map(|charts| PageView::Sales { charts }),
        Page::Products => products::aggregate(view).ready().map(|rows| PageView::Products { rows }),
        Page::Traffic => traffic::aggregate(view).ready().map(|shares| PageView::Traffic { shares }),
        Page::Finance => finance::aggregate(view)
            .ready()
            .map(|summary| PageView::Finance { summary }),
    };
    rendered.unwrap_or_else(|| PageView::no_data(page))
}

// ---------------------------------------------------------------------------
// Shared group-by helpers
// ---------------------------------------------------------------------------

/// Sum `value` per calendar day, chronologically.
pub(crate) fn daily_totals<'a>(
    records: impl Iterator<Item = &'a SalesRecord>,
    value: impl Fn(&SalesRecord) -> f64,
) -> Vec<DailyPoint> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        *by_day.entry(r.date).or_default() += value(r);
    }
    by_day
        .into_iter()
        .map(|(date, value)| DailyPoint { date, value })
        .collect()
}

/// Sum `value` per label, in label order.
pub(crate) fn label_totals<'a>(
    records: impl Iterator<Item = &'a SalesRecord>,
    label: impl Fn(&SalesRecord) -> &str,
    value: impl Fn(&SalesRecord) -> f64,
) -> Vec<LabelledTotal> {
    let mut by_label: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        *by_label.entry(label(r).to_string()).or_default() += value(r);
    }
    by_label
        .into_iter()
        .map(|(label, value)| LabelledTotal { label, value })
        .collect()
}
