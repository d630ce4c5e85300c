use std::collections::BTreeMap;

use serde::Serialize;

use super::Panel;
use crate::data::filter::FilteredView;
use crate::format::format_fraction_pct;

/// One line of the product performance table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub asin: String,
    pub title: String,
    pub sessions: u64,
    /// Mean Buy Box share, formatted as a percentage (`"80.00%"`).
    pub buy_box_pct: String,
    pub units_sold: u64,
    pub revenue: f64,
    pub profit: f64,
}

#[derive(Default)]
struct Accumulator {
    sessions: u64,
    buy_box_sum: f64,
    rows: usize,
    units_sold: u64,
    revenue: f64,
    profit: f64,
}

/// Group by `(asin, title)`, highest revenue first.
pub fn aggregate(view: &FilteredView<'_>) -> Panel<Vec<ProductRow>> {
    if view.is_empty() {
        return Panel::NoData;
    }

    let mut groups: BTreeMap<(&str, &str), Accumulator> = BTreeMap::new();
    for r in view.records() {
        let acc = groups.entry((r.asin.as_str(), r.title.as_str())).or_default();
        acc.sessions = acc.sessions.saturating_add(r.sessions);
        acc.buy_box_sum += r.buy_box_pct;
        acc.rows += 1;
        acc.units_sold = acc.units_sold.saturating_add(r.units_sold);
        acc.revenue += r.revenue;
        acc.profit += r.profit;
    }

    let mut rows: Vec<ProductRow> = groups
        .into_iter()
        .map(|((asin, title), acc)| ProductRow {
            asin: asin.to_string(),
            title: title.to_string(),
            sessions: acc.sessions,
            buy_box_pct: format_fraction_pct(acc.buy_box_sum / acc.rows as f64),
            units_sold: acc.units_sold,
            revenue: acc.revenue,
            profit: acc.profit,
        })
        .collect();
    rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    Panel::Ready(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{record, table};

    #[test]
    fn groups_sum_and_rank_by_revenue() {
        let mut low_buy_box = record(2, "A", "Books", 4, 40, 40.0);
        low_buy_box.buy_box_pct = 0.6;
        let t = table(vec![
            record(1, "A", "Books", 1, 10, 10.25),
            record(1, "B", "Books", 2, 20, 500.0),
            low_buy_box,
            record(3, "A", "Books", 3, 30, 30.5),
        ]);
        let rows = aggregate(&FilteredView::all(&t)).ready().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].asin, "B");
        let a = &rows[1];
        assert_eq!(a.title, "Title A");
        assert_eq!(a.sessions, 80);
        assert_eq!(a.units_sold, 8);
        assert_eq!(a.revenue, 10.25 + 40.0 + 30.5);
        assert_eq!(a.profit, 10.25 * 0.25 + 40.0 * 0.25 + 30.5 * 0.25);
        // (0.8 + 0.6 + 0.8) / 3
        assert_eq!(a.buy_box_pct, "73.33%");
        assert_eq!(rows[0].buy_box_pct, "80.00%");
    }

    #[test]
    fn same_asin_different_title_is_a_separate_product() {
        let mut renamed = record(2, "A", "Books", 1, 1, 5.0);
        renamed.title = "Title A (2nd ed.)".into();
        let t = table(vec![record(1, "A", "Books", 1, 1, 5.0), renamed]);
        let rows = aggregate(&FilteredView::all(&t)).ready().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn huge_counts_saturate() {
        let t = table(vec![
            record(1, "A", "Books", u64::MAX, u64::MAX, 1.0),
            record(2, "A", "Books", u64::MAX, u64::MAX, 1.0),
        ]);
        let rows = aggregate(&FilteredView::all(&t)).ready().unwrap();
        assert_eq!(rows[0].sessions, u64::MAX);
        assert_eq!(rows[0].units_sold, u64::MAX);
    }

    #[test]
    fn empty_input_is_no_data() {
        let t = table(vec![]);
        assert!(aggregate(&FilteredView::all(&t)).is_no_data());
    }
}
