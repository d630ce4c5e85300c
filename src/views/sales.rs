use serde::Serialize;

use super::{daily_totals, label_totals, DailyPoint, LabelledTotal, Panel};
use crate::data::filter::FilteredView;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesCharts {
    /// Revenue per day, chronological.
    pub daily_revenue: Vec<DailyPoint>,
    /// Revenue per category, highest first.
    pub revenue_by_category: Vec<LabelledTotal>,
}

pub fn aggregate(view: &FilteredView<'_>) -> Panel<SalesCharts> {
    if view.is_empty() {
        return Panel::NoData;
    }

    let daily_revenue = daily_totals(view.records(), |r| r.revenue);

    let mut revenue_by_category = label_totals(view.records(), |r| r.category.as_str(), |r| r.revenue);
    // Stable: equal revenues keep category order.
    revenue_by_category.sort_by(|a, b| b.value.total_cmp(&a.value));

    Panel::Ready(SalesCharts {
        daily_revenue,
        revenue_by_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{record, table};

    #[test]
    fn trend_is_chronological_and_categories_ranked() {
        let t = table(vec![
            record(3, "A", "Books", 1, 1, 30.0),
            record(1, "B", "Apparel", 1, 1, 10.0),
            record(3, "C", "Electronics", 1, 1, 45.0),
            record(2, "D", "Books", 1, 1, 20.0),
        ]);
        let charts = aggregate(&FilteredView::all(&t)).ready().unwrap();

        let days: Vec<(u32, f64)> = charts
            .daily_revenue
            .iter()
            .map(|p| (chrono::Datelike::day(&p.date), p.value))
            .collect();
        assert_eq!(days, vec![(1, 10.0), (2, 20.0), (3, 75.0)]);

        let ranked: Vec<(&str, f64)> = charts
            .revenue_by_category
            .iter()
            .map(|c| (c.label.as_str(), c.value))
            .collect();
        assert_eq!(
            ranked,
            vec![("Books", 50.0), ("Electronics", 45.0), ("Apparel", 10.0)]
        );
    }

    #[test]
    fn empty_input_is_no_data() {
        let t = table(vec![]);
        assert!(aggregate(&FilteredView::all(&t)).is_no_data());
    }
}
