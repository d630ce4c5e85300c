use serde::Serialize;

use super::{daily_totals, DailyPoint, Panel};
use crate::data::filter::FilteredView;
use crate::format::format_money;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceSummary {
    pub total_profit: f64,
    pub total_revenue: f64,
    /// Profit per day, chronological.
    pub daily_profit: Vec<DailyPoint>,
}

impl FinanceSummary {
    /// `(title, value)` pairs for the two metric cards.
    pub fn metrics(&self) -> [(&'static str, String); 2] {
        [
            ("Total Profit", format_money(self.total_profit)),
            ("Total Revenue", format_money(self.total_revenue)),
        ]
    }
}

pub fn aggregate(view: &FilteredView<'_>) -> Panel<FinanceSummary> {
    if view.is_empty() {
        return Panel::NoData;
    }

    let (total_profit, total_revenue) = view
        .records()
        .fold((0.0, 0.0), |(p, r), rec| (p + rec.profit, r + rec.revenue));

    Panel::Ready(FinanceSummary {
        total_profit,
        total_revenue,
        daily_profit: daily_totals(view.records(), |r| r.profit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{record, table};

    #[test]
    fn totals_and_daily_profit() {
        let t = table(vec![
            record(2, "A", "Books", 1, 1, 100.0),
            record(1, "B", "Books", 1, 1, 40.0),
            record(2, "C", "Books", 1, 1, 60.0),
        ]);
        let summary = aggregate(&FilteredView::all(&t)).ready().unwrap();
        assert_eq!(summary.total_revenue, 200.0);
        assert_eq!(summary.total_profit, 50.0);
        let profits: Vec<f64> = summary.daily_profit.iter().map(|p| p.value).collect();
        assert_eq!(profits, vec![10.0, 40.0]);
        assert!(summary.daily_profit[0].date < summary.daily_profit[1].date);
    }

    #[test]
    fn metrics_are_formatted_as_money() {
        let t = table(vec![record(1, "A", "Books", 1, 1, 4_000.4)]);
        let summary = aggregate(&FilteredView::all(&t)).ready().unwrap();
        assert_eq!(
            summary.metrics(),
            [
                ("Total Profit", "$1,000.10".to_string()),
                ("Total Revenue", "$4,000.40".to_string()),
            ]
        );
    }

    #[test]
    fn empty_input_is_no_data() {
        let t = table(vec![]);
        assert!(aggregate(&FilteredView::all(&t)).is_no_data());
    }
}
