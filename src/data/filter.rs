use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::model::{SalesRecord, SalesTable};

/// Sentinel label meaning "no restriction" in the marketplace and category
/// controls.
pub const ALL: &str = "All";

// ---------------------------------------------------------------------------
// DateRange
// ---------------------------------------------------------------------------

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Bounds given in reverse order are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// First instant of the first day.
    pub fn start_of_day(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Last instant of the last day.
    pub fn end_of_day(&self) -> NaiveDateTime {
        // 23:59:59.999999999
        self.end
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN) - chrono::Duration::nanoseconds(1))
            .unwrap_or(NaiveDateTime::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let instant = date.and_time(NaiveTime::MIN);
        self.start_of_day() <= instant && instant <= self.end_of_day()
    }
}

// ---------------------------------------------------------------------------
// Marketplace / category selectors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MarketplaceFilter {
    #[default]
    All,
    Only(String),
}

impl FromStr for MarketplaceFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(if s.eq_ignore_ascii_case(ALL) {
            MarketplaceFilter::All
        } else {
            MarketplaceFilter::Only(s.to_string())
        })
    }
}

impl fmt::Display for MarketplaceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketplaceFilter::All => write!(f, "{ALL}"),
            MarketplaceFilter::Only(m) => write!(f, "{m}"),
        }
    }
}

impl MarketplaceFilter {
    pub fn matches(&self, marketplace: &str) -> bool {
        match self {
            MarketplaceFilter::All => true,
            MarketplaceFilter::Only(m) => m == marketplace,
        }
    }
}

/// Selected categories. Empty, or containing [`ALL`], means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter(pub BTreeSet<String>);

impl CategoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn of<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty() || self.0.contains(ALL)
    }

    pub fn matches(&self, category: &str) -> bool {
        self.is_unrestricted() || self.0.contains(category)
    }
}

// ---------------------------------------------------------------------------
// Predicates and criteria
// ---------------------------------------------------------------------------

/// One independent row test. Predicates commute: any application order
/// yields the same rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Date(DateRange),
    Marketplace(MarketplaceFilter),
    Category(CategoryFilter),
}

impl Predicate {
    pub fn matches(&self, record: &SalesRecord) -> bool {
        match self {
            Predicate::Date(range) => range.contains(record.date),
            Predicate::Marketplace(m) => m.matches(&record.marketplace),
            Predicate::Category(c) => c.matches(&record.category),
        }
    }
}

/// The dashboard's filter controls as plain values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// `None` means every date.
    pub date_range: Option<DateRange>,
    pub marketplace: MarketplaceFilter,
    pub categories: CategoryFilter,
}

impl FilterCriteria {
    /// Initial control state for a table: its full date span, every
    /// marketplace and every category selected.
    pub fn defaults_for(table: &SalesTable) -> Self {
        Self {
            date_range: table.date_bounds().map(|(lo, hi)| DateRange::new(lo, hi)),
            marketplace: MarketplaceFilter::All,
            categories: CategoryFilter::of(table.categories()),
        }
    }

    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(3);
        if let Some(range) = self.date_range {
            predicates.push(Predicate::Date(range));
        }
        predicates.push(Predicate::Marketplace(self.marketplace.clone()));
        predicates.push(Predicate::Category(self.categories.clone()));
        predicates
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.date_range.map_or(true, |r| r.contains(record.date))
            && self.marketplace.matches(&record.marketplace)
            && self.categories.matches(&record.category)
    }
}

// ---------------------------------------------------------------------------
// FilteredView – a borrowed subtable
// ---------------------------------------------------------------------------

/// Rows of a [`SalesTable`] that passed a filter, in table order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a SalesTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Every row of `table`.
    pub fn all(table: &'a SalesTable) -> Self {
        Self {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn from_indices(table: &'a SalesTable, indices: Vec<usize>) -> Self {
        Self { table, indices }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        let rows = self.table.records();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Narrow further by one predicate.
    pub fn narrow(self, predicate: &Predicate) -> Self {
        let rows = self.table.records();
        let indices = self
            .indices
            .into_iter()
            .filter(|&i| predicate.matches(&rows[i]))
            .collect();
        Self {
            table: self.table,
            indices,
        }
    }
}

/// Return the rows of `table` passing all active criteria.
pub fn filter<'a>(table: &'a SalesTable, criteria: &FilterCriteria) -> FilteredView<'a> {
    FilteredView::from_indices(table, filtered_indices(table, criteria))
}

/// Indices of records passing all active criteria.
pub fn filtered_indices(table: &SalesTable, criteria: &FilterCriteria) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| criteria.matches(r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::conversion_rate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn record(day: u32, marketplace: &str, category: &str) -> SalesRecord {
        SalesRecord {
            date: date(day),
            marketplace: marketplace.into(),
            category: category.into(),
            asin: format!("B0{day}"),
            title: format!("Item {day}"),
            sessions: 100,
            units_sold: 10,
            revenue: 100.0,
            orders: 7,
            buy_box_pct: 0.9,
            profit: 25.0,
            traffic_source: "Organic".into(),
            conversion_rate: conversion_rate(10, 100),
        }
    }

    fn table() -> SalesTable {
        SalesTable::new(
            vec![
                record(1, "US", "Books"),
                record(2, "UK", "Books"),
                record(3, "US", "Apparel"),
                record(4, "DE", "Electronics"),
                record(5, "US", "Electronics"),
            ],
            Vec::new(),
        )
    }

    #[test]
    fn date_range_is_inclusive_and_normalized() {
        let range = DateRange::new(date(4), date(2));
        assert_eq!(range.start, date(2));
        assert!(range.contains(date(2)));
        assert!(range.contains(date(4)));
        assert!(!range.contains(date(5)));
        assert_eq!(range.end_of_day().time().to_string(), "23:59:59.999999999");
    }

    #[test]
    fn all_sentinels_return_the_date_filtered_set() {
        let t = table();
        let criteria = FilterCriteria {
            date_range: Some(DateRange::new(date(2), date(4))),
            marketplace: "All".parse().unwrap(),
            categories: CategoryFilter::of(["All"]),
        };
        assert_eq!(filter(&t, &criteria).indices(), &[1, 2, 3]);

        let criteria = FilterCriteria {
            categories: CategoryFilter::all(),
            ..criteria
        };
        assert_eq!(filter(&t, &criteria).indices(), &[1, 2, 3]);
    }

    #[test]
    fn marketplace_and_category_restrict() {
        let t = table();
        let criteria = FilterCriteria {
            date_range: None,
            marketplace: MarketplaceFilter::Only("US".into()),
            categories: CategoryFilter::of(["Books", "Electronics"]),
        };
        let view = filter(&t, &criteria);
        assert_eq!(view.indices(), &[0, 4]);
        assert!(view.records().all(|r| r.marketplace == "US"));
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let t = table();
        let criteria = FilterCriteria {
            date_range: Some(DateRange::new(date(1), date(5))),
            marketplace: MarketplaceFilter::Only("US".into()),
            categories: CategoryFilter::of(["Apparel", "Electronics"]),
        };
        let preds = criteria.predicates();
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let expected = filter(&t, &criteria).indices().to_vec();
        assert_eq!(expected, vec![2, 4]);
        for order in orders {
            let view = order
                .iter()
                .fold(FilteredView::all(&t), |view, &p| view.narrow(&preds[p]));
            assert_eq!(view.indices(), expected.as_slice());
        }
    }

    #[test]
    fn defaults_select_everything() {
        let t = table();
        let criteria = FilterCriteria::defaults_for(&t);
        assert_eq!(criteria.date_range, Some(DateRange::new(date(1), date(5))));
        assert_eq!(criteria.categories.0.len(), 3);
        assert_eq!(filter(&t, &criteria).len(), t.len());
    }

    #[test]
    fn marketplace_sentinel_parses_case_insensitively() {
        assert_eq!("all".parse::<MarketplaceFilter>().unwrap(), MarketplaceFilter::All);
        assert_eq!(
            " UK ".parse::<MarketplaceFilter>().unwrap(),
            MarketplaceFilter::Only("UK".into())
        );
    }
}
