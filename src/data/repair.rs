use std::ops::Range;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use log::warn;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::model::{conversion_rate, CellValue, Column, RawTable, SalesRecord, SalesTable};

// ---------------------------------------------------------------------------
// Backfill constants
// ---------------------------------------------------------------------------

/// Substituted for unparseable dates and used as the start of a synthesized
/// daily sequence.
pub const FALLBACK_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2022, 1, 1) {
    Some(d) => d,
    None => panic!("invalid fallback date"),
};

pub const MARKETPLACES: [&str; 3] = ["US", "UK", "DE"];
pub const CATEGORIES: [&str; 4] = ["Electronics", "Books", "Home & Kitchen", "Apparel"];
pub const TRAFFIC_SOURCES: [&str; 4] = ["Organic", "Paid Search", "Social Media", "Direct"];

pub const BUY_BOX_CHOICES: [f64; 4] = [0.6, 0.7, 0.8, 0.9];
const BUY_BOX_WEIGHTS: [u32; 4] = [1, 2, 3, 4];

const SESSIONS_BASE: Range<u64> = 100..10_000;
const UNITS_BASE: Range<u64> = 10..500;
const UNIT_PRICE: Range<u64> = 10..200;

pub const ORDERS_PER_UNIT: f64 = 0.7;
pub const PROFIT_MARGIN: f64 = 0.25;

/// Placeholder for blank label cells in a present column.
pub const UNKNOWN_LABEL: &str = "Unknown";

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%b-%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

// ---------------------------------------------------------------------------
// Advisory collection
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Advisories(Vec<String>);

impl Advisories {
    fn push(&mut self, message: String) {
        warn!("{message}");
        self.0.push(message);
    }

    fn missing(&mut self, column: Column) {
        self.push(format!(
            "'{}' column not found. Generating dummy data for it.",
            column.header()
        ));
    }
}

// ---------------------------------------------------------------------------
// Table construction
// ---------------------------------------------------------------------------

/// Resolve every column of `raw` into a fully-populated [`SalesTable`].
///
/// Columns are repaired independently and in a fixed order, each only when
/// absent from the source, so a seeded `rng` reproduces the same synthetic
/// values. `conversion_rate` is always recomputed last.
pub fn build_table<R: Rng + ?Sized>(raw: RawTable, rng: &mut R) -> SalesTable {
    let n = raw.len();
    let mut notes = Advisories::default();

    let dates = resolve_dates(&raw, &mut notes);

    let marketplaces = match label_column(&raw, Column::Marketplace, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Marketplace);
            draw_labels(&MARKETPLACES, n, rng)
        }
    };
    let categories = match label_column(&raw, Column::Category, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Category);
            draw_labels(&CATEGORIES, n, rng)
        }
    };
    let asins = match label_column(&raw, Column::Asin, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Asin);
            (0..n).map(|i| format!("B0{i:08}")).collect()
        }
    };
    let titles = match label_column(&raw, Column::Title, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Title);
            (0..n).map(|i| format!("Product Title {i}")).collect()
        }
    };
    let sessions = match count_column(&raw, Column::Sessions, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Sessions);
            draw_seasonal_counts(&dates, SESSIONS_BASE, rng)
        }
    };
    let units_sold = match count_column(&raw, Column::UnitsSold, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::UnitsSold);
            draw_seasonal_counts(&dates, UNITS_BASE, rng)
        }
    };
    let revenue = match amount_column(&raw, Column::Revenue, &mut notes) {
        Some(v) => v,
        None => {
            notes.missing(Column::Revenue);
            units_sold
                .iter()
                .map(|&units| units as f64 * rng.gen_range(UNIT_PRICE) as f64)
                .collect()
        }
    };
    let orders = match count_column(&raw, Column::Orders, &mut notes) {
        Some(v) => v,
        None => units_sold.iter().map(|&units| derive_orders(units)).collect(),
    };
    let buy_box = match fraction_column(&raw, Column::BuyBoxPct, &mut notes) {
        Some(v) => v,
        None => draw_buy_box(n, rng),
    };
    let profit = match amount_column(&raw, Column::Profit, &mut notes) {
        Some(v) => v,
        None => revenue.iter().map(|&r| derive_profit(r)).collect(),
    };
    let traffic_sources = match label_column(&raw, Column::TrafficSource, &mut notes) {
        Some(v) => v,
        None => draw_labels(&TRAFFIC_SOURCES, n, rng),
    };

    let records = dates
        .into_iter()
        .zip(marketplaces)
        .zip(categories)
        .zip(asins)
        .zip(titles)
        .zip(traffic_sources)
        .enumerate()
        .map(
            |(i, (((((date, marketplace), category), asin), title), traffic_source))| SalesRecord {
                date,
                marketplace,
                category,
                asin,
                title,
                sessions: sessions[i],
                units_sold: units_sold[i],
                revenue: revenue[i],
                orders: orders[i],
                buy_box_pct: buy_box[i],
                profit: profit[i],
                traffic_source,
                conversion_rate: conversion_rate(units_sold[i], sessions[i]),
            },
        )
        .collect();

    SalesTable::new(records, notes.0)
}

/// `round(units_sold * 0.7)`.
pub fn derive_orders(units_sold: u64) -> u64 {
    (units_sold as f64 * ORDERS_PER_UNIT).round() as u64
}

/// `revenue * 0.25`.
pub fn derive_profit(revenue: f64) -> f64 {
    revenue * PROFIT_MARGIN
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

fn resolve_dates(raw: &RawTable, notes: &mut Advisories) -> Vec<NaiveDate> {
    let Some(cells) = raw.column(Column::Date) else {
        notes.push("'Date' column not found, generating dummy dates.".to_string());
        return (0..raw.len())
            .map(|i| {
                FALLBACK_DATE
                    .checked_add_days(Days::new(i as u64))
                    .unwrap_or(NaiveDate::MAX)
            })
            .collect();
    };

    let mut unparseable = 0usize;
    let dates = cells
        .iter()
        .map(|cell| {
            cell_to_date(cell).unwrap_or_else(|| {
                unparseable += 1;
                FALLBACK_DATE
            })
        })
        .collect();

    if unparseable > 0 {
        notes.push(format!(
            "{unparseable} value(s) in 'Date' column were unparseable. Filling with '{FALLBACK_DATE}'."
        ));
    }
    dates
}

fn cell_to_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(d) => Some(*d),
        CellValue::Text(s) => parse_date(s),
        _ => None,
    }
}

/// Parse a calendar date from the common export layouts. Any time-of-day
/// component is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

// ---------------------------------------------------------------------------
// Present columns: read with per-cell recovery
// ---------------------------------------------------------------------------

fn label_column(raw: &RawTable, column: Column, notes: &mut Advisories) -> Option<Vec<String>> {
    let cells = raw.column(column)?;
    let mut blanks = 0usize;
    let labels = cells
        .iter()
        .map(|cell| {
            cell.as_label().unwrap_or_else(|| {
                blanks += 1;
                UNKNOWN_LABEL.to_string()
            })
        })
        .collect();
    if blanks > 0 {
        notes.push(format!(
            "{blanks} blank value(s) in '{}' column replaced with '{UNKNOWN_LABEL}'.",
            column.header()
        ));
    }
    Some(labels)
}

fn count_column(raw: &RawTable, column: Column, notes: &mut Advisories) -> Option<Vec<u64>> {
    numeric_column(raw, column, notes, |v| (v >= 0.0).then_some(v))
        .map(|values| values.into_iter().map(|v| v as u64).collect())
}

fn amount_column(raw: &RawTable, column: Column, notes: &mut Advisories) -> Option<Vec<f64>> {
    numeric_column(raw, column, notes, |v| (v >= 0.0).then_some(v))
}

/// Buy Box share as a fraction. `"85%"` and bare values in (1, 100] are read
/// as percentages.
fn fraction_column(raw: &RawTable, column: Column, notes: &mut Advisories) -> Option<Vec<f64>> {
    let cells = raw.column(column)?;
    let mut invalid = 0usize;
    let values = cells
        .iter()
        .map(|cell| {
            let parsed = match cell {
                CellValue::Text(s) if s.trim().ends_with('%') => s
                    .trim()
                    .trim_end_matches('%')
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|v| v / 100.0),
                other => other.as_f64(),
            };
            let fraction = parsed.filter(|v| v.is_finite()).and_then(|v| match v {
                v if (0.0..=1.0).contains(&v) => Some(v),
                v if v > 1.0 && v <= 100.0 => Some(v / 100.0),
                _ => None,
            });
            fraction.unwrap_or_else(|| {
                invalid += 1;
                0.0
            })
        })
        .collect();
    if invalid > 0 {
        notes.push(format!(
            "{invalid} invalid value(s) in '{}' column replaced with 0.",
            column.header()
        ));
    }
    Some(values)
}

fn numeric_column(
    raw: &RawTable,
    column: Column,
    notes: &mut Advisories,
    accept: impl Fn(f64) -> Option<f64>,
) -> Option<Vec<f64>> {
    let cells = raw.column(column)?;
    let mut invalid = 0usize;
    let values = cells
        .iter()
        .map(|cell| {
            cell.as_f64()
                .filter(|v| v.is_finite())
                .and_then(&accept)
                .unwrap_or_else(|| {
                    invalid += 1;
                    0.0
                })
        })
        .collect();
    if invalid > 0 {
        notes.push(format!(
            "{invalid} missing or invalid value(s) in '{}' column replaced with 0.",
            column.header()
        ));
    }
    Some(values)
}

// ---------------------------------------------------------------------------
// Absent columns: synthetic draws
// ---------------------------------------------------------------------------

fn draw_labels<R: Rng + ?Sized>(labels: &[&str], n: usize, rng: &mut R) -> Vec<String> {
    (0..n)
        .map(|_| labels[rng.gen_range(0..labels.len())].to_string())
        .collect()
}

/// Base draw scaled by `1 + month / 12`. The float-to-int cast truncates and
/// saturates, so NaN and negatives land on 0.
fn draw_seasonal_counts<R: Rng + ?Sized>(
    dates: &[NaiveDate],
    base: Range<u64>,
    rng: &mut R,
) -> Vec<u64> {
    dates
        .iter()
        .map(|date| {
            let scale = 1.0 + date.month() as f64 / 12.0;
            (rng.gen_range(base.clone()) as f64 * scale) as u64
        })
        .collect()
}

fn draw_buy_box<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f64> {
    let dist = WeightedIndex::new(BUY_BOX_WEIGHTS).expect("buy box weights are positive constants");
    (0..n).map(|_| BUY_BOX_CHOICES[dist.sample(rng)]).collect()
}
