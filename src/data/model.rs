use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed raw cell mirroring the dtypes a spreadsheet export or
/// a Parquet file can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Guess the type of a textual cell (CSV has no schema).
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::Text(s.to_string())
    }

    /// Interpret the value as a number. Text is parsed after stripping
    /// thousands separators and a leading currency sign.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',')
                    .collect();
                cleaned.parse::<f64>().ok()
            }
            _ => None,
        }
    }

    /// Label view of the cell; `None` for nulls and blank text.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – the canonical column set of a sales export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Date,
    Marketplace,
    Category,
    Asin,
    Title,
    Sessions,
    UnitsSold,
    Revenue,
    Orders,
    BuyBoxPct,
    Profit,
    TrafficSource,
    ConversionRate,
}

impl Column {
    pub const ALL: [Column; 13] = [
        Column::Date,
        Column::Marketplace,
        Column::Category,
        Column::Asin,
        Column::Title,
        Column::Sessions,
        Column::UnitsSold,
        Column::Revenue,
        Column::Orders,
        Column::BuyBoxPct,
        Column::Profit,
        Column::TrafficSource,
        Column::ConversionRate,
    ];

    /// Display header as it appears in a seller-central export.
    pub fn header(self) -> &'static str {
        match self {
            Column::Date => "Date",
            Column::Marketplace => "Marketplace",
            Column::Category => "Category",
            Column::Asin => "ASIN",
            Column::Title => "Title",
            Column::Sessions => "Sessions",
            Column::UnitsSold => "Units Sold",
            Column::Revenue => "Revenue",
            Column::Orders => "Orders",
            Column::BuyBoxPct => "Buy Box %",
            Column::Profit => "Profit",
            Column::TrafficSource => "Traffic Source",
            Column::ConversionRate => "Conversion Rate",
        }
    }

    /// Resolve a source header. Matching ignores case and treats spaces,
    /// underscores and hyphens alike, so `units_sold` matches `Units Sold`.
    pub fn from_header(header: &str) -> Option<Column> {
        let wanted = normalize_header(header);
        Column::ALL
            .into_iter()
            .find(|c| normalize_header(c.header()) == wanted)
    }
}

fn normalize_header(h: &str) -> String {
    h.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' | '_' | '-' => None,
            c => Some(c.to_ascii_lowercase()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RawTable – the unvalidated input, column-oriented
// ---------------------------------------------------------------------------

/// Raw rows with an unconstrained column set.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in source order.
    pub column_names: Vec<String>,
    /// One vector per column, same order as `column_names`.
    pub columns: Vec<Vec<CellValue>>,
    pub n_rows: usize,
}

impl RawTable {
    pub fn new(column_names: Vec<String>) -> Self {
        let columns = vec![Vec::new(); column_names.len()];
        Self {
            column_names,
            columns,
            n_rows: 0,
        }
    }

    /// Append a row given in column order. Short rows are padded with nulls.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.column_names.len(), CellValue::Null);
        for (col, cell) in self.columns.iter_mut().zip(cells) {
            col.push(cell);
        }
        self.n_rows += 1;
    }

    /// Cells of the source column that resolves to `column`, if any.
    pub fn column(&self, column: Column) -> Option<&[CellValue]> {
        self.column_names
            .iter()
            .position(|name| Column::from_header(name) == Some(column))
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.column(column).is_some()
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }
}

// ---------------------------------------------------------------------------
// SalesRecord – one fully-populated row
// ---------------------------------------------------------------------------

/// One product/day/marketplace observation. Every field is resolved at load
/// time; downstream code never checks presence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub marketplace: String,
    pub category: String,
    pub asin: String,
    pub title: String,
    pub sessions: u64,
    pub units_sold: u64,
    pub revenue: f64,
    pub orders: u64,
    /// Fraction in [0, 1].
    pub buy_box_pct: f64,
    pub profit: f64,
    pub traffic_source: String,
    /// Percentage, always derived from `units_sold` and `sessions`.
    pub conversion_rate: f64,
}

/// `units_sold / sessions * 100`, defined as 0 when there were no sessions.
pub fn conversion_rate(units_sold: u64, sessions: u64) -> f64 {
    if sessions == 0 {
        0.0
    } else {
        units_sold as f64 / sessions as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// SalesTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable loaded table. Built once per distinct source content and
/// shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SalesTable {
    pub(crate) records: Vec<SalesRecord>,
    /// Human-readable notes about columns that had to be repaired.
    advisories: Vec<String>,
}

impl SalesTable {
    pub fn new(records: Vec<SalesRecord>, advisories: Vec<String>) -> Self {
        Self {
            records,
            advisories,
        }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn advisories(&self) -> &[String] {
        &self.advisories
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct marketplaces in first-appearance order.
    pub fn marketplaces(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.marketplace.as_str()))
    }

    /// Distinct categories in first-appearance order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.category.as_str()))
    }

    /// Earliest and latest record date.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
