use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Deserialize;

use crate::data::filter::{CategoryFilter, DateRange, FilterCriteria, MarketplaceFilter};
use crate::data::model::SalesTable;
use crate::views::Page;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SynthesisConfig {
    /// Seed for synthetic backfill. Unset means fresh entropy on every load.
    pub seed: Option<u64>,
}

/// Initial control values. Anything unset falls back to the table-derived
/// defaults (full date span, all marketplaces, all categories).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub page: Page,
    pub marketplace: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DashboardConfig {
    pub fn criteria_for(&self, table: &SalesTable) -> FilterCriteria {
        let defaults = FilterCriteria::defaults_for(table);
        let date_range = match (self.start_date, self.end_date, defaults.date_range) {
            (Some(start), Some(end), _) => Some(DateRange::new(start, end)),
            (Some(start), None, Some(full)) => Some(DateRange::new(start, full.end)),
            (None, Some(end), Some(full)) => Some(DateRange::new(full.start, end)),
            (_, _, full) => full,
        };
        let marketplace = self
            .marketplace
            .as_deref()
            .map(|m| m.parse().unwrap_or_default())
            .unwrap_or(MarketplaceFilter::All);
        let categories = if self.categories.is_empty() {
            defaults.categories
        } else {
            CategoryFilter::of(self.categories.iter().cloned())
        };
        FilterCriteria {
            date_range,
            marketplace,
            categories,
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[source]
path = "data/amazon.csv"

[dashboard]
page = "Overview"
marketplace = "All"
"#;

/// Name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "dashboard.toml";

/// Load configuration.
///
/// Search order:
/// 1. `explicit` path (first CLI argument), which must exist
/// 2. `dashboard.toml` in the working directory
/// 3. Falls back to embedded default config
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        info!("Loading config from: {}", path.display());
        return parse_file(path);
    }

    let local = Path::new(CONFIG_FILE);
    if local.exists() {
        info!("Loading config from: {}", local.display());
        return parse_file(local);
    }
    warn!("{CONFIG_FILE} not found in working directory");

    info!("Using default embedded configuration");
    parse(DEFAULT_CONFIG).context("parsing embedded default config")
}

fn parse_file(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn parse(contents: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(contents)?)
}
