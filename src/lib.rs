//! Seller analytics dashboard core: load a sales export, repair missing
//! columns, filter by date/marketplace/category and aggregate per page.

pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod state;
pub mod views;

pub use data::cache::DatasetCache;
pub use data::filter::{filter, FilterCriteria, FilteredView};
pub use data::model::{SalesRecord, SalesTable};
pub use error::LoadError;
pub use state::DashboardState;
pub use views::{render_page, Page, PageView};
