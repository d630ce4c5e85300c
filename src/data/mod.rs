/// Data layer: core types, loading, repair, caching and filtering.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable (any subset of columns)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  repair   │  fill absent columns, derive orders/profit/conversion
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ SalesTable  │  Vec<SalesRecord>, immutable, cached by content digest
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date range / marketplace / categories → FilteredView
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod repair;
