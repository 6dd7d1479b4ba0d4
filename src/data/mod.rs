/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  embedded .csv / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse text → Dataset (rows sorted by year)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterState → filtered rows
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  rows → one series per chart (uses regression)
///   └───────────┘
/// ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod regression;
