/// Data layer: report model, loading, filtering and export.
///
/// Architecture:
/// ```text
///  Sales_By_Product_Report.xlsx / .xls
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sheet `Report_Output`, header on row 1 → RecordTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ predicate  │  vendor, cost > 0, "Motorola", last 3 days
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  location / salesman / product selectors
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  column projection → CSV / .xlsx, summary stats
///   └──────────┘
/// ```

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod predicate;
