/// Data layer: core types, loading, and previewing.
///
/// Architecture:
/// ```text
///  .xlsx / .ods / .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset   (LoadError on failure)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  Vec<Column>, shared row count
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ preview  │  first rows → RecordBatch → text table
///   └──────────┘
/// ```

pub mod error;
pub mod loader;
pub mod model;
pub mod preview;
