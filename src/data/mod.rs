/// Data layer: typed schema, loading, validation, cleaning, filtering and
/// aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema   │  check the ten required columns → EvaluationTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  drop rows without the three scores
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  Programa / Materia / Periodo selections
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  six fixed views + their download tables
///   └───────────┘
/// ```

pub mod aggregate;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod stats;
