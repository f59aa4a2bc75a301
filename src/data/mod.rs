/// Data layer: core types, loading, channel selection and writing.
///
/// Architecture:
/// ```text
///  .csv / .txt / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RecordingTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ RecordingTable │  named Numeric / Text columns
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  select   │  name heuristics → EEG column indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  cleaned table → <prefix><name>.csv
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod select;
pub mod writer;
