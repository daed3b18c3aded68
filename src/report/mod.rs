// src/report/mod.rs
// =============================================================================
// Everything that happens after a fetch finishes:
// - aggregate: collects outcomes, decides the verdict
// - render: prints the report (table, JSON, CI annotations)
// =============================================================================

mod aggregate;
mod render;

pub use aggregate::{Aggregator, CrawlReport, CrawlStats, Verdict};
pub use render::{print_report, write_annotations, write_json, write_output_time, write_table};
