// src/lib.rs
// =============================================================================
// The crawl engine as a library.
//
// The binary (src/main.rs) only parses flags, sets up logging and prints the
// report. Everything else lives here so integration tests in tests/ can run
// real crawls against a mock server.
//
// Module map:
// - config: validated, immutable crawl settings
// - error: the few things that are real errors (bad config, unusable link)
// - crawl: normalization, filters, frontier and the crawl loop
// - checker: HTTP fetching, retries, concurrency limits, HTML link extraction
// - report: aggregation and output
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod report;

pub use config::{CrawlConfig, CrawlConfigBuilder, FilterRules};
pub use crawl::Crawler;
pub use error::{ConfigError, UnusableUrl};
pub use report::{CrawlReport, Verdict};
