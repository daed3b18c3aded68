// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Iterative crawling starting from a seed URL (no recursion)
// - Each normalized URL is scheduled at most once, even on cyclic sites
// - Configurable depth limit
// - Include/exclude rules deciding what is checked and what is followed
// - Cancellation and an optional overall deadline
//
// Submodules:
// - normalize: raw link text -> canonical URL
// - filter: exclude/include/onsite rules
// - frontier: work queue + seen set
// - orchestrator: the crawl loop tying everything together
// =============================================================================

pub mod filter;
pub mod frontier;
pub mod normalize;
mod orchestrator;

pub use filter::FilterChain;
pub use frontier::{CrawlTarget, Frontier, VisitOutcome, VisitRecord};
pub use normalize::normalize;
pub use orchestrator::Crawler;
