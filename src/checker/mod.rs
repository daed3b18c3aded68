// src/checker/mod.rs
// =============================================================================
// This module contains all link checking logic.
//
// Submodules:
// - http: Makes HTTP requests to check if links are alive
// - limiter: Per-host and global caps on in-flight requests
// - retry: Exponential backoff between attempts
// - html: Extracts links from HTML pages
//
// This file (mod.rs) is the module root - it ties everything together and
// exports the public API that other parts of our application can use.
// =============================================================================

mod html;
mod http;
mod limiter;
mod retry;

// Re-export public items from submodules
// This lets users write `checker::Fetcher` instead of
// `checker::http::Fetcher`
pub use html::ParsedPage;
pub use http::{build_client, ErrorKind, FetchOutcome, Fetcher};
pub use limiter::{ConcurrencyLimiter, RequestPermit};
pub use retry::RetryPolicy;
