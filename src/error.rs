// src/error.rs
// =============================================================================
// Error types for the crawl engine.
//
// Only two things in this crate are real errors:
// - ConfigError: the configuration is unusable, so we never start crawling
// - UnusableUrl: a link we found can't be turned into something fetchable
//
// Everything that goes wrong on the network (404s, timeouts, DNS failures)
// is NOT an error here. Those become FetchOutcome values that end up in the
// report, because finding them is the whole point of the tool.
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: automatic conversion so `?` works across error types
// =============================================================================

use thiserror::Error;

/// Problems with the crawl configuration. Always fatal, raised before the
/// first request is sent.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("a seed URL is required")]
    MissingSeed,

    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("seed URL must use http or https, got '{0}'")]
    UnsupportedSeedScheme(String),

    #[error("{name} must be at least 1")]
    ZeroLimit { name: &'static str },

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("backoff base delay ({base:?}) is larger than its cap ({max:?})")]
    BackoffInverted {
        base: std::time::Duration,
        max: std::time::Duration,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a discovered link was dropped before reaching the frontier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnusableUrl {
    #[error("empty link")]
    Empty,

    #[error("unparsable link: {0}")]
    Invalid(#[from] url::ParseError),

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("link has no host")]
    NoHost,
}
