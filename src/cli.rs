// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag can also come from an environment variable. CI runners pass
// action inputs as INPUT_<NAME> variables, so the same binary works both as
// `broken-link-crawler --website-url https://example.com` on a laptop and as
// a CI step configured only through its inputs.
//
// Rust concepts:
// - Derive macros: clap generates the parser from the struct below
// - value_delimiter: "a,b,c" becomes vec!["a", "b", "c"]
// - Result: a bad combination of flags is a ConfigError, not a panic
// =============================================================================

use std::time::Duration;

use clap::Parser;

use broken_link_crawler::config::{
    DEFAULT_CONNECT_LIMIT_PER_HOST, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_RETRIES,
};
use broken_link_crawler::{ConfigError, CrawlConfig, FilterRules};

#[derive(Parser, Debug)]
#[command(
    name = "broken-link-crawler",
    version,
    about = "Crawls a website and reports broken links",
    long_about = "broken-link-crawler walks every page of a website reachable from a seed URL, \
                  checks every link it finds and exits non-zero if any of them are broken. \
                  It's meant to run as a CI step."
)]
pub struct Cli {
    /// Website URL to start crawling from (e.g., https://example.com)
    #[arg(long, env = "INPUT_WEBSITE_URL")]
    pub website_url: String,

    /// Log every checked link, not only the broken ones
    #[arg(long, env = "INPUT_VERBOSE", default_value_t = false)]
    pub verbose: bool,

    /// Retries after the first attempt for transient failures
    #[arg(long, env = "INPUT_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Seconds of backoff a single URL may spend between retries
    #[arg(long, env = "INPUT_MAX_RETRY_TIME", default_value_t = 30)]
    pub max_retry_time: u64,

    /// Link hops to follow from the seed page (-1 = no limit, 0 = seed only)
    #[arg(
        long,
        env = "INPUT_MAX_DEPTH",
        default_value_t = -1,
        allow_negative_numbers = true
    )]
    pub max_depth: i64,

    /// Simultaneous requests allowed against one host
    #[arg(long, env = "INPUT_CONNECT_LIMIT_PER_HOST", default_value_t = DEFAULT_CONNECT_LIMIT_PER_HOST)]
    pub connect_limit_per_host: usize,

    /// Simultaneous requests allowed overall
    #[arg(long, env = "INPUT_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "INPUT_TIMEOUT", default_value_t = 10)]
    pub timeout: u64,

    /// Stop the whole crawl after this many seconds and report what we have
    #[arg(long, env = "INPUT_OVERALL_TIMEOUT")]
    pub overall_timeout: Option<u64>,

    /// Only follow pages whose URL contains one of these (comma separated)
    #[arg(long, env = "INPUT_INCLUDE_URL_CONTAINED", value_delimiter = ',')]
    pub include_url_contained: Vec<String>,

    /// Skip URLs containing any of these (comma separated)
    #[arg(long, env = "INPUT_EXCLUDE_URL_CONTAINED", value_delimiter = ',')]
    pub exclude_url_contained: Vec<String>,

    /// Skip URLs starting with any of these (comma separated)
    #[arg(long, env = "INPUT_EXCLUDE_URL_PREFIX", value_delimiter = ',')]
    pub exclude_url_prefix: Vec<String>,

    /// Skip URLs ending with any of these (comma separated)
    #[arg(long, env = "INPUT_EXCLUDE_URL_SUFFIX", value_delimiter = ',')]
    pub exclude_url_suffix: Vec<String>,

    /// Use GET instead of HEAD for every onsite link
    #[arg(long, env = "INPUT_ALWAYS_GET_ONSITE", default_value_t = false)]
    pub always_get_onsite: bool,

    /// Check anchors only, skip images, scripts, stylesheets and frames
    #[arg(long, env = "INPUT_ANCHORS_ONLY", default_value_t = false)]
    pub anchors_only: bool,

    /// Override the User-Agent header
    #[arg(long, env = "INPUT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Output results in JSON format instead of a table
    #[arg(long, env = "INPUT_JSON", default_value_t = false)]
    pub json: bool,
}

impl Cli {
    /// Turns the parsed flags into a validated crawl config.
    pub fn build_config(&self) -> Result<CrawlConfig, ConfigError> {
        // negative depth means "no limit"
        let max_depth = usize::try_from(self.max_depth).ok();

        let mut builder = CrawlConfig::builder(self.website_url.as_str())
            .max_depth(max_depth)
            .max_retries(self.max_retries)
            .max_retry_time(Duration::from_secs(self.max_retry_time))
            .connect_limit_per_host(self.connect_limit_per_host)
            .max_concurrency(self.max_concurrency)
            .request_timeout(Duration::from_secs(self.timeout))
            .overall_timeout(self.overall_timeout.map(Duration::from_secs))
            .always_get_onsite(self.always_get_onsite)
            .check_resources(!self.anchors_only)
            .verbose(self.verbose)
            .filters(FilterRules {
                include_contained: non_empty(&self.include_url_contained),
                exclude_contained: non_empty(&self.exclude_url_contained),
                exclude_prefix: non_empty(&self.exclude_url_prefix),
                exclude_suffix: non_empty(&self.exclude_url_suffix),
            });
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build()
    }
}

// An empty CI input arrives as "", which would otherwise become one empty
// rule matching every URL
fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}


// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why `env = "..."` on every flag?
//    - clap checks the command line first, then the environment variable,
//      then the default. CI inputs therefore need no wrapper script.
//
// 2. Why is max_depth an i64 here but Option<usize> in CrawlConfig?
//    - The CLI accepts -1 for "no limit" because that's easy to type
//    - Inside the crawler, Option says the same thing without a magic number
//
// 3. Why does build_config return ConfigError instead of anyhow::Error?
//    - The library defines typed errors; main.rs wraps them with anyhow
// -----------------------------------------------------------------------------
