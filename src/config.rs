// src/config.rs
// =============================================================================
// Typed crawl configuration.
//
// The configuration is built exactly once, before the crawl starts:
// 1. The CLI (or a test) creates a CrawlConfigBuilder from the seed URL
// 2. Optional settings are chained onto the builder
// 3. build() validates everything and returns a CrawlConfig or a ConfigError
//
// After that the config is wrapped in an Arc and shared read-only by every
// component. Nothing inside the crawl loop looks up settings anywhere else.
//
// Rust concepts:
// - Builder pattern: methods that take `mut self` and return `Self`
// - Option<T>: max_depth = None means "no depth limit"
// - Duration: typed time spans instead of raw numbers of seconds
// =============================================================================

use serde::Serialize;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Default browser-like user agent. Some sites refuse obvious bots on HEAD.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MAX_RETRY_TIME: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_LIMIT_PER_HOST: usize = 10;
pub const DEFAULT_MAX_CONCURRENCY: usize = 100;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Include/exclude rules, evaluated against the full normalized URL string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterRules {
    /// When non-empty, only URLs containing one of these are followed.
    pub include_contained: Vec<String>,
    /// URLs containing any of these are neither followed nor checked.
    pub exclude_contained: Vec<String>,
    pub exclude_prefix: Vec<String>,
    pub exclude_suffix: Vec<String>,
}

impl FilterRules {
    pub fn is_empty(&self) -> bool {
        self.include_contained.is_empty()
            && self.exclude_contained.is_empty()
            && self.exclude_prefix.is_empty()
            && self.exclude_suffix.is_empty()
    }
}

/// Everything a crawl run needs to know, validated up front.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlConfig {
    pub seed_url: Url,
    /// Link hops allowed from the seed. `Some(0)` checks the seed only,
    /// `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Retries after the first attempt, so at most `max_retries + 1` requests.
    pub max_retries: u32,
    /// Cap on the total backoff wait spent on a single URL.
    pub max_retry_time: Duration,
    pub connect_limit_per_host: usize,
    /// Cap on in-flight requests across all hosts.
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
    /// Use GET instead of HEAD for onsite links that are not followed.
    pub always_get_onsite: bool,
    /// Also check images, scripts, stylesheets and frames, not only anchors.
    pub check_resources: bool,
    /// Wall-clock budget for the whole run. The report is marked incomplete
    /// when it runs out.
    pub overall_timeout: Option<Duration>,
    pub verbose: bool,
    pub filters: FilterRules,
}

impl CrawlConfig {
    /// Starts a builder from a raw seed URL string.
    pub fn builder(seed_url: impl Into<String>) -> CrawlConfigBuilder {
        CrawlConfigBuilder::new(seed_url)
    }

    /// True when a target at `depth` may still have its links followed.
    pub fn can_descend_from(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }

    /// True when a target at `depth` is inside the crawl bound at all.
    pub fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }
}

/// Builder for [`CrawlConfig`]. Nothing is validated until [`build`].
///
/// [`build`]: CrawlConfigBuilder::build
#[derive(Debug, Clone)]
pub struct CrawlConfigBuilder {
    seed_url: String,
    max_depth: Option<usize>,
    max_retries: u32,
    max_retry_time: Duration,
    connect_limit_per_host: usize,
    max_concurrency: usize,
    request_timeout: Duration,
    backoff_base: Duration,
    backoff_max: Duration,
    max_redirects: usize,
    user_agent: String,
    always_get_onsite: bool,
    check_resources: bool,
    overall_timeout: Option<Duration>,
    verbose: bool,
    filters: FilterRules,
}

impl CrawlConfigBuilder {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth: None,
            max_retries: DEFAULT_MAX_RETRIES,
            max_retry_time: DEFAULT_MAX_RETRY_TIME,
            connect_limit_per_host: DEFAULT_CONNECT_LIMIT_PER_HOST,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            always_get_onsite: false,
            check_resources: true,
            overall_timeout: None,
            verbose: false,
            filters: FilterRules::default(),
        }
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retry_time(mut self, max_retry_time: Duration) -> Self {
        self.max_retry_time = max_retry_time;
        self
    }

    pub fn connect_limit_per_host(mut self, limit: usize) -> Self {
        self.connect_limit_per_host = limit;
        self
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = limit;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff_base = base;
        self.backoff_max = max;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn always_get_onsite(mut self, enabled: bool) -> Self {
        self.always_get_onsite = enabled;
        self
    }

    pub fn check_resources(mut self, enabled: bool) -> Self {
        self.check_resources = enabled;
        self
    }

    pub fn overall_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.overall_timeout = timeout;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn filters(mut self, filters: FilterRules) -> Self {
        self.filters = filters;
        self
    }

    /// Validates every setting and produces the immutable config.
    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        let raw = self.seed_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingSeed);
        }

        let mut seed_url = Url::parse(raw).map_err(|source| ConfigError::InvalidSeed {
            url: raw.to_string(),
            source,
        })?;
        if !matches!(seed_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedSeedScheme(seed_url.scheme().to_string()));
        }
        seed_url.set_fragment(None);

        if self.connect_limit_per_host == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "connect_limit_per_host",
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_concurrency",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "request_timeout",
            });
        }
        if self.overall_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroDuration {
                name: "overall_timeout",
            });
        }
        if self.backoff_base > self.backoff_max {
            return Err(ConfigError::BackoffInverted {
                base: self.backoff_base,
                max: self.backoff_max,
            });
        }

        Ok(CrawlConfig {
            seed_url,
            max_depth: self.max_depth,
            max_retries: self.max_retries,
            max_retry_time: self.max_retry_time,
            connect_limit_per_host: self.connect_limit_per_host,
            max_concurrency: self.max_concurrency,
            request_timeout: self.request_timeout,
            backoff_base: self.backoff_base,
            backoff_max: self.backoff_max,
            max_redirects: self.max_redirects,
            user_agent: self.user_agent,
            always_get_onsite: self.always_get_onsite,
            check_resources: self.check_resources,
            overall_timeout: self.overall_timeout,
            verbose: self.verbose,
            filters: self.filters,
        })
    }
}
