// src/checker/http.rs
// =============================================================================
// This module checks if URLs are alive by making HTTP requests.
//
// Key functionality:
// - GET for pages we will crawl (we need the HTML body)
// - HEAD for everything else (lightweight, no body download), with a GET
//   fallback for servers that refuse HEAD
// - Detects the failure modes (404, timeout, DNS, refused, TLS, redirects)
// - Retries transient failures with exponential backoff
// - Honors the per-host and global concurrency limits
// - Stops at the next suspension point when the crawl is cancelled
//
// One call to Fetcher::fetch produces exactly one FetchOutcome, summarizing
// the final attempt. Retries of one URL always run one after another.
// =============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::checker::limiter::ConcurrencyLimiter;
use crate::checker::retry::RetryPolicy;
use crate::config::CrawlConfig;
use crate::crawl::filter::FilterChain;
use crate::crawl::frontier::CrawlTarget;
use crate::error::ConfigError;

/// Why a request produced no usable HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Request timed out
    Timeout,
    /// Nothing listening on the other end
    ConnectionRefused,
    /// Could not resolve hostname
    Dns,
    /// Too many redirects (redirect loop)
    TooManyRedirects,
    /// SSL/TLS certificate error
    Tls,
    /// Any other transport error
    Other,
    /// The crawl was stopped before this URL finished
    Cancelled,
}

impl ErrorKind {
    /// Transient failures are retried, the rest are final on first sight.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout | ErrorKind::ConnectionRefused | ErrorKind::Dns | ErrorKind::Other
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "Timeout",
            ErrorKind::ConnectionRefused => "ConnectionRefused",
            ErrorKind::Dns => "DnsError",
            ErrorKind::TooManyRedirects => "TooManyRedirects",
            ErrorKind::Tls => "TlsError",
            ErrorKind::Other => "RequestError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Final result of checking one URL.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub url: Url,
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Url>,
    /// Where redirects ended up, when different from `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<Url>,
    /// Status of the last response, if any response arrived at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Human-readable detail for the error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// HTML body, kept only until links are extracted.
    #[serde(skip)]
    pub body: Option<String>,
    pub elapsed_ms: u64,
}

impl FetchOutcome {
    /// Broken = final status in the error range, or a network failure that
    /// survived every retry. A cancelled check is neither broken nor healthy.
    pub fn is_broken(&self) -> bool {
        match self.error {
            Some(ErrorKind::Cancelled) => false,
            Some(_) => true,
            None => self.status.map_or(false, |status| status >= 400),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.error == Some(ErrorKind::Cancelled)
    }

    pub fn is_healthy(&self) -> bool {
        self.error.is_none() && !self.is_broken()
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
    }

    /// URL the response actually came from.
    pub fn effective_url(&self) -> &Url {
        self.final_url.as_ref().unwrap_or(&self.url)
    }

    /// Short label for tables and logs: "HTTP 404", "Timeout", ...
    pub fn label(&self) -> String {
        match (self.error, self.status) {
            (Some(kind), _) => kind.to_string(),
            (None, Some(status)) => format!("HTTP {}", status),
            (None, None) => "unknown".to_string(),
        }
    }
}

// What a single attempt produced, before retry decisions are made
#[derive(Debug)]
enum Attempt {
    Response {
        status: StatusCode,
        final_url: Url,
        content_type: Option<String>,
        body: Option<String>,
    },
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl Attempt {
    fn is_transient(&self) -> bool {
        match self {
            Attempt::Response { status, .. } => is_transient_status(*status),
            Attempt::Failed { kind, .. } => kind.is_transient(),
        }
    }

    fn cancelled() -> Self {
        Attempt::Failed {
            kind: ErrorKind::Cancelled,
            message: "crawl cancelled".to_string(),
        }
    }
}

// 429 and 5xx usually mean "try again later", 4xx never changes on retry
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Builds the one HTTP client shared by the whole crawl.
pub fn build_client(config: &CrawlConfig) -> Result<Client, ConfigError> {
    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// Checks single URLs. Owns no state besides the shared limiter.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    limiter: Arc<ConcurrencyLimiter>,
    retry: RetryPolicy,
    filter: Arc<FilterChain>,
    always_get_onsite: bool,
}

impl Fetcher {
    pub fn new(
        client: Client,
        limiter: Arc<ConcurrencyLimiter>,
        filter: Arc<FilterChain>,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            client,
            limiter,
            retry: RetryPolicy::from_config(config),
            filter,
            always_get_onsite: config.always_get_onsite,
        }
    }

    fn method_for(&self, target: &CrawlTarget) -> Method {
        if target.follow || (self.always_get_onsite && self.filter.is_onsite(target.url.as_str()))
        {
            Method::GET
        } else {
            Method::HEAD
        }
    }

    /// Checks one URL, retrying transient failures within the retry budget.
    pub async fn fetch(&self, target: &CrawlTarget, cancel: &CancellationToken) -> FetchOutcome {
        let started = Instant::now();
        let method = self.method_for(target);
        let mut attempts = 0u32;
        let mut waited = Duration::ZERO;

        let last = loop {
            attempts += 1;
            let attempt = tokio::select! {
                biased;
                _ = cancel.cancelled() => Attempt::cancelled(),
                attempt = self.attempt(target, method.clone()) => attempt,
            };

            if !attempt.is_transient() {
                break attempt;
            }

            let Some(delay) = self.retry.next_delay(attempts - 1, waited) else {
                break attempt;
            };

            debug!(
                url = %target.url,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                result = ?attempt,
                "transient failure, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Attempt::cancelled(),
                _ = tokio::time::sleep(delay) => {}
            }
            waited += delay;
        };

        let mut outcome = FetchOutcome {
            url: target.url.clone(),
            depth: target.depth,
            origin: target.origin.clone(),
            final_url: None,
            status: None,
            error: None,
            message: None,
            attempts,
            content_type: None,
            body: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        match last {
            Attempt::Response {
                status,
                final_url,
                content_type,
                body,
            } => {
                outcome.status = Some(status.as_u16());
                outcome.final_url = (final_url != target.url).then_some(final_url);
                outcome.content_type = content_type;
                outcome.body = body;
            }
            Attempt::Failed { kind, message } => {
                outcome.error = Some(kind);
                outcome.message = Some(message);
            }
        }
        outcome
    }

    // One request (plus the HEAD -> GET fallback) under one permit
    async fn attempt(&self, target: &CrawlTarget, method: Method) -> Attempt {
        let _permit = match self.limiter.acquire(&target.url).await {
            Ok(permit) => permit,
            Err(_) => return Attempt::cancelled(),
        };

        let response = match self.send(method.clone(), &target.url).await {
            Ok(response) => response,
            Err(attempt) => return attempt,
        };

        // Some servers answer HEAD with 405/501 even though GET works fine
        let response = if method == Method::HEAD
            && matches!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) {
            trace!(url = %target.url, "HEAD refused, falling back to GET");
            match self.send(Method::GET, &target.url).await {
                Ok(response) => response,
                Err(attempt) => return attempt,
            }
        } else {
            response
        };

        let status = response.status();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        // Only bodies we are going to crawl are downloaded
        let wants_body = target.follow
            && status.is_success()
            && content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"));

        let body = if wants_body {
            match response.text().await {
                Ok(text) => Some(text),
                Err(e) => return categorize_error(&e),
            }
        } else {
            None
        };

        Attempt::Response {
            status,
            final_url,
            content_type,
            body,
        }
    }

    async fn send(&self, method: Method, url: &Url) -> Result<reqwest::Response, Attempt> {
        self.client
            .request(method, url.as_str())
            .send()
            .await
            .map_err(|e| categorize_error(&e))
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - Connection refused
// - SSL certificate issues
// - Too many redirects
//
// reqwest only exposes a few is_*() helpers, so for DNS, refused and TLS we
// walk the source() chain and look at the underlying io::Error / messages.
fn categorize_error(error: &reqwest::Error) -> Attempt {
    let chain = error_chain(error);
    let lowered = chain.to_ascii_lowercase();

    let kind = if error.is_timeout() {
        ErrorKind::Timeout
    } else if error.is_redirect() {
        ErrorKind::TooManyRedirects
    } else if has_io_kind(error, std::io::ErrorKind::ConnectionRefused)
        || lowered.contains("connection refused")
    {
        ErrorKind::ConnectionRefused
    } else if lowered.contains("dns error") || lowered.contains("failed to lookup address") {
        ErrorKind::Dns
    } else if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl")
    {
        ErrorKind::Tls
    } else {
        ErrorKind::Other
    };

    Attempt::Failed {
        kind,
        message: chain,
    }
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn has_io_kind(error: &reqwest::Error, kind: std::io::ErrorKind) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.kind() == kind {
                return true;
            }
        }
        source = inner.source();
    }
    false
}
