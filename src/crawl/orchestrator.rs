// src/crawl/orchestrator.rs
// =============================================================================
// The crawl loop.
//
// How it works:
// 1. Put the seed URL in the frontier (depth 0)
// 2. Take every available target from the frontier and start its fetch
// 3. Wait for whichever fetch finishes first
// 4. Record the outcome; if the page is healthy HTML we may follow, extract
//    its links, normalize and filter them, and offer them to the frontier
// 5. Repeat until nothing is queued and nothing is in flight
//
// All fetches are futures polled from this one loop (FuturesUnordered), so
// there is a single place where outcomes arrive and no shared counters.
// The fetches themselves still overlap: each one is just waiting on the
// network most of the time.
//
// Stopping early:
// - the caller's CancellationToken fires, or
// - the optional overall timeout elapses
// Either way we stop handing out work, tell in-flight fetches to give up at
// their next await point, wait for them to return, and finalize a report
// marked incomplete.
// =============================================================================

use std::future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Client;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::checker::{build_client, ConcurrencyLimiter, FetchOutcome, Fetcher, ParsedPage};
use crate::config::CrawlConfig;
use crate::crawl::filter::FilterChain;
use crate::crawl::frontier::{CrawlTarget, Frontier, VisitOutcome};
use crate::crawl::normalize::normalize;
use crate::error::ConfigError;
use crate::report::{Aggregator, CrawlReport};

// Targets handed out per unit of global concurrency. Extra targets wait on
// their host semaphore without holding a global slot.
const DISPATCH_FACTOR: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlState {
    Running,
    Draining,
}

/// Crawls one site. Reusable: every run gets fresh frontier, limiter and
/// aggregator; only the HTTP client is shared between runs.
#[derive(Debug, Clone)]
pub struct Crawler {
    config: Arc<CrawlConfig>,
    filter: Arc<FilterChain>,
    client: Client,
}

impl Crawler {
    /// Builds a crawler with its own HTTP client.
    pub fn new(config: CrawlConfig) -> Result<Self, ConfigError> {
        let client = build_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    /// Builds a crawler around an existing HTTP client.
    pub fn with_client(config: CrawlConfig, client: Client) -> Self {
        let filter = Arc::new(FilterChain::new(config.filters.clone(), &config.seed_url));
        Self {
            config: Arc::new(config),
            filter,
            client,
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls until the frontier is exhausted (or the overall timeout hits).
    pub async fn run(&self) -> CrawlReport {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), but stops early once `cancel` fires and
    /// returns whatever was collected so far.
    pub async fn run_with_cancellation(&self, cancel: CancellationToken) -> CrawlReport {
        // child token: our own deadline must not cancel the caller's token
        let cancel = cancel.child_token();
        let deadline = self.config.overall_timeout.map(|t| Instant::now() + t);

        let limiter = Arc::new(ConcurrencyLimiter::new(
            self.config.connect_limit_per_host,
            self.config.max_concurrency,
        ));
        let fetcher = Fetcher::new(self.client.clone(), limiter, self.filter.clone(), &self.config);
        let frontier = Frontier::new(self.config.clone(), self.filter.clone());
        let mut aggregator = Aggregator::new(self.config.verbose);

        info!(
            seed = %self.config.seed_url,
            max_depth = ?self.config.max_depth,
            "starting crawl"
        );
        frontier.enqueue_seed(self.config.seed_url.clone());

        let window = self.config.max_concurrency.saturating_mul(DISPATCH_FACTOR);
        let mut in_flight = FuturesUnordered::new();
        let mut state = CrawlState::Running;

        loop {
            if state == CrawlState::Running {
                let room = window.saturating_sub(in_flight.len());
                for target in frontier.next_batch(room) {
                    trace!(url = %target.url, depth = target.depth, "dispatching");
                    let fetcher = &fetcher;
                    let cancel = &cancel;
                    in_flight.push(async move {
                        let outcome = fetcher.fetch(&target, cancel).await;
                        (target, outcome)
                    });
                }
            }

            if in_flight.is_empty() {
                // while running, an empty in-flight set right after dispatch
                // means the frontier has nothing left
                debug_assert!(state == CrawlState::Draining || frontier.is_exhausted());
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled(), if state == CrawlState::Running => {
                    warn!(
                        in_flight = in_flight.len(),
                        queued = frontier.pending(),
                        "crawl cancelled, draining in-flight requests"
                    );
                    state = CrawlState::Draining;
                }
                _ = wait_until(deadline), if state == CrawlState::Running => {
                    warn!(
                        in_flight = in_flight.len(),
                        queued = frontier.pending(),
                        "overall timeout reached, draining in-flight requests"
                    );
                    cancel.cancel();
                    state = CrawlState::Draining;
                }
                Some((target, outcome)) = in_flight.next() => {
                    self.handle_completion(&frontier, &mut aggregator, state, target, outcome);
                }
            }
        }

        let complete = state == CrawlState::Running;
        let unfinished = frontier.pending() + frontier.in_flight();
        let report = aggregator.finalize(complete, unfinished);
        info!(
            checked = report.total_checked,
            broken = report.broken.len(),
            unchecked = report.unchecked,
            complete = report.complete,
            "crawl finished"
        );
        report
    }

    fn handle_completion(
        &self,
        frontier: &Frontier,
        aggregator: &mut Aggregator,
        state: CrawlState,
        target: CrawlTarget,
        mut outcome: FetchOutcome,
    ) {
        if outcome.is_cancelled() {
            frontier.complete(&target.url, None);
            aggregator.record(outcome);
            return;
        }

        frontier.complete(
            &target.url,
            Some(VisitOutcome {
                status: outcome.status,
                broken: outcome.is_broken(),
            }),
        );

        if outcome.is_broken() {
            warn!(
                url = %outcome.url,
                result = %outcome.label(),
                attempts = outcome.attempts,
                origin = outcome.origin.as_ref().map(Url::as_str),
                "broken link"
            );
        } else {
            debug!(
                url = %outcome.url,
                result = %outcome.label(),
                elapsed_ms = outcome.elapsed_ms,
                "ok"
            );
        }

        // nothing new is dispatched while draining
        let body = outcome.body.take().filter(|_| state == CrawlState::Running);
        if let Some(body) = body {
            // links resolve against where redirects ended. The seed is
            // crawled wherever it lands, any other page only while onsite.
            let page_url = outcome.effective_url().clone();
            let stays_onsite = target.depth == 0 || self.filter.should_follow(&page_url);
            if outcome.is_healthy() && target.follow && stays_onsite {
                let links = self.discover_links(&body, &page_url);
                let found = links.len();
                let accepted = links
                    .into_iter()
                    .filter(|link| frontier.offer(link.clone(), target.depth + 1, &target.url))
                    .count();
                debug!(url = %target.url, found, accepted, "links extracted");
            }
        }

        aggregator.record(outcome);
    }

    // Parsing is synchronous and the parsed document never crosses an await.
    fn discover_links(&self, body: &str, page_url: &Url) -> Vec<Url> {
        let page = ParsedPage::parse(body, page_url, self.config.check_resources);
        page.links()
            .filter_map(|raw| match normalize(raw, page.base()) {
                Ok(url) => Some(url),
                Err(reason) => {
                    trace!(link = raw, %reason, "dropping unusable link");
                    None
                }
            })
            .collect()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
