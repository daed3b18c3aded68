// src/report/aggregate.rs
// =============================================================================
// Collects fetch outcomes into the final crawl report.
//
// The orchestrator owns exactly one Aggregator and calls record() from its
// single completion point, so outcomes are appended in one place without any
// shared counters. When the crawl ends, finalize() turns it into an
// immutable CrawlReport with:
// - every broken outcome (sorted by URL so reruns produce the same report)
// - every healthy outcome too, but only in verbose mode
// - summary statistics and start/finish timestamps
//
// The verdict is simple: any broken link means failure.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::checker::{ErrorKind, FetchOutcome};

/// Run-level pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure,
}

impl Verdict {
    /// Process exit code: 0 on success, 1 when broken links were found.
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Success => 0,
            Verdict::Failure => 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub healthy: usize,
    pub broken: usize,
    /// Final HTTP status -> number of URLs that ended with it.
    pub by_status: BTreeMap<u16, usize>,
    /// Error kind -> number of URLs that ended with it.
    pub by_error: BTreeMap<ErrorKind, usize>,
    /// Total requests sent, retries included.
    pub attempts: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub total_checked: usize,
    pub broken: Vec<FetchOutcome>,
    /// Healthy outcomes, filled only in verbose mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub healthy: Vec<FetchOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// False when the crawl was cancelled or ran out of time.
    pub complete: bool,
    /// Targets that were scheduled but never finished.
    pub unchecked: usize,
    pub stats: CrawlStats,
}

impl CrawlReport {
    pub fn verdict(&self) -> Verdict {
        if self.broken.is_empty() {
            Verdict::Success
        } else {
            Verdict::Failure
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[derive(Debug)]
pub struct Aggregator {
    verbose: bool,
    started_at: DateTime<Utc>,
    total_checked: usize,
    cancelled: usize,
    broken: Vec<FetchOutcome>,
    healthy: Vec<FetchOutcome>,
    stats: CrawlStats,
}

impl Aggregator {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            started_at: Utc::now(),
            total_checked: 0,
            cancelled: 0,
            broken: Vec::new(),
            healthy: Vec::new(),
            stats: CrawlStats::default(),
        }
    }

    /// Adds one terminal outcome. Cancelled checks are not counted as
    /// checked, they surface as `unchecked` in the report.
    pub fn record(&mut self, mut outcome: FetchOutcome) {
        // bodies are only needed for link extraction
        outcome.body = None;
        self.stats.attempts += u64::from(outcome.attempts);

        if outcome.is_cancelled() {
            self.cancelled += 1;
            return;
        }

        self.total_checked += 1;
        if let Some(status) = outcome.status {
            *self.stats.by_status.entry(status).or_default() += 1;
        }
        if let Some(kind) = outcome.error {
            *self.stats.by_error.entry(kind).or_default() += 1;
        }

        if outcome.is_broken() {
            self.stats.broken += 1;
            self.broken.push(outcome);
        } else {
            self.stats.healthy += 1;
            if self.verbose {
                self.healthy.push(outcome);
            }
        }
    }

    /// Seals the report. `unfinished` counts targets still queued or in
    /// flight when the crawl stopped.
    pub fn finalize(mut self, complete: bool, unfinished: usize) -> CrawlReport {
        self.broken.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));
        self.healthy.sort_by(|a, b| a.url.as_str().cmp(b.url.as_str()));

        CrawlReport {
            total_checked: self.total_checked,
            broken: self.broken,
            healthy: self.healthy,
            started_at: self.started_at,
            finished_at: Utc::now(),
            complete,
            unchecked: unfinished + self.cancelled,
            stats: self.stats,
        }
    }
}
