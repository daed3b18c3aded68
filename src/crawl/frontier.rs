// src/crawl/frontier.rs
// =============================================================================
// The frontier: every URL we know about, and which ones still need work.
//
// It combines two structures (like the old breadth-first queue did):
// - VecDeque<CrawlTarget>: URLs waiting to be fetched, oldest first
// - HashMap<String, VisitRecord>: every URL ever accepted, keyed by its
//   normalized string, with its depth and (eventually) its outcome
//
// The "seen" check and the "mark as seen" step happen under one lock, so two
// pages linking to the same URL can never schedule it twice. The first offer
// wins, later ones are rejected.
//
// No recursion anywhere: cyclic link graphs are broken by the seen map plus
// the depth ceiling, and the queue is a plain heap-allocated work list.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl::filter::FilterChain;

/// One unit of crawl work. Created once, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    /// Link hops from the seed; the seed itself is 0.
    pub depth: usize,
    /// Page the link was found on, None for the seed.
    pub origin: Option<Url>,
    /// False for leaves: checked, but their links are never extracted.
    pub follow: bool,
}

/// Terminal result of a visit, as remembered by the frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisitOutcome {
    pub status: Option<u16>,
    pub broken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    /// Handed out to the orchestrator (in flight or finished).
    pub visited: bool,
    pub depth: usize,
    /// Written once, when the fetch finishes.
    pub outcome: Option<VisitOutcome>,
}

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<CrawlTarget>,
    visits: HashMap<String, VisitRecord>,
    in_flight: usize,
}

#[derive(Debug)]
pub struct Frontier {
    config: Arc<CrawlConfig>,
    filter: Arc<FilterChain>,
    state: Mutex<FrontierState>,
}

impl Frontier {
    pub fn new(config: Arc<CrawlConfig>, filter: Arc<FilterChain>) -> Self {
        Self {
            config,
            filter,
            state: Mutex::new(FrontierState::default()),
        }
    }

    // The lock is never held across an await, and a panic while holding it
    // leaves the maps consistent, so a poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Schedules the seed at depth 0. The seed is always checked and, unless
    /// the depth ceiling is 0, always followed: it defines the site.
    pub fn enqueue_seed(&self, url: Url) -> bool {
        let follow = self.config.can_descend_from(0);
        self.insert(CrawlTarget {
            url,
            depth: 0,
            origin: None,
            follow,
        })
    }

    /// Offers a discovered link. Returns true when it was newly scheduled.
    pub fn offer(&self, url: Url, depth: usize, origin: &Url) -> bool {
        if !self.filter.should_check(&url) {
            return false;
        }
        if !self.config.within_depth(depth) {
            return false;
        }

        let follow = self.filter.should_follow(&url) && self.config.can_descend_from(depth);
        self.insert(CrawlTarget {
            url,
            depth,
            origin: Some(origin.clone()),
            follow,
        })
    }

    fn insert(&self, target: CrawlTarget) -> bool {
        let mut state = self.state();
        let key = target.url.as_str().to_string();
        if state.visits.contains_key(&key) {
            return false;
        }
        state.visits.insert(
            key,
            VisitRecord {
                visited: false,
                depth: target.depth,
                outcome: None,
            },
        );
        state.queue.push_back(target);
        true
    }

    /// Hands out up to `n` targets and counts them as in flight.
    pub fn next_batch(&self, n: usize) -> Vec<CrawlTarget> {
        let mut state = self.state();
        let take = n.min(state.queue.len());
        let batch: Vec<CrawlTarget> = state.queue.drain(..take).collect();
        for target in &batch {
            if let Some(record) = state.visits.get_mut(target.url.as_str()) {
                record.visited = true;
            }
        }
        state.in_flight += batch.len();
        batch
    }

    /// Marks a target handed out by `next_batch` as finished. `None` means
    /// the fetch was abandoned and the URL stays without an outcome.
    pub fn complete(&self, url: &Url, outcome: Option<VisitOutcome>) {
        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);
        if let Some(record) = state.visits.get_mut(url.as_str()) {
            if record.outcome.is_none() {
                record.outcome = outcome;
            }
        }
    }

    /// Nothing queued and nothing in flight.
    pub fn is_exhausted(&self) -> bool {
        let state = self.state();
        state.queue.is_empty() && state.in_flight == 0
    }

    pub fn pending(&self) -> usize {
        self.state().queue.len()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    #[cfg(test)]
    fn seen(&self) -> usize {
        self.state().visits.len()
    }

    #[cfg(test)]
    fn record(&self, url: &Url) -> Option<VisitRecord> {
        self.state().visits.get(url.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterRules;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn frontier(max_depth: Option<usize>, rules: FilterRules) -> Frontier {
        let config = Arc::new(
            CrawlConfig::builder("https://example.com/")
                .max_depth(max_depth)
                .filters(rules.clone())
                .build()
                .unwrap(),
        );
        let filter = Arc::new(FilterChain::new(rules, &config.seed_url));
        Frontier::new(config, filter)
    }

    #[test]
    fn test_seed_then_exhaustion() {
        let frontier = frontier(Some(2), FilterRules::default());
        assert!(frontier.is_exhausted());
        assert!(frontier.enqueue_seed(url("https://example.com/")));
        assert!(!frontier.is_exhausted());

        let batch = frontier.next_batch(10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].depth, 0);
        assert!(batch[0].follow);
        assert!(!frontier.is_exhausted(), "in-flight work keeps it alive");

        frontier.complete(
            &batch[0].url,
            Some(VisitOutcome { status: Some(200), broken: false }),
        );
        assert!(frontier.is_exhausted());
    }

    #[test]
    fn test_duplicate_offer_rejected() {
        let frontier = frontier(Some(3), FilterRules::default());
        let origin = url("https://example.com/");
        assert!(frontier.offer(url("https://example.com/a"), 1, &origin));
        assert!(!frontier.offer(url("https://example.com/a"), 2, &origin));
        assert_eq!(frontier.pending(), 1);
        // first writer wins: the depth stays the one from the first offer
        assert_eq!(frontier.record(&url("https://example.com/a")).unwrap().depth, 1);
    }

    #[test]
    fn test_depth_ceiling() {
        let frontier = frontier(Some(1), FilterRules::default());
        let origin = url("https://example.com/");
        assert!(frontier.offer(url("https://example.com/one"), 1, &origin));
        assert!(!frontier.offer(url("https://example.com/two"), 2, &origin));

        let batch = frontier.next_batch(10);
        // depth 1 is the ceiling, so it is checked but not followed
        assert!(!batch[0].follow);
    }

    #[test]
    fn test_depth_zero_seed_is_leaf() {
        let frontier = frontier(Some(0), FilterRules::default());
        frontier.enqueue_seed(url("https://example.com/"));
        assert!(!frontier.next_batch(1)[0].follow);
    }

    #[test]
    fn test_excluded_never_accepted() {
        let frontier = frontier(
            None,
            FilterRules {
                exclude_prefix: vec!["https://excluded.example".into()],
                ..Default::default()
            },
        );
        let origin = url("https://example.com/");
        assert!(!frontier.offer(url("https://excluded.example/x"), 1, &origin));
        assert_eq!(frontier.seen(), 0);
    }

    #[test]
    fn test_offsite_is_leaf() {
        let frontier = frontier(None, FilterRules::default());
        let origin = url("https://example.com/");
        assert!(frontier.offer(url("https://other.org/page"), 1, &origin));
        let batch = frontier.next_batch(1);
        assert!(!batch[0].follow);
        assert_eq!(batch[0].origin.as_ref(), Some(&origin));
    }

    #[test]
    fn test_outcome_is_write_once() {
        let frontier = frontier(None, FilterRules::default());
        let seed = url("https://example.com/");
        frontier.enqueue_seed(seed.clone());
        frontier.next_batch(1);
        frontier.complete(&seed, Some(VisitOutcome { status: Some(404), broken: true }));
        frontier.complete(&seed, Some(VisitOutcome { status: Some(200), broken: false }));

        let record = frontier.record(&seed).unwrap();
        assert!(record.visited);
        assert_eq!(record.outcome, Some(VisitOutcome { status: Some(404), broken: true }));
    }

    #[test]
    fn test_concurrent_offers_schedule_once() {
        let frontier = Arc::new(frontier(None, FilterRules::default()));
        let origin = url("https://example.com/");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let frontier = frontier.clone();
                let origin = origin.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|i| {
                            frontier.offer(
                                Url::parse(&format!("https://example.com/p{}", i)).unwrap(),
                                1,
                                &origin,
                            )
                        })
                        .count()
                })
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 50);
        assert_eq!(frontier.seen(), 50);
    }
}
