//! Bounded FIFO frontier with normalized-URL dedup.

use std::collections::{HashSet, VecDeque};

use thiserror::Error;

use crate::normalizer::normalize;

/// Default bounded queue depth for the frontier.
pub const DEFAULT_FRONTIER_CAP: usize = 100;

/// Errors that can emerge while queueing URLs into the frontier.
///
/// Each variant hands the rejected URL back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontierError {
    /// The queue is full; newly discovered links are dropped, not deferred.
    #[error("frontier full; dropped {0}")]
    QueueFull(String),
    /// The URL is already waiting in the queue.
    #[error("already queued: {0}")]
    Duplicate(String),
    /// The URL was dequeued earlier in this crawl.
    #[error("already visited: {0}")]
    AlreadyVisited(String),
}

/// Breadth-first work queue for a single crawl.
///
/// Entries keep the URL exactly as discovered; dedup runs on its normalized
/// form, so visited and queued keys are always normalized.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    cap: usize,
    peak: usize,
}

impl Frontier {
    /// Constructs a new, empty frontier holding at most `cap` URLs.
    pub fn new(cap: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(cap.min(1024)),
            queued: HashSet::new(),
            visited: HashSet::new(),
            cap,
            peak: 0,
        }
    }

    /// Number of URLs waiting in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Largest queue depth observed so far.
    pub fn peak_len(&self) -> usize {
        self.peak
    }

    /// Number of distinct normalized URLs marked visited.
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    /// Appends `url` to the back of the queue.
    ///
    /// Rejected when its normalized form was visited or is already queued, or
    /// when the queue is at capacity. Filling to capacity and rejecting the rest
    /// keeps exactly the oldest `cap` entries, the same set an
    /// append-then-truncate policy would keep.
    pub fn push(&mut self, url: String) -> Result<(), FrontierError> {
        let key = normalize(&url);
        if self.visited.contains(&key) {
            return Err(FrontierError::AlreadyVisited(url));
        }
        if self.queued.contains(&key) {
            return Err(FrontierError::Duplicate(url));
        }
        if self.queue.len() >= self.cap {
            return Err(FrontierError::QueueFull(url));
        }
        self.queued.insert(key);
        self.queue.push_back(url);
        self.peak = self.peak.max(self.queue.len());
        Ok(())
    }

    /// Removes and returns the oldest queued URL.
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&normalize(&url));
        Some(url)
    }

    /// Records `url` as visited; returns false if it already was.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(normalize(url))
    }

    /// Whether the normalized form of `url` was visited.
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&normalize(url))
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTIER_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_fifo_order() {
        let mut frontier = Frontier::new(4);
        frontier.push("https://a.test/1".into()).expect("first");
        frontier.push("https://a.test/2".into()).expect("second");

        assert_eq!(frontier.pop().as_deref(), Some("https://a.test/1"));
        assert_eq!(frontier.pop().as_deref(), Some("https://a.test/2"));
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn duplicate_spellings_rejected() {
        let mut frontier = Frontier::new(4);
        frontier.push("https://dup.test/a/".into()).expect("first spelling");

        match frontier
            .push("https://DUP.test/a#section".into())
            .expect_err("duplicate rejected")
        {
            FrontierError::Duplicate(url) => assert_eq!(url, "https://DUP.test/a#section"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn visited_urls_rejected() {
        let mut frontier = Frontier::new(4);
        assert!(frontier.mark_visited("https://seen.test/page/"));
        assert!(!frontier.mark_visited("https://seen.test/page"));
        assert!(frontier.is_visited("https://SEEN.test/page#x"));

        assert!(matches!(
            frontier.push("https://seen.test/page".into()),
            Err(FrontierError::AlreadyVisited(_))
        ));
    }

    #[test]
    fn overflow_keeps_oldest_entries() {
        let mut frontier = Frontier::new(3);
        let mut dropped = Vec::new();
        for idx in 0..6 {
            if let Err(FrontierError::QueueFull(url)) = frontier.push(format!("https://cap.test/{idx}")) {
                dropped.push(url);
            }
        }

        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.peak_len(), 3);
        assert_eq!(dropped.len(), 3);
        assert_eq!(frontier.pop().as_deref(), Some("https://cap.test/0"));
    }

    #[test]
    fn popped_urls_can_be_requeued_until_visited() {
        let mut frontier = Frontier::new(2);
        frontier.push("https://re.test/x".into()).expect("queued");
        let url = frontier.pop().expect("popped");
        frontier.push(url.clone()).expect("requeue allowed before visit");
        frontier.pop();
        frontier.mark_visited(&url);
        assert!(frontier.push(url).is_err());
    }
}
