//! Breadth-first, same-domain crawl loop.
//!
//! The crawl is strictly sequential: one render at a time, seed first. Every
//! dequeued URL is marked visited exactly once and the frontier is capped, so
//! the loop terminates even on cyclic link graphs.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::controls::CrawlConfig;
use crate::fetcher::{FetchedPage, Page, PageFetcher};
use crate::frontier::{Frontier, FrontierError};
use crate::normalizer::{is_crawlable, normalize, same_domain};

/// Counters collected while crawling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// URLs taken off the frontier and rendered.
    pub dequeued: usize,
    /// Rendered URLs that yielded no page.
    pub failed: usize,
    /// Discovered links accepted into the frontier.
    pub links_enqueued: usize,
    /// Discovered links dropped because the frontier was full.
    pub links_dropped: usize,
    /// Deepest the frontier got during the crawl.
    pub peak_frontier: usize,
}

/// Pages collected by a crawl plus its counters.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Pages in visit order, seed first.
    pub pages: Vec<Page>,
    /// Crawl counters.
    pub stats: CrawlStats,
}

/// Sequential BFS crawler over a single site.
pub struct Crawler {
    fetcher: PageFetcher,
    config: CrawlConfig,
}

impl Crawler {
    /// Builds a crawler around `fetcher`.
    pub fn new(fetcher: PageFetcher, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Crawls from `seed` until `max_pages` pages are collected or the
    /// frontier drains.
    pub fn crawl(&self, seed: &str, max_pages: usize) -> Vec<Page> {
        self.crawl_report(seed, max_pages).pages
    }

    /// Same as [`Crawler::crawl`], keeping the counters.
    pub fn crawl_report(&self, seed: &str, max_pages: usize) -> CrawlReport {
        let mut report = CrawlReport::default();
        let mut frontier = Frontier::new(self.config.frontier_cap);
        if let Err(err) = frontier.push(normalize(seed)) {
            warn!(seed, error = %err, "seed rejected by frontier");
            return report;
        }

        while report.pages.len() < max_pages {
            let Some(url) = frontier.pop() else {
                break;
            };
            if frontier.is_visited(&url) {
                continue;
            }

            report.stats.dequeued += 1;
            debug!(
                url = %url,
                collected = report.pages.len(),
                max_pages,
                "crawling page"
            );
            let fetched = self.fetcher.fetch(&url);
            frontier.mark_visited(&url);

            let Some(FetchedPage { page, links }) = fetched else {
                report.stats.failed += 1;
                continue;
            };
            report.pages.push(page);
            self.enqueue_links(&mut frontier, seed, links, &mut report.stats);
        }

        report.stats.peak_frontier = frontier.peak_len();
        info!(
            seed,
            pages = report.pages.len(),
            dequeued = report.stats.dequeued,
            failed = report.stats.failed,
            enqueued = report.stats.links_enqueued,
            dropped = report.stats.links_dropped,
            "crawl complete"
        );
        report
    }

    fn enqueue_links(
        &self,
        frontier: &mut Frontier,
        seed: &str,
        links: Vec<String>,
        stats: &mut CrawlStats,
    ) {
        for link in links {
            if !is_crawlable(&link) || !same_domain(&link, seed) {
                continue;
            }
            match frontier.push(link) {
                Ok(()) => stats.links_enqueued += 1,
                Err(FrontierError::QueueFull(_)) => stats.links_dropped += 1,
                Err(FrontierError::Duplicate(_) | FrontierError::AlreadyVisited(_)) => {}
            }
        }
    }
}
