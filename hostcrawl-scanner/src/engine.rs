use crate::fetcher::Fetcher;
use crate::filter::filter_links;
use crate::host::{DomainSuffix, Host};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Called once per newly visited host with the depth it was discovered at.
pub type TraceCallback = Arc<dyn Fn(&Host, usize) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub hosts_discovered: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.pages_fetched += other.pages_fetched;
        self.fetch_failures += other.fetch_failures;
        self.hosts_discovered += other.hosts_discovered;
    }
}

/// A host whose links are still being descended into.
struct Frame {
    host: Host,
    depth: usize,
    pending: Vec<Host>,
}

/// Depth-first host discovery restricted to one domain suffix.
pub struct Scanner<F> {
    fetcher: F,
    suffix: DomainSuffix,
    max_depth: usize,
    trace_callback: Option<TraceCallback>,
}

impl<F: Fetcher> Scanner<F> {
    pub fn new(fetcher: F, suffix: DomainSuffix) -> Self {
        Self {
            fetcher,
            suffix,
            max_depth: DEFAULT_MAX_DEPTH,
            trace_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_trace_callback(mut self, callback: TraceCallback) -> Self {
        self.trace_callback = Some(callback);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn suffix(&self) -> &DomainSuffix {
        &self.suffix
    }

    /// Scan from `seed` at depth 0. The seed itself is recorded in `visited`.
    ///
    /// A seed already present in `visited` has been claimed by an earlier
    /// traversal and is not fetched again.
    pub async fn scan(&self, seed: &Host, visited: &mut HashSet<Host>) -> ScanStats {
        if !visited.insert(seed.clone()) {
            debug!("{} already visited, skipping", seed);
            return ScanStats::default();
        }
        info!("Starting scan of {} (max depth {})", seed, self.max_depth);

        let mut stats = self.scan_from(seed, visited, 0).await;
        stats.hosts_discovered += 1;

        info!(
            "Scan of {} complete: {} pages fetched, {} failures, {} hosts known",
            seed,
            stats.pages_fetched,
            stats.fetch_failures,
            visited.len()
        );
        stats
    }

    /// Depth-first scan starting at `current`, which sits at `depth`.
    ///
    /// Every host is inserted into `visited` before it is descended into, so
    /// siblings sharing a link never both descend into it. At `max_depth` the
    /// page is still fetched and its links are recorded, but not followed.
    /// The walk keeps an explicit frame stack; recursion depth does not grow
    /// with `max_depth`.
    pub async fn scan_from(
        &self,
        current: &Host,
        visited: &mut HashSet<Host>,
        depth: usize,
    ) -> ScanStats {
        let mut stats = ScanStats::default();
        let known_before = visited.len();

        let links = self.discover(current, &mut stats).await;
        if depth >= self.max_depth {
            visited.extend(links);
            stats.hosts_discovered = visited.len() - known_before;
            return stats;
        }

        let mut stack = vec![Frame {
            host: current.clone(),
            depth,
            pending: links.into_iter().collect(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(link) = frame.pending.pop() else {
                stack.pop();
                continue;
            };

            // Self-loops and already visited hosts are not descended into.
            if link == frame.host || visited.contains(&link) {
                continue;
            }

            let parent_depth = frame.depth;
            visited.insert(link.clone());
            self.trace(&link, parent_depth);

            let child_depth = parent_depth + 1;
            let child_links = self.discover(&link, &mut stats).await;
            if child_depth >= self.max_depth {
                visited.extend(child_links);
            } else {
                stack.push(Frame {
                    host: link,
                    depth: child_depth,
                    pending: child_links.into_iter().collect(),
                });
            }
        }

        stats.hosts_discovered = visited.len() - known_before;
        stats
    }

    /// Fetch `host` and filter its links. Fetch failures count as no links.
    async fn discover(&self, host: &Host, stats: &mut ScanStats) -> HashSet<Host> {
        match self.fetcher.fetch(host).await {
            Ok(raw_links) => {
                stats.pages_fetched += 1;
                let links = filter_links(&raw_links, &self.suffix);
                debug!(
                    "{}: {} links, {} under {}",
                    host,
                    raw_links.len(),
                    links.len(),
                    self.suffix
                );
                links
            }
            Err(e) => {
                stats.fetch_failures += 1;
                debug!("{} produced an error: {}", host, e);
                HashSet::new()
            }
        }
    }

    fn trace(&self, host: &Host, depth: usize) {
        debug!("Discovered {} at depth {}", host, depth);
        if let Some(ref callback) = self.trace_callback {
            callback(host, depth);
        }
    }
}
