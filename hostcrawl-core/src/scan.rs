use crate::error::{CoreError, Result};
use crate::seeds::validate_seeds;
use futures::stream::{self, StreamExt};
use hostcrawl_scanner::{DomainSuffix, Fetcher, Host, ScanStats, Scanner, TraceCallback};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// How visited sets relate across seeds of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisitedPolicy {
    /// Every seed starts from an empty visited set. Seeds may rediscover each
    /// other's hosts, and may be scanned concurrently.
    #[default]
    PerSeed,
    /// One visited set is threaded through the seeds in order. Hosts claimed
    /// by an earlier seed are not descended into again.
    Shared,
}

/// Options for configuring a scan run
pub struct ScanOptions {
    pub seeds: Vec<Host>,
    pub max_depth: usize,
    pub domain_suffix: DomainSuffix,
    pub visited_policy: VisitedPolicy,
    /// Seeds scanned at once under `VisitedPolicy::PerSeed`.
    pub workers: usize,
    pub show_progress_bars: bool,
}

/// Callback for reporting run progress
pub type ScanProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// The merged outcome of all seed traversals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub seeds: Vec<Host>,
    pub domain_suffix: DomainSuffix,
    pub max_depth: usize,
    pub visited_policy: VisitedPolicy,
    pub hosts: BTreeSet<Host>,
    pub stats: ScanStats,
}

impl ScanReport {
    /// Display labels of every discovered host, sorted by host.
    pub fn labels(&self) -> Vec<String> {
        self.hosts
            .iter()
            .map(|host| host.display_label(&self.domain_suffix))
            .collect()
    }

    pub fn seed_labels(&self) -> Vec<String> {
        self.seeds
            .iter()
            .map(|seed| seed.display_label(&self.domain_suffix))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Run one traversal per seed and union the results.
pub async fn execute_scan<F: Fetcher>(
    options: ScanOptions,
    fetcher: F,
    progress_callback: Option<ScanProgressCallback>,
    trace_callback: Option<TraceCallback>,
) -> Result<ScanReport> {
    let ScanOptions {
        seeds,
        max_depth,
        domain_suffix,
        visited_policy,
        workers,
        show_progress_bars,
    } = options;

    if seeds.is_empty() {
        return Err(CoreError::NoSeeds);
    }
    validate_seeds(&seeds, &domain_suffix)?;

    // Set up single progress bar for overall scan progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Starting scan...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let discovered_count = Arc::new(AtomicUsize::new(0));
    let internal_trace_callback: TraceCallback = {
        let pb_clone = progress_bar.clone();
        let count_clone = discovered_count.clone();
        Arc::new(move |host: &Host, depth: usize| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            match (&pb_clone, &trace_callback) {
                (Some(pb), Some(cb)) => pb.suspend(|| cb(host, depth)),
                (None, Some(cb)) => cb(host, depth),
                _ => {}
            }
            if let Some(ref pb) = pb_clone {
                pb.set_message(format!("Scanning... {} hosts discovered", count));
            }
        })
    };

    let scanner = Scanner::new(fetcher, domain_suffix.clone())
        .with_max_depth(max_depth)
        .with_trace_callback(internal_trace_callback);

    let seed_count = seeds.len();
    let report_progress = |idx: usize, seed: &Host| {
        if let Some(ref callback) = progress_callback
            && seed_count > 1
        {
            callback(format!("Scanning seed {}/{}: {}", idx + 1, seed_count, seed));
        }
    };

    let mut hosts = BTreeSet::new();
    let mut stats = ScanStats::default();

    match visited_policy {
        VisitedPolicy::PerSeed => {
            let scanner = &scanner;
            let report_progress = &report_progress;
            let results: Vec<(HashSet<Host>, ScanStats)> = stream::iter(seeds.iter().enumerate())
                .map(|(idx, seed)| async move {
                    report_progress(idx, seed);
                    let mut visited = HashSet::new();
                    let seed_stats = scanner.scan(seed, &mut visited).await;
                    (visited, seed_stats)
                })
                .buffer_unordered(workers.max(1))
                .collect()
                .await;

            for (visited, seed_stats) in results {
                hosts.extend(visited);
                stats.merge(&seed_stats);
            }
        }
        VisitedPolicy::Shared => {
            let mut visited = HashSet::new();
            for (idx, seed) in seeds.iter().enumerate() {
                report_progress(idx, seed);
                let seed_stats = scanner.scan(seed, &mut visited).await;
                stats.merge(&seed_stats);
            }
            hosts.extend(visited);
        }
    }

    // Seeds under PerSeed can rediscover each other's hosts.
    stats.hosts_discovered = hosts.len();

    if let Some(ref pb) = progress_bar {
        pb.finish_and_clear();
    }
    info!(
        "Scan complete: {} hosts from {} seed(s), {} pages fetched, {} failures",
        hosts.len(),
        seed_count,
        stats.pages_fetched,
        stats.fetch_failures
    );

    Ok(ScanReport {
        seeds,
        domain_suffix,
        max_depth,
        visited_policy,
        hosts,
        stats,
    })
}
