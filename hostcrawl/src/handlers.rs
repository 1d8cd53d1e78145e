use clap::ArgMatches;
use colored::Colorize;
use crate::commands::DEFAULT_SUFFIX;
use hostcrawl_core::output::{DEFAULT_OUTPUT_DIR, save_report};
use hostcrawl_core::seeds::load_seeds;
use hostcrawl_core::{CoreError, ScanOptions, ScanProgressCallback, ScanReport, VisitedPolicy, execute_scan};
use hostcrawl_scanner::engine::DEFAULT_MAX_DEPTH;
use hostcrawl_scanner::{DomainSuffix, Host, HttpFetcher, TraceCallback};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use url::Url;

/// Everything about a run that is not handed to the scan itself.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub save: bool,
    pub name_seeds: bool,
    pub output_dir: PathBuf,
    pub debug: bool,
    pub quiet: bool,
    pub json: bool,
    pub timeout_secs: u64,
}

impl RunSettings {
    /// Debug traces share stdout with the labels, except when stdout must
    /// stay a single JSON document.
    pub fn traces_on_stdout(&self) -> bool {
        !self.json
    }
}

/// Turn parsed arguments into scan options and run settings.
///
/// Seeds are loaded here, so a missing or empty seeds file is reported
/// before any fetching starts.
pub fn scan_options_from_matches(matches: &ArgMatches) -> Result<(ScanOptions, RunSettings), CoreError> {
    let max_depth = matches
        .get_one::<usize>("depth")
        .copied()
        .unwrap_or(DEFAULT_MAX_DEPTH);
    let domain_suffix = match matches.get_one::<DomainSuffix>("suffix") {
        Some(suffix) => suffix.clone(),
        None => DomainSuffix::new(DEFAULT_SUFFIX)?,
    };

    let urls: Vec<Url> = matches
        .get_many::<Url>("url")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let seeds_file = matches.get_one::<PathBuf>("seeds-file");
    let seeds = load_seeds(&urls, seeds_file.map(PathBuf::as_path), &domain_suffix)?;

    let debug = matches.get_flag("debug");
    let quiet = matches.get_flag("quiet");
    let json = matches.get_flag("json");

    let visited_policy = if matches.get_flag("shared-visited") {
        VisitedPolicy::Shared
    } else {
        VisitedPolicy::PerSeed
    };

    let options = ScanOptions {
        seeds,
        max_depth,
        domain_suffix,
        visited_policy,
        workers: matches.get_one::<usize>("workers").copied().unwrap_or(1),
        show_progress_bars: !debug && !quiet && !json,
    };

    let settings = RunSettings {
        save: !matches.get_flag("no-save"),
        name_seeds: matches.get_flag("name-seeds"),
        output_dir: matches
            .get_one::<PathBuf>("output-dir")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        debug,
        quiet,
        json,
        timeout_secs: matches.get_one::<u64>("timeout").copied().unwrap_or(10),
    };

    Ok((options, settings))
}

/// One debug trace line: indentation proportional to depth, then `label @ (depth)`.
pub fn format_trace_line(host: &Host, depth: usize, suffix: &DomainSuffix) -> String {
    format!("{}{} @ ({})", "  ".repeat(depth), host.display_label(suffix), depth)
}

/// Logs go to stderr so stdout carries only traces and labels.
pub fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let filter = Targets::new()
        .with_target("hostcrawl", level)
        .with_target("hostcrawl_core", level)
        .with_target("hostcrawl_scanner", level)
        .with_default(Level::WARN);

    let result = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn policy_description(policy: VisitedPolicy) -> &'static str {
    match policy {
        VisitedPolicy::PerSeed => "per seed",
        VisitedPolicy::Shared => "shared across seeds",
    }
}

fn print_header(options: &ScanOptions, settings: &RunSettings) {
    eprintln!(
        "\n{} Scanning {} seed(s) under {}",
        "→".blue().bold(),
        options.seeds.len().to_string().cyan(),
        options.domain_suffix.to_string().bright_white()
    );
    eprintln!("Max depth: {}", options.max_depth);
    eprintln!("Visited set: {}", policy_description(options.visited_policy));
    if options.visited_policy == VisitedPolicy::PerSeed && options.workers > 1 {
        eprintln!("Workers: {}", options.workers);
    }
    if settings.save {
        eprintln!("Output: {}\n", settings.output_dir.display());
    } else {
        eprintln!("Output: not saved\n");
    }
}

fn print_summary(report: &ScanReport) {
    eprintln!(
        "\n{} Scan complete: {} hosts, {} pages fetched, {} failed",
        "✓".green().bold(),
        report.hosts.len().to_string().cyan(),
        report.stats.pages_fetched,
        report.stats.fetch_failures
    );
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "✗".red().bold(), e);
    std::process::exit(1);
}

pub async fn handle_scan(matches: &ArgMatches) {
    init_tracing(matches.get_flag("debug"));

    let (options, settings) = match scan_options_from_matches(matches) {
        Ok(parsed) => parsed,
        Err(e) => fail(e),
    };

    let fetcher = match HttpFetcher::for_suffix(options.domain_suffix.clone(), settings.timeout_secs) {
        Ok(fetcher) => fetcher,
        Err(e) => fail(e),
    };

    let chatty = !settings.quiet && !settings.json;
    if chatty {
        print_header(&options, &settings);
    }

    let trace_callback: Option<TraceCallback> = if settings.debug {
        let suffix = options.domain_suffix.clone();
        let to_stdout = settings.traces_on_stdout();
        Some(Arc::new(move |host: &Host, depth: usize| {
            let line = format_trace_line(host, depth, &suffix);
            if to_stdout {
                println!("{}", line);
            } else {
                eprintln!("{}", line);
            }
        }))
    } else {
        None
    };

    let progress_callback: Option<ScanProgressCallback> = if chatty {
        Some(Arc::new(|msg: String| {
            eprintln!("{}", msg);
        }))
    } else {
        None
    };

    let report = match execute_scan(options, fetcher, progress_callback, trace_callback).await {
        Ok(report) => report,
        Err(e) => fail(format!("Scan failed: {}", e)),
    };

    if settings.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        for label in report.labels() {
            println!("{}", label);
        }
    }

    if chatty {
        print_summary(&report);
    }

    if settings.save {
        match save_report(&settings.output_dir, &report, settings.name_seeds) {
            Ok(path) => {
                if chatty {
                    eprintln!("{} Saved to {}", "✓".green().bold(), path.display());
                }
            }
            Err(e) => fail(e),
        }
    }
}
