use crate::error::{CoreError, Result};
use hostcrawl_scanner::{DomainSuffix, Host};
use std::fs;
use std::path::Path;
use tracing::warn;
use url::Url;

/// Resolve the seed list from either a seeds file or explicit URLs.
///
/// A seeds file wins when both are given. Duplicate seeds are dropped, first
/// occurrence kept.
pub fn load_seeds(urls: &[Url], seeds_file: Option<&Path>, suffix: &DomainSuffix) -> Result<Vec<Host>> {
    let seeds = if let Some(path) = seeds_file {
        load_seeds_from_file(path, suffix)?
    } else if !urls.is_empty() {
        urls.iter().map(Host::from_url).collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        return Err(CoreError::NoSeeds);
    };

    Ok(dedup_seeds(seeds))
}

/// Load seeds from a newline-delimited file of URLs, hostnames or labels.
pub fn load_seeds_from_file(path: &Path, suffix: &DomainSuffix) -> Result<Vec<Host>> {
    let content = fs::read_to_string(path).map_err(|source| CoreError::SeedsFile {
        path: path.to_path_buf(),
        source,
    })?;

    let seeds: Vec<Host> = content
        .lines()
        .filter_map(|line| parse_seed_line(line, suffix))
        .collect();

    if seeds.is_empty() {
        return Err(CoreError::EmptySeedsFile(path.to_path_buf()));
    }

    Ok(seeds)
}

/// Parse one seeds-file line.
///
/// Accepts a full URL (`https://web.mit.edu/x`), a bare hostname
/// (`web.mit.edu`) or a display label (`web`, expanded with `suffix`).
/// Blank lines and `#` comments yield `None`.
pub fn parse_seed_line(line: &str, suffix: &DomainSuffix) -> Option<Host> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let parsed = if line.contains("://") {
        Host::parse(line)
    } else {
        // Hostnames compare case-insensitively once parsed, so `WEB.MIT.EDU`
        // is a hostname and not a label.
        match Host::parse(&format!("https://{}", line)) {
            Ok(host) if suffix.matches(&host) => Ok(host),
            _ => Host::parse(&format!("https://{}{}", line, suffix)),
        }
    };

    match parsed {
        Ok(host) => Some(host),
        Err(e) => {
            warn!("Skipping invalid seed '{}': {}", line, e);
            None
        }
    }
}

/// Every seed must already satisfy the domain filter.
pub fn validate_seeds(seeds: &[Host], suffix: &DomainSuffix) -> Result<()> {
    match seeds.iter().find(|seed| !suffix.matches(seed)) {
        Some(seed) => Err(CoreError::SeedOutsideDomain {
            seed: seed.to_string(),
            suffix: suffix.to_string(),
        }),
        None => Ok(()),
    }
}

fn dedup_seeds(seeds: Vec<Host>) -> Vec<Host> {
    let mut unique = Vec::with_capacity(seeds.len());
    for seed in seeds {
        if !unique.contains(&seed) {
            unique.push(seed);
        }
    }
    unique
}
