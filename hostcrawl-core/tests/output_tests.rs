// Tests for result persistence

use hostcrawl_core::output::{save_report, write_results};
use hostcrawl_core::{CoreError, ScanReport, VisitedPolicy};
use hostcrawl_scanner::{DomainSuffix, Host, ScanStats};
use std::fs;
use tempfile::TempDir;

fn report(labels: &[&str]) -> ScanReport {
    ScanReport {
        seeds: vec![Host::parse("https://libraries.mit.edu").unwrap()],
        domain_suffix: DomainSuffix::new(".mit.edu").unwrap(),
        max_depth: 2,
        visited_policy: VisitedPolicy::PerSeed,
        hosts: labels
            .iter()
            .map(|l| Host::parse(&format!("https://{}.mit.edu", l)).unwrap())
            .collect(),
        stats: ScanStats::default(),
    }
}

#[test]
fn test_write_results_one_label_per_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depth-2-100.txt");

    write_results(&path, &["web", "eecs", "libraries"]).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "web\neecs\nlibraries\n");
}

#[test]
fn test_write_results_creates_output_dir() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("nested").join("depth-1-5.txt");

    write_results(&path, &["web"]).unwrap();

    assert!(path.exists());
}

#[test]
fn test_write_results_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("depth-3-1.txt");
    fs::write(&path, "previous results\n").unwrap();

    let result = write_results(&path, &["web"]);

    assert!(matches!(result, Err(CoreError::OutputExists(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous results\n");
}

#[test]
fn test_write_results_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.txt");

    write_results::<&str>(&path, &[]).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_save_report_writes_labels() {
    let dir = TempDir::new().unwrap();
    let path = save_report(dir.path(), &report(&["web", "libraries"]), false).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("depth-2-"));
    assert!(name.ends_with(".txt"));
    assert!(!name.contains("libraries"));

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "libraries\nweb\n");
}

#[test]
fn test_save_report_with_seed_names() {
    let dir = TempDir::new().unwrap();
    let path = save_report(dir.path(), &report(&["web"]), true).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("depth-2-libraries-"));
}
