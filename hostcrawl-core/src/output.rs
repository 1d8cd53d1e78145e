// Result persistence: one label per line, written to a file that must not exist yet

use crate::error::{CoreError, Result};
use crate::scan::ScanReport;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_OUTPUT_DIR: &str = "out";

/// Build `dir/depth-<d>-<ts>.txt`, or `dir/depth-<d>-<s1>-<s2>-<ts>.txt` when
/// seed labels are given.
pub fn output_path(
    dir: &Path,
    max_depth: usize,
    seed_labels: Option<&[String]>,
    timestamp: i64,
) -> PathBuf {
    let mut name = format!("depth-{}", max_depth);
    if let Some(labels) = seed_labels {
        for label in labels {
            name.push('-');
            name.push_str(&sanitize_label(label));
        }
    }
    name.push_str(&format!("-{}.txt", timestamp));
    dir.join(name)
}

/// Write one label per line. Fails with `OutputExists` rather than overwrite.
pub fn write_results<S: AsRef<str>>(path: &Path, labels: &[S]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => CoreError::OutputExists(path.to_path_buf()),
            _ => CoreError::IoError(e),
        })?;

    let mut writer = BufWriter::new(file);
    for label in labels {
        writeln!(writer, "{}", label.as_ref())?;
    }
    writer.flush()?;

    info!("Wrote {} labels to {}", labels.len(), path.display());
    Ok(())
}

/// Save a finished report under `dir`, stamped with the current time.
pub fn save_report(dir: &Path, report: &ScanReport, name_seeds: bool) -> Result<PathBuf> {
    let seed_labels = name_seeds.then(|| report.seed_labels());
    let path = output_path(
        dir,
        report.max_depth,
        seed_labels.as_deref(),
        chrono::Utc::now().timestamp(),
    );
    write_results(&path, &report.labels())?;
    Ok(path)
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect()
}
