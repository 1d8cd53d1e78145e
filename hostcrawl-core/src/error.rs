use hostcrawl_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Either --url or --seeds-file must be provided")]
    NoSeeds,

    #[error("No valid seeds found in {0}")]
    EmptySeedsFile(PathBuf),

    #[error("Seed {seed} is not under {suffix}")]
    SeedOutsideDomain { seed: String, suffix: String },

    #[error("Failed to read seeds file {path}: {source}")]
    SeedsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output file {0} already exists, refusing to overwrite")]
    OutputExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Progress bar template error: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
