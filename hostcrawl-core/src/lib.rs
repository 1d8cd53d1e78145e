pub mod error;
pub mod output;
pub mod scan;
pub mod seeds;

pub use error::{CoreError, Result};
pub use scan::{ScanOptions, ScanProgressCallback, ScanReport, VisitedPolicy, execute_scan};
