pub mod engine;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod host;

pub use engine::{ScanStats, Scanner, TraceCallback};
pub use error::ScanError;
pub use fetcher::{Fetcher, HttpFetcher};
pub use filter::filter_links;
pub use host::{DomainSuffix, Host};
