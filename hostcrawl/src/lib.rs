pub mod commands;
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use commands::command_argument_builder;
pub use handlers::{
    RunSettings, format_trace_line, handle_scan, init_tracing, scan_options_from_matches,
};

// Re-export scan functionality from hostcrawl-core
pub use hostcrawl_core::{ScanOptions, ScanReport, VisitedPolicy, execute_scan};
