//! Output module for operator-facing reports
//!
//! This module handles:
//! - Per-source pipeline statistics for `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, PipelineStatistics, SourceStatistics};
