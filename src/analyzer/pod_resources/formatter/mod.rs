//! Output formatting for aggregation reports.
//!
//! Supports multiple output formats: table, summary, JSON and YAML.

mod output;

pub use output::{OutputFormat, format_reports};
