//! # Container Resource Aggregator
//!
//! A kubectl plugin and library that computes the effective resource
//! requests and limits a scheduler reserves for a pod.
//!
//! ## Features
//!
//! - **Exact Quantities**: Fixed-point parsing of Kubernetes quantity strings
//!   (`500m`, `256Mi`, `1e3`) with magnitude comparison across suffixes
//! - **Init/Main Aggregation**: Largest init container vs. sum of main
//!   containers, per resource name
//! - **Workload Dispatch**: Pods, Deployments, StatefulSets, DaemonSets,
//!   ReplicaSets, Jobs and CronJobs, including multi-document streams
//! - **Best-Effort Parsing**: Malformed quantities are skipped and reported
//!   instead of failing the whole manifest
//! - **Multiple Formats**: Table, summary, JSON and YAML output
//!
//! ## Example
//!
//! ```rust
//! use container_resource_aggregator::aggregate_content;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = r#"
//! kind: Pod
//! metadata: {name: demo}
//! spec:
//!   containers:
//!   - resources: {requests: {memory: 128Mi}}
//!   - resources: {requests: {memory: 128Mi}}
//! "#;
//! let reports = aggregate_content(manifest, false)?;
//! assert_eq!(reports[0].summary.effective_requests["memory"].to_string(), "256Mi");
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

// Re-export commonly used types and functions
pub use analyzer::pod_resources::{Quantity, Summary, aggregate, aggregate_with_diagnostics};
pub use error::{AggregatorError, Result};
pub use handlers::{AggregateOptions, aggregate_content, handle_aggregate};

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the command described by parsed arguments and return its output.
pub fn run_command(cli: &cli::Cli) -> Result<String> {
    let config = config::load_config(cli.config.as_deref())?;
    let options = AggregateOptions::resolve(cli, &config);
    handle_aggregate(options)
}
