//! Pod Resource Aggregator
//!
//! Computes the resources a scheduler reserves for a pod from its manifest.
//!
//! Init containers run sequentially, so their phase needs the largest single
//! request or limit. Main containers run concurrently, so theirs are summed.
//! The effective value per resource is the larger of the two.
//!
//! # Example
//!
//! ```rust
//! use container_resource_aggregator::analyzer::pod_resources::{aggregate, Quantity};
//!
//! let spec: serde_yaml::Value = serde_yaml::from_str(r#"
//! initContainers:
//! - resources: {requests: {cpu: 900m}}
//! containers:
//! - resources: {requests: {cpu: 250m}}
//! - resources: {requests: {cpu: 250m}}
//! "#).unwrap();
//!
//! let summary = aggregate(&spec).unwrap();
//! assert_eq!(summary.total_requests["cpu"], "500m".parse::<Quantity>().unwrap());
//! assert_eq!(summary.effective_requests["cpu"].to_string(), "900m");
//! ```

/// Exact resource quantities.
pub mod quantity;

/// Core data types.
pub mod types;

/// Manifest and resource parsing.
pub mod parser;

/// Init-max / main-sum aggregation.
pub mod aggregator;

/// Output formatting (table, summary, JSON, YAML).
pub mod formatter;

pub use aggregator::{aggregate, aggregate_with_diagnostics};
pub use formatter::{OutputFormat, format_reports};
pub use parser::{ManifestOptions, WorkloadKind, extract_workload, parse_manifests};
pub use quantity::{Quantity, QuantityFormat, QuantityParseError};
pub use types::{
    ContainerResources, Phase, RejectedQuantity, ResourceKind, ResourceList, SkippedEntry, Summary,
    Workload, WorkloadReport,
};
