//! # Analyzer Module
//!
//! This module provides manifest analysis capabilities:
//! - Resource quantity parsing and arithmetic
//! - Pod spec discovery across workload kinds
//! - Init/main container resource aggregation

pub mod pod_resources;

// Re-export pod resource types
pub use pod_resources::{
    OutputFormat, Quantity, Summary, Workload, WorkloadReport, aggregate,
    aggregate_with_diagnostics, format_reports, parse_manifests,
};
