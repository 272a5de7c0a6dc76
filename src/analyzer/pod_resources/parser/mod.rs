//! Parsing utilities for pod resource aggregation.
//!
//! Decodes manifest streams, locates each workload's pod spec and builds
//! typed resource lists from container `resources` blocks.

pub mod yaml;

pub use yaml::{
    ManifestOptions, WorkloadKind, build_resource_list, extract_container_name,
    extract_container_resources, extract_workload, parse_manifests,
};
