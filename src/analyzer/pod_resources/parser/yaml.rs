//! YAML manifest parsing.
//!
//! Locates the pod spec inside workload manifests and turns container
//! `resources` blocks into typed quantity maps.

use crate::analyzer::pod_resources::quantity::Quantity;
use crate::analyzer::pod_resources::types::{
    ContainerResources, RejectedQuantity, ResourceKind, ResourceList, Workload,
};
use crate::error::{AggregatorError, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_yaml::Value;

// ============================================================================
// Workload Kinds
// ============================================================================

/// Workload kinds that carry a pod spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Pod,
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Job,
    CronJob,
}

impl WorkloadKind {
    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "Pod" => Some(Self::Pod),
            "Deployment" => Some(Self::Deployment),
            "StatefulSet" => Some(Self::StatefulSet),
            "DaemonSet" => Some(Self::DaemonSet),
            "ReplicaSet" => Some(Self::ReplicaSet),
            "Job" => Some(Self::Job),
            "CronJob" => Some(Self::CronJob),
            _ => None,
        }
    }

    /// Path from the document root to the pod spec.
    pub fn pod_spec_path(&self) -> &'static [&'static str] {
        match self {
            Self::Pod => &["spec"],
            Self::Deployment
            | Self::StatefulSet
            | Self::DaemonSet
            | Self::ReplicaSet
            | Self::Job => &["spec", "template", "spec"],
            Self::CronJob => &["spec", "jobTemplate", "spec", "template", "spec"],
        }
    }
}

// ============================================================================
// Manifest Parsing
// ============================================================================

/// Options for reading a manifest stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestOptions {
    /// Skip documents that are not workloads instead of failing.
    pub skip_unsupported: bool,
}

/// Parse every document in a YAML (or JSON) stream into workloads.
pub fn parse_manifests(content: &str, options: &ManifestOptions) -> Result<Vec<Workload>> {
    let mut workloads = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let doc = Value::deserialize(document)?;
        if doc.is_null() {
            continue;
        }

        match extract_workload(&doc) {
            Ok(workload) => workloads.push(workload),
            Err(AggregatorError::UnsupportedKind(kind)) if options.skip_unsupported => {
                info!("Skipping document of unsupported kind {}", kind);
            }
            Err(AggregatorError::MissingKind) if options.skip_unsupported => {
                info!("Skipping document without a kind");
            }
            Err(e) => return Err(e),
        }
    }

    if workloads.is_empty() {
        return Err(AggregatorError::NoWorkloads);
    }
    Ok(workloads)
}

/// Locate the pod spec of a single manifest document.
pub fn extract_workload(doc: &Value) -> Result<Workload> {
    let kind = doc
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(AggregatorError::MissingKind)?;
    let workload_kind =
        WorkloadKind::parse(kind).ok_or_else(|| AggregatorError::UnsupportedKind(kind.to_string()))?;

    let metadata = doc.get("metadata");
    let name = metadata
        .and_then(|m| m.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let namespace = metadata
        .and_then(|m| m.get("namespace"))
        .and_then(Value::as_str)
        .map(String::from);

    let pod_spec = workload_kind
        .pod_spec_path()
        .iter()
        .try_fold(doc, |value, key| value.get(*key))
        .filter(|spec| spec.is_mapping())
        .ok_or_else(|| AggregatorError::MissingPodSpec {
            kind: kind.to_string(),
            name: name.clone(),
        })?;

    debug!("Found pod spec for {}/{}", kind, name);

    Ok(Workload {
        kind: kind.to_string(),
        name,
        namespace,
        pod_spec: pod_spec.clone(),
    })
}

// ============================================================================
// Resource Parsing
// ============================================================================

/// Text of a scalar as written in the manifest (`"500m"`, `2`, `0.5`).
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    scalar_text(value).unwrap_or_else(|| {
        serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    })
}

/// Best-effort build of a resource list from a `requests` or `limits`
/// mapping.
///
/// Entries that do not parse as quantities are left out of the list and
/// returned alongside it. A missing or non-mapping value yields an empty
/// list.
pub fn build_resource_list(raw: Option<&Value>) -> (ResourceList, Vec<RejectedQuantity>) {
    let mut list = ResourceList::new();
    let mut rejected = Vec::new();

    let Some(Value::Mapping(entries)) = raw else {
        return (list, rejected);
    };

    for (key, value) in entries {
        let Some(resource) = scalar_text(key) else {
            continue;
        };

        let parsed = scalar_text(value)
            .ok_or_else(|| "not a scalar quantity".to_string())
            .and_then(|text| text.parse::<Quantity>().map_err(|e| e.to_string()));

        match parsed {
            Ok(quantity) => {
                list.insert(resource, quantity);
            }
            Err(reason) => rejected.push(RejectedQuantity {
                resource,
                value: display_value(value),
                reason,
            }),
        }
    }

    (list, rejected)
}

/// Extract the requests and limits of one container.
pub fn extract_container_resources(
    container: &Value,
) -> (ContainerResources, Vec<(ResourceKind, RejectedQuantity)>) {
    let resources = container.get("resources");
    let mut parsed = ContainerResources::default();
    let mut rejected = Vec::new();

    for kind in ResourceKind::ALL {
        let (list, bad) = build_resource_list(resources.and_then(|r| r.get(kind.as_str())));
        rejected.extend(bad.into_iter().map(|entry| (kind, entry)));
        match kind {
            ResourceKind::Requests => parsed.requests = list,
            ResourceKind::Limits => parsed.limits = list,
        }
    }

    (parsed, rejected)
}

/// Extract container name from a container YAML value.
pub fn extract_container_name(container: &Value) -> Option<String> {
    container.get("name")?.as_str().map(String::from)
}

// ============================================================================
// Tests
// ============================================================================
