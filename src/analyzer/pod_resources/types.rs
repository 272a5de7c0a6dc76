//! Core types for pod resource aggregation.

use super::quantity::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource name (e.g. `cpu`, `memory`, `nvidia.com/gpu`) to quantity.
pub type ResourceList = BTreeMap<String, Quantity>;

// ============================================================================
// Phase / ResourceKind
// ============================================================================

/// Lifecycle phase a container belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Init containers run one at a time before the pod starts.
    Init,
    /// Main containers run side by side for the life of the pod.
    Main,
}

impl Phase {
    /// Pod spec field holding this phase's containers.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Init => "initContainers",
            Self::Main => "containers",
        }
    }

    /// Merge one container's resources into the running phase totals.
    ///
    /// Init containers never overlap, so the phase needs only the largest
    /// single ask. Main containers overlap, so their asks add up.
    pub fn fold(&self, dest: &mut ResourceList, src: ResourceList) {
        match self {
            Self::Init => fold_max(dest, src),
            Self::Main => fold_sum(dest, src),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init container"),
            Self::Main => write!(f, "container"),
        }
    }
}

/// Which half of a container's `resources` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Requests,
    Limits,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Requests, ResourceKind::Limits];

    /// Field name inside a container's `resources` block.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requests => "requests",
            Self::Limits => "limits",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep the larger value per resource; ties keep the existing entry.
fn fold_max(dest: &mut ResourceList, src: ResourceList) {
    for (name, quantity) in src {
        match dest.get_mut(&name) {
            Some(current) if quantity > *current => *current = quantity,
            Some(_) => {}
            None => {
                dest.insert(name, quantity);
            }
        }
    }
}

fn fold_sum(dest: &mut ResourceList, src: ResourceList) {
    for (name, quantity) in src {
        dest.entry(name)
            .and_modify(|current| *current += quantity)
            .or_insert(quantity);
    }
}

// ============================================================================
// Container resources
// ============================================================================

/// Parsed `resources` block of one container. Missing entries mean
/// "unspecified", not zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResources {
    #[serde(default)]
    pub requests: ResourceList,
    #[serde(default)]
    pub limits: ResourceList,
}

impl ContainerResources {
    pub fn get(&self, kind: ResourceKind) -> &ResourceList {
        match kind {
            ResourceKind::Requests => &self.requests,
            ResourceKind::Limits => &self.limits,
        }
    }

    pub fn into_parts(self) -> (ResourceList, ResourceList) {
        (self.requests, self.limits)
    }
}

/// A quantity entry that could not be parsed and was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedQuantity {
    pub resource: String,
    pub value: String,
    pub reason: String,
}

/// A rejected entry together with where it was found in the pod spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub phase: Phase,
    /// Position of the container within its list.
    pub container_index: usize,
    pub container_name: Option<String>,
    pub kind: ResourceKind,
    pub resource: String,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.phase, self.container_index)?;
        if let Some(name) = &self.container_name {
            write!(f, " ({})", name)?;
        }
        write!(
            f,
            ": ignoring {}.{} = {:?}: {}",
            self.kind, self.resource, self.value, self.reason
        )
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Aggregated resource footprint of one pod.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Sum over main containers.
    pub total_requests: ResourceList,
    pub total_limits: ResourceList,
    /// Largest single init container.
    pub init_max_requests: ResourceList,
    pub init_max_limits: ResourceList,
    /// What the scheduler reserves: max(total, init max).
    pub effective_requests: ResourceList,
    pub effective_limits: ResourceList,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self, kind: ResourceKind) -> &ResourceList {
        match kind {
            ResourceKind::Requests => &self.total_requests,
            ResourceKind::Limits => &self.total_limits,
        }
    }

    pub fn init_max(&self, kind: ResourceKind) -> &ResourceList {
        match kind {
            ResourceKind::Requests => &self.init_max_requests,
            ResourceKind::Limits => &self.init_max_limits,
        }
    }

    pub fn effective(&self, kind: ResourceKind) -> &ResourceList {
        match kind {
            ResourceKind::Requests => &self.effective_requests,
            ResourceKind::Limits => &self.effective_limits,
        }
    }

    /// Running map a phase folds into.
    pub fn phase_map_mut(&mut self, phase: Phase, kind: ResourceKind) -> &mut ResourceList {
        match (phase, kind) {
            (Phase::Init, ResourceKind::Requests) => &mut self.init_max_requests,
            (Phase::Init, ResourceKind::Limits) => &mut self.init_max_limits,
            (Phase::Main, ResourceKind::Requests) => &mut self.total_requests,
            (Phase::Main, ResourceKind::Limits) => &mut self.total_limits,
        }
    }

    fn effective_mut(&mut self, kind: ResourceKind) -> &mut ResourceList {
        match kind {
            ResourceKind::Requests => &mut self.effective_requests,
            ResourceKind::Limits => &mut self.effective_limits,
        }
    }

    /// Fill the effective maps from the phase maps.
    ///
    /// Every resource seen in either phase gets an effective value. The
    /// main-phase total wins only when it is strictly larger.
    pub fn derive_effective(&mut self) {
        for kind in ResourceKind::ALL {
            let mut effective = self.init_max(kind).clone();
            for (name, total) in self.total(kind) {
                match effective.get_mut(name) {
                    Some(init_max) if *total > *init_max => *init_max = *total,
                    Some(_) => {}
                    None => {
                        effective.insert(name.clone(), *total);
                    }
                }
            }
            *self.effective_mut(kind) = effective;
        }
    }

    /// Resource names with an effective request or limit, sorted.
    pub fn resource_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .effective_requests
            .keys()
            .chain(self.effective_limits.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.effective_requests.is_empty() && self.effective_limits.is_empty()
    }
}

// ============================================================================
// Workloads
// ============================================================================

/// A manifest document whose pod spec has been located.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub pod_spec: serde_yaml::Value,
}

impl Workload {
    /// `Kind/name`, or `Kind/namespace/name` when namespaced.
    pub fn identifier(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}/{}/{}", self.kind, ns, self.name),
            None => format!("{}/{}", self.kind, self.name),
        }
    }
}

/// Aggregation outcome for one workload, as handed to the formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedEntry>,
}

impl WorkloadReport {
    pub fn new(workload: &Workload, summary: Summary, skipped: Vec<SkippedEntry>) -> Self {
        Self {
            kind: workload.kind.clone(),
            name: workload.name.clone(),
            namespace: workload.namespace.clone(),
            summary,
            skipped,
        }
    }
}
