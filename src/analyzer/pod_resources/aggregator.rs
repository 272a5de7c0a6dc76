//! Pod-level aggregation of container requests and limits.
//!
//! Init containers run one after another before the main containers start,
//! so a pod never needs more than its largest init container at once. Main
//! containers run together, so their asks add up. The scheduler reserves
//! whichever of the two is larger, per resource.

use super::parser::{extract_container_name, extract_container_resources};
use super::types::{Phase, ResourceKind, SkippedEntry, Summary};
use crate::error::{AggregatorError, Result};
use log::{debug, warn};
use serde_yaml::Value;

/// Aggregate the resources of a pod spec.
///
/// Fails only when the pod spec or one of its container lists has the
/// wrong shape. Unparsable quantities are skipped.
pub fn aggregate(pod_spec: &Value) -> Result<Summary> {
    aggregate_with_diagnostics(pod_spec).map(|(summary, _)| summary)
}

/// Like [`aggregate`], also returning the entries that were skipped.
pub fn aggregate_with_diagnostics(pod_spec: &Value) -> Result<(Summary, Vec<SkippedEntry>)> {
    if !pod_spec.is_mapping() {
        return Err(AggregatorError::structural("spec", "mapping", pod_spec));
    }

    let mut summary = Summary::new();
    let mut skipped = Vec::new();

    for phase in [Phase::Init, Phase::Main] {
        for (index, container) in container_list(pod_spec, phase)?.iter().enumerate() {
            if !container.is_mapping() {
                debug!("Ignoring {} #{}: not a mapping", phase, index);
                continue;
            }

            let container_name = extract_container_name(container);
            let (resources, rejected) = extract_container_resources(container);

            for (kind, entry) in rejected {
                let entry = SkippedEntry {
                    phase,
                    container_index: index,
                    container_name: container_name.clone(),
                    kind,
                    resource: entry.resource,
                    value: entry.value,
                    reason: entry.reason,
                };
                warn!("{}", entry);
                skipped.push(entry);
            }

            debug!(
                "{} #{} ({}): {} requests, {} limits",
                phase,
                index,
                container_name.as_deref().unwrap_or("unnamed"),
                resources.requests.len(),
                resources.limits.len()
            );

            let (requests, limits) = resources.into_parts();
            phase.fold(summary.phase_map_mut(phase, ResourceKind::Requests), requests);
            phase.fold(summary.phase_map_mut(phase, ResourceKind::Limits), limits);
        }
    }

    summary.derive_effective();
    Ok((summary, skipped))
}

/// Containers of one phase. A missing list is empty; a present one must
/// be a sequence, `null` included.
fn container_list(pod_spec: &Value, phase: Phase) -> Result<&[Value]> {
    match pod_spec.get(phase.field()) {
        None => Ok(&[][..]),
        Some(Value::Sequence(containers)) => Ok(containers.as_slice()),
        Some(other) => Err(AggregatorError::structural(
            phase.field(),
            "sequence",
            other,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::pod_resources::quantity::Quantity;

    fn spec(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_sum_of_main_containers() {
        let summary = aggregate(&spec(
            r#"
containers:
- name: a
  resources: {requests: {cpu: 100m}}
- name: b
  resources: {requests: {cpu: 250m}}
- name: c
  resources: {requests: {cpu: 150m}}
"#,
        ))
        .unwrap();

        assert_eq!(summary.total_requests["cpu"], q("500m"));
        assert_eq!(summary.total_requests["cpu"].to_string(), "500m");
        assert_eq!(summary.effective_requests["cpu"], q("500m"));
        assert!(summary.init_max_requests.is_empty());
    }

    #[test]
    fn test_max_of_init_containers() {
        let summary = aggregate(&spec(
            r#"
initContainers:
- name: first
  resources: {requests: {cpu: 200m}}
- name: second
  resources: {requests: {cpu: 900m}}
containers:
- name: app
  resources: {requests: {cpu: 100m}}
"#,
        ))
        .unwrap();

        assert_eq!(summary.init_max_requests["cpu"], q("900m"));
        assert_eq!(summary.total_requests["cpu"], q("100m"));
        assert_eq!(summary.effective_requests["cpu"], q("900m"));
    }

    #[test]
    fn test_effective_is_larger_phase() {
        let init_wins = aggregate(&spec(
            r#"
initContainers:
- resources: {requests: {memory: 512Mi}}
containers:
- resources: {requests: {memory: 300Mi}}
"#,
        ))
        .unwrap();
        assert_eq!(init_wins.effective_requests["memory"], q("512Mi"));

        let total_wins = aggregate(&spec(
            r#"
initContainers:
- resources: {requests: {memory: 300Mi}}
containers:
- resources: {requests: {memory: 256Mi}}
- resources: {requests: {memory: 256Mi}}
"#,
        ))
        .unwrap();
        assert_eq!(total_wins.effective_requests["memory"], q("512Mi"));
        assert_eq!(total_wins.effective_requests["memory"].to_string(), "512Mi");
    }

    #[test]
    fn test_suffix_equivalence_across_containers() {
        let summary = aggregate(&spec(
            r#"
initContainers:
- resources: {limits: {cpu: "1"}}
containers:
- resources: {limits: {cpu: 500m}}
- resources: {limits: {cpu: 0.5}}
"#,
        ))
        .unwrap();
        assert_eq!(summary.total_limits["cpu"], q("1000m"));
        assert_eq!(summary.effective_limits["cpu"], q("1"));
    }

    #[test]
    fn test_missing_limits_tolerated() {
        let summary = aggregate(&spec(
            r#"
initContainers:
- resources: {requests: {cpu: 1}}
containers:
- resources: {requests: {cpu: 2, memory: 1Gi}}
- name: sidecar
"#,
        ))
        .unwrap();
        assert!(summary.total_limits.is_empty());
        assert!(summary.init_max_limits.is_empty());
        assert!(summary.effective_limits.is_empty());
        assert_eq!(summary.effective_requests.len(), 2);
    }

    #[test]
    fn test_main_only_resource_is_effective() {
        let summary = aggregate(&spec(
            r#"
initContainers:
- resources: {requests: {cpu: 100m}}
containers:
- resources: {requests: {cpu: 50m, memory: 64Mi}}
"#,
        ))
        .unwrap();
        assert_eq!(summary.effective_requests["memory"], q("64Mi"));
        assert_eq!(summary.effective_requests["cpu"], q("100m"));
    }

    #[test]
    fn test_malformed_entry_isolated() {
        let (summary, skipped) = aggregate_with_diagnostics(&spec(
            r#"
containers:
- name: app
  resources:
    requests: {cpu: not-a-number, memory: 128Mi}
"#,
        ))
        .unwrap();

        assert_eq!(summary.total_requests.len(), 1);
        assert_eq!(summary.total_requests["memory"], q("128Mi"));
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].phase, Phase::Main);
        assert_eq!(skipped[0].container_name.as_deref(), Some("app"));
        assert_eq!(skipped[0].kind, ResourceKind::Requests);
        assert_eq!(skipped[0].resource, "cpu");
    }

    #[test]
    fn test_odd_shapes_are_empty_contributions() {
        let summary = aggregate(&spec(
            r#"
containers:
- just-a-string
- resources: "nope"
- resources: {requests: [1, 2]}
- resources: {requests: {cpu: 1}}
"#,
        ))
        .unwrap();
        assert_eq!(summary.total_requests.len(), 1);
        assert_eq!(summary.effective_requests["cpu"], q("1"));
    }

    #[test]
    fn test_structural_errors() {
        let err = aggregate(&spec("containers: oops\n")).unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::Structural { ref field, found: "string", .. } if field == "containers"
        ));

        let err = aggregate(&spec("containers: []\ninitContainers: null\n")).unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::Structural { ref field, found: "null", .. } if field == "initContainers"
        ));

        let err = aggregate(&spec("containers: ~\n")).unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::Structural { ref field, found: "null", .. } if field == "containers"
        ));

        let err = aggregate(&spec("initContainers: {name: x}\n")).unwrap_err();
        assert!(matches!(
            err,
            AggregatorError::Structural { ref field, found: "mapping", .. } if field == "initContainers"
        ));

        assert!(matches!(
            aggregate(&spec("[1, 2]")),
            Err(AggregatorError::Structural { .. })
        ));
    }

    #[test]
    fn test_empty_pod_spec() {
        let summary = aggregate(&spec("{}")).unwrap();
        assert_eq!(summary, Summary::default());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let pod = spec(
            r#"
initContainers:
- resources: {requests: {cpu: 1}, limits: {memory: 1Gi}}
containers:
- resources: {requests: {cpu: 300m}, limits: {memory: 256Mi}}
- resources: {requests: {cpu: 300m, nvidia.com/gpu: 1}}
"#,
        );
        let first = aggregate(&pod).unwrap();
        let second = aggregate(&pod).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
