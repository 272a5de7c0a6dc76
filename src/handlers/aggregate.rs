//! Handler for the aggregate command.
//!
//! Reads a manifest from a file or stdin, aggregates every workload in it
//! and renders the reports.

use crate::analyzer::pod_resources::{
    ManifestOptions, OutputFormat, WorkloadReport, aggregate_with_diagnostics, format_reports,
    parse_manifests,
};
use crate::cli::Cli;
use crate::config::types::Config;
use crate::error::Result;
use log::info;
use std::io::Read;
use std::path::PathBuf;

/// Configuration for the aggregate command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Manifest file, `None` for stdin
    pub input: Option<PathBuf>,
    /// Output format
    pub format: OutputFormat,
    /// Skip documents whose kind has no pod template
    pub skip_unsupported: bool,
    /// Colorize table output
    pub color: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            input: None,
            format: OutputFormat::Table,
            skip_unsupported: false,
            color: true,
        }
    }
}

impl AggregateOptions {
    /// Merge command-line flags over file configuration.
    pub fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            input: cli.input().cloned(),
            format: cli.format.unwrap_or(config.output.format),
            skip_unsupported: cli.skip_unsupported || config.manifest.skip_unsupported,
            color: config.output.color && !cli.no_color,
        }
    }
}

/// Aggregate every workload in a manifest stream.
pub fn aggregate_content(content: &str, skip_unsupported: bool) -> Result<Vec<WorkloadReport>> {
    let workloads = parse_manifests(content, &ManifestOptions { skip_unsupported })?;

    workloads
        .iter()
        .map(|workload| -> Result<WorkloadReport> {
            info!("Aggregating {}", workload.identifier());
            let (summary, skipped) = aggregate_with_diagnostics(&workload.pod_spec)?;
            Ok(WorkloadReport::new(workload, summary, skipped))
        })
        .collect()
}

/// Run the aggregate command and return the rendered output.
pub fn handle_aggregate(options: AggregateOptions) -> Result<String> {
    if !options.color {
        colored::control::set_override(false);
    }

    let content = match &options.input {
        Some(path) => {
            info!("Reading manifest from {}", path.display());
            std::fs::read_to_string(path)?
        }
        None => {
            info!("Reading manifest from stdin");
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let reports = aggregate_content(&content, options.skip_unsupported)?;
    format_reports(&reports, options.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AggregatorError;
    use clap::Parser;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
spec:
  template:
    spec:
      initContainers:
      - name: init
        resources:
          requests: {cpu: "1", memory: 1Gi}
      containers:
      - name: api
        resources:
          requests: {cpu: 200m, memory: 256Mi}
          limits: {cpu: 500m, memory: 512Mi}
      - name: proxy
        resources:
          requests: {cpu: 100m, memory: 64Mi}
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
"#;

    #[test]
    fn test_resolve_prefers_cli_flags() {
        let cli = Cli::try_parse_from(["agg", "m.yaml", "-f", "yaml", "--no-color"]).unwrap();
        let mut config = Config::default();
        config.output.format = OutputFormat::Json;
        config.manifest.skip_unsupported = true;

        let options = AggregateOptions::resolve(&cli, &config);
        assert_eq!(options.input, Some(PathBuf::from("m.yaml")));
        assert_eq!(options.format, OutputFormat::Yaml);
        assert!(options.skip_unsupported);
        assert!(!options.color);
    }

    #[test]
    fn test_resolve_falls_back_to_config() {
        let cli = Cli::try_parse_from(["agg"]).unwrap();
        let mut config = Config::default();
        config.output.format = OutputFormat::Summary;

        let options = AggregateOptions::resolve(&cli, &config);
        assert_eq!(options.input, None);
        assert_eq!(options.format, OutputFormat::Summary);
        assert!(!options.skip_unsupported);
        assert!(options.color);
    }

    #[test]
    fn test_aggregate_content() {
        let reports = aggregate_content(MANIFEST, true).unwrap();
        assert_eq!(reports.len(), 1);

        let summary = &reports[0].summary;
        assert_eq!(summary.total_requests["cpu"].to_string(), "300m");
        assert_eq!(summary.effective_requests["cpu"].to_string(), "1");
        assert_eq!(summary.effective_requests["memory"].to_string(), "1Gi");
        assert_eq!(summary.effective_limits["memory"].to_string(), "512Mi");
    }

    #[test]
    fn test_aggregate_content_unsupported_kind() {
        assert!(matches!(
            aggregate_content(MANIFEST, false),
            Err(AggregatorError::UnsupportedKind(kind)) if kind == "ConfigMap"
        ));
    }

    #[test]
    fn test_handle_aggregate_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, MANIFEST.as_bytes()).unwrap();

        let output = handle_aggregate(AggregateOptions {
            input: Some(file.path().to_path_buf()),
            format: OutputFormat::Json,
            skip_unsupported: true,
            color: false,
        })
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["kind"], "Deployment");
        assert_eq!(value[0]["summary"]["effectiveLimits"]["cpu"], "500m");
    }

    #[test]
    fn test_handle_aggregate_missing_file() {
        let result = handle_aggregate(AggregateOptions {
            input: Some(PathBuf::from("/nonexistent/manifest.yaml")),
            ..AggregateOptions::default()
        });
        assert!(matches!(result, Err(AggregatorError::Io(_))));
    }
}
