//! Output formatting for aggregation reports.
//!
//! Supports multiple output formats: table, plain summary, JSON and YAML.

use crate::analyzer::pod_resources::quantity::Quantity;
use crate::analyzer::pod_resources::types::{ResourceKind, ResourceList, WorkloadReport};
use crate::error::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

const RULE: &str =
    "═══════════════════════════════════════════════════════════════════════════════";

// ============================================================================
// Output Format
// ============================================================================

/// Output format for aggregation reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Boxed, colored report (default)
    #[default]
    Table,
    /// Plain text, one block per resource
    Summary,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

// ============================================================================
// Formatting Functions
// ============================================================================

/// Render reports in the requested format.
pub fn format_reports(reports: &[WorkloadReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(format_table(reports)),
        OutputFormat::Summary => Ok(format_summary(reports)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(reports)?),
    }
}

fn cell(list: &ResourceList, resource: &str) -> String {
    list.get(resource)
        .map(Quantity::to_string)
        .unwrap_or_else(|| "-".to_string())
}

/// One `(label, value)` row per phase for a resource kind.
fn rows(report: &WorkloadReport, kind: ResourceKind, resource: &str) -> [(&'static str, String); 3] {
    let summary = &report.summary;
    let (init, total, effective) = match kind {
        ResourceKind::Requests => ("InitMax Requests:", "Total Requests:", "Effective Request:"),
        ResourceKind::Limits => ("InitMax Limits:", "Total Limits:", "Effective Limit:"),
    };
    [
        (init, cell(summary.init_max(kind), resource)),
        (total, cell(summary.total(kind), resource)),
        (effective, cell(summary.effective(kind), resource)),
    ]
}

// ============================================================================
// Table Format
// ============================================================================

fn format_table(reports: &[WorkloadReport]) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{}\n", RULE.bright_blue()));
    output.push_str(&format!(
        "{}\n",
        "📦 POD RESOURCE AGGREGATION REPORT".bright_white().bold()
    ));
    output.push_str(&format!("{}\n", RULE.bright_blue()));

    for report in reports {
        output.push_str(&format_table_report(report));
    }

    output.push_str(&format!("\n{}\n", RULE.bright_blue()));
    output
}

fn format_table_report(report: &WorkloadReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n┌─ {} {}\n",
        format!("{}/{}", report.kind, report.name).bright_white().bold(),
        report
            .namespace
            .as_deref()
            .map(|ns| format!("(namespace: {})", ns))
            .unwrap_or_default()
            .dimmed()
    ));

    let resources = report.summary.resource_names();
    if resources.is_empty() {
        output.push_str(&format!(
            "│ {}\n",
            "(no resource requests or limits declared)".dimmed()
        ));
    }

    for resource in resources {
        output.push_str(&format!("│\n│ {}\n", resource.cyan().bold()));

        for kind in ResourceKind::ALL {
            if kind == ResourceKind::Limits
                && !report.summary.effective_limits.contains_key(resource)
            {
                continue;
            }
            for (i, (label, value)) in rows(report, kind, resource).into_iter().enumerate() {
                // Last row of each kind is the effective value.
                let value = if i == 2 {
                    value.green().bold()
                } else {
                    value.normal()
                };
                output.push_str(&format!("│   {} {}\n", format!("{:<19}", label).dimmed(), value));
            }
        }
    }

    if !report.skipped.is_empty() {
        output.push_str(&format!(
            "│\n│ {}\n",
            format!("⚠ {} entries skipped:", report.skipped.len()).yellow()
        ));
        for entry in &report.skipped {
            output.push_str(&format!("│   {}\n", entry.to_string().yellow()));
        }
    }

    output.push_str(&format!(
        "└{}\n",
        "──────────────────────────────────────────────────────────────────────────────".dimmed()
    ));
    output
}

// ============================================================================
// Summary Format
// ============================================================================

fn format_summary(reports: &[WorkloadReport]) -> String {
    let mut output = String::new();

    for report in reports {
        output.push_str(&format!(
            "Analysis result ({}/{}):\n",
            report.kind, report.name
        ));

        for resource in report.summary.resource_names() {
            output.push_str(&format!("{}:\n", resource));
            for kind in ResourceKind::ALL {
                if kind == ResourceKind::Limits
                    && !report.summary.effective_limits.contains_key(resource)
                {
                    continue;
                }
                for (label, value) in rows(report, kind, resource) {
                    output.push_str(&format!("  {:<19}{}\n", label, value));
                }
            }
            output.push('\n');
        }

        for entry in &report.skipped {
            output.push_str(&format!("skipped: {}\n", entry));
        }
    }

    output
}

// ============================================================================
// Tests
// ============================================================================
