//! Output formatting for CLI commands.
//!
//! This module renders plans, manifests and verification reports as text
//! tables or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::OutputFormat;
use crate::planner::{Manifest, Plan, ResourcePlan};
use crate::verifier::VerificationReport;

/// Output formatter for CLI.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Planned resource row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Resource")]
    urn: String,
    #[tabled(rename = "Operations")]
    ops: String,
    #[tabled(rename = "Goal")]
    goal: String,
}

/// Violation row for table display.
#[derive(Tabled)]
struct ViolationRow {
    #[tabled(rename = "Resource")]
    urn: String,
    #[tabled(rename = "Violation")]
    violation: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &Plan, detailed: bool) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Text => Self::format_plan_text(plan, detailed),
        }
    }

    fn format_plan_text(plan: &Plan, detailed: bool) -> String {
        if plan.is_empty() {
            return format!("{} No resources planned.\n", "✓".green());
        }

        let mut output = String::new();
        let _ = write!(
            output,
            "\nPlan created {} by {}\n\n",
            plan.manifest.time, plan.manifest.version
        );

        let rows: Vec<PlanRow> = plan
            .resource_plans
            .iter()
            .map(|(urn, resource)| PlanRow {
                urn: urn.to_string(),
                ops: resource.ops_display(),
                goal: Self::goal_summary(resource),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        if detailed {
            for (urn, resource) in &plan.resource_plans {
                let Some(goal) = &resource.goal else {
                    continue;
                };
                if goal.expects_no_property_changes() {
                    continue;
                }

                let _ = writeln!(output, "\n{urn}");
                for (key, value) in &goal.adds {
                    let _ = writeln!(output, "   {} {key} = {value}", "+".green());
                }
                for (key, value) in &goal.updates {
                    let _ = writeln!(output, "   {} {key} = {value}", "~".yellow());
                }
                for key in &goal.deletes {
                    let _ = writeln!(output, "   {} {key}", "-".red());
                }
            }
        }

        if !plan.config.is_empty() {
            let _ = write!(
                output,
                "\nConfig: {} keys ({} secret)\n",
                plan.config.len(),
                plan.config.secret_count()
            );
        }

        let _ = write!(output, "\nPlan: {} resources\n", plan.len());
        output
    }

    fn goal_summary(resource: &ResourcePlan) -> String {
        match &resource.goal {
            None => "delete".red().to_string(),
            Some(goal) => format!(
                "+{} ~{} -{}",
                goal.adds.len(),
                goal.updates.len(),
                goal.deletes.len()
            ),
        }
    }

    /// Formats a plan manifest and whether its integrity marker checks out.
    #[must_use]
    pub fn format_manifest(&self, manifest: &Manifest) -> String {
        let verified = manifest.verify();

        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "time": manifest.time,
                    "version": manifest.version,
                    "magic": manifest.magic,
                    "verified": verified,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "   Version: {}", manifest.version);
                let _ = writeln!(output, "   Created: {}", manifest.time);
                let _ = writeln!(output, "   Magic: {}", manifest.magic);
                let status = if verified {
                    format!("{} manifest verified", "✓".green())
                } else {
                    format!("{} manifest does not match its content", "✗".red())
                };
                let _ = writeln!(output, "\n{status}");
                output
            }
        }
    }

    /// Formats a verification report.
    #[must_use]
    pub fn format_report(&self, report: &VerificationReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    fn format_report_text(report: &VerificationReport) -> String {
        let mut output = if report.is_conforming() {
            format!(
                "{} Run conforms to plan ({} resources checked).\n",
                "✓".green(),
                report.checked
            )
        } else {
            let rows: Vec<ViolationRow> = report
                .violations
                .iter()
                .map(|v| ViolationRow {
                    urn: v.urn.to_string(),
                    violation: v.violation.to_string(),
                })
                .collect();

            format!(
                "{} Run violates plan:\n\n{}\n\n{}/{} resources in violation.\n",
                "✗".red(),
                Table::new(rows),
                report.violating_urns().len(),
                report.checked
            )
        };

        if report.has_unresolved() {
            let _ = write!(output, "\n{} Unresolved references:\n", "⚠".yellow());
            for (from, to) in &report.unresolved {
                let _ = writeln!(output, "   - {from} -> {to}");
            }
        }

        output
    }
}
