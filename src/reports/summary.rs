//! Summary report generator for shell output.

use super::{ReportError, ReportFormat, ReportGenerator, ReportMetadata};
use crate::diff::{Classification, Impact, ResourceDiff};
use crate::import::ImportResult;
use crate::model::TopologyType;
use crate::reconcile::{format_duration, PollOutcome, RunScope};

/// Apply ANSI color formatting if colored output is enabled.
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "green" => format!("\x1b[32m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "cyan" => format!("\x1b[36m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            "dim" => format!("\x1b[2m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// Summary reporter for shell output
pub struct SummaryReporter {
    colored: bool,
}

impl SummaryReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self { colored: true }
    }

    /// Disable colored output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        ansi_color(text, color, self.colored)
    }

    fn header(&self, lines: &mut Vec<String>, title: &str) {
        lines.push(self.color(title, "bold"));
        lines.push(self.color("─".repeat(40).as_str(), "dim"));
    }

    fn field(&self, lines: &mut Vec<String>, label: &str, value: impl std::fmt::Display) {
        lines.push(format!("{}  {value}", self.color(label, "cyan")));
    }

    fn metadata_lines(&self, lines: &mut Vec<String>, metadata: &ReportMetadata) {
        if let (Some(baseline), Some(compared)) = (&metadata.baseline, &metadata.compared) {
            self.field(lines, "Compared:", format!("{baseline} → {compared}"));
            lines.push(String::new());
        }
    }

    fn diff_lines(&self, lines: &mut Vec<String>, diff: &ResourceDiff) {
        let (missing, extra, different) = diff.counts();
        if missing > 0 {
            lines.push(format!(
                "  {} {} missing",
                self.color(&format!("-{missing}"), "red"),
                plural(missing, "resource", "resources")
            ));
            for key in &diff.missing {
                lines.push(format!("      {key}"));
            }
        }
        if extra > 0 {
            lines.push(format!(
                "  {} unexpected {}",
                self.color(&format!("+{extra}"), "green"),
                plural(extra, "resource", "resources")
            ));
            for key in &diff.extra {
                lines.push(format!("      {key}"));
            }
        }
        if different > 0 {
            lines.push(format!(
                "  {} {} with field differences",
                self.color(&format!("~{different}"), "yellow"),
                plural(different, "resource", "resources")
            ));
            for entry in &diff.different {
                lines.push(format!("      {}", entry.key));
                for description in &entry.differences {
                    lines.push(format!("        {}", self.color(description, "dim")));
                }
            }
        }
        if diff.is_empty() {
            lines.push(format!("  {}", self.color("No differences", "dim")));
        }
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for SummaryReporter {
    fn generate_import_report(&self, result: &ImportResult) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        let spec = &result.fabric_spec;
        let patterns = result.provenance.detected_patterns();

        self.header(&mut lines, "Fabric Import");
        self.field(&mut lines, "Fabric:", &spec.name);
        self.field(&mut lines, "Source:", result.provenance.original_path());
        self.field(&mut lines, "Topology:", spec.topology_type());
        self.field(
            &mut lines,
            "Switches:",
            format!(
                "{} spine ({}), {} leaf ({})",
                patterns.spine_count, spec.spine_model_id, patterns.leaf_count, spec.leaf_model_id
            ),
        );
        self.field(&mut lines, "Endpoints:", spec.endpoint_count);

        if spec.topology_type() == TopologyType::MultiClass {
            lines.push(String::new());
            lines.push(self.color("Leaf classes:", "bold"));
            for class in &result.leaf_classes {
                lines.push(format!(
                    "  {}  {} {}, {} uplinks, {} endpoints/leaf, profiles [{}]",
                    self.color(&class.class_id, "cyan"),
                    class.leaf_count(),
                    plural(class.leaf_count(), "leaf", "leaves"),
                    class.uplinks_per_leaf,
                    class.endpoints_per_leaf,
                    class.endpoint_profiles.join(", ")
                ));
            }
        } else {
            self.field(&mut lines, "Uplinks/leaf:", spec.uplinks_per_leaf);
            self.field(&mut lines, "Profile:", &spec.endpoint_profile);
        }

        if !result.provenance.assumptions().is_empty() {
            lines.push(String::new());
            lines.push(self.color("Assumptions:", "bold"));
            for assumption in result.provenance.assumptions() {
                lines.push(format!("  - {assumption}"));
            }
        }

        lines.push(String::new());
        let validation = &result.validation;
        let status = if validation.is_valid {
            self.color("valid", "green")
        } else {
            self.color("invalid", "red")
        };
        self.field(&mut lines, "Capacity:", status);
        for error in &validation.errors {
            lines.push(format!("  {}", self.color(&error.to_string(), "red")));
        }
        for warning in &validation.warnings {
            lines.push(format!("  {}", self.color(&warning.to_string(), "yellow")));
        }
        for warning in result.provenance.warnings() {
            lines.push(format!("  {}", self.color(&format!("warning: {warning}"), "yellow")));
        }

        Ok(lines.join("\n"))
    }

    fn generate_diff_report(
        &self,
        diff: &ResourceDiff,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        self.header(&mut lines, "Resource Diff");
        self.metadata_lines(&mut lines, metadata);
        lines.push(self.color("Differences:", "bold"));
        self.diff_lines(&mut lines, diff);
        Ok(lines.join("\n"))
    }

    fn generate_classification_report(
        &self,
        classification: &Classification,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        self.header(&mut lines, "Semantic Diff");
        self.metadata_lines(&mut lines, metadata);

        let breaking = classification.breaking().count();
        let cosmetic = classification.cosmetic().count();
        if classification.semantic_differences.is_empty() {
            lines.push(format!("  {}", self.color("No differences", "dim")));
        }
        for difference in &classification.semantic_differences {
            let (tag, color) = match difference.impact {
                Impact::Breaking => ("breaking", "red"),
                Impact::Cosmetic => ("cosmetic", "dim"),
            };
            lines.push(format!(
                "  {} {}",
                self.color(&format!("[{tag}]"), color),
                difference.description
            ));
        }

        lines.push(String::new());
        let verdict = if classification.is_valid {
            self.color("equivalent", "green")
        } else {
            self.color("drifted", "red")
        };
        self.field(
            &mut lines,
            "Result:",
            format!("{verdict} ({breaking} breaking, {cosmetic} cosmetic)"),
        );
        Ok(lines.join("\n"))
    }

    fn generate_poll_report(
        &self,
        outcome: &PollOutcome,
        scope: &RunScope,
    ) -> Result<String, ReportError> {
        let mut lines = Vec::new();
        self.header(&mut lines, "Reconciliation");
        self.field(&mut lines, "Namespace:", scope.namespace());
        self.field(&mut lines, "Selector:", scope.selector());

        let status = match outcome.status {
            crate::reconcile::PollStatus::Satisfied => self.color("satisfied", "green"),
            crate::reconcile::PollStatus::Exhausted => self.color("exhausted", "red"),
            crate::reconcile::PollStatus::Canceled => self.color("canceled", "yellow"),
        };
        self.field(
            &mut lines,
            "Status:",
            format!(
                "{status} after {} {}",
                outcome.attempts,
                plural(outcome.attempts as usize, "attempt", "attempts")
            ),
        );
        if !outcome.delays.is_empty() {
            let delays: Vec<String> = outcome.delays.iter().map(|d| format_duration(*d)).collect();
            self.field(&mut lines, "Delays:", delays.join(", "));
        }
        if let Some(error) = &outcome.last_error {
            self.field(&mut lines, "Last error:", self.color(error, "red"));
        }
        if let Some(diff) = &outcome.last_diff {
            if !diff.is_empty() {
                lines.push(String::new());
                lines.push(self.color("Last diff:", "bold"));
                self.diff_lines(&mut lines, diff);
            }
        }
        Ok(lines.join("\n"))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{DiffEngine, SemanticClassifier};
    use crate::model::Resource;

    fn config_map(name: &str, labels: &[(&str, &str)]) -> Resource {
        labels
            .iter()
            .fold(Resource::new("v1", "ConfigMap", name), |r, (k, v)| {
                r.with_label(*k, *v)
            })
    }

    #[test]
    fn test_diff_summary_lists_keys() {
        let expected = vec![config_map("a", &[]), config_map("b", &[("tier", "1")])];
        let actual = vec![config_map("b", &[("tier", "2")]), config_map("c", &[])];
        let diff = DiffEngine::new().compare(&expected, &actual);

        let report = SummaryReporter::new()
            .no_color()
            .generate_diff_report(&diff, &ReportMetadata::new("before", "after"))
            .unwrap();

        assert!(report.contains("before → after"));
        assert!(report.contains("-1 resource missing"));
        assert!(report.contains("ConfigMap/a"));
        assert!(report.contains("+1 unexpected resource"));
        assert!(report.contains("label tier: expected 1, got 2"));
        assert!(!report.contains('\x1b'));
    }

    #[test]
    fn test_classification_verdict() {
        let before = vec![config_map("a", &[("displayName", "A")])];
        let after = vec![config_map("a", &[("displayName", "Renamed")])];
        let classification = SemanticClassifier::default().classify(&before, &after);

        let report = SummaryReporter::new()
            .no_color()
            .generate_classification_report(&classification, &ReportMetadata::default())
            .unwrap();
        assert!(report.contains("[cosmetic]"));
        assert!(report.contains("equivalent (0 breaking, 1 cosmetic)"));
    }

    #[test]
    fn test_empty_diff() {
        let report = SummaryReporter::new()
            .no_color()
            .generate_diff_report(&ResourceDiff::new(), &ReportMetadata::default())
            .unwrap();
        assert!(report.contains("No differences"));
    }
}
