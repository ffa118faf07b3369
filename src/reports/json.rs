//! JSON report generator.

use super::{ReportError, ReportFormat, ReportGenerator, ReportMetadata};
use crate::diff::{Classification, ResourceDiff};
use crate::import::ImportResult;
use crate::reconcile::{PollOutcome, RunScope};
use chrono::Utc;
use serde::Serialize;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: true }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn render<T: Serialize>(&self, report_type: &'static str, metadata: Option<&ReportMetadata>, body: T) -> Result<String, ReportError> {
        let report = JsonReport {
            metadata: JsonReportMetadata {
                tool: ToolInfo {
                    name: env!("CARGO_PKG_NAME"),
                    version: env!("CARGO_PKG_VERSION"),
                },
                report_type,
                generated_at: Utc::now().to_rfc3339(),
                sources: metadata,
            },
            body,
        };
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };
        rendered.map_err(|e| ReportError::SerializationError(e.to_string()))
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate_import_report(&self, result: &ImportResult) -> Result<String, ReportError> {
        self.render("import", None, result)
    }

    fn generate_diff_report(
        &self,
        diff: &ResourceDiff,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError> {
        self.render("diff", Some(metadata), DiffBody { is_empty: diff.is_empty(), diff })
    }

    fn generate_classification_report(
        &self,
        classification: &Classification,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError> {
        self.render("classification", Some(metadata), classification)
    }

    fn generate_poll_report(
        &self,
        outcome: &PollOutcome,
        scope: &RunScope,
    ) -> Result<String, ReportError> {
        self.render(
            "reconcile",
            None,
            PollBody {
                namespace: scope.namespace(),
                selector: scope.selector(),
                outcome,
            },
        )
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

// ============================================================================
// JSON structures
// ============================================================================

#[derive(Serialize)]
struct JsonReport<'a, T: Serialize> {
    metadata: JsonReportMetadata<'a>,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReportMetadata<'a> {
    tool: ToolInfo,
    report_type: &'static str,
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sources: Option<&'a ReportMetadata>,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DiffBody<'a> {
    is_empty: bool,
    #[serde(flatten)]
    diff: &'a ResourceDiff,
}

#[derive(Serialize)]
struct PollBody<'a> {
    namespace: String,
    selector: String,
    #[serde(flatten)]
    outcome: &'a PollOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use crate::model::Resource;
    use crate::reconcile::{ManualScheduler, Poller, ScriptedClient, CancellationToken};

    #[test]
    fn test_diff_json_shape() {
        let expected = vec![Resource::new("v1", "Service", "service1")];
        let diff = DiffEngine::new().compare(&expected, &[]);

        let text = JsonReporter::new()
            .generate_diff_report(&diff, &ReportMetadata::new("expected/", "actual/"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["metadata"]["tool"]["name"], "fabric-drift");
        assert_eq!(value["metadata"]["reportType"], "diff");
        assert_eq!(value["metadata"]["sources"]["baseline"], "expected/");
        assert_eq!(value["isEmpty"], false);
        assert_eq!(value["missing"][0]["kind"], "Service");
        assert_eq!(value["missing"][0]["name"], "service1");
    }

    #[test]
    fn test_poll_json_carries_delays() {
        let expected = vec![Resource::new("v1", "ConfigMap", "cm")];
        let client = ScriptedClient::new().respond("ConfigMap", Ok(Vec::new()));
        let scheduler = ManualScheduler::new();
        let poller = Poller::new(&client, &scheduler).with_policy(
            crate::reconcile::BackoffPolicy::default().with_max_attempts(3),
        );
        let scope = RunScope::new("it", "7").unwrap();
        let outcome = poller.poll(&expected, &scope, &CancellationToken::new());

        let text = JsonReporter::new().pretty(false).generate_poll_report(&outcome, &scope).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["namespace"], "it-7");
        assert_eq!(value["status"], "exhausted");
        assert_eq!(value["attempts"], 3);
        assert_eq!(value["delaysMs"], serde_json::json!([1000, 2000]));
        assert!(!text.contains('\n'));
    }
}
