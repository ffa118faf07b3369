//! Reconcile command handler.
//!
//! Polls a cluster (or a recorded snapshot) until every expected resource
//! of one run exists.

use super::exit_codes;
use super::output::{should_use_color, write_output, OutputTarget};
use super::resources::load_resources;
use crate::config::AppConfig;
use crate::model::Resource;
use crate::reconcile::{
    CancellationToken, ClusterClient, Poller, RunScope, ScriptedClient, ThreadScheduler,
    RUN_ID_LABEL,
};
use crate::reports::{create_reporter_with_options, ReportFormat};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Inputs of the `reconcile` subcommand.
#[derive(Debug, Clone)]
pub struct ReconcileCommand {
    /// Expected resources: a layout directory or a manifest file
    pub expected: PathBuf,
    pub run_id: String,
    /// Serve the cluster side from this layout or manifest file instead of
    /// the API server
    pub actual: Option<PathBuf>,
    /// Overall deadline; cancels the poll when it fires
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
    pub format: ReportFormat,
    pub output_file: Option<PathBuf>,
    pub no_color: bool,
    pub quiet: bool,
}

/// Place expected resources in the run's namespace and label them with its id.
fn scoped(resources: Vec<Resource>, scope: &RunScope) -> Vec<Resource> {
    resources
        .into_iter()
        .map(|r| {
            r.with_namespace(scope.namespace())
                .with_label(RUN_ID_LABEL, scope.run_id())
        })
        .collect()
}

#[cfg(feature = "cluster")]
fn live_client(config: &AppConfig) -> Result<Box<dyn ClusterClient>> {
    use crate::cluster::{KubeClient, KubeClientConfig};

    let client_config = KubeClientConfig::from_config(&config.reconcile.cluster);
    if client_config.token.is_none() {
        tracing::warn!(
            "{} is not set; listing without a bearer token",
            config.reconcile.cluster.token_env
        );
    }
    let client = KubeClient::new(client_config).context("creating cluster client")?;
    Ok(Box::new(client))
}

#[cfg(not(feature = "cluster"))]
fn live_client(_config: &AppConfig) -> Result<Box<dyn ClusterClient>> {
    anyhow::bail!("built without the 'cluster' feature; pass --actual to reconcile against a snapshot")
}

/// Run the reconcile command, returning the desired exit code.
pub fn run_reconcile(command: &ReconcileCommand, config: &AppConfig) -> Result<i32> {
    let scope = RunScope::new(&config.reconcile.namespace_prefix, &command.run_id)
        .context("invalid run scope")?;
    let codec = config.codec.manifest_codec();
    let expected = scoped(load_resources(&command.expected, &codec)?, &scope);

    let client: Box<dyn ClusterClient> = match &command.actual {
        Some(path) => {
            let snapshot = scoped(load_resources(path, &codec)?, &scope);
            tracing::info!("Reconciling against snapshot {}", path.display());
            Box::new(ScriptedClient::from_snapshot(snapshot))
        }
        None => live_client(config)?,
    };

    let mut policy = config.reconcile.backoff.clone();
    if let Some(max_attempts) = command.max_attempts {
        policy = policy.with_max_attempts(max_attempts);
    }
    policy.validate().context("invalid backoff policy")?;

    let cancel = CancellationToken::new();
    let _deadline = command.timeout.map(|timeout| cancel.cancel_after(timeout));

    let scheduler = ThreadScheduler;
    let outcome = Poller::new(client.as_ref(), &scheduler)
        .with_policy(policy)
        .with_engine(config.diff_engine())
        .poll(&expected, &scope, &cancel);
    // Release a pending deadline thread.
    cancel.cancel();

    let target = OutputTarget::from_option(command.output_file.clone());
    let reporter =
        create_reporter_with_options(command.format, should_use_color(command.no_color, &target));
    let report = reporter.generate_poll_report(&outcome, &scope)?;
    write_output(&report, &target, command.quiet)?;

    Ok(if outcome.is_satisfied() {
        exit_codes::SUCCESS
    } else {
        exit_codes::DRIFT_OR_INVALID
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPECTED: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: config1
---
apiVersion: v1
kind: Service
metadata:
  name: service1
";

    const PARTIAL: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: config1
";

    fn command(tmp: &TempDir, actual: &str) -> ReconcileCommand {
        let expected_path = tmp.path().join("expected.yaml");
        let actual_path = tmp.path().join("actual.yaml");
        std::fs::write(&expected_path, EXPECTED).unwrap();
        std::fs::write(&actual_path, actual).unwrap();
        ReconcileCommand {
            expected: expected_path,
            run_id: "42".to_string(),
            actual: Some(actual_path),
            timeout: None,
            max_attempts: Some(1),
            format: ReportFormat::Json,
            output_file: Some(tmp.path().join("report.json")),
            no_color: true,
            quiet: true,
        }
    }

    #[test]
    fn test_snapshot_satisfied() {
        let tmp = TempDir::new().unwrap();
        let code = run_reconcile(&command(&tmp, EXPECTED), &AppConfig::default()).unwrap();
        assert_eq!(code, exit_codes::SUCCESS);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["status"], "satisfied");
        assert_eq!(report["namespace"], "it-42");
    }

    #[test]
    fn test_snapshot_missing_service() {
        let tmp = TempDir::new().unwrap();
        let code = run_reconcile(&command(&tmp, PARTIAL), &AppConfig::default()).unwrap();
        assert_eq!(code, exit_codes::DRIFT_OR_INVALID);

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(tmp.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["status"], "exhausted");
        assert_eq!(report["lastDiff"]["missing"][0]["name"], "service1");
    }

    #[test]
    fn test_bad_run_id() {
        let tmp = TempDir::new().unwrap();
        let mut cmd = command(&tmp, EXPECTED);
        cmd.run_id = "not a label".to_string();
        assert!(run_reconcile(&cmd, &AppConfig::default()).is_err());
    }
}
