//! Post-build deployment trigger.

use crate::config::TriggerConfig;
use crate::env::{build_environment, EnvironmentOverride};
use crate::obs::{
    emit_deploy_failed, emit_trigger_finished, emit_trigger_skipped, emit_trigger_started,
    DeploySpan,
};
use crate::outcome::BuildOutcome;
use crate::pipeline::DeploymentPipeline;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Decide whether a finished build should be deployed.
///
/// Success and "no result yet" deploy; anything else only when the operator
/// opted in with `run_on_failure`.
pub fn should_deploy(outcome: BuildOutcome, run_on_failure: bool) -> bool {
    outcome.succeeded_so_far() || run_on_failure
}

/// What the build host hands the step at execution time.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Result of the build so far.
    pub outcome: BuildOutcome,

    /// Ambient environment snapshot.
    pub base_env: EnvironmentOverride,

    /// Build-specific variables; these win over `base_env`.
    pub build_variables: BTreeMap<String, String>,

    /// Build workspace root.
    pub workspace: PathBuf,
}

impl BuildContext {
    /// Context with an empty environment, rooted at `workspace`.
    pub fn new(outcome: BuildOutcome, workspace: impl Into<PathBuf>) -> Self {
        Self {
            outcome,
            base_env: EnvironmentOverride::new(),
            build_variables: BTreeMap::new(),
            workspace: workspace.into(),
        }
    }

    pub fn with_base_env(mut self, env: EnvironmentOverride) -> Self {
        self.base_env = env;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.build_variables.insert(key.into(), value.into());
        self
    }

    /// The merged environment the pipeline sees.
    pub fn environment(&self) -> EnvironmentOverride {
        build_environment(&self.base_env, &self.build_variables)
    }
}

/// Result of one trigger execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Correlates log lines for this execution.
    pub run_id: String,

    /// Whether the pipeline was invoked.
    pub attempted: bool,

    /// Whether the orchestrator accepted the update.
    pub deployed: bool,

    /// The build outcome, unchanged by the deployment.
    pub final_status: BuildOutcome,

    /// Message of an ignored orchestrator failure.
    pub deployment_error: Option<String>,
}

impl RunResult {
    /// Whether the build step reports success to the host.
    ///
    /// Only an explicit `Success` counts; the deployment result is ignored.
    pub fn step_succeeded(&self) -> bool {
        self.final_status == BuildOutcome::Success
    }
}

/// Runs the deployment pipeline after a build when the outcome allows it.
pub struct DeploymentTrigger {
    pipeline: Arc<dyn DeploymentPipeline>,
}

impl DeploymentTrigger {
    pub fn new(pipeline: Arc<dyn DeploymentPipeline>) -> Self {
        Self { pipeline }
    }

    /// Execute the post-build step.
    ///
    /// Orchestrator failures are logged and dropped; they never change the
    /// returned status and are not retried.
    pub async fn execute(&self, config: &TriggerConfig, build: &BuildContext) -> RunResult {
        let run_id = Uuid::new_v4().to_string();
        DeploySpan::new(&run_id)
            .instrument(self.run(run_id.clone(), config, build))
            .await
    }

    async fn run(
        &self,
        run_id: String,
        config: &TriggerConfig,
        build: &BuildContext,
    ) -> RunResult {
        let mut result = RunResult {
            run_id,
            attempted: false,
            deployed: false,
            final_status: build.outcome,
            deployment_error: None,
        };

        if !should_deploy(build.outcome, config.run_on_failure()) {
            emit_trigger_skipped(build.outcome, config.run_on_failure());
            return result;
        }

        let env = build.environment();
        emit_trigger_started(config.target_url(), build.outcome, env.len());

        let start = Instant::now();
        result.attempted = true;
        match self.pipeline.deploy(config, &env, &build.workspace).await {
            Ok(receipt) => {
                emit_trigger_finished(
                    &receipt.app_id,
                    &receipt.descriptor_digest,
                    start.elapsed().as_millis() as u64,
                );
                result.deployed = true;
            }
            Err(e) => {
                emit_deploy_failed(config.target_url(), &e);
                result.deployment_error = Some(e.to_string());
            }
        }

        result
    }
}
