//! Integration tests for the deployment trigger with a recording pipeline.

use async_trait::async_trait;
use marathon_deploy_core::{
    BuildContext, BuildOutcome, DeploymentPipeline, DeploymentReceipt, DeploymentTrigger,
    EnvironmentOverride, MarathonRecorder, OrchestratorError, PostBuildPublisher, TriggerConfig,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One recorded pipeline invocation.
#[derive(Debug, Clone)]
struct Call {
    target_url: String,
    env: EnvironmentOverride,
    workspace: PathBuf,
}

/// Test double recording every call and answering with a fixed result.
struct RecordingPipeline {
    calls: Mutex<Vec<Call>>,
    reject: bool,
}

impl RecordingPipeline {
    fn accepting() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject: false,
        })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reject: true,
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeploymentPipeline for RecordingPipeline {
    async fn deploy(
        &self,
        config: &TriggerConfig,
        env: &EnvironmentOverride,
        workspace: &Path,
    ) -> Result<DeploymentReceipt, OrchestratorError> {
        self.calls.lock().unwrap().push(Call {
            target_url: config.target_url().to_string(),
            env: env.clone(),
            workspace: workspace.to_path_buf(),
        });

        if self.reject {
            return Err(OrchestratorError::Rejected {
                status: 422,
                message: "Object is not valid".to_string(),
            });
        }

        Ok(DeploymentReceipt {
            app_id: config.app_id().unwrap_or("/app").to_string(),
            deployment_id: Some("dep-1".to_string()),
            descriptor_digest: "0".repeat(64),
        })
    }
}

fn config(run_on_failure: bool) -> TriggerConfig {
    TriggerConfig::builder("http://marathon.local:8080")
        .app_id("/web")
        .run_on_failure(run_on_failure)
        .build()
        .expect("config")
}

fn build(outcome: BuildOutcome) -> BuildContext {
    let base: EnvironmentOverride = [
        ("HOME".to_string(), "/home/ci".to_string()),
        ("BUILD_NUMBER".to_string(), "1".to_string()),
    ]
    .into_iter()
    .collect();

    BuildContext::new(outcome, "/var/ci/workspace/web")
        .with_base_env(base)
        .with_variable("BUILD_NUMBER", "42")
        .with_variable("IMAGE_TAG", "v42")
}

/// Test: failed build without opt-in never reaches the pipeline
#[tokio::test]
async fn test_failed_build_is_not_deployed() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(false), &build(BuildOutcome::Failure)).await;

    assert!(pipeline.calls().is_empty(), "Pipeline must not be invoked");
    assert!(!result.attempted);
    assert!(!result.deployed);
    assert_eq!(result.final_status, BuildOutcome::Failure);
    assert!(!result.step_succeeded());
}

/// Test: unstable build without opt-in is skipped too
#[tokio::test]
async fn test_unstable_build_is_not_deployed() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(false), &build(BuildOutcome::Unstable)).await;

    assert!(pipeline.calls().is_empty());
    assert_eq!(result.final_status, BuildOutcome::Unstable);
}

/// Test: successful build deploys exactly once with the merged environment
#[tokio::test]
async fn test_successful_build_deploys_once_with_merged_env() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(false), &build(BuildOutcome::Success)).await;

    let calls = pipeline.calls();
    assert_eq!(calls.len(), 1, "Pipeline should be invoked exactly once");
    let call = &calls[0];
    assert_eq!(call.target_url, "http://marathon.local:8080");
    assert_eq!(call.workspace, PathBuf::from("/var/ci/workspace/web"));
    assert_eq!(call.env.get("BUILD_NUMBER"), Some("42"), "Build variable wins");
    assert_eq!(call.env.get("HOME"), Some("/home/ci"));
    assert_eq!(call.env.get("IMAGE_TAG"), Some("v42"));

    assert!(result.attempted);
    assert!(result.deployed);
    assert!(result.deployment_error.is_none());
    assert!(result.step_succeeded());
}

/// Test: build without a result yet is treated as succeeding so far
#[tokio::test]
async fn test_unknown_outcome_deploys_but_step_not_successful() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(false), &build(BuildOutcome::Unknown)).await;

    assert_eq!(pipeline.calls().len(), 1);
    assert!(result.deployed);
    assert_eq!(result.final_status, BuildOutcome::Unknown);
    assert!(!result.step_succeeded());
}

/// Test: run_on_failure deploys a failed build and still reports failure
#[tokio::test]
async fn test_run_on_failure_deploys_failed_build() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(true), &build(BuildOutcome::Failure)).await;

    assert_eq!(pipeline.calls().len(), 1);
    assert!(result.deployed);
    assert_eq!(result.final_status, BuildOutcome::Failure);
    assert!(!result.step_succeeded());
}

/// Test: orchestrator rejection is swallowed and the build status survives
#[tokio::test]
async fn test_orchestrator_error_is_swallowed() {
    let pipeline = RecordingPipeline::rejecting();
    let trigger = DeploymentTrigger::new(pipeline.clone());

    let result = trigger.execute(&config(false), &build(BuildOutcome::Success)).await;

    assert_eq!(pipeline.calls().len(), 1, "No retry after rejection");
    assert!(result.attempted);
    assert!(!result.deployed);
    assert_eq!(result.final_status, BuildOutcome::Success);
    assert!(result.step_succeeded(), "Deployment failure must not fail the step");
    let message = result.deployment_error.expect("error message retained");
    assert!(message.contains("422"));
}

/// Test: each execution gets its own run id
#[tokio::test]
async fn test_run_ids_are_unique() {
    let pipeline = RecordingPipeline::accepting();
    let trigger = DeploymentTrigger::new(pipeline);

    let a = trigger.execute(&config(false), &build(BuildOutcome::Success)).await;
    let b = trigger.execute(&config(false), &build(BuildOutcome::Success)).await;

    assert_ne!(a.run_id, b.run_id);
}

/// Test: recorder dispatches through the publisher interface
#[tokio::test]
async fn test_recorder_as_publisher() {
    let pipeline = RecordingPipeline::accepting();
    let publisher: Box<dyn PostBuildPublisher> =
        Box::new(MarathonRecorder::new(config(false), pipeline.clone()));

    let result = publisher.trigger(&build(BuildOutcome::Success)).await;

    assert_eq!(publisher.display_name(), "Marathon Deployments");
    assert_eq!(pipeline.calls().len(), 1);
    assert!(result.step_succeeded());
}
