//! Marathon implementation of the deployment pipeline.
//!
//! read template -> apply overrides -> resolve variables -> write rendered
//! file -> `PUT /v2/apps/{id}`.

use crate::client::{MarathonClient, MarathonClientConfig};
use crate::descriptor::AppDescriptor;
use async_trait::async_trait;
use marathon_deploy_core::{
    DeploymentPipeline, DeploymentReceipt, EnvironmentOverride, OrchestratorError, TriggerConfig,
};
use std::path::Path;
use tracing::info;

/// Deploys a workspace's `marathon.json` to the configured Marathon.
#[derive(Debug, Clone, Default)]
pub struct MarathonPipeline {
    config: MarathonClientConfig,
}

impl MarathonPipeline {
    pub fn new(config: MarathonClientConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(MarathonClientConfig::from_env())
    }

    /// Render the descriptor for `config` without contacting Marathon.
    pub fn render(
        &self,
        config: &TriggerConfig,
        env: &EnvironmentOverride,
        workspace: &Path,
    ) -> Result<AppDescriptor, OrchestratorError> {
        let mut app = AppDescriptor::read(&workspace.join(&self.config.descriptor_file))?;
        app.apply_overrides(config, env);
        app.resolve(env);

        if app.id().is_none() {
            return Err(OrchestratorError::Descriptor(
                "no app id in descriptor or configuration".to_string(),
            ));
        }
        Ok(app)
    }
}

#[async_trait]
impl DeploymentPipeline for MarathonPipeline {
    async fn deploy(
        &self,
        config: &TriggerConfig,
        env: &EnvironmentOverride,
        workspace: &Path,
    ) -> Result<DeploymentReceipt, OrchestratorError> {
        let app = self.render(config, env, workspace)?;
        app.to_file(&workspace.join(&self.config.rendered_file))?;

        let client = MarathonClient::new(config.target_url(), self.config.clone())?;
        let response = client.update_app(&app).await?;

        let receipt = DeploymentReceipt {
            app_id: app.id().unwrap_or_default().to_string(),
            deployment_id: response.deployment_id,
            descriptor_digest: app.digest()?,
        };
        info!(
            app_id = %receipt.app_id,
            deployment_id = ?receipt.deployment_id,
            "Marathon deployment submitted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn workspace_with(descriptor: serde_json::Value) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("marathon.json"),
            serde_json::to_string(&descriptor).unwrap(),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_render_applies_config() {
        let dir = workspace_with(json!({ "id": "/template", "instances": 1 }));
        let config = TriggerConfig::builder("http://marathon.local")
            .app_id("/override")
            .build()
            .unwrap();

        let app = MarathonPipeline::default()
            .render(&config, &EnvironmentOverride::new(), dir.path())
            .unwrap();

        assert_eq!(app.id(), Some("/override"));
    }

    #[test]
    fn test_render_requires_app_id() {
        let dir = workspace_with(json!({ "instances": 1 }));
        let config = TriggerConfig::builder("http://marathon.local").build().unwrap();

        let err = MarathonPipeline::default()
            .render(&config, &EnvironmentOverride::new(), dir.path())
            .unwrap_err();

        assert!(err.to_string().contains("no app id"));
    }

    #[test]
    fn test_custom_descriptor_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("deploy")).unwrap();
        std::fs::write(dir.path().join("deploy/app.json"), r#"{"id": "/custom"}"#).unwrap();
        let config = TriggerConfig::builder("http://marathon.local").build().unwrap();

        let pipeline = MarathonPipeline::new(
            MarathonClientConfig::default().with_descriptor_file("deploy/app.json"),
        );
        let app = pipeline
            .render(&config, &EnvironmentOverride::new(), dir.path())
            .unwrap();

        assert_eq!(app.id(), Some("/custom"));
    }

    #[tokio::test]
    async fn test_deploy_unreachable_marathon_fails_after_rendering() {
        let dir = workspace_with(json!({ "id": "/svc" }));
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = TriggerConfig::builder(format!("http://{addr}"))
            .build()
            .unwrap();
        let err = MarathonPipeline::default()
            .deploy(&config, &EnvironmentOverride::new(), dir.path())
            .await
            .unwrap_err();

        // A proxy from the environment may answer instead of refusing.
        assert!(matches!(
            err,
            OrchestratorError::Transport(_) | OrchestratorError::Rejected { .. }
        ));
        assert!(dir.path().join("marathon-rendered.json").exists());
    }
}
