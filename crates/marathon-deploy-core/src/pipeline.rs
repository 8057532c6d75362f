//! Deployment pipeline seam.
//!
//! The trigger only decides whether and with which environment a deployment
//! runs. Rendering the descriptor and talking to the orchestrator happen
//! behind [`DeploymentPipeline`].

use crate::config::TriggerConfig;
use crate::env::EnvironmentOverride;
use crate::error::OrchestratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the orchestrator accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentReceipt {
    /// Application id the descriptor was pushed under.
    pub app_id: String,

    /// Orchestrator deployment id, when the API returns one.
    pub deployment_id: Option<String>,

    /// SHA-256 of the rendered descriptor.
    pub descriptor_digest: String,
}

/// Renders a deployment descriptor and pushes it to the orchestrator.
#[async_trait]
pub trait DeploymentPipeline: Send + Sync {
    /// Create or update the application described by `config`.
    ///
    /// `env` resolves templated fields; `workspace` is the build workspace
    /// holding the descriptor template.
    async fn deploy(
        &self,
        config: &TriggerConfig,
        env: &EnvironmentOverride,
        workspace: &Path,
    ) -> Result<DeploymentReceipt, OrchestratorError>;
}
