//! Error taxonomy for the deployment step.

/// Errors raised while assembling a [`TriggerConfig`](crate::TriggerConfig)
/// or the build context around it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("target URL must not be empty")]
    EmptyTargetUrl,

    #[error("invalid label '{0}': expected NAME=VALUE")]
    InvalidLabel(String),

    #[error("invalid build variable '{0}': expected KEY=VALUE")]
    InvalidVariable(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by a [`DeploymentPipeline`](crate::DeploymentPipeline).
///
/// These never fail the build step; the trigger logs and drops them.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("invalid deployment descriptor: {0}")]
    Descriptor(String),

    #[error("invalid orchestrator URL: {0}")]
    InvalidUrl(String),

    #[error("orchestrator rejected update ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("orchestrator unreachable: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for OrchestratorError {
    fn from(err: reqwest::Error) -> Self {
        OrchestratorError::Transport(err.to_string())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
