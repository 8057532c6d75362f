//! marathon-deploy core - post-build deployment step
//!
//! Provides:
//! - The deployment trigger: when a finished build is deployed and with
//!   which environment
//! - Tiered URL validation with a bounded reachability probe
//! - The host-facing publisher interface tying both together

pub mod config;
pub mod env;
pub mod error;
pub mod obs;
pub mod outcome;
pub mod pipeline;
pub mod publisher;
pub mod telemetry;
pub mod trigger;
pub mod validate;

// Re-export key types
pub use config::{MarathonLabel, MarathonUri, TriggerConfig, TriggerConfigBuilder};
pub use env::{build_environment, parse_variable, EnvironmentOverride};
pub use error::{ConfigError, OrchestratorError};
pub use outcome::BuildOutcome;
pub use pipeline::{DeploymentPipeline, DeploymentReceipt};
pub use publisher::{FormField, MarathonFieldValidator, MarathonRecorder, PostBuildPublisher};
pub use telemetry::init_tracing;
pub use trigger::{should_deploy, BuildContext, DeploymentTrigger, RunResult};
pub use validate::{
    check_url_syntax, EndpointValidator, ValidationVerdict, ValidatorConfig,
    INVALID_URL_MESSAGE, UNREACHABLE_URL_MESSAGE,
};
