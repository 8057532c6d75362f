//! Host-facing extension surface.
//!
//! A build host registers a [`PostBuildPublisher`] to run it after a build
//! and to validate its configuration fields as they are edited.

use crate::config::TriggerConfig;
use crate::pipeline::DeploymentPipeline;
use crate::trigger::{BuildContext, DeploymentTrigger, RunResult};
use crate::validate::{EndpointValidator, ValidationVerdict};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration fields exposed to the host's form validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    /// Marathon base URL.
    Url,
    AppId,
    Docker,
    /// One entry of the URI list.
    Uri,
    LabelName,
    LabelValue,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Url => "url",
            FormField::AppId => "app_id",
            FormField::Docker => "docker",
            FormField::Uri => "uri",
            FormField::LabelName => "label_name",
            FormField::LabelValue => "label_value",
        }
    }

    /// Whether values of this field are checked as URLs.
    pub fn is_url(&self) -> bool {
        matches!(self, FormField::Url | FormField::Uri)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "url" => Ok(FormField::Url),
            "app_id" | "appid" => Ok(FormField::AppId),
            "docker" => Ok(FormField::Docker),
            "uri" => Ok(FormField::Uri),
            "label_name" => Ok(FormField::LabelName),
            "label_value" => Ok(FormField::LabelValue),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// A step that runs after a build and validates its own form fields.
#[async_trait]
pub trait PostBuildPublisher: Send + Sync {
    /// Name shown by the host.
    fn display_name(&self) -> &str;

    /// Run the step for a completed build.
    async fn trigger(&self, build: &BuildContext) -> RunResult;

    /// Validate one field value.
    async fn validate_field(&self, field: FormField, value: Option<&str>) -> ValidationVerdict;
}

/// Per-field validation rules for the Marathon step.
///
/// Needs no job configuration, so hosts can validate a form before a
/// publisher exists. URL fields are probed; every other field is accepted.
#[derive(Debug, Clone, Default)]
pub struct MarathonFieldValidator {
    validator: EndpointValidator,
}

impl MarathonFieldValidator {
    pub fn new(validator: EndpointValidator) -> Self {
        Self { validator }
    }

    pub async fn validate_field(&self, field: FormField, value: Option<&str>) -> ValidationVerdict {
        if field.is_url() {
            self.validator.validate_url(value).await
        } else {
            ValidationVerdict::Ok
        }
    }
}

/// Publisher that deploys the build to Marathon.
pub struct MarathonRecorder {
    config: TriggerConfig,
    trigger: DeploymentTrigger,
    fields: MarathonFieldValidator,
}

impl MarathonRecorder {
    pub const DISPLAY_NAME: &'static str = "Marathon Deployments";

    pub fn new(config: TriggerConfig, pipeline: Arc<dyn DeploymentPipeline>) -> Self {
        Self {
            config,
            trigger: DeploymentTrigger::new(pipeline),
            fields: MarathonFieldValidator::default(),
        }
    }

    pub fn with_validator(mut self, validator: EndpointValidator) -> Self {
        self.fields = MarathonFieldValidator::new(validator);
        self
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }
}

#[async_trait]
impl PostBuildPublisher for MarathonRecorder {
    fn display_name(&self) -> &str {
        Self::DISPLAY_NAME
    }

    async fn trigger(&self, build: &BuildContext) -> RunResult {
        self.trigger.execute(&self.config, build).await
    }

    async fn validate_field(&self, field: FormField, value: Option<&str>) -> ValidationVerdict {
        self.fields.validate_field(field, value).await
    }
}
