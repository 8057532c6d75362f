//! Deployment step configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// A URI Marathon fetches into the task sandbox before launch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MarathonUri(pub String);

impl MarathonUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A `(name, value)` label attached to the Marathon app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarathonLabel {
    pub name: String,
    pub value: String,
}

impl MarathonLabel {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl FromStr for MarathonLabel {
    type Err = ConfigError;

    /// Parse `NAME=VALUE`. The value may itself contain `=`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok(MarathonLabel::new(name.trim(), value))
            }
            _ => Err(ConfigError::InvalidLabel(s.to_string())),
        }
    }
}

/// Immutable configuration of the post-build deployment step.
///
/// Constructed once through [`TriggerConfig::builder`]; the target URL is
/// guaranteed non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "TriggerConfigFile")]
pub struct TriggerConfig {
    target_url: String,
    app_id: Option<String>,
    docker_image: Option<String>,
    uris: Vec<MarathonUri>,
    labels: Vec<MarathonLabel>,
    run_on_failure: bool,
}

impl TriggerConfig {
    /// Start building a configuration for the given Marathon URL.
    pub fn builder(target_url: impl Into<String>) -> TriggerConfigBuilder {
        TriggerConfigBuilder {
            target_url: target_url.into(),
            app_id: None,
            docker_image: None,
            uris: Vec::new(),
            labels: Vec::new(),
            run_on_failure: false,
        }
    }

    /// Load a configuration from a JSON job file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Rebuild this configuration, keeping every field as a starting point.
    pub fn to_builder(&self) -> TriggerConfigBuilder {
        TriggerConfigBuilder {
            target_url: self.target_url.clone(),
            app_id: self.app_id.clone(),
            docker_image: self.docker_image.clone(),
            uris: self.uris.clone(),
            labels: self.labels.clone(),
            run_on_failure: self.run_on_failure,
        }
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn docker_image(&self) -> Option<&str> {
        self.docker_image.as_deref()
    }

    pub fn uris(&self) -> &[MarathonUri] {
        &self.uris
    }

    pub fn labels(&self) -> &[MarathonLabel] {
        &self.labels
    }

    /// Whether to deploy even when the build did not succeed.
    pub fn run_on_failure(&self) -> bool {
        self.run_on_failure
    }
}

/// Builder for [`TriggerConfig`].
#[derive(Debug, Clone)]
pub struct TriggerConfigBuilder {
    target_url: String,
    app_id: Option<String>,
    docker_image: Option<String>,
    uris: Vec<MarathonUri>,
    labels: Vec<MarathonLabel>,
    run_on_failure: bool,
}

impl TriggerConfigBuilder {
    pub fn target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = url.into();
        self
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn docker_image(mut self, image: impl Into<String>) -> Self {
        self.docker_image = Some(image.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uris.push(MarathonUri::new(uri));
        self
    }

    pub fn uris(mut self, uris: impl IntoIterator<Item = MarathonUri>) -> Self {
        self.uris.extend(uris);
        self
    }

    pub fn label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push(MarathonLabel::new(name, value));
        self
    }

    pub fn labels(mut self, labels: impl IntoIterator<Item = MarathonLabel>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn run_on_failure(mut self, run_on_failure: bool) -> Self {
        self.run_on_failure = run_on_failure;
        self
    }

    /// Finish the configuration.
    ///
    /// Blank optional strings are normalised to `None`.
    pub fn build(self) -> Result<TriggerConfig> {
        let target_url = self.target_url.trim().to_string();
        if target_url.is_empty() {
            return Err(ConfigError::EmptyTargetUrl);
        }

        Ok(TriggerConfig {
            target_url,
            app_id: non_blank(self.app_id),
            docker_image: non_blank(self.docker_image),
            uris: self.uris,
            labels: self.labels,
            run_on_failure: self.run_on_failure,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// On-disk shape of a job file; validated into [`TriggerConfig`].
#[derive(Debug, Deserialize)]
struct TriggerConfigFile {
    #[serde(alias = "url")]
    target_url: String,
    #[serde(default, alias = "appid")]
    app_id: Option<String>,
    #[serde(default, alias = "docker")]
    docker_image: Option<String>,
    #[serde(default)]
    uris: Vec<MarathonUri>,
    #[serde(default)]
    labels: Vec<MarathonLabel>,
    #[serde(default, alias = "run_failed")]
    run_on_failure: bool,
}

impl TryFrom<TriggerConfigFile> for TriggerConfig {
    type Error = ConfigError;

    fn try_from(file: TriggerConfigFile) -> Result<Self> {
        let mut builder = TriggerConfig::builder(file.target_url)
            .uris(file.uris)
            .labels(file.labels)
            .run_on_failure(file.run_on_failure);
        if let Some(app_id) = file.app_id {
            builder = builder.app_id(app_id);
        }
        if let Some(image) = file.docker_image {
            builder = builder.docker_image(image);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_url() {
        let err = TriggerConfig::builder("   ").build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyTargetUrl));
    }

    #[test]
    fn test_builder_keeps_order() {
        let config = TriggerConfig::builder("http://marathon.local:8080")
            .app_id("/web/frontend")
            .docker_image("registry.local/frontend:42")
            .uri("http://artifacts.local/a.tgz")
            .uri("http://artifacts.local/b.tgz")
            .label("owner", "web")
            .label("tier", "edge")
            .build()
            .unwrap();

        assert_eq!(config.target_url(), "http://marathon.local:8080");
        assert_eq!(config.app_id(), Some("/web/frontend"));
        assert_eq!(config.docker_image(), Some("registry.local/frontend:42"));
        assert_eq!(config.uris()[0].as_str(), "http://artifacts.local/a.tgz");
        assert_eq!(config.uris()[1].as_str(), "http://artifacts.local/b.tgz");
        assert_eq!(config.labels()[0], MarathonLabel::new("owner", "web"));
        assert_eq!(config.labels()[1].name, "tier");
        assert!(!config.run_on_failure());
    }

    #[test]
    fn test_blank_optionals_are_none() {
        let config = TriggerConfig::builder("http://marathon.local")
            .app_id("  ")
            .docker_image("")
            .build()
            .unwrap();
        assert!(config.app_id().is_none());
        assert!(config.docker_image().is_none());
    }

    #[test]
    fn test_parse_label() {
        let label: MarathonLabel = "HAPROXY_0_VHOST=web.example.com".parse().unwrap();
        assert_eq!(label.name, "HAPROXY_0_VHOST");
        assert_eq!(label.value, "web.example.com");

        let label: MarathonLabel = "query=a=b".parse().unwrap();
        assert_eq!(label.value, "a=b");

        assert!("novalue".parse::<MarathonLabel>().is_err());
        assert!("=value".parse::<MarathonLabel>().is_err());
    }

    #[test]
    fn test_deserialize_job_file() {
        let json = r#"{
            "url": "http://marathon.local:8080",
            "appid": "/svc",
            "uris": ["http://artifacts.local/svc.tgz"],
            "labels": [{"name": "owner", "value": "ops"}],
            "run_failed": true
        }"#;
        let config: TriggerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.app_id(), Some("/svc"));
        assert_eq!(config.uris().len(), 1);
        assert_eq!(config.labels()[0].value, "ops");
        assert!(config.run_on_failure());
        assert!(config.docker_image().is_none());
    }

    #[test]
    fn test_deserialize_rejects_empty_url() {
        let json = r#"{"target_url": ""}"#;
        assert!(serde_json::from_str::<TriggerConfig>(json).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(&path, r#"{"target_url": "http://marathon.local"}"#).unwrap();

        let config = TriggerConfig::from_file(&path).unwrap();
        assert_eq!(config.target_url(), "http://marathon.local");
        assert!(config.uris().is_empty());
    }

    #[test]
    fn test_to_builder_overrides() {
        let base = TriggerConfig::builder("http://a.local").app_id("/a").build().unwrap();
        let config = base.to_builder().target_url("http://b.local").build().unwrap();
        assert_eq!(config.target_url(), "http://b.local");
        assert_eq!(config.app_id(), Some("/a"));
    }
}
