//! Marathon REST API client
//!
//! Only the create-or-update call the deployment step needs:
//! `PUT /v2/apps/{id}`.

use crate::descriptor::AppDescriptor;
use marathon_deploy_core::OrchestratorError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

type Result<T> = std::result::Result<T, OrchestratorError>;

/// Default descriptor template, relative to the build workspace.
pub const DEFAULT_DESCRIPTOR_FILE: &str = "marathon.json";

/// Default output file for the rendered descriptor.
pub const DEFAULT_RENDERED_FILE: &str = "marathon-rendered.json";

/// Marathon client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarathonClientConfig {
    /// Bound on each API request
    pub request_timeout: Duration,
    /// DC/OS authentication token (optional for open clusters)
    pub token: Option<String>,
    /// Descriptor template file name inside the workspace
    pub descriptor_file: String,
    /// Rendered descriptor file name inside the workspace
    pub rendered_file: String,
    /// Override running deployments of the same app
    pub force: bool,
}

impl Default for MarathonClientConfig {
    fn default() -> Self {
        MarathonClientConfig {
            request_timeout: Duration::from_secs(30),
            token: None,
            descriptor_file: DEFAULT_DESCRIPTOR_FILE.to_string(),
            rendered_file: DEFAULT_RENDERED_FILE.to_string(),
            force: true,
        }
    }
}

impl MarathonClientConfig {
    /// Defaults overlaid with `MARATHON_TOKEN` and `MARATHON_DESCRIPTOR`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        MarathonClientConfig {
            token: std::env::var("MARATHON_TOKEN").ok().filter(|t| !t.is_empty()),
            descriptor_file: std::env::var("MARATHON_DESCRIPTOR")
                .ok()
                .filter(|f| !f.is_empty())
                .unwrap_or(defaults.descriptor_file),
            ..defaults
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_descriptor_file(mut self, file: &str) -> Self {
        self.descriptor_file = file.to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Marathon's answer to an accepted update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    #[serde(default)]
    pub deployment_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Marathon client bound to one cluster
pub struct MarathonClient {
    base_url: Url,
    config: MarathonClientConfig,
    http_client: reqwest::Client,
}

impl MarathonClient {
    /// Create a client for the Marathon instance at `base_url`
    pub fn new(base_url: &str, config: MarathonClientConfig) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| OrchestratorError::InvalidUrl(format!("{base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(OrchestratorError::InvalidUrl(format!(
                "{base_url}: unsupported scheme"
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("marathon-deploy/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(MarathonClient {
            base_url,
            config,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the app resource for `app_id`.
    pub fn app_url(&self, app_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                OrchestratorError::InvalidUrl(format!("{}: cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty().extend(["v2", "apps"]);
            segments.extend(app_id.split('/').filter(|s| !s.is_empty()));
        }
        if self.config.force {
            url.query_pairs_mut().append_pair("force", "true");
        }
        Ok(url)
    }

    /// Create or update the app.
    pub async fn update_app(&self, app: &AppDescriptor) -> Result<UpdateResponse> {
        let app_id = app
            .id()
            .ok_or_else(|| OrchestratorError::Descriptor("app descriptor has no id".to_string()))?;
        let url = self.app_url(app_id)?;
        info!(app_id = %app_id, url = %url, "Updating Marathon app");

        let mut request = self
            .http_client
            .put(url)
            .header(CONTENT_TYPE, "application/json")
            .body(app.to_bytes()?);
        if let Some(token) = &self.config.token {
            request = request.header(AUTHORIZATION, format!("token={token}"));
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(OrchestratorError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Marathon accepted update");
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}
