//! Endpoint validation for configured URLs.
//!
//! Validation is tiered: a URL that does not parse is an error, a URL that
//! parses but does not answer with a 2xx status is only a warning. The
//! target environment may simply not be up yet when the job is configured.

use crate::obs::emit_probe_completed;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Message for URLs that fail the syntax check.
pub const INVALID_URL_MESSAGE: &str = "Not a valid URL";

/// Message for URLs that parse but fail the reachability probe.
pub const UNREACHABLE_URL_MESSAGE: &str = "URL did not return a 200 response.";

/// Default probe timeout, in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

/// Outcome of validating one field value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum ValidationVerdict {
    Ok,
    Warning(String),
    Error(String),
}

impl ValidationVerdict {
    pub fn warning(message: impl Into<String>) -> Self {
        ValidationVerdict::Warning(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        ValidationVerdict::Error(message.into())
    }

    /// Whether the value may be accepted (`Ok` or `Warning`).
    pub fn is_acceptable(&self) -> bool {
        !matches!(self, ValidationVerdict::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationVerdict::Ok => None,
            ValidationVerdict::Warning(m) | ValidationVerdict::Error(m) => Some(m),
        }
    }
}

impl fmt::Display for ValidationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationVerdict::Ok => f.write_str("OK"),
            ValidationVerdict::Warning(m) => write!(f, "WARNING: {m}"),
            ValidationVerdict::Error(m) => write!(f, "ERROR: {m}"),
        }
    }
}

/// Probe settings.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Bound on connecting and on the whole HEAD request.
    pub probe_timeout: Duration,

    /// Route probes through the proxy configured in the environment.
    pub use_system_proxy: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            use_system_proxy: true,
        }
    }
}

impl ValidatorConfig {
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn without_proxy(mut self) -> Self {
        self.use_system_proxy = false;
        self
    }
}

/// Validates URLs syntactically and with a single HEAD probe.
///
/// Stateless: each call opens and drops its own connection, so concurrent
/// validations do not interact.
#[derive(Debug, Clone, Default)]
pub struct EndpointValidator {
    config: ValidatorConfig,
}

impl EndpointValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a candidate URL.
    ///
    /// `None`, empty and unparseable values are errors. Anything that parses
    /// is probed once; a non-2xx status, connect failure or timeout yields a
    /// warning, never an error.
    pub async fn validate_url(&self, candidate: Option<&str>) -> ValidationVerdict {
        let Some(url) = parse_url(candidate) else {
            return ValidationVerdict::error(INVALID_URL_MESSAGE);
        };

        if self.returns_2xx(&url).await {
            ValidationVerdict::Ok
        } else {
            ValidationVerdict::warning(UNREACHABLE_URL_MESSAGE)
        }
    }

    /// Issue one HEAD request and report whether it answered with 2xx.
    async fn returns_2xx(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            debug!(url = %url, "Skipping probe for non-HTTP scheme");
            emit_probe_completed(url.as_str(), None, false);
            return false;
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.config.probe_timeout)
            .timeout(self.config.probe_timeout)
            .pool_max_idle_per_host(0);
        if !self.config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = match builder.build() {
            Ok(client) => client,
            Err(e) => {
                debug!(error = %e, "Failed to build probe client");
                return false;
            }
        };

        match client.head(url.clone()).send().await {
            Ok(response) => {
                let status = response.status();
                let reachable = status.is_success();
                emit_probe_completed(url.as_str(), Some(status.as_u16()), reachable);
                reachable
            }
            Err(e) => {
                debug!(url = %url, error = %e, "Probe failed");
                emit_probe_completed(url.as_str(), None, false);
                false
            }
        }
    }
}

/// Structural URL check; no network access.
///
/// Requires an absolute URL with a host.
pub fn parse_url(candidate: Option<&str>) -> Option<Url> {
    let candidate = candidate?.trim();
    if candidate.is_empty() {
        return None;
    }
    Url::parse(candidate).ok().filter(|url| url.has_host())
}

/// Syntax-only validation, for surfaces that must not touch the network.
pub fn check_url_syntax(candidate: Option<&str>) -> ValidationVerdict {
    match parse_url(candidate) {
        Some(_) => ValidationVerdict::Ok,
        None => ValidationVerdict::error(INVALID_URL_MESSAGE),
    }
}
