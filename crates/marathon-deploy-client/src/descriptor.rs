//! Marathon app descriptor handling.
//!
//! The descriptor is kept as raw JSON so fields this step does not touch
//! pass through to Marathon unchanged.

use crate::template::{replace_macro, resolve_value};
use marathon_deploy_core::{EnvironmentOverride, OrchestratorError, TriggerConfig};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

type Result<T> = std::result::Result<T, OrchestratorError>;

/// A Marathon app definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AppDescriptor {
    app: Map<String, Value>,
}

impl AppDescriptor {
    /// Wrap a JSON document; it must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(app) => Ok(Self { app }),
            other => Err(OrchestratorError::Descriptor(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            ))),
        }
    }

    /// Read the descriptor template from a file.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OrchestratorError::Descriptor(format!(
                "descriptor not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&content)?)
    }

    /// Application id, if set.
    pub fn id(&self) -> Option<&str> {
        self.app.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.app.clone())
    }

    /// Apply the step's overrides, resolving build variables in each.
    ///
    /// - app id replaces `id`
    /// - docker image replaces `container.docker.image`
    /// - URIs are appended to `uris`
    /// - labels are inserted into `labels`
    pub fn apply_overrides(&mut self, config: &TriggerConfig, env: &EnvironmentOverride) {
        if let Some(app_id) = config.app_id() {
            self.app
                .insert("id".to_string(), Value::String(replace_macro(app_id, env)));
        }

        if let Some(image) = config.docker_image() {
            self.set_docker_image(replace_macro(image, env));
        }

        if !config.uris().is_empty() {
            let uris = array_entry(&mut self.app, "uris");
            for uri in config.uris() {
                uris.push(Value::String(replace_macro(uri.as_str(), env)));
            }
        }

        if !config.labels().is_empty() {
            let labels = object_entry(&mut self.app, "labels");
            for label in config.labels() {
                labels.insert(
                    replace_macro(&label.name, env),
                    Value::String(replace_macro(&label.value, env)),
                );
            }
        }
    }

    /// Resolve build variables in every string value of the descriptor.
    pub fn resolve(&mut self, env: &EnvironmentOverride) {
        for (_, value) in self.app.iter_mut() {
            resolve_value(value, env);
        }
    }

    fn set_docker_image(&mut self, image: String) {
        let container = object_entry(&mut self.app, "container");
        if !container.contains_key("type") {
            container.insert("type".to_string(), json!("DOCKER"));
        }
        let docker = object_entry(container, "docker");
        docker.insert("image".to_string(), Value::String(image));
    }

    /// Serialized form sent to Marathon.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.app)?)
    }

    /// SHA-256 hex digest of [`Self::to_bytes`].
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.to_bytes()?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Write the rendered descriptor as pretty JSON.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.app)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Wrote rendered descriptor");
        Ok(())
    }
}

/// Get `map[key]` as an object, replacing any non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    match entry {
        Value::Object(inner) => inner,
        _ => unreachable!("entry was just made an object"),
    }
}

/// Get `map[key]` as an array, replacing any non-array value.
fn array_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let entry = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(Vec::new());
    }
    match entry {
        Value::Array(inner) => inner,
        _ => unreachable!("entry was just made an array"),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
