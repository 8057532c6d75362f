//! Build environment passed to the deployment pipeline.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variables visible to descriptor templating for one build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct EnvironmentOverride(BTreeMap<String, String>);

impl EnvironmentOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    ///
    /// Variables whose name or value is not valid unicode are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self(vars)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Overlay `vars`, replacing existing values on collision.
    pub fn override_all<'a, I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (k, v) in vars {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl FromIterator<(String, String)> for EnvironmentOverride {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, String>> for EnvironmentOverride {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Merge build-specific variables over the ambient environment.
///
/// No validation of names or values; build variables win on collision.
pub fn build_environment(
    base: &EnvironmentOverride,
    build_variables: &BTreeMap<String, String>,
) -> EnvironmentOverride {
    let mut env = base.clone();
    env.override_all(build_variables);
    env
}

/// Parse a `KEY=VALUE` build variable argument.
pub fn parse_variable(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ConfigError::InvalidVariable(arg.to_string())),
    }
}
