//! Build-variable substitution in descriptor strings.
//!
//! Supports `$NAME` and `${NAME}`. References to variables that are not
//! defined are left verbatim so that values meant for the container's own
//! shell survive rendering.

use marathon_deploy_core::EnvironmentOverride;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;

fn macro_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z0-9_.]+)\}|([A-Za-z0-9_]+))").expect("valid macro pattern")
    })
}

/// Replace `$NAME` / `${NAME}` references with values from `env`.
pub fn replace_macro(input: &str, env: &EnvironmentOverride) -> String {
    if !input.contains('$') {
        return input.to_string();
    }

    macro_pattern()
        .replace_all(input, |caps: &Captures<'_>| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match env.get(name) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Resolve references in every string of a JSON document, keys excluded.
pub fn resolve_value(value: &mut Value, env: &EnvironmentOverride) {
    match value {
        Value::String(s) => {
            let resolved = replace_macro(s, env);
            if resolved != *s {
                *s = resolved;
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_value(item, env);
            }
        }
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                resolve_value(v, env);
            }
        }
        _ => {}
    }
}
