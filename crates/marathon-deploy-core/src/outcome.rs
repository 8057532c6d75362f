//! Build outcome as reported by the build host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal (or not-yet-terminal) result of a CI build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Build completed without errors.
    Success,

    /// Build completed but reported test failures or warnings.
    Unstable,

    /// Build failed.
    Failure,

    /// Build was cancelled.
    Aborted,

    /// Build was never executed.
    NotBuilt,

    /// No result recorded yet; the build is still running its post-steps.
    #[default]
    Unknown,
}

impl BuildOutcome {
    /// Get the outcome name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuildOutcome::Success => "SUCCESS",
            BuildOutcome::Unstable => "UNSTABLE",
            BuildOutcome::Failure => "FAILURE",
            BuildOutcome::Aborted => "ABORTED",
            BuildOutcome::NotBuilt => "NOT_BUILT",
            BuildOutcome::Unknown => "UNKNOWN",
        }
    }

    /// Whether the build counts as succeeding so far.
    ///
    /// A build without a recorded result is still running the post-step,
    /// so it has not failed yet.
    pub fn succeeded_so_far(&self) -> bool {
        matches!(self, BuildOutcome::Success | BuildOutcome::Unknown)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildOutcome {
    type Err = std::convert::Infallible;

    /// Parse a host-reported result. Anything unrecognised is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let outcome = match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "success" => BuildOutcome::Success,
            "unstable" => BuildOutcome::Unstable,
            "failure" | "failed" => BuildOutcome::Failure,
            "aborted" => BuildOutcome::Aborted,
            "not_built" => BuildOutcome::NotBuilt,
            _ => BuildOutcome::Unknown,
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_names() {
        assert_eq!(BuildOutcome::Success.name(), "SUCCESS");
        assert_eq!(BuildOutcome::NotBuilt.name(), "NOT_BUILT");
        assert_eq!(BuildOutcome::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_parse_outcome() {
        assert_eq!("SUCCESS".parse::<BuildOutcome>().unwrap(), BuildOutcome::Success);
        assert_eq!("unstable".parse::<BuildOutcome>().unwrap(), BuildOutcome::Unstable);
        assert_eq!("Failure".parse::<BuildOutcome>().unwrap(), BuildOutcome::Failure);
        assert_eq!("not-built".parse::<BuildOutcome>().unwrap(), BuildOutcome::NotBuilt);
        assert_eq!("".parse::<BuildOutcome>().unwrap(), BuildOutcome::Unknown);
        assert_eq!("none".parse::<BuildOutcome>().unwrap(), BuildOutcome::Unknown);
    }

    #[test]
    fn test_succeeded_so_far() {
        assert!(BuildOutcome::Success.succeeded_so_far());
        assert!(BuildOutcome::Unknown.succeeded_so_far());
        assert!(!BuildOutcome::Unstable.succeeded_so_far());
        assert!(!BuildOutcome::Failure.succeeded_so_far());
        assert!(!BuildOutcome::Aborted.succeeded_so_far());
        assert!(!BuildOutcome::NotBuilt.succeeded_so_far());
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(BuildOutcome::default(), BuildOutcome::Unknown);
    }
}
