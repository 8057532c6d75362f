//! Structured log events for the deployment step.
//!
//! - Run-scoped tracing span via the `DeploySpan` RAII guard
//! - Emission functions for trigger decisions, deployment failures and probes
//!
//! Events are emitted at `info!` (failures at `warn!`) and can be filtered
//! with `RUST_LOG`.

use crate::outcome::BuildOutcome;
use std::future::Future;
use tracing::instrument::{Instrument, Instrumented};
use tracing::{info, warn};

/// Span tagged with the trigger's run id.
///
/// The span is only entered while the instrumented future is polled, so it
/// never leaks onto other tasks across an `.await`.
///
/// # Example
///
/// ```ignore
/// DeploySpan::new("5b0f...").instrument(async {
///     // every event in here is associated with run_id = "5b0f..."
/// }).await;
/// ```
pub struct DeploySpan {
    span: tracing::Span,
}

impl DeploySpan {
    pub fn new(run_id: &str) -> Self {
        Self {
            span: tracing::info_span!("marathon.deploy", run_id = %run_id),
        }
    }

    /// Run `fut` inside this span.
    pub fn instrument<F: Future>(self, fut: F) -> Instrumented<F> {
        fut.instrument(self.span)
    }
}

/// Emit event: trigger decided not to deploy.
pub fn emit_trigger_skipped(outcome: BuildOutcome, run_on_failure: bool) {
    info!(
        event = "trigger.skipped",
        outcome = %outcome,
        run_on_failure = run_on_failure,
    );
}

/// Emit event: deployment pipeline invoked.
pub fn emit_trigger_started(target_url: &str, outcome: BuildOutcome, env_vars: usize) {
    info!(
        event = "trigger.started",
        target_url = %target_url,
        outcome = %outcome,
        env_vars = env_vars,
    );
}

/// Emit event: deployment accepted by the orchestrator.
pub fn emit_trigger_finished(app_id: &str, descriptor_digest: &str, duration_ms: u64) {
    info!(
        event = "trigger.finished",
        app_id = %app_id,
        descriptor_digest = %descriptor_digest,
        duration_ms = duration_ms,
    );
}

/// Emit event: orchestrator failure that is being ignored.
pub fn emit_deploy_failed(target_url: &str, error: &dyn std::fmt::Display) {
    warn!(event = "deploy.failed", target_url = %target_url, error = %error);
}

/// Emit event: reachability probe finished.
pub fn emit_probe_completed(url: &str, status: Option<u16>, reachable: bool) {
    info!(
        event = "probe.completed",
        url = %url,
        status = status,
        reachable = reachable,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>(_: T) {}

    #[test]
    fn test_deploy_span_future_is_send() {
        assert_send(DeploySpan::new("test-run-id").instrument(async {
            emit_trigger_skipped(BuildOutcome::Failure, false);
        }));
    }

    #[tokio::test]
    async fn test_deploy_span_wraps_events() {
        let value = DeploySpan::new("test-run-id")
            .instrument(async {
                emit_probe_completed("http://localhost", Some(404), false);
                7
            })
            .await;
        assert_eq!(value, 7);
    }
}
