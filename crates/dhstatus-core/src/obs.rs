//! Structured observability hooks for status and watch events.
//!
//! Events are emitted at `info!` (failures at `warn!`) with an `event` field,
//! so `--log-json` output can be filtered by event name.

use tracing::{info, warn};

use crate::domain::{CheckRunPollState, RegistryVerdict, SourceError};
use crate::freshness::Freshness;
use crate::watch::WatchOutcome;

/// Span tagging everything logged while probing sources for `tag`.
pub fn tag_span(tag: &str) -> tracing::Span {
    tracing::info_span!("dhstatus", tag = %tag)
}

/// Emit event: freshness evaluated for the running pod.
pub fn emit_status_evaluated(pod: &str, pr_number: u64, freshness: &Freshness) {
    info!(
        event = "status.evaluated",
        pod = %pod,
        pr_number = pr_number,
        verdict = %freshness.verdict,
    );
}

/// Emit event: registry probe finished.
pub fn emit_registry_checked(image: &str, verdict: &RegistryVerdict) {
    match &verdict.error {
        Some(error) => warn!(event = "registry.checked", image = %image, error = %error),
        None => info!(
            event = "registry.checked",
            image = %image,
            tag_exists = verdict.tag_exists,
            digest_match = verdict.digest_match,
            image_exists = verdict.image_exists,
        ),
    }
}

/// Emit event: one check-run poll answered.
pub fn emit_polled(check: &str, state: &CheckRunPollState) {
    info!(
        event = "watch.polled",
        check = %check,
        status = %state.status,
        conclusion = %state.conclusion,
        not_modified = state.not_modified,
    );
}

/// Emit event: a poll failed and will be retried (warning level).
pub fn emit_poll_failed(check: &str, error: &SourceError) {
    warn!(event = "watch.poll_failed", check = %check, error = %error);
}

/// Emit event: watch reached a terminal state.
pub fn emit_watch_finished(check: &str, outcome: &WatchOutcome) {
    info!(
        event = "watch.finished",
        check = %check,
        outcome = outcome.as_str(),
        exit_code = outcome.exit_code(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_span_create() {
        let _span = tag_span("pr42-fe").entered();
    }

    #[test]
    fn test_emitters_without_subscriber() {
        emit_poll_failed("Build FE", &SourceError::Transport("reset".to_string()));
        emit_watch_finished("Build FE", &WatchOutcome::TimedOut);
        emit_registry_checked("r/a:b", &RegistryVerdict::tag_removed(true));
    }
}
