use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::checker::Checker;
use super::types::{DeliveryReport, MessageOutcome, ProbeOutcome, SkipReason};
use crate::queue::Delivery;
use crate::registry::Registry;
use crate::validation::{canonicalize_for_probe, validate_url};

/// Probes delivered URLs and records their liveness in the registry
pub struct Prober {
    registry: Arc<dyn Registry>,
    checker: Arc<dyn Checker>,
}

impl Prober {
    pub fn new(registry: Arc<dyn Registry>, checker: Arc<dyn Checker>) -> Self {
        Self { registry, checker }
    }

    /// Process every message of a delivery independently.
    ///
    /// A message that fails validation or cannot be recorded is skipped
    /// without affecting its siblings.
    pub async fn handle_delivery(&self, delivery: Delivery) -> DeliveryReport {
        if delivery.is_empty() {
            info!("No websites to check");
            return DeliveryReport::default();
        }

        let outcomes =
            join_all(delivery.messages.iter().map(|message| self.process(&message.body))).await;
        let report = DeliveryReport { outcomes };

        info!(
            messages = delivery.len(),
            recorded = report.recorded(),
            skipped = report.skipped(),
            "Website status updated"
        );
        report
    }

    /// Validate, probe and record one registered URL
    pub async fn process(&self, original_url: &str) -> MessageOutcome {
        if let Err(e) = validate_url(original_url) {
            warn!(url = %original_url, error = %e, "Skipping invalid URL");
            return MessageOutcome::Skipped {
                url: original_url.to_string(),
                reason: SkipReason::InvalidUrl(e),
            };
        }

        let outcome = self.probe(&canonicalize_for_probe(original_url)).await;
        let checked_at = Utc::now();

        // The registry key stays the registered form, not the probe target
        match self.registry.record_status(original_url, outcome.status, checked_at).await {
            Ok(()) => {
                debug!(url = %original_url, status = %outcome.status, "Recorded website status");
                MessageOutcome::Recorded {
                    url: original_url.to_string(),
                    status: outcome.status,
                    checked_at,
                }
            }
            Err(e) => {
                error!(url = %original_url, error = %e, "Failed to record website status");
                MessageOutcome::Skipped {
                    url: original_url.to_string(),
                    reason: SkipReason::StoreFailed(e.to_string()),
                }
            }
        }
    }

    /// One bounded request, no retries. Transport errors classify as `DOWN`.
    pub async fn probe(&self, target: &str) -> ProbeOutcome {
        let outcome = match self.checker.check(target).await {
            Ok((latency_ms, status_code)) => {
                ProbeOutcome::responded(target.to_string(), status_code, latency_ms)
            }
            Err(e) => ProbeOutcome::unreachable(target.to_string(), e.to_string()),
        };

        debug!(
            target = %outcome.target,
            status = %outcome.status,
            status_code = ?outcome.status_code,
            latency_ms = ?outcome.latency_ms,
            error = ?outcome.error,
            "Probe finished"
        );
        outcome
    }
}
