//! Event polling state machine
//!
//! Registers progress events for a session until the remote reports the
//! session eligible, then redeems. Every registration reply is classified
//! into a `PollOutcome`, and the outcome alone selects the next wait:
//!
//! | outcome          | next step                                   |
//! |------------------|---------------------------------------------|
//! | `RateLimited`    | wait `rate_limited`, register again         |
//! | `Pending`        | wait `pending`, register again              |
//! | `TransientError` | wait `transient`, register again            |
//! | `Eligible`       | redeem; done on success, else wait `transient` |
//! | `SessionRejected`| stop, the worker re-authenticates           |
//!
//! Polling is unbounded unless `RetryPolicy::max_poll_attempts` is set; the
//! cooldowns are the only backpressure.

use std::sync::Arc;

use promo_client::PromoApi;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::policy::{RetryPolicy, cooldown};
use crate::redeemer::CodeRedeemer;
use crate::session::Session;

/// Classification of one registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Remote asked the client to slow down (400/429)
    RateLimited,
    /// Enough progress registered; a code can be requested
    Eligible,
    /// Event accepted, no code yet
    Pending,
    /// Transport failure, timeout, server error or unreadable reply
    TransientError,
    /// Bearer token refused (401/403); the session is dead
    SessionRejected,
}

impl PollOutcome {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::RateLimited => "rate_limited",
            PollOutcome::Eligible => "eligible",
            PollOutcome::Pending => "pending",
            PollOutcome::TransientError => "transient_error",
            PollOutcome::SessionRejected => "session_rejected",
        }
    }
}

/// How a poll ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// A code was redeemed (new or duplicate)
    Redeemed(String),
    /// The session's bearer token was rejected
    SessionLost,
    /// `max_poll_attempts` reached without a redemption
    Exhausted,
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct RegistrationBody {
    #[serde(rename = "hasCode", default)]
    has_code: Option<bool>,
}

/// Classify a register-event reply by status and body.
pub fn classify_reply(status: u16, body: &str) -> PollOutcome {
    match status {
        400 | 429 => PollOutcome::RateLimited,
        401 | 403 => PollOutcome::SessionRejected,
        200..=299 => match serde_json::from_str::<RegistrationBody>(body) {
            Ok(RegistrationBody {
                has_code: Some(true),
            }) => PollOutcome::Eligible,
            Ok(_) => PollOutcome::Pending,
            Err(_) => PollOutcome::TransientError,
        },
        _ => PollOutcome::TransientError,
    }
}

pub struct EventPoller {
    api: Arc<dyn PromoApi>,
    redeemer: CodeRedeemer,
    policy: RetryPolicy,
}

impl EventPoller {
    pub fn new(api: Arc<dyn PromoApi>, redeemer: CodeRedeemer, policy: RetryPolicy) -> Self {
        Self {
            api,
            redeemer,
            policy,
        }
    }

    /// Register events under `session` until a code is redeemed or the
    /// session is lost. Redemption is attempted exactly once per eligibility
    /// signal.
    pub async fn poll_until_eligible(
        &self,
        session: &Session,
        cancel: &CancellationToken,
    ) -> PollResult {
        let credential = session.credential();
        let fingerprint = credential.fingerprint();
        let mut attempts: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return PollResult::Cancelled;
            }
            if let Some(max) = self.policy.max_poll_attempts
                && attempts >= max
            {
                info!(credential = %fingerprint, attempts, "poll attempt limit reached");
                return PollResult::Exhausted;
            }
            attempts += 1;

            let registration = self.api.register_event(
                session.bearer_token(),
                &credential.promo_id,
                &credential.event_type,
            );
            let reply = tokio::select! {
                _ = cancel.cancelled() => return PollResult::Cancelled,
                reply = registration => reply,
            };
            let outcome = match reply {
                Ok(reply) => classify_reply(reply.status, &reply.body),
                Err(e) => {
                    debug!(credential = %fingerprint, error = %e, "register-event transport error");
                    PollOutcome::TransientError
                }
            };
            metrics::counter!("promo_poll_outcomes_total", "outcome" => outcome.label())
                .increment(1);

            let wait = match outcome {
                PollOutcome::Eligible => match self.redeemer.redeem(session).await {
                    Ok(code) => return PollResult::Redeemed(code),
                    Err(e) => {
                        warn!(credential = %fingerprint, error = %e, "redemption failed, polling again");
                        self.policy.transient
                    }
                },
                PollOutcome::SessionRejected => {
                    warn!(credential = %fingerprint, "bearer token rejected");
                    return PollResult::SessionLost;
                }
                PollOutcome::RateLimited => self.policy.rate_limited,
                PollOutcome::Pending => self.policy.pending,
                PollOutcome::TransientError => self.policy.transient,
            };

            debug!(
                credential = %fingerprint,
                outcome = outcome.label(),
                attempt = attempts,
                cooldown_secs = wait.as_secs(),
                "cooling down before next registration"
            );
            if !cooldown(wait, cancel).await {
                return PollResult::Cancelled;
            }
        }
    }
}
