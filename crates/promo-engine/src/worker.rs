//! Per-credential cycle: authenticate → poll → redeem, forever
//!
//! One worker instance serves every credential of an execution unit; each
//! `run` call is an independent loop with no state shared between
//! credentials beyond the dedup sink.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use promo_client::CredentialRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::poller::{EventPoller, PollResult};
use crate::policy::{RetryPolicy, cooldown};
use crate::session::SessionAuthenticator;
use crate::stats::EngineStats;

pub struct CredentialWorker {
    authenticator: SessionAuthenticator,
    poller: EventPoller,
    policy: RetryPolicy,
    stats: Arc<EngineStats>,
}

impl CredentialWorker {
    pub fn new(
        authenticator: SessionAuthenticator,
        poller: EventPoller,
        policy: RetryPolicy,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            authenticator,
            poller,
            policy,
            stats,
        }
    }

    /// Cycle `credential` until `cancel` fires.
    ///
    /// After a redemption the next cycle starts immediately with a fresh
    /// login. A failed login, a rejected bearer or an exhausted poll waits
    /// `RetryPolicy::reauth` first. An in-flight login is abandoned on cancel.
    pub async fn run(&self, credential: Arc<CredentialRecord>, cancel: CancellationToken) {
        let fingerprint = credential.fingerprint();
        info!(credential = %fingerprint, promo_id = %credential.promo_id, "worker started");

        while !cancel.is_cancelled() {
            let attempt = tokio::select! {
                _ = cancel.cancelled() => None,
                result = self.authenticator.authenticate(&credential) => Some(result),
            };
            let Some(attempt) = attempt else { break };
            let session = match attempt {
                Ok(session) => session,
                Err(_) => {
                    if !cooldown(self.policy.reauth, &cancel).await {
                        break;
                    }
                    continue;
                }
            };

            match self.poller.poll_until_eligible(&session, &cancel).await {
                PollResult::Redeemed(_) => {
                    self.stats.cycles_completed.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        credential = %fingerprint,
                        session_age_secs = session.age().as_secs(),
                        "cycle complete, starting next"
                    );
                }
                PollResult::SessionLost | PollResult::Exhausted => {
                    warn!(credential = %fingerprint, "session ended without a code, re-authenticating");
                    if !cooldown(self.policy.reauth, &cancel).await {
                        break;
                    }
                }
                PollResult::Cancelled => break,
            }
        }

        info!(credential = %fingerprint, "worker stopped");
    }
}
