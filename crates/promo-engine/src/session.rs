//! Bearer sessions
//!
//! A session is owned by the worker that created it and is thrown away on
//! any sign of trouble. There is no refresh: a new login is cheap and is
//! always the recovery path.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::Secret;
use promo_client::{CredentialRecord, PromoApi};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::stats::EngineStats;

/// Short-lived authorization derived from one credential.
#[derive(Debug)]
pub struct Session {
    credential: Arc<CredentialRecord>,
    bearer_token: Secret<String>,
    created_at: Instant,
}

impl Session {
    pub fn new(credential: Arc<CredentialRecord>, bearer_token: String) -> Self {
        Self {
            credential,
            bearer_token: Secret::new(bearer_token),
            created_at: Instant::now(),
        }
    }

    pub fn credential(&self) -> &CredentialRecord {
        &self.credential
    }

    pub fn bearer_token(&self) -> &str {
        self.bearer_token.expose()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Exchanges credentials for sessions.
///
/// Reports each failure exactly once; retry cadence belongs to the worker.
pub struct SessionAuthenticator {
    api: Arc<dyn PromoApi>,
    stats: Arc<EngineStats>,
}

impl SessionAuthenticator {
    pub fn new(api: Arc<dyn PromoApi>, stats: Arc<EngineStats>) -> Self {
        Self { api, stats }
    }

    pub async fn authenticate(&self, credential: &Arc<CredentialRecord>) -> Result<Session> {
        match self.api.login(credential.app_token.expose()).await {
            Ok(token) => {
                debug!(credential = %credential.fingerprint(), "session established");
                Ok(Session::new(credential.clone(), token))
            }
            Err(e) => {
                self.stats.auth_failures.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("promo_auth_failures_total").increment(1);
                warn!(credential = %credential.fingerprint(), error = %e, "login failed");
                Err(Error::AuthFailure(e.to_string()))
            }
        }
    }
}
