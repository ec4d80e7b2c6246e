//! Code redemption
//!
//! Turns an eligible session into a promo code and hands it to the dedup
//! sink. A duplicate still counts as a successful redemption: deduplication
//! only decides whether output is written, not whether the cycle is done.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use promo_client::{PromoApi, extract_promo_code};
use tracing::{error, info, warn};

use crate::dedup::DedupSink;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::stats::EngineStats;

pub struct CodeRedeemer {
    api: Arc<dyn PromoApi>,
    dedup: Arc<DedupSink>,
    stats: Arc<EngineStats>,
}

impl CodeRedeemer {
    pub fn new(api: Arc<dyn PromoApi>, dedup: Arc<DedupSink>, stats: Arc<EngineStats>) -> Self {
        Self { api, dedup, stats }
    }

    /// Request a code for the session's promo and persist it through dedup.
    ///
    /// `RedeemFailure` when the call fails or the body holds no code;
    /// `Persist` when the code was found but could not be written.
    pub async fn redeem(&self, session: &Session) -> Result<String> {
        let credential = session.credential();
        let body = self
            .api
            .create_code(session.bearer_token(), &credential.promo_id)
            .await
            .map_err(|e| Error::RedeemFailure(e.to_string()))?;

        let Some(code) = extract_promo_code(&body) else {
            warn!(
                credential = %credential.fingerprint(),
                body_len = body.len(),
                "no promoCode in create-code response"
            );
            return Err(Error::RedeemFailure("no promoCode in response".into()));
        };

        match self.dedup.offer_and_persist(&code).await {
            Ok(true) => {
                self.stats.codes_persisted.fetch_add(1, Ordering::Relaxed);
                info!(code = %code, promo_id = %credential.promo_id, "promo code redeemed");
            }
            Ok(false) => {
                self.stats.duplicate_codes.fetch_add(1, Ordering::Relaxed);
                info!(code = %code, promo_id = %credential.promo_id, "promo code already collected");
            }
            Err(e) => {
                error!(code = %code, error = %e, "promo code redeemed but not persisted");
                return Err(e);
            }
        }
        Ok(code)
    }
}
