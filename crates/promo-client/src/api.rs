//! Protocol abstraction
//!
//! The `PromoApi` trait decouples the engine's state machine from the wire.
//! `HttpPromoApi` is the production implementation; tests drive the engine
//! through scripted implementations of the same trait.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn PromoApi>`).

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Boxed future returned by every `PromoApi` call.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Raw answer to a register-event call.
///
/// Registration is the one call whose non-2xx statuses carry meaning (400 is
/// the remote's rate-limit signal), so the status and body are handed back
/// unclassified and the engine decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReply {
    pub status: u16,
    pub body: String,
}

/// The three calls of the reward protocol.
///
/// Implementations report each call's outcome exactly once and never retry.
pub trait PromoApi: Send + Sync {
    /// Exchange an app token for a bearer token (`clientToken`).
    ///
    /// Fails on transport errors, non-2xx statuses, unparseable bodies and a
    /// missing or empty token field.
    fn login<'a>(&'a self, app_token: &'a str) -> ApiFuture<'a, String>;

    /// Register one progress event under a bearer token.
    ///
    /// Only transport errors (including timeouts) are returned as `Err`.
    fn register_event<'a>(
        &'a self,
        bearer_token: &'a str,
        promo_id: &'a str,
        event_type: &'a str,
    ) -> ApiFuture<'a, RegistrationReply>;

    /// Ask for a promo code. Returns the raw 2xx body, which may wrap the
    /// JSON payload in non-JSON text.
    fn create_code<'a>(&'a self, bearer_token: &'a str, promo_id: &'a str)
    -> ApiFuture<'a, String>;
}
