//! Client side of the promo reward protocol
//!
//! Everything the engine needs from the outside world at the record level:
//!
//! 1. `credentials::load_credentials()` reads `appToken|promoId|eventType` lines
//! 2. `HttpPromoApi` speaks the three-endpoint protocol (login, register-event,
//!    create-code) behind the `PromoApi` trait so the engine can be driven by stubs
//! 3. `extract::extract_promo_code()` pulls the code out of a create-code body
//! 4. `codes::FileCodeSink` appends redeemed codes to durable output
//!
//! This crate holds no retry policy. Every call reports its outcome once and
//! the engine decides how to react.

pub mod api;
pub mod codes;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod extract;
pub mod http;
pub mod ident;

pub use api::{ApiFuture, PromoApi, RegistrationReply};
pub use codes::{CodeSink, FileCodeSink, read_existing_codes};
pub use credentials::{CredentialRecord, LoadReport, load_credentials, parse_credentials};
pub use error::{Error, Result};
pub use extract::extract_promo_code;
pub use http::{ApiSettings, HttpPromoApi};
