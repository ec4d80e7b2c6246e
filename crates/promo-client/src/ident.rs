//! Random client and event identifiers
//!
//! Each login gets a fresh `clientId` and each registration attempt a fresh
//! `eventId`. Both are opaque to the remote side; they only need to be
//! unpredictable and unique within a run.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngExt;

use crate::constants::IDENTIFIER_LEN;

/// Draw `len` random bytes, base64-encode them and keep the first `len` characters.
///
/// Base64 expands 3 bytes to 4 characters, so the encoded form is always
/// longer than `len` and the truncation never pads.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(bytes.as_mut_slice());
    let mut encoded = STANDARD.encode(&bytes);
    encoded.truncate(len);
    encoded
}

/// Identifier sent as `clientId` on login.
pub fn client_id() -> String {
    random_token(IDENTIFIER_LEN)
}

/// Identifier sent as `eventId` on each registration attempt.
pub fn event_id() -> String {
    random_token(IDENTIFIER_LEN)
}
