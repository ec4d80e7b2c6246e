//! Protocol constants
//!
//! Fixed values the remote reward API expects from a game client. None of
//! these are secrets; the app token and bearer token are the only credentials.

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.gamepromo.io";

pub const LOGIN_PATH: &str = "/promo/login-client";
pub const REGISTER_EVENT_PATH: &str = "/promo/register-event";
pub const CREATE_CODE_PATH: &str = "/promo/create-code";

/// Platform tag sent as `clientOrigin` at login
pub const DEFAULT_CLIENT_ORIGIN: &str = "android";

/// Client build sent as `clientVersion` at login
pub const DEFAULT_CLIENT_VERSION: &str = "2.4.9";

/// `eventOrigin` is a literal sentinel, never derived from the session
pub const EVENT_ORIGIN: &str = "undefined";

pub const DEFAULT_USER_AGENT: &str =
    "UnityPlayer/2022.3.28f1 (UnityWebRequest/1.0, libcurl/8.5.0-DEV)";

/// Length of generated client and event identifiers
pub const IDENTIFIER_LEN: usize = 37;
