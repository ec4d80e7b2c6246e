//! reqwest implementation of the reward protocol
//!
//! All three endpoints POST JSON to `{base_url}/promo/...`. The two
//! bearer-authenticated calls present themselves as the Unity game client.
//! Every request carries the configured timeout; a timeout surfaces as
//! `Error::Http` like any other transport failure.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::{ApiFuture, PromoApi, RegistrationReply};
use crate::constants::{
    CREATE_CODE_PATH, DEFAULT_BASE_URL, DEFAULT_CLIENT_ORIGIN, DEFAULT_CLIENT_VERSION,
    DEFAULT_USER_AGENT, EVENT_ORIGIN, LOGIN_PATH, REGISTER_EVENT_PATH,
};
use crate::error::{Error, Result};
use crate::ident;

/// Connection settings for `HttpPromoApi`.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub client_origin: String,
    pub client_version: String,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_origin: DEFAULT_CLIENT_ORIGIN.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    app_token: &'a str,
    client_id: String,
    client_origin: &'a str,
    client_version: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    client_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterEventRequest<'a> {
    promo_id: &'a str,
    event_id: String,
    event_type: &'a str,
    event_origin: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCodeRequest<'a> {
    promo_id: &'a str,
}

/// Production `PromoApi` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpPromoApi {
    client: reqwest::Client,
    settings: ApiSettings,
    game_headers: HeaderMap,
}

impl HttpPromoApi {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;

        let mut game_headers = HeaderMap::new();
        game_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        game_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|e| Error::Http(format!("invalid user agent: {e}")))?,
        );

        Ok(Self {
            client,
            settings,
            game_headers,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    #[instrument(skip_all)]
    async fn login_inner(&self, app_token: &str) -> Result<String> {
        let payload = LoginRequest {
            app_token,
            client_id: ident::client_id(),
            client_origin: &self.settings.client_origin,
            client_version: &self.settings.client_version,
        };

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = response
            .json::<LoginResponse>()
            .await
            .map_err(|e| Error::InvalidResponse(format!("login response: {e}")))?;

        match parsed.client_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(Error::MissingField("clientToken")),
        }
    }

    #[instrument(skip_all, fields(promo_id = %promo_id))]
    async fn register_event_inner(
        &self,
        bearer_token: &str,
        promo_id: &str,
        event_type: &str,
    ) -> Result<RegistrationReply> {
        let payload = RegisterEventRequest {
            promo_id,
            event_id: ident::event_id(),
            event_type,
            event_origin: EVENT_ORIGIN,
        };

        let response = self
            .client
            .post(self.url(REGISTER_EVENT_PATH))
            .headers(self.game_headers.clone())
            .bearer_auth(bearer_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(format!("register-event request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading register-event body: {e}")))?;
        debug!(status, "register-event answered");
        Ok(RegistrationReply { status, body })
    }

    #[instrument(skip_all, fields(promo_id = %promo_id))]
    async fn create_code_inner(&self, bearer_token: &str, promo_id: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url(CREATE_CODE_PATH))
            .headers(self.game_headers.clone())
            .bearer_auth(bearer_token)
            .json(&CreateCodeRequest { promo_id })
            .send()
            .await
            .map_err(|e| Error::Http(format!("create-code request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading create-code body: {e}")))?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl PromoApi for HttpPromoApi {
    fn login<'a>(&'a self, app_token: &'a str) -> ApiFuture<'a, String> {
        Box::pin(self.login_inner(app_token))
    }

    fn register_event<'a>(
        &'a self,
        bearer_token: &'a str,
        promo_id: &'a str,
        event_type: &'a str,
    ) -> ApiFuture<'a, RegistrationReply> {
        Box::pin(self.register_event_inner(bearer_token, promo_id, event_type))
    }

    fn create_code<'a>(
        &'a self,
        bearer_token: &'a str,
        promo_id: &'a str,
    ) -> ApiFuture<'a, String> {
        Box::pin(self.create_code_inner(bearer_token, promo_id))
    }
}
