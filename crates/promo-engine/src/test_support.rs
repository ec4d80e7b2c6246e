//! Scripted collaborators for engine tests
//!
//! `ScriptedApi` answers each call from a per-key queue (login by app token,
//! register/create by promo id) and falls back to a steady default once the
//! queue is empty. `MemorySink` records appended lines and can be told to fail.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use promo_client::{ApiFuture, CodeSink, Error as ClientError, PromoApi, RegistrationReply};

pub(crate) const PENDING: &str = r#"{"hasCode":false}"#;
pub(crate) const ELIGIBLE: &str = r#"{"hasCode":true}"#;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Login {
    Token(&'static str),
    Fail,
    /// Panics inside the login future, killing the execution unit
    Panic,
    /// Stays in flight for the given time, then panics
    PanicAfter(Duration),
    /// Never completes
    Stall,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Register {
    Reply(u16, &'static str),
    NetworkError,
    /// Never completes
    Stall,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Create {
    Body(&'static str),
    NetworkError,
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    logins: Mutex<HashMap<String, VecDeque<Login>>>,
    login_fallbacks: Mutex<HashMap<String, Login>>,
    registrations: Mutex<HashMap<String, VecDeque<Register>>>,
    creates: Mutex<HashMap<String, VecDeque<Create>>>,
    login_log: Mutex<Vec<String>>,
    pub register_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login_script(self, app_token: &str, steps: impl IntoIterator<Item = Login>) -> Self {
        self.logins
            .lock()
            .unwrap()
            .entry(app_token.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn login_fallback(self, app_token: &str, step: Login) -> Self {
        self.login_fallbacks
            .lock()
            .unwrap()
            .insert(app_token.to_string(), step);
        self
    }

    pub fn register_script(
        self,
        promo_id: &str,
        steps: impl IntoIterator<Item = Register>,
    ) -> Self {
        self.registrations
            .lock()
            .unwrap()
            .entry(promo_id.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn create_script(self, promo_id: &str, steps: impl IntoIterator<Item = Create>) -> Self {
        self.creates
            .lock()
            .unwrap()
            .entry(promo_id.to_string())
            .or_default()
            .extend(steps);
        self
    }

    pub fn logins_for(&self, app_token: &str) -> usize {
        self.login_log
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.as_str() == app_token)
            .count()
    }

    pub fn registers(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

impl PromoApi for ScriptedApi {
    fn login<'a>(&'a self, app_token: &'a str) -> ApiFuture<'a, String> {
        self.login_log.lock().unwrap().push(app_token.to_string());
        let scripted = self
            .logins
            .lock()
            .unwrap()
            .get_mut(app_token)
            .and_then(VecDeque::pop_front);
        let step = scripted.unwrap_or_else(|| {
            self.login_fallbacks
                .lock()
                .unwrap()
                .get(app_token)
                .copied()
                .unwrap_or(Login::Token("bearer"))
        });
        Box::pin(async move {
            match step {
                Login::Token(token) => Ok(token.to_string()),
                Login::Fail => Err(ClientError::MissingField("clientToken")),
                Login::Panic => panic!("scripted unit crash"),
                Login::PanicAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    panic!("scripted unit crash after {delay:?}")
                }
                Login::Stall => std::future::pending().await,
            }
        })
    }

    fn register_event<'a>(
        &'a self,
        _bearer_token: &'a str,
        promo_id: &'a str,
        _event_type: &'a str,
    ) -> ApiFuture<'a, RegistrationReply> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .registrations
            .lock()
            .unwrap()
            .get_mut(promo_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Register::Reply(200, PENDING));
        Box::pin(async move {
            match step {
                Register::Reply(status, body) => Ok(RegistrationReply {
                    status,
                    body: body.to_string(),
                }),
                Register::NetworkError => Err(ClientError::Http("connection reset".into())),
                Register::Stall => std::future::pending().await,
            }
        })
    }

    fn create_code<'a>(
        &'a self,
        _bearer_token: &'a str,
        promo_id: &'a str,
    ) -> ApiFuture<'a, String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .creates
            .lock()
            .unwrap()
            .get_mut(promo_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Create::NetworkError);
        Box::pin(async move {
            match step {
                Create::Body(body) => Ok(body.to_string()),
                Create::NetworkError => Err(ClientError::Http("connection reset".into())),
            }
        })
    }
}

#[derive(Default)]
pub(crate) struct MemorySink {
    lines: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl CodeSink for MemorySink {
    fn append<'a>(
        &'a self,
        code: &'a str,
    ) -> Pin<Box<dyn Future<Output = promo_client::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError::Io("disk full".into()));
            }
            self.lines.lock().unwrap().push(code.to_string());
            Ok(())
        })
    }
}
