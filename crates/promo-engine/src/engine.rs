//! Execution units and their shared wiring
//!
//! `Engine` owns the collaborators every unit needs (API, sink, policy,
//! stats) and decides which `DedupSink` a unit gets. Units run all of their
//! workers on one task, so a panic in any worker takes the whole unit down
//! and hands control back to the supervisor.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::future::join_all;
use promo_client::{CodeSink, CredentialRecord, PromoApi};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dedup::DedupSink;
use crate::policy::RetryPolicy;
use crate::poller::EventPoller;
use crate::redeemer::CodeRedeemer;
use crate::session::SessionAuthenticator;
use crate::stats::EngineStats;
use crate::worker::CredentialWorker;

/// Reach of duplicate suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DedupScope {
    /// One set for the whole process, shared by every unit
    #[default]
    Shared,
    /// A fresh set (from the startup seed) for every unit and every respawn.
    /// Codes written by a crashed unit are forgotten by its replacement.
    PerUnit,
}

pub struct Engine {
    api: Arc<dyn PromoApi>,
    sink: Arc<dyn CodeSink>,
    seed: Arc<Vec<String>>,
    scope: DedupScope,
    shared: Arc<DedupSink>,
    policy: RetryPolicy,
    stats: Arc<EngineStats>,
}

impl Engine {
    /// `seed` is the content of durable output at startup.
    pub fn new(
        api: Arc<dyn PromoApi>,
        sink: Arc<dyn CodeSink>,
        seed: Vec<String>,
        scope: DedupScope,
        policy: RetryPolicy,
    ) -> Self {
        let shared = Arc::new(DedupSink::with_seed(sink.clone(), seed.iter().cloned()));
        Self {
            api,
            sink,
            seed: Arc::new(seed),
            scope,
            shared,
            policy,
            stats: Arc::new(EngineStats::new()),
        }
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    pub fn scope(&self) -> DedupScope {
        self.scope
    }

    fn dedup_for_unit(&self) -> Arc<DedupSink> {
        match self.scope {
            DedupScope::Shared => self.shared.clone(),
            DedupScope::PerUnit => Arc::new(DedupSink::with_seed(
                self.sink.clone(),
                self.seed.iter().cloned(),
            )),
        }
    }

    /// Assemble a worker writing through `dedup`.
    pub fn worker(&self, dedup: Arc<DedupSink>) -> CredentialWorker {
        let redeemer = CodeRedeemer::new(self.api.clone(), dedup, self.stats.clone());
        let poller = EventPoller::new(self.api.clone(), redeemer, self.policy.clone());
        let authenticator = SessionAuthenticator::new(self.api.clone(), self.stats.clone());
        CredentialWorker::new(authenticator, poller, self.policy.clone(), self.stats.clone())
    }

    /// Run one execution unit: every credential of the partition concurrently,
    /// until `cancel` fires.
    pub async fn run_unit(
        &self,
        unit: usize,
        credentials: Arc<[Arc<CredentialRecord>]>,
        cancel: CancellationToken,
    ) {
        self.stats.units_started.fetch_add(1, Ordering::Relaxed);
        let worker = self.worker(self.dedup_for_unit());
        info!(unit, credentials = credentials.len(), "execution unit started");

        join_all(
            credentials
                .iter()
                .map(|credential| worker.run(credential.clone(), cancel.clone())),
        )
        .await;

        info!(unit, "execution unit stopped");
    }
}
