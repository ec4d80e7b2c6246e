//! Execution unit supervision
//!
//! One supervising task per partition spawns the unit, waits for it, and
//! respawns it over the same partition whenever it ends while the engine is
//! still meant to be running. Units are expected to run until cancelled, so
//! a normal return counts as abnormal just like a panic.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::future::join_all;
use promo_client::CredentialRecord;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::partition::partition_ranges;
use crate::policy::{RestartPolicy, cooldown};

pub struct Supervisor {
    engine: Arc<Engine>,
    partitions: Vec<Arc<[Arc<CredentialRecord>]>>,
    restart: RestartPolicy,
}

impl Supervisor {
    /// Partition `credentials` across `width` execution units.
    pub fn new(
        engine: Arc<Engine>,
        credentials: Vec<CredentialRecord>,
        width: usize,
        restart: RestartPolicy,
    ) -> Self {
        let credentials: Vec<Arc<CredentialRecord>> =
            credentials.into_iter().map(Arc::new).collect();
        let partitions = partition_ranges(credentials.len(), width)
            .into_iter()
            .map(|range| credentials[range].iter().cloned().collect())
            .collect();
        Self {
            engine,
            partitions,
            restart,
        }
    }

    pub fn partitions(&self) -> &[Arc<[Arc<CredentialRecord>]>] {
        &self.partitions
    }

    /// Run every unit until `cancel` fires and all units have stopped.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            units = self.partitions.len(),
            credentials = self.partitions.iter().map(|p| p.len()).sum::<usize>(),
            "supervisor starting"
        );

        let handles: Vec<_> = self
            .partitions
            .into_iter()
            .enumerate()
            .map(|(unit, credentials)| {
                tokio::spawn(supervise_unit(
                    self.engine.clone(),
                    unit,
                    credentials,
                    self.restart.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "unit supervisor task failed");
            }
        }
        info!("supervisor stopped");
    }
}

async fn supervise_unit(
    engine: Arc<Engine>,
    unit: usize,
    credentials: Arc<[Arc<CredentialRecord>]>,
    restart: RestartPolicy,
    cancel: CancellationToken,
) {
    let mut consecutive: u32 = 0;

    loop {
        let started = Instant::now();
        let handle = tokio::spawn({
            let engine = engine.clone();
            let credentials = credentials.clone();
            let cancel = cancel.clone();
            async move { engine.run_unit(unit, credentials, cancel).await }
        });
        let exit = handle.await;

        if cancel.is_cancelled() {
            debug!(unit, "unit finished after cancellation");
            return;
        }

        match exit {
            Ok(()) => warn!(unit, "execution unit returned while engine still running"),
            Err(e) if e.is_panic() => error!(unit, error = %e, "execution unit crashed"),
            Err(e) => error!(unit, error = %e, "execution unit aborted"),
        }

        if started.elapsed() >= restart.max_backoff {
            consecutive = 0;
        }
        consecutive = consecutive.saturating_add(1);
        let delay = restart.delay(consecutive);

        engine.stats().unit_restarts.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("promo_unit_restarts_total").increment(1);
        warn!(
            unit,
            attempt = consecutive,
            restart_in_ms = delay.as_millis() as u64,
            "respawning execution unit"
        );

        if !cooldown(delay, &cancel).await {
            return;
        }
    }
}
