//! Engine-wide counters for the status endpoint
//!
//! Mirrors the Prometheus counters as plain atomics so the health handler can
//! report them without scraping the recorder.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

/// Live counters shared by every unit through `Arc`.
#[derive(Debug)]
pub struct EngineStats {
    pub codes_persisted: AtomicU64,
    pub duplicate_codes: AtomicU64,
    pub cycles_completed: AtomicU64,
    pub auth_failures: AtomicU64,
    pub units_started: AtomicU64,
    pub unit_restarts: AtomicU64,
    pub started_at: Instant,
}

/// Point-in-time copy of `EngineStats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub codes_persisted: u64,
    pub duplicate_codes: u64,
    pub cycles_completed: u64,
    pub auth_failures: u64,
    pub units_started: u64,
    pub unit_restarts: u64,
    pub uptime_seconds: u64,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            codes_persisted: AtomicU64::new(0),
            duplicate_codes: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            auth_failures: AtomicU64::new(0),
            units_started: AtomicU64::new(0),
            unit_restarts: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            codes_persisted: self.codes_persisted.load(Ordering::Relaxed),
            duplicate_codes: self.duplicate_codes.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            units_started: self.units_started.load(Ordering::Relaxed),
            unit_restarts: self.unit_restarts.load(Ordering::Relaxed),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}
