//! Deduplicating front for the code sink
//!
//! Check, append and insert happen in one critical section under a tokio
//! Mutex. The durable append comes before the in-memory insert, so a crash
//! between the two can only produce a duplicate line on restart, never a
//! code that was reported new but is missing from output.

use std::collections::HashSet;
use std::sync::Arc;

use promo_client::CodeSink;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Set of codes already written, guarding a `CodeSink`.
///
/// Constructed explicitly and shared by `Arc`; the scope of deduplication is
/// exactly the set of callers holding the same instance.
pub struct DedupSink {
    seen: Mutex<HashSet<String>>,
    sink: Arc<dyn CodeSink>,
}

impl DedupSink {
    pub fn new(sink: Arc<dyn CodeSink>) -> Self {
        Self::with_seed(sink, std::iter::empty())
    }

    /// Start from codes already present in durable output.
    pub fn with_seed(sink: Arc<dyn CodeSink>, seed: impl IntoIterator<Item = String>) -> Self {
        Self {
            seen: Mutex::new(seed.into_iter().collect()),
            sink,
        }
    }

    /// Persist `code` unless it was seen before.
    ///
    /// Returns `true` when the code was new and is now durably written,
    /// `false` for a duplicate. A failed append leaves the set untouched so a
    /// later offer of the same code is still treated as new.
    pub async fn offer_and_persist(&self, code: &str) -> Result<bool> {
        let mut seen = self.seen.lock().await;
        if seen.contains(code) {
            metrics::counter!("promo_codes_duplicate_total").increment(1);
            debug!(code, "duplicate code, not persisted again");
            return Ok(false);
        }

        self.sink
            .append(code)
            .await
            .map_err(|e| Error::Persist(e.to_string()))?;
        seen.insert(code.to_string());
        metrics::counter!("promo_codes_persisted_total").increment(1);
        Ok(true)
    }

    pub async fn contains(&self, code: &str) -> bool {
        self.seen.lock().await.contains(code)
    }

    pub async fn len(&self) -> usize {
        self.seen.lock().await.len()
    }
}
