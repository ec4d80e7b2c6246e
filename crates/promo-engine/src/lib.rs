//! Promo code acquisition engine
//!
//! Drives the reward protocol for many credentials at once, forever, and
//! keeps the collected codes unique in durable output.
//!
//! Credential lifecycle:
//! 1. `Supervisor` partitions credentials into contiguous chunks, one per execution unit
//! 2. Each unit runs one `CredentialWorker` per credential concurrently
//! 3. Worker authenticates (`SessionAuthenticator`) → bearer `Session`
//! 4. `EventPoller` registers progress events until the remote reports eligibility,
//!    cooling down according to `RetryPolicy` after every classified outcome
//! 5. `CodeRedeemer` fetches the code and offers it to the `DedupSink`
//! 6. Worker re-authenticates and starts the next cycle
//! 7. A unit that dies is respawned by the supervisor with backoff

pub mod dedup;
pub mod engine;
pub mod error;
pub mod partition;
pub mod policy;
pub mod poller;
pub mod redeemer;
pub mod session;
pub mod stats;
pub mod supervisor;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use dedup::DedupSink;
pub use engine::{DedupScope, Engine};
pub use error::{Error, Result};
pub use partition::partition_ranges;
pub use policy::{RestartPolicy, RetryPolicy};
pub use poller::{EventPoller, PollOutcome, PollResult, classify_reply};
pub use redeemer::CodeRedeemer;
pub use session::{Session, SessionAuthenticator};
pub use stats::{EngineStats, StatsSnapshot};
pub use supervisor::Supervisor;
pub use worker::CredentialWorker;
