//! Client-side synchronization with the TFS data store.
//!
//! ## Protocol
//!
//! Each resource is one JSON document on the server. The client:
//! 1. Fetches the whole document on load (`GET /api/{resource}`)
//! 2. Saves by posting the whole, already-merged document
//!    (`POST /api/{resource}`)
//! 3. Polls a cheap staleness probe (`GET /api/{resource}/sync`) and
//!    refetches when the server copy is newer
//!
//! Conflicts resolve as last-write-wins on the server.

mod bus;
mod client;
mod error;
mod store;

use std::time::Duration;

pub use bus::{UpdateBus, UpdateNotice};
pub use client::{check_server, HttpRemote, Remote};
pub use error::SyncError;
pub use store::{Phase, PollHandle, ResourceStore, Snapshot, SyncOutcome};

/// Timeouts and timer periods used by the client store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Full document fetch
    pub fetch_timeout: Duration,
    /// Staleness probe
    pub probe_timeout: Duration,
    /// Document save
    pub save_timeout: Duration,
    /// Period of the background sync check
    pub poll_interval: Duration,
    /// Sync checks are skipped for this long after a local save
    pub cooldown: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(8),
            probe_timeout: Duration::from_secs(5),
            save_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(30),
            cooldown: Duration::from_secs(5),
        }
    }
}

impl SyncSettings {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
