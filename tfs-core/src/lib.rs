//! TFS Core Library
//!
//! Resource models shared by the site backend and its clients, plus the
//! client-side store that keeps a local copy of each resource in sync with
//! the server.

pub mod api;
pub mod document;
pub mod models;
pub mod resource;
pub mod sync;

pub use api::{ApiResponse, SaveRequest, SyncProbe, SyncQuery};
pub use document::{merge_fields, next_id, now_millis, Document};
pub use models::{Event, Luminary, Magazine, Session, Speaker, Sponsor};
pub use resource::{Resource, ResourceKind};
pub use sync::{
    check_server, HttpRemote, Phase, PollHandle, Remote, ResourceStore, Snapshot, SyncError,
    SyncOutcome, SyncSettings, UpdateBus, UpdateNotice,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
