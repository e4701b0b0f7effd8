//! Server-side modules for the TFS data store.

pub mod routes;
pub mod storage;

pub use routes::{router, AppState};
pub use storage::{DocumentStore, StoreError};
