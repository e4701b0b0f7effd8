//! Client-side cache of one resource document kept in sync with the server.
//!
//! State machine: `Loading -> Ready -> (Saving <-> Ready)`.
//!
//! * Reads never fail: when the server cannot be reached the store keeps
//!   the built-in defaults (first load) or the last-known document.
//! * Writes are pessimistic: the next document is built locally, posted,
//!   and adopted only once the server accepts it.
//! * After a save, sync checks are suppressed for the cool-down window so
//!   that a lagging server copy does not revert the fresh write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::bus::{UpdateBus, UpdateNotice};
use super::client::Remote;
use super::error::SyncError;
use super::SyncSettings;
use crate::document::{now_millis, Document};
use crate::resource::{Resource, ResourceKind};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Saving,
}

/// What a store currently holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub phase: Phase,
    pub document: Document<T>,
}

/// Result of one background sync check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Skipped, a local save happened within the cool-down window
    Suppressed,
    /// Server copy is not newer
    Current,
    /// Server copy was newer and has been adopted
    Refreshed,
    /// Probe or refetch failed; the last-known document is kept
    Unreachable,
}

/// Synchronizing store for one resource type.
///
/// Cloning is cheap and yields a handle to the same store.
pub struct ResourceStore<T: Resource, R: Remote<T>> {
    inner: Arc<Inner<T, R>>,
}

struct Inner<T: Resource, R> {
    remote: R,
    settings: SyncSettings,
    bus: UpdateBus,
    instance: u64,
    state: watch::Sender<Snapshot<T>>,
    /// Instant of the last successful save. The lock also serializes saves
    /// and sync checks on this store.
    last_save: Mutex<Option<Instant>>,
}

impl<T: Resource, R: Remote<T>> Clone for ResourceStore<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Resource, R: Remote<T>> ResourceStore<T, R> {
    /// Creates a store in the `Loading` phase holding the default document.
    pub fn new(remote: R, settings: SyncSettings, bus: UpdateBus) -> Self {
        let (state, _) = watch::channel(Snapshot {
            phase: Phase::Loading,
            document: Document::defaults(),
        });

        Self {
            inner: Arc::new(Inner {
                remote,
                settings,
                bus,
                instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
                state,
                last_save: Mutex::new(None),
            }),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        T::KIND
    }

    pub fn state(&self) -> Snapshot<T> {
        self.inner.state.borrow().clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    pub fn document(&self) -> Document<T> {
        self.inner.state.borrow().document.clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.state.borrow().document.items.clone()
    }

    /// Receives every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.inner.state.subscribe()
    }

    /// Initial load. Falls back to the built-in defaults on any failure.
    pub async fn load(&self) {
        let _guard = self.inner.last_save.lock().await;

        let document = match self.inner.remote.fetch().await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", T::KIND, e);
                Document::defaults()
            }
        };

        self.inner.state.send_replace(Snapshot {
            phase: Phase::Ready,
            document,
        });
    }

    /// Adds `item` and returns the id it was stored under.
    pub async fn add(&self, item: T) -> Result<String, SyncError> {
        let mut last_save = self.inner.last_save.lock().await;
        let (next, id) = self.document().with_added(item);
        self.commit(&mut last_save, next).await?;
        Ok(id)
    }

    /// Shallow-merges `updates` into the item with `id`.
    pub async fn update(&self, id: &str, updates: Map<String, Value>) -> Result<(), SyncError> {
        let mut last_save = self.inner.last_save.lock().await;
        let next = self
            .document()
            .with_updated(id, &updates)
            .map_err(|source| SyncError::Merge {
                id: id.to_string(),
                source,
            })?;
        self.commit(&mut last_save, next).await
    }

    pub async fn remove(&self, id: &str) -> Result<(), SyncError> {
        let mut last_save = self.inner.last_save.lock().await;
        let next = self.document().with_removed(id);
        self.commit(&mut last_save, next).await
    }

    async fn commit(
        &self,
        last_save: &mut Option<Instant>,
        mut next: Document<T>,
    ) -> Result<(), SyncError> {
        next.last_modified = now_millis();
        self.inner.state.send_modify(|s| s.phase = Phase::Saving);

        match self.inner.remote.save(&next).await {
            Ok(stored) => {
                tracing::info!(
                    "Saved {} ({} items, lastModified {})",
                    T::KIND,
                    stored.items.len(),
                    stored.last_modified
                );
                self.inner.state.send_replace(Snapshot {
                    phase: Phase::Ready,
                    document: stored,
                });
                *last_save = Some(Instant::now());
                self.inner.bus.notify(UpdateNotice {
                    kind: T::KIND,
                    origin: self.inner.instance,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", T::KIND, e);
                self.inner.state.send_modify(|s| s.phase = Phase::Ready);
                Err(e)
            }
        }
    }

    /// Runs one sync check: probe the server and refetch when it is newer.
    pub async fn check_sync(&self) -> SyncOutcome {
        let last_save = self.inner.last_save.lock().await;

        if let Some(saved_at) = *last_save {
            if saved_at.elapsed() < self.inner.settings.cooldown {
                tracing::debug!("Skipping {} sync check, saved recently", T::KIND);
                return SyncOutcome::Suppressed;
            }
        }

        let local = self.inner.state.borrow().document.last_modified;
        match self.inner.remote.probe(local).await {
            Ok(false) => SyncOutcome::Current,
            Ok(true) => {
                if self.refetch().await {
                    SyncOutcome::Refreshed
                } else {
                    SyncOutcome::Unreachable
                }
            }
            Err(e) => {
                tracing::debug!("Sync check for {} failed: {}", T::KIND, e);
                SyncOutcome::Unreachable
            }
        }
    }

    /// Refetches the whole document regardless of staleness.
    pub async fn refresh(&self) -> bool {
        let _guard = self.inner.last_save.lock().await;
        self.refetch().await
    }

    /// Caller holds the `last_save` lock.
    async fn refetch(&self) -> bool {
        match self.inner.remote.fetch().await {
            Ok(document) => {
                tracing::debug!(
                    "Refreshed {} (lastModified {})",
                    T::KIND,
                    document.last_modified
                );
                self.inner.state.send_replace(Snapshot {
                    phase: Phase::Ready,
                    document,
                });
                true
            }
            Err(e) => {
                tracing::debug!("Refetch of {} failed: {}", T::KIND, e);
                false
            }
        }
    }

    /// Starts the background task: a sync check every poll interval, and an
    /// immediate refetch whenever another store saves the same resource.
    ///
    /// The task runs until the returned handle is stopped or dropped.
    pub fn start_polling(&self) -> PollHandle {
        let store = self.clone();
        let mut notices = self.inner.bus.subscribe();
        let period = self.inner.settings.poll_interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.check_sync().await;
                    }
                    notice = notices.recv() => match notice {
                        Ok(notice) => {
                            if notice.kind == T::KIND && notice.origin != store.inner.instance {
                                store.refresh().await;
                            }
                        }
                        // Skipped notices lose their origin, so refetch once
                        Err(RecvError::Lagged(_)) => {
                            store.refresh().await;
                        }
                        Err(RecvError::Closed) => return,
                    },
                }
            }
        });

        PollHandle { task }
    }
}

/// Handle to a store's background polling task.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancels polling. Dropping the handle does the same.
    pub fn stop(self) {}
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sponsor;
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct FakeServer {
        document: Document<Sponsor>,
        fail_fetch: bool,
        fail_save: bool,
        fetches: usize,
        probes: usize,
        saves: usize,
    }

    #[derive(Debug, Clone, Default)]
    struct FakeRemote {
        server: Arc<StdMutex<FakeServer>>,
    }

    impl FakeRemote {
        fn with_document(document: Document<Sponsor>) -> Self {
            let remote = Self::default();
            remote.server.lock().unwrap().document = document;
            remote
        }

        fn server(&self) -> std::sync::MutexGuard<'_, FakeServer> {
            self.server.lock().unwrap()
        }
    }

    impl Remote<Sponsor> for FakeRemote {
        async fn fetch(&self) -> Result<Document<Sponsor>, SyncError> {
            let mut server = self.server.lock().unwrap();
            server.fetches += 1;
            if server.fail_fetch {
                return Err(SyncError::Network("connection refused".to_string()));
            }
            Ok(server.document.clone())
        }

        async fn probe(&self, last_modified: i64) -> Result<bool, SyncError> {
            let mut server = self.server.lock().unwrap();
            server.probes += 1;
            Ok(server.document.last_modified > last_modified)
        }

        async fn save(&self, document: &Document<Sponsor>) -> Result<Document<Sponsor>, SyncError> {
            let mut server = self.server.lock().unwrap();
            server.saves += 1;
            if server.fail_save {
                return Err(SyncError::Server {
                    status: 200,
                    message: "disk full".to_string(),
                });
            }
            let mut stored = document.clone();
            stored.stamp(server.document.last_modified);
            server.document = stored.clone();
            Ok(stored)
        }
    }

    fn sponsor(name: &str) -> Sponsor {
        Sponsor {
            name: name.to_string(),
            industry: "Finance".to_string(),
            ..Sponsor::default()
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn store(remote: &FakeRemote) -> ResourceStore<Sponsor, FakeRemote> {
        ResourceStore::new(remote.clone(), SyncSettings::default(), UpdateBus::new())
    }

    #[tokio::test]
    async fn test_load_falls_back_to_defaults() {
        let remote = FakeRemote::default();
        remote.server().fail_fetch = true;
        let store = store(&remote);
        assert_eq!(store.phase(), Phase::Loading);

        store.load().await;

        assert_eq!(store.phase(), Phase::Ready);
        assert_eq!(store.items(), Sponsor::defaults());
        assert_eq!(store.document().last_modified, 0);
    }

    #[tokio::test]
    async fn test_load_adopts_server_document() {
        let remote = FakeRemote::with_document(Document::new(vec![sponsor("Acme")], 100));
        let store = store(&remote);

        store.load().await;

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.document().last_modified, 100);
    }

    #[tokio::test]
    async fn test_add_from_default_state_persists() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let store = store(&remote);

        let id = store.add(sponsor("Acme")).await.unwrap();

        let server = remote.server();
        assert_eq!(server.document.items.len(), Sponsor::defaults().len() + 1);
        assert!(server.document.last_modified > 100);
        assert!(store.document().find(&id).is_some());
        assert_eq!(store.document(), server.document);
        assert_eq!(store.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_add_after_load_to_empty_store() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let store = store(&remote);
        store.load().await;

        let id = store.add(sponsor("Acme")).await.unwrap();

        let server = remote.server();
        assert_eq!(server.document.items.len(), 1);
        assert_eq!(server.document.items[0].id, id);
        assert!(server.document.last_modified > 100);
        assert_eq!(store.items()[0].name, "Acme");
    }

    #[tokio::test]
    async fn test_add_assigns_unused_id() {
        let remote = FakeRemote::default();
        remote.server().fail_fetch = true;
        let store = store(&remote);
        store.load().await;
        remote.server().fail_fetch = false;

        let before: Vec<String> = store.items().into_iter().map(|s| s.id).collect();
        let id = store.add(sponsor("Acme")).await.unwrap();
        assert!(!before.contains(&id));
        assert!(id.starts_with("sponsor-"));

        store.remove(&id).await.unwrap();
        let after: Vec<String> = store.items().into_iter().map(|s| s.id).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let remote = FakeRemote::with_document(Document::new(vec![sponsor("Acme")], 100));
        let store = store(&remote);
        store.load().await;
        let before = store.document();

        remote.server().fail_save = true;
        let result = store.add(sponsor("Beta")).await;

        assert!(matches!(result, Err(SyncError::Server { .. })));
        assert_eq!(store.document(), before);
        assert_eq!(store.phase(), Phase::Ready);

        // A failed save does not start the cool-down
        assert_eq!(store.check_sync().await, SyncOutcome::Current);
    }

    #[tokio::test]
    async fn test_sequential_updates_merge_shallowly() {
        let remote = FakeRemote::default();
        let store = store(&remote);
        store.load().await;
        let id = store.add(sponsor("Acme")).await.unwrap();

        store
            .update(&id, fields(json!({ "name": "Acme Capital" })))
            .await
            .unwrap();
        store
            .update(&id, fields(json!({ "isActive": true })))
            .await
            .unwrap();

        let item = store.document().find(&id).cloned().unwrap();
        assert_eq!(item.name, "Acme Capital");
        assert!(item.is_active);
        assert_eq!(item.industry, "Finance");
    }

    #[tokio::test]
    async fn test_bad_update_is_rejected_before_save() {
        let remote = FakeRemote::default();
        remote.server().fail_fetch = true;
        let store = store(&remote);
        store.load().await;
        let before = store.document();

        let result = store
            .update("iqas", fields(json!({ "isActive": "maybe" })))
            .await;

        assert!(matches!(result, Err(SyncError::Merge { .. })));
        assert_eq!(remote.server().saves, 0);
        assert_eq!(store.document(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_check_suppressed_during_cooldown() {
        let remote = FakeRemote::default();
        let store = store(&remote);
        store.load().await;
        store.add(sponsor("Acme")).await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.check_sync().await, SyncOutcome::Suppressed);
        assert_eq!(remote.server().probes, 0);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.check_sync().await, SyncOutcome::Current);
        assert_eq!(remote.server().probes, 1);
    }

    #[tokio::test]
    async fn test_sync_check_refreshes_newer_server_copy() {
        let remote = FakeRemote::with_document(Document::new(vec![sponsor("Acme")], 100));
        let store = store(&remote);
        store.load().await;

        remote.server().document = Document::new(vec![sponsor("Acme"), sponsor("Beta")], 200);

        assert_eq!(store.check_sync().await, SyncOutcome::Refreshed);
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.document().last_modified, 200);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_last_known() {
        let remote = FakeRemote::with_document(Document::new(vec![sponsor("Acme")], 100));
        let store = store(&remote);
        store.load().await;

        {
            let mut server = remote.server();
            server.document.last_modified = 200;
            server.fail_fetch = true;
        }

        assert_eq!(store.check_sync().await, SyncOutcome::Unreachable);
        assert_eq!(store.document().last_modified, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_picks_up_remote_changes() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let store = store(&remote);
        store.load().await;
        let mut changes = store.subscribe();

        let handle = store.start_polling();
        remote.server().document = Document::new(vec![sponsor("Acme")], 300);

        tokio::time::timeout(Duration::from_secs(60), changes.changed())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(store.document().last_modified, 300);
        assert!(remote.server().probes >= 1);
        assert!(handle.is_running());
        handle.stop();
    }

    #[tokio::test]
    async fn test_sibling_store_refetches_on_notice() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let bus = UpdateBus::new();
        let writer = ResourceStore::new(remote.clone(), SyncSettings::default(), bus.clone());
        let reader = ResourceStore::new(remote.clone(), SyncSettings::default(), bus);
        writer.load().await;
        reader.load().await;

        let mut changes = reader.subscribe();
        let _polling = reader.start_polling();

        writer.add(sponsor("Acme")).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                changes.changed().await.unwrap();
                if changes.borrow().document.items.len() == 1 {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(reader.document(), writer.document());
    }

    #[tokio::test]
    async fn test_own_notice_does_not_refetch() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let store = store(&remote);
        store.load().await;
        let _polling = store.start_polling();

        store.add(sponsor("Acme")).await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(remote.server().fetches, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_polling_task_ends() {
        let remote = FakeRemote::with_document(Document::new(Vec::new(), 100));
        let store = store(&remote);
        store.load().await;
        let handle = store.start_polling();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_secs(31)).await;
        let probes = remote.server().probes;
        assert_eq!(probes, 1);

        handle.stop();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(remote.server().probes, probes);
    }
}
