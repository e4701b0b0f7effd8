use tokio::sync::broadcast;

use crate::resource::ResourceKind;

/// "Resource X was just saved by store instance N."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub kind: ResourceKind,
    pub origin: u64,
}

impl UpdateNotice {
    /// Signal name of the notice, e.g. `tfs-sponsors-updated`.
    pub fn signal(&self) -> String {
        self.kind.update_signal()
    }
}

/// In-process broadcast of save notices so that sibling stores of the same
/// resource refetch right away instead of waiting for their next poll.
#[derive(Debug, Clone)]
pub struct UpdateBus {
    sender: broadcast::Sender<UpdateNotice>,
}

impl UpdateBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UpdateNotice> {
        self.sender.subscribe()
    }

    pub fn notify(&self, notice: UpdateNotice) {
        tracing::debug!("Broadcasting {} from store {}", notice.signal(), notice.origin);
        // No subscribers is fine
        let _ = self.sender.send(notice);
    }
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new()
    }
}
