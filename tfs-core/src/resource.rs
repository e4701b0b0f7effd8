use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Resource collections served by the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Sessions,
    Sponsors,
    Magazines,
    Events,
    Luminaries,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Sessions,
        ResourceKind::Sponsors,
        ResourceKind::Magazines,
        ResourceKind::Events,
        ResourceKind::Luminaries,
    ];

    /// Path segment used under `/api/`.
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Sessions => "sessions",
            ResourceKind::Sponsors => "sponsors",
            ResourceKind::Magazines => "magazines",
            ResourceKind::Events => "events",
            ResourceKind::Luminaries => "luminaries",
        }
    }

    /// Returns the filename the document is persisted under.
    pub fn filename(&self) -> &'static str {
        match self {
            ResourceKind::Sessions => "sessions.json",
            ResourceKind::Sponsors => "sponsors.json",
            ResourceKind::Magazines => "magazines.json",
            ResourceKind::Events => "events.json",
            ResourceKind::Luminaries => "luminaries.json",
        }
    }

    /// Prefix of generated item ids (`{prefix}-{timestamp}`).
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ResourceKind::Sessions => "session",
            ResourceKind::Sponsors => "sponsor",
            ResourceKind::Magazines => "magazine",
            ResourceKind::Events => "event",
            ResourceKind::Luminaries => "luminary",
        }
    }

    /// Name of the signal broadcast after a successful save.
    pub fn update_signal(&self) -> String {
        format!("tfs-{}-updated", self.name())
    }

    /// Parse from string name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sessions" => Some(ResourceKind::Sessions),
            "sponsors" => Some(ResourceKind::Sponsors),
            "magazines" => Some(ResourceKind::Magazines),
            "events" => Some(ResourceKind::Events),
            "luminaries" => Some(ResourceKind::Luminaries),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An item that lives in one resource collection.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Short human-readable name used in listings.
    fn label(&self) -> &str;

    /// Items used when the server cannot be reached on first load.
    fn defaults() -> Vec<Self> {
        Vec::new()
    }
}
