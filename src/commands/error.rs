use tfs_core::{ResourceKind, SyncError};

/// Errors from CLI commands
#[derive(Debug)]
pub enum CommandError {
    /// Talking to the data store failed
    Sync(SyncError),
    /// `--json` argument could not be used
    InvalidInput(String),
    /// No item with that id
    NotFound(ResourceKind, String),
    /// Could not render output
    Output(serde_json::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Sync(e) => write!(f, "{}", e),
            CommandError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CommandError::NotFound(kind, id) => write!(f, "No {} item with id '{}'", kind, id),
            CommandError::Output(e) => write!(f, "Failed to render output: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Sync(e) => Some(e),
            CommandError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SyncError> for CommandError {
    fn from(e: SyncError) -> Self {
        CommandError::Sync(e)
    }
}
