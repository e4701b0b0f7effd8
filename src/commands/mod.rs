mod config_cmd;
mod error;
mod item;
mod showcase;

pub use config_cmd::ConfigCommand;
pub use error::CommandError;
pub use item::{ItemCommand, OutputFormat};
pub use showcase::{roster, upcoming};

use tfs_core::{HttpRemote, Resource, ResourceStore, UpdateBus};

use tfs_site::config::Config;

/// Opens a store for `T` against the configured server and loads it.
/// An unreachable server leaves the store on its built-in defaults.
pub async fn open_store<T: Resource>(config: &Config) -> ResourceStore<T, HttpRemote<T>> {
    let settings = config.sync_settings();
    let remote = HttpRemote::new(config.server_url.value.clone(), settings);
    let store = ResourceStore::new(remote, settings, UpdateBus::new());
    store.load().await;
    store
}
