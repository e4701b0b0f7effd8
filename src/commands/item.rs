use clap::{Subcommand, ValueEnum};
use serde_json::{Map, Value};
use tfs_core::{
    Event, HttpRemote, Luminary, Magazine, Phase, Resource, ResourceKind, ResourceStore, Session,
    Sponsor,
};

use super::{open_store, CommandError};
use tfs_site::config::Config;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_resource(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(s).ok_or_else(|| {
        format!(
            "unknown resource '{}' (expected sessions, sponsors, magazines, events or luminaries)",
            s
        )
    })
}

#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// List the items of a resource
    List {
        /// Resource name
        #[arg(value_parser = parse_resource)]
        resource: ResourceKind,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Add an item to a resource
    Add {
        /// Resource name
        #[arg(value_parser = parse_resource)]
        resource: ResourceKind,

        /// Item as a JSON object; an id is generated when missing
        #[arg(long)]
        json: String,
    },

    /// Merge fields into an existing item
    Update {
        /// Resource name
        #[arg(value_parser = parse_resource)]
        resource: ResourceKind,

        /// Item ID
        id: String,

        /// Fields to replace, as a JSON object
        #[arg(long)]
        json: String,
    },

    /// Remove an item
    Remove {
        /// Resource name
        #[arg(value_parser = parse_resource)]
        resource: ResourceKind,

        /// Item ID
        id: String,
    },

    /// Keep a resource in sync and print every change (Ctrl-C to stop)
    Watch {
        /// Resource name
        #[arg(value_parser = parse_resource)]
        resource: ResourceKind,
    },
}

impl ItemCommand {
    fn resource(&self) -> ResourceKind {
        match self {
            ItemCommand::List { resource, .. }
            | ItemCommand::Add { resource, .. }
            | ItemCommand::Update { resource, .. }
            | ItemCommand::Remove { resource, .. }
            | ItemCommand::Watch { resource } => *resource,
        }
    }

    pub async fn run(&self, config: &Config) -> Result<(), CommandError> {
        match self.resource() {
            ResourceKind::Sessions => self.run_for::<Session>(config).await,
            ResourceKind::Sponsors => self.run_for::<Sponsor>(config).await,
            ResourceKind::Magazines => self.run_for::<Magazine>(config).await,
            ResourceKind::Events => self.run_for::<Event>(config).await,
            ResourceKind::Luminaries => self.run_for::<Luminary>(config).await,
        }
    }

    async fn run_for<T: Resource>(&self, config: &Config) -> Result<(), CommandError> {
        let store = open_store::<T>(config).await;

        match self {
            ItemCommand::List { format, .. } => print_items(&store.items(), *format),
            ItemCommand::Add { json, .. } => {
                let item: T = serde_json::from_str(json)
                    .map_err(|e| CommandError::InvalidInput(e.to_string()))?;
                let id = store.add(item).await?;
                println!("Added {} {}", T::KIND.id_prefix(), id);
                Ok(())
            }
            ItemCommand::Update { id, json, .. } => {
                let updates = parse_object(json)?;
                ensure_exists(&store, id)?;
                store.update(id, updates).await?;
                println!("Updated {}", id);
                Ok(())
            }
            ItemCommand::Remove { id, .. } => {
                ensure_exists(&store, id)?;
                store.remove(id).await?;
                println!("Removed {}", id);
                Ok(())
            }
            ItemCommand::Watch { .. } => watch(&store).await,
        }
    }
}

fn ensure_exists<T: Resource>(
    store: &ResourceStore<T, HttpRemote<T>>,
    id: &str,
) -> Result<(), CommandError> {
    if store.document().find(id).is_none() {
        return Err(CommandError::NotFound(T::KIND, id.to_string()));
    }
    Ok(())
}

/// Parses a `--json` argument that must be an object.
fn parse_object(json: &str) -> Result<Map<String, Value>, CommandError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(CommandError::InvalidInput(
            "--json must be a JSON object".to_string(),
        )),
        Err(e) => Err(CommandError::InvalidInput(e.to_string())),
    }
}

fn print_items<T: Resource>(items: &[T], format: OutputFormat) -> Result<(), CommandError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).map_err(CommandError::Output)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No {} found.", T::KIND);
            }
            for item in items {
                println!("{}  {}", item.id(), item.label());
            }
        }
    }
    Ok(())
}

async fn watch<T: Resource>(store: &ResourceStore<T, HttpRemote<T>>) -> Result<(), CommandError> {
    let mut changes = store.subscribe();
    let polling = store.start_polling();

    let current = store.document();
    println!(
        "Watching {} ({} items, lastModified {}). Press Ctrl-C to stop.",
        T::KIND,
        current.items.len(),
        current.last_modified
    );

    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                if snapshot.phase == Phase::Ready {
                    println!(
                        "{} updated: {} items (lastModified {})",
                        T::KIND,
                        snapshot.document.items.len(),
                        snapshot.document.last_modified
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    polling.stop();
    Ok(())
}
