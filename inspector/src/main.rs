use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use bevy_inspector::events::{event_channel, EventReceiver};
use bevy_inspector::logging::init_tracing;
use bevy_inspector::remote::{EntityId, Parameter};
use bevy_inspector::{CacheEventSender, InspectorConfig, InspectorTree, Node, RemoteCache};

#[derive(Parser)]
#[command(name = "inspector")]
#[command(about = "Browse the entities of a running Bevy app over the remote protocol")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Remote base URL (overrides .inspector.toml)
    #[arg(long, env = "BEVY_REMOTE_URL")]
    url: Option<String>,

    /// Remote port (overrides .inspector.toml and BEVY_REMOTE_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Show failed fetches as error leaves instead of hiding them
    #[arg(long)]
    show_errors: bool,

    /// Debug logging
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the entity tree, expanding down to a depth
    Tree {
        /// Levels below the roots to expand (entity = 0, component = 1, ...)
        #[arg(long, short, default_value_t = 2)]
        depth: usize,
    },
    /// List root entities
    Entities,
    /// List the components of an entity
    Components {
        /// Entity id
        entity: EntityId,
    },
    /// Print the values of one component
    Get {
        /// Entity id
        entity: EntityId,
        /// Full component path
        component: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = InspectorConfig::load()?;
    if let Some(url) = cli.url {
        config.remote.url = url;
    }
    if let Some(port) = cli.port {
        config.remote.port = port;
    }
    if cli.show_errors {
        config.tree.show_errors = true;
    }

    let (tx, rx) = event_channel();
    let cache = Arc::new(RemoteCache::connect(&config)?.with_events(CacheEventSender::new(tx)));
    let tree = InspectorTree::new(cache.clone()).with_show_errors(config.tree.show_errors);

    match cli.command {
        Commands::Tree { depth } => print_tree(&tree, depth).await,
        Commands::Entities => {
            for entity in cache.list_all_entities().await {
                println!("{}\t{}", entity.id, entity.display_name());
            }
        }
        Commands::Components { entity } => {
            for component in cache.list_components(entity).await {
                println!("{}\t{}", component.short_name(), component.path);
            }
        }
        Commands::Get { entity, component } => {
            cache.fetch_parameters(entity, &component).await?;
            if let Some(stored) = cache.component(entity, &component) {
                print_parameters(stored.try_parameters()?, 0);
            }
        }
    }

    drain_events(rx);
    Ok(())
}

/// Depth-first walk of the projection, expanding on demand
async fn print_tree(tree: &InspectorTree, max_depth: usize) {
    let mut stack: Vec<(Node, usize)> = tree
        .children(None)
        .await
        .into_iter()
        .rev()
        .map(|node| (node, 0))
        .collect();

    if stack.is_empty() {
        println!("No entities found at {}", tree.cache().endpoint());
        return;
    }

    while let Some((node, depth)) = stack.pop() {
        let item = tree.tree_item(&node);
        let indent = "  ".repeat(depth);
        match item.description {
            Some(description) => println!("{}{}  ({})", indent, item.label, description),
            None => println!("{}{}", indent, item.label),
        }

        if item.collapsible && depth < max_depth {
            let children = tree.children(Some(&node)).await;
            stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
        }
    }
}

fn print_parameters(params: &[Parameter], depth: usize) {
    let indent = "  ".repeat(depth);
    for param in params {
        match param.text() {
            Some(text) => println!("{}{}: {}", indent, param.name, text),
            None => {
                println!("{}{}", indent, param.name);
                print_parameters(param.children(), depth + 1);
            }
        }
    }
}

fn drain_events(mut rx: EventReceiver) {
    let mut count = 0;
    while let Ok(event) = rx.try_recv() {
        tracing::debug!(stale = ?event.stale_node(), "cache event: {:?}", event);
        count += 1;
    }
    tracing::debug!("{} cache events emitted", count);
}
