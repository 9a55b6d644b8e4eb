//! Read-through cache and lazy tree view for a Bevy Remote Protocol endpoint
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bevy_inspector::{InspectorConfig, InspectorTree, RemoteCache};
//!
//! let config = InspectorConfig::load()?;
//! let cache = Arc::new(RemoteCache::connect(&config)?);
//! let tree = InspectorTree::new(cache);
//!
//! for root in tree.children(None).await {
//!     println!("{}", tree.tree_item(&root).label);
//! }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod protocol;
pub mod remote;
pub mod transport;
pub mod tree;

pub use config::InspectorConfig;
pub use error::{RemoteError, RemoteResult};
pub use events::{event_channel, CacheEvent, CacheEventSender};
pub use remote::RemoteCache;
pub use tree::{InspectorTree, Node, TreeItem};
