//! Change notification
//!
//! After a fetch mutates the cache, the cache emits an event naming the
//! subtree that may now be stale. A host re-requests children for that node;
//! nothing is diffed, the event is only a hint to re-render.

use tokio::sync::mpsc;

use crate::remote::EntityId;
use crate::tree::Node;

// ============================================================================
// Cache Events
// ============================================================================

/// Events emitted by the cache and the tree projection
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// A full entity listing was merged
    EntitiesListed {
        /// Root set, in remote order
        roots: Vec<EntityId>,
    },

    /// An entity's component list was merged
    ComponentsListed { entity: EntityId },

    /// A component's parameter tree was replaced (or marked unreflectable)
    ParametersFetched { entity: EntityId, component: String },

    /// Explicit refresh request from the host side
    Refresh {
        /// `None` refreshes the whole tree
        node: Option<Node>,
    },
}

impl CacheEvent {
    /// The node whose children may be stale (`None` = whole tree)
    pub fn stale_node(&self) -> Option<Node> {
        match self {
            CacheEvent::EntitiesListed { .. } => None,
            CacheEvent::ComponentsListed { entity } => Some(Node::Entity { id: *entity }),
            CacheEvent::ParametersFetched { entity, component } => Some(Node::Component {
                entity: *entity,
                path: component.clone(),
            }),
            CacheEvent::Refresh { node } => node.clone(),
        }
    }
}

// ============================================================================
// Event Channel
// ============================================================================

/// Sender for cache events
pub type EventSender = mpsc::UnboundedSender<CacheEvent>;

/// Receiver for cache events
pub type EventReceiver = mpsc::UnboundedReceiver<CacheEvent>;

/// Create a new event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Optional sender with a consistent API
#[derive(Clone, Default)]
pub struct CacheEventSender {
    sender: Option<EventSender>,
}

impl CacheEventSender {
    /// Create a sender that forwards to a channel
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// No-op sender (events are discarded)
    pub fn none() -> Self {
        Self { sender: None }
    }

    /// Whether events go anywhere
    pub fn is_active(&self) -> bool {
        self.sender.is_some()
    }

    /// Send an event (silently dropped if there is no receiver)
    pub fn send(&self, event: CacheEvent) {
        if let Some(ref sender) = self.sender {
            let _ = sender.send(event);
        }
    }

    /// Root listing refreshed
    pub fn entities_listed(&self, roots: Vec<EntityId>) {
        self.send(CacheEvent::EntitiesListed { roots });
    }

    /// Component set of an entity refreshed
    pub fn components_listed(&self, entity: EntityId) {
        self.send(CacheEvent::ComponentsListed { entity });
    }

    /// Values of one component refreshed
    pub fn parameters_fetched(&self, entity: EntityId, component: &str) {
        self.send(CacheEvent::ParametersFetched {
            entity,
            component: component.to_string(),
        });
    }

    /// Ask the view to redraw a node, or everything for `None`
    pub fn refresh(&self, node: Option<Node>) {
        self.send(CacheEvent::Refresh { node });
    }
}
