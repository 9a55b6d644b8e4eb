//! Read-through cache over one remote endpoint
//!
//! Fetch-on-demand: every async query issues its request, merges the
//! response into the local mirror and answers from the mirror. Merges follow
//! two rules:
//!
//! - entity listings refresh identity and hierarchy fields only and never
//!   clear an entity's components;
//! - a values fetch replaces a component's parameter tree wholesale.
//!
//! Nothing is evicted. An entity the remote stops reporting stays in the
//! mirror until the cache is dropped.
//!
//! # Concurrency
//!
//! The entity map is guarded by a mutex that is never held across an
//! `.await`, so the cache can be shared between tasks. In-flight requests are
//! not deduplicated: two concurrent fetches of the same node both reach the
//! remote and whichever response merges last wins. Callers must not assume
//! read-after-write consistency between overlapping fetches of one node.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{InspectorConfig, WellKnownPaths};
use crate::error::{RemoteError, RemoteResult};
use crate::events::CacheEventSender;
use crate::protocol::{self, RequestId};
use crate::transport::{HttpTransport, Transport};

use super::model::{find_parameter, Component, ComponentValues, Entity, EntityId, Parameter};

/// Local mirror of a remote process's entities
pub struct RemoteCache {
    transport: Arc<dyn Transport>,
    paths: WellKnownPaths,
    prefetch_components: bool,
    entities: Mutex<HashMap<EntityId, Entity>>,
    next_request_id: AtomicU64,
    events: CacheEventSender,
}

impl RemoteCache {
    /// Create an empty cache over a transport
    pub fn new(transport: Arc<dyn Transport>, paths: WellKnownPaths) -> Self {
        Self {
            transport,
            paths,
            prefetch_components: false,
            entities: Mutex::new(HashMap::new()),
            next_request_id: AtomicU64::new(0),
            events: CacheEventSender::none(),
        }
    }

    /// Create a cache for the configured HTTP endpoint
    pub fn connect(config: &InspectorConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.remote)?;
        tracing::info!("Inspecting remote at {}", transport.endpoint());

        Ok(Self::new(Arc::new(transport), config.hierarchy.clone())
            .with_prefetch(config.tree.prefetch_components))
    }

    /// Emit change notifications on this sender
    pub fn with_events(mut self, events: CacheEventSender) -> Self {
        self.events = events;
        self
    }

    /// Fetch each listed entity's components right after listing
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch_components = prefetch;
        self
    }

    /// Configured well-known component paths
    pub fn paths(&self) -> &WellKnownPaths {
        &self.paths
    }

    /// Address of the remote
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    pub(crate) fn events(&self) -> &CacheEventSender {
        &self.events
    }

    fn request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityId, Entity>> {
        self.entities.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // Strict fetches
    // ========================================================================

    /// List every entity and merge identity/hierarchy fields
    ///
    /// Returns the parentless entities in the order the remote sent them.
    pub async fn fetch_all_entities(&self) -> RemoteResult<Vec<Entity>> {
        let request =
            protocol::encode_list_entities(self.request_id(), &self.paths.as_options());
        let envelope = self.transport.send(&request).await?;
        let rows = protocol::decode_list_entities(envelope)?;

        let root_ids: Vec<EntityId> = {
            let mut entities = self.lock();
            for row in &rows {
                entities
                    .entry(row.entity)
                    .and_modify(|entity| entity.apply_query(row, &self.paths))
                    .or_insert_with(|| Entity::from_query(row, &self.paths));
            }
            warn_on_hierarchy_mismatch(&entities, rows.iter().map(|row| row.entity));

            rows.iter()
                .filter(|row| entities.get(&row.entity).is_some_and(|e| !e.has_parent()))
                .map(|row| row.entity)
                .collect()
        };

        tracing::debug!(
            "Listed {} entities ({} roots)",
            rows.len(),
            root_ids.len()
        );
        self.events.entities_listed(root_ids.clone());

        if self.prefetch_components {
            for row in &rows {
                self.list_components(row.entity).await;
            }
        }

        let entities = self.lock();
        Ok(root_ids
            .iter()
            .filter_map(|id| entities.get(id).cloned())
            .collect())
    }

    /// List an entity's component paths and merge them as placeholders
    ///
    /// Components that already hold parameter data are left untouched.
    pub async fn fetch_components(&self, entity: EntityId) -> RemoteResult<Vec<Component>> {
        let request = protocol::encode_list_components(self.request_id(), entity);
        let envelope = self
            .transport
            .send(&request)
            .await
            .map_err(|e| e.for_entity(entity))?;
        let paths = protocol::decode_list_components(envelope).map_err(|e| e.for_entity(entity))?;

        let components = {
            let mut entities = self.lock();
            let record = entities
                .entry(entity)
                .or_insert_with(|| Entity::new(entity));
            for path in paths {
                record
                    .components
                    .entry(path.clone())
                    .or_insert_with(|| Component::new(entity, path));
            }
            record.component_list()
        };

        self.events.components_listed(entity);
        Ok(components)
    }

    /// Fetch one component's values and replace its parameter tree
    ///
    /// A per-component error from the remote is not a failure: the component
    /// is marked unreflectable and that state is returned.
    pub async fn fetch_parameters(
        &self,
        entity: EntityId,
        component: &str,
    ) -> RemoteResult<ComponentValues> {
        let request = protocol::encode_get_values(self.request_id(), entity, &[component]);
        let envelope = self
            .transport
            .send(&request)
            .await
            .map_err(|e| e.for_entity(entity))?;
        let mut result = protocol::decode_get_values(envelope).map_err(|e| e.for_entity(entity))?;

        let values = if let Some(error) = result.errors.remove(component) {
            tracing::debug!(
                entity,
                component,
                code = error.code,
                "Component not reflectable: {}",
                error.message
            );
            ComponentValues::Unreflectable(error)
        } else if let Some(value) = result.components.remove(component) {
            ComponentValues::Fetched(value.into_parameters())
        } else {
            return Err(RemoteError::Protocol(format!(
                "get response has neither a value nor an error for {}",
                component
            )));
        };

        {
            let mut entities = self.lock();
            let record = entities
                .entry(entity)
                .or_insert_with(|| Entity::new(entity));
            record
                .components
                .entry(component.to_string())
                .or_insert_with(|| Component::new(entity, component))
                .values = values.clone();
        }

        self.events.parameters_fetched(entity, component);
        Ok(values)
    }

    // ========================================================================
    // Lenient queries: failures are logged and become empty results
    // ========================================================================

    /// Root entities from a fresh listing; empty on failure
    pub async fn list_all_entities(&self) -> Vec<Entity> {
        match self.fetch_all_entities().await {
            Ok(roots) => roots,
            Err(e) => {
                tracing::warn!("Failed to list entities from {}: {}", self.endpoint(), e);
                Vec::new()
            }
        }
    }

    /// Current component list of an entity; empty on failure
    pub async fn list_components(&self, entity: EntityId) -> Vec<Component> {
        match self.fetch_components(entity).await {
            Ok(components) => components,
            Err(e) => {
                tracing::warn!(entity, "Failed to list components: {}", e);
                Vec::new()
            }
        }
    }

    /// Freshly fetched values of a component; `Pending` on failure
    pub async fn get_parameters(&self, entity: EntityId, component: &str) -> ComponentValues {
        match self.fetch_parameters(entity, component).await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(entity, component, "Failed to get component values: {}", e);
                ComponentValues::Pending
            }
        }
    }

    // ========================================================================
    // Cache-only lookups
    // ========================================================================

    /// Known children of an entity; handles not yet in the cache are skipped
    pub fn children_of(&self, entity: EntityId) -> Vec<Entity> {
        let entities = self.lock();
        let Some(children) = entities.get(&entity).and_then(|e| e.children.as_ref()) else {
            return Vec::new();
        };

        children
            .iter()
            .filter_map(|child| {
                let found = entities.get(child).cloned();
                if found.is_none() {
                    tracing::debug!(entity, child, "Child not yet known to the cache");
                }
                found
            })
            .collect()
    }

    /// The entity's parent as a zero- or one-element list
    pub fn parent_of(&self, entity: EntityId) -> Vec<Entity> {
        let entities = self.lock();
        entities
            .get(&entity)
            .and_then(|e| e.parent)
            .and_then(|parent| entities.get(&parent).cloned())
            .into_iter()
            .collect()
    }

    /// Snapshot of a cached entity
    pub fn entity(&self, id: EntityId) -> Option<Entity> {
        self.lock().get(&id).cloned()
    }

    /// Snapshot of a cached component
    pub fn component(&self, entity: EntityId, path: &str) -> Option<Component> {
        self.lock()
            .get(&entity)
            .and_then(|e| e.component(path))
            .cloned()
    }

    /// Resolve a parameter by its key path inside a component
    pub fn parameter_at(
        &self,
        entity: EntityId,
        component: &str,
        key_path: &[String],
    ) -> Option<Parameter> {
        let entities = self.lock();
        let component = entities.get(&entity)?.component(component)?;
        find_parameter(component.parameters(), key_path).cloned()
    }

    /// Number of entities in the mirror
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Log listed entities whose resolved parent does not list them as a child
///
/// This happens when the remote reparents between fetches; it is not fatal
/// and is rebuilt on the next listing.
fn warn_on_hierarchy_mismatch(
    entities: &HashMap<EntityId, Entity>,
    listed: impl Iterator<Item = EntityId>,
) {
    for id in listed {
        let Some(parent) = entities.get(&id).and_then(|e| e.parent) else {
            continue;
        };
        let Some(parent_entity) = entities.get(&parent) else {
            continue;
        };
        let listed_as_child = parent_entity
            .children
            .as_ref()
            .is_some_and(|children| children.contains(&id));
        if !listed_as_child {
            tracing::warn!(
                entity = id,
                parent,
                "Entity is missing from its parent's children; hierarchy may be stale"
            );
        }
    }
}
