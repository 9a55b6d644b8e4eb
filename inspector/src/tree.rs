//! Lazily expanded tree view over the remote cache
//!
//! Roots are parentless entities, their children are components, and below
//! that come the component's parameters, recursively. Nodes only carry
//! handles and paths; labels and values are looked up in the cache each time
//! so a later fetch shows up on the next render.
//!
//! Expansion is demand-driven and never suppressed: asking for the children
//! of an entity or component node always goes back to the remote.

use std::sync::Arc;

use crate::remote::{ComponentValues, Entity, EntityId, Parameter, RemoteCache};

/// Label of the leaf shown under a component the remote cannot introspect
pub const UNREFLECTABLE_MESSAGE: &str = "Component is either not registered, or not reflected.";

/// A node in the inspector tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Entity {
        id: EntityId,
    },
    Component {
        entity: EntityId,
        path: String,
    },
    /// Object- or array-shaped parameter
    ParameterBranch {
        entity: EntityId,
        component: String,
        key_path: Vec<String>,
    },
    /// Scalar parameter
    ParameterLeaf {
        entity: EntityId,
        component: String,
        key_path: Vec<String>,
    },
    /// Informational leaf (unreflectable component, failed fetch)
    Diagnostic {
        message: String,
    },
}

impl Node {
    pub fn is_expandable(&self) -> bool {
        matches!(
            self,
            Node::Entity { .. } | Node::Component { .. } | Node::ParameterBranch { .. }
        )
    }
}

/// Display data for one node, as a tree widget wants it
#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    pub label: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub collapsible: bool,
}

impl TreeItem {
    fn new(label: impl Into<String>, collapsible: bool) -> Self {
        Self {
            label: label.into(),
            description: None,
            tooltip: None,
            collapsible,
        }
    }
}

/// Tree data source backed by a [`RemoteCache`]
pub struct InspectorTree {
    cache: Arc<RemoteCache>,
    show_errors: bool,
}

impl InspectorTree {
    pub fn new(cache: Arc<RemoteCache>) -> Self {
        Self {
            cache,
            show_errors: false,
        }
    }

    /// Show failed fetches as an error leaf instead of no children
    pub fn with_show_errors(mut self, show_errors: bool) -> Self {
        self.show_errors = show_errors;
        self
    }

    pub fn cache(&self) -> &RemoteCache {
        &self.cache
    }

    /// Ask the host to re-request children of `node` (`None` = whole tree)
    pub fn refresh(&self, node: Option<Node>) {
        self.cache.events().refresh(node);
    }

    /// Children of `parent`, or the root set when `parent` is `None`
    pub async fn children(&self, parent: Option<&Node>) -> Vec<Node> {
        match parent {
            None => self.roots().await,
            Some(Node::Entity { id }) => self.components(*id).await,
            Some(Node::Component { entity, path }) => self.component_children(*entity, path).await,
            Some(Node::ParameterBranch {
                entity,
                component,
                key_path,
            }) => match self.cache.parameter_at(*entity, component, key_path) {
                Some(parameter) => {
                    parameter_nodes(*entity, component, key_path, parameter.children())
                }
                None => Vec::new(),
            },
            Some(Node::ParameterLeaf { .. }) | Some(Node::Diagnostic { .. }) => Vec::new(),
        }
    }

    /// Display data for a node, resolved through the cache
    pub fn tree_item(&self, node: &Node) -> TreeItem {
        match node {
            Node::Entity { id } => match self.cache.entity(*id) {
                Some(entity) => TreeItem {
                    label: entity.display_name(),
                    description: None,
                    tooltip: Some(entity.tooltip()),
                    collapsible: true,
                },
                None => TreeItem::new(id.to_string(), true),
            },
            Node::Component { path, .. } => TreeItem {
                label: crate::remote::short_name(path).to_string(),
                description: Some(path.clone()),
                tooltip: Some(path.clone()),
                collapsible: true,
            },
            Node::ParameterBranch { key_path, .. } => TreeItem::new(last_key(key_path), true),
            Node::ParameterLeaf {
                entity,
                component,
                key_path,
            } => {
                let mut item = TreeItem::new(last_key(key_path), false);
                item.description = self
                    .cache
                    .parameter_at(*entity, component, key_path)
                    .and_then(|p| p.text().map(str::to_string));
                item
            }
            Node::Diagnostic { message } => TreeItem::new(message.clone(), false),
        }
    }

    async fn roots(&self) -> Vec<Node> {
        let roots = if self.show_errors {
            match self.cache.fetch_all_entities().await {
                Ok(roots) => roots,
                Err(e) => return vec![diagnostic(e)],
            }
        } else {
            self.cache.list_all_entities().await
        };
        entity_nodes(roots)
    }

    async fn components(&self, entity: EntityId) -> Vec<Node> {
        let components = if self.show_errors {
            match self.cache.fetch_components(entity).await {
                Ok(components) => components,
                Err(e) => return vec![diagnostic(e)],
            }
        } else {
            self.cache.list_components(entity).await
        };

        components
            .into_iter()
            .map(|c| Node::Component {
                entity,
                path: c.path,
            })
            .collect()
    }

    async fn component_children(&self, entity: EntityId, path: &str) -> Vec<Node> {
        let paths = self.cache.paths();
        if path == paths.children {
            return entity_nodes(self.cache.children_of(entity));
        }
        if path == paths.parent {
            return entity_nodes(self.cache.parent_of(entity));
        }

        let values = if self.show_errors {
            match self.cache.fetch_parameters(entity, path).await {
                Ok(values) => values,
                Err(e) => return vec![diagnostic(e)],
            }
        } else {
            self.cache.get_parameters(entity, path).await
        };

        match values {
            ComponentValues::Fetched(params) => parameter_nodes(entity, path, &[], &params),
            ComponentValues::Unreflectable(_) => vec![Node::Diagnostic {
                message: UNREFLECTABLE_MESSAGE.to_string(),
            }],
            ComponentValues::Pending => Vec::new(),
        }
    }
}

fn entity_nodes(entities: Vec<Entity>) -> Vec<Node> {
    entities
        .into_iter()
        .map(|e| Node::Entity { id: e.id })
        .collect()
}

fn parameter_nodes(
    entity: EntityId,
    component: &str,
    prefix: &[String],
    params: &[Parameter],
) -> Vec<Node> {
    params
        .iter()
        .map(|param| {
            let mut key_path = prefix.to_vec();
            key_path.push(param.name.clone());
            let component = component.to_string();
            if param.is_branch() {
                Node::ParameterBranch {
                    entity,
                    component,
                    key_path,
                }
            } else {
                Node::ParameterLeaf {
                    entity,
                    component,
                    key_path,
                }
            }
        })
        .collect()
}

fn diagnostic(error: impl std::fmt::Display) -> Node {
    Node::Diagnostic {
        message: error.to_string(),
    }
}

fn last_key(key_path: &[String]) -> String {
    key_path.last().cloned().unwrap_or_default()
}
