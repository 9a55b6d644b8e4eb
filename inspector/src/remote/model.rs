//! Local mirror types for remote entities, components and parameters

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::WellKnownPaths;
use crate::error::{RemoteError, RemoteResult};
use crate::protocol::{ItemError, QueriedEntity};

/// Opaque entity handle, unique for the lifetime of one remote process run
pub type EntityId = u64;

/// Derive the display name of a component path
///
/// Drops everything from the first `<` and keeps the last `::` segment, so
/// `game::physics::Velocity<f32>` becomes `Velocity`.
pub fn short_name(path: &str) -> &str {
    let base = path.split('<').next().unwrap_or(path);
    base.rsplit("::").next().unwrap_or(base)
}

// ============================================================================
// Parameters
// ============================================================================

/// A named field (or array element) inside a component value
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Field name, or the element index for array items
    pub name: String,
    pub value: ParamValue,
}

/// A reflected value, decoded straight from the wire into its shape
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Scalar in its textual form
    Leaf(String),
    /// Ordered branch; children are named by index
    Array(Vec<Parameter>),
    /// Keyed branch; children keep wire order
    Object(Vec<Parameter>),
}

impl ParamValue {
    /// Arrays and objects expand; leaves do not
    pub fn is_branch(&self) -> bool {
        !matches!(self, ParamValue::Leaf(_))
    }

    /// Textual value of a leaf
    pub fn text(&self) -> Option<&str> {
        match self {
            ParamValue::Leaf(text) => Some(text),
            _ => None,
        }
    }

    /// Sub-parameters of a branch (empty for leaves)
    pub fn children(&self) -> &[Parameter] {
        match self {
            ParamValue::Leaf(_) => &[],
            ParamValue::Array(items) | ParamValue::Object(items) => items,
        }
    }

    /// Flatten a whole component value into its top-level parameters
    ///
    /// A scalar component value becomes one unnamed leaf.
    pub fn into_parameters(self) -> Vec<Parameter> {
        match self {
            ParamValue::Array(items) | ParamValue::Object(items) => items,
            leaf => vec![Parameter {
                name: String::new(),
                value: leaf,
            }],
        }
    }
}

impl Parameter {
    /// Whether this parameter has sub-parameters
    pub fn is_branch(&self) -> bool {
        self.value.is_branch()
    }

    /// Textual value, if this is a leaf
    pub fn text(&self) -> Option<&str> {
        self.value.text()
    }

    /// Sub-parameters, empty for leaves
    pub fn children(&self) -> &[Parameter] {
        self.value.children()
    }
}

/// Walk a key path down a parameter list
pub fn find_parameter<'a>(params: &'a [Parameter], key_path: &[String]) -> Option<&'a Parameter> {
    let (first, rest) = key_path.split_first()?;
    let found = params.iter().find(|p| &p.name == first)?;
    if rest.is_empty() {
        Some(found)
    } else {
        find_parameter(found.children(), rest)
    }
}

// ============================================================================
// Components
// ============================================================================

/// What is known about a component's values
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ComponentValues {
    /// Listed, but values never fetched (or the last fetch failed)
    #[default]
    Pending,
    /// Parameter tree from the most recent successful fetch
    Fetched(Vec<Parameter>),
    /// The remote reported it cannot introspect this component
    Unreflectable(ItemError),
}

/// A component attached to an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub entity: EntityId,
    /// Fully qualified type path
    pub path: String,
    pub values: ComponentValues,
}

impl Component {
    /// Placeholder record with no parameter data yet
    pub fn new(entity: EntityId, path: impl Into<String>) -> Self {
        Self {
            entity,
            path: path.into(),
            values: ComponentValues::Pending,
        }
    }

    pub fn short_name(&self) -> &str {
        short_name(&self.path)
    }

    /// Stored parameter tree; empty unless values were fetched successfully
    pub fn parameters(&self) -> &[Parameter] {
        match &self.values {
            ComponentValues::Fetched(params) => params,
            _ => &[],
        }
    }

    pub fn is_unreflectable(&self) -> bool {
        matches!(self.values, ComponentValues::Unreflectable(_))
    }

    /// Stored parameters, or the per-item error the remote reported
    pub fn try_parameters(&self) -> RemoteResult<&[Parameter]> {
        match &self.values {
            ComponentValues::Unreflectable(error) => Err(RemoteError::RemoteItem {
                path: self.path.clone(),
                code: error.code,
                message: error.message.clone(),
            }),
            _ => Ok(self.parameters()),
        }
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A remote entity and everything fetched about it so far
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// From the well-known name component, when present
    pub name: Option<String>,
    pub parent: Option<EntityId>,
    pub children: Option<Vec<EntityId>>,
    /// Keyed by full component path
    pub components: BTreeMap<String, Component>,
}

impl Entity {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            name: None,
            parent: None,
            children: None,
            components: BTreeMap::new(),
        }
    }

    /// Build an entity from a query row
    pub fn from_query(row: &QueriedEntity, paths: &WellKnownPaths) -> Self {
        let mut entity = Self::new(row.entity);
        entity.apply_query(row, paths);
        entity
    }

    /// Refresh identity and hierarchy fields from a query row
    ///
    /// The component map is never touched.
    pub fn apply_query(&mut self, row: &QueriedEntity, paths: &WellKnownPaths) {
        self.name = row.components.get(&paths.name).and_then(name_of);
        self.parent = row.components.get(&paths.parent).and_then(entity_of);
        self.children = row.components.get(&paths.children).and_then(|v| {
            v.as_array()
                .map(|ids| ids.iter().filter_map(entity_of).collect())
        });
    }

    /// Name if known, otherwise the stringified id
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// "name - id" when named, otherwise the id
    pub fn tooltip(&self) -> String {
        match &self.name {
            Some(name) => format!("{} - {}", name, self.id),
            None => self.id.to_string(),
        }
    }

    /// Whether the last listing resolved a parent
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Cached components, sorted by path
    pub fn component_list(&self) -> Vec<Component> {
        self.components.values().cloned().collect()
    }

    /// Cached component by full path
    pub fn component(&self, path: &str) -> Option<&Component> {
        self.components.get(path)
    }
}

/// Name components serialize either as `{ "name": ... }` or as a bare string
fn name_of(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(fields) => fields.get("name")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn entity_of(value: &Value) -> Option<EntityId> {
    value.as_u64()
}
