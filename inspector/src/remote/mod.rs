//! Remote state mirror
//!
//! [`RemoteCache`] owns every entity, component and parameter fetched from
//! one endpoint. Views hold handles and paths, never copies, and re-resolve
//! through the cache so later fetches are visible.

mod cache;
mod model;

pub use cache::RemoteCache;
pub use model::{
    find_parameter, short_name, Component, ComponentValues, Entity, EntityId, ParamValue,
    Parameter,
};
