//! JSON-RPC codec for the Bevy Remote Protocol read methods
//!
//! Pure request/response translation: builds request envelopes for the three
//! read methods and decodes their results into typed values. No state lives
//! here; request ids are chosen by the caller.

use std::collections::HashMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::{EntityId, ParamValue, Parameter};

/// JSON-RPC protocol version sent with every request
pub const JSONRPC_VERSION: &str = "2.0";

/// Enumerate entities, optionally fetching some components alongside
pub const METHOD_QUERY: &str = "bevy/query";

/// Enumerate the component paths present on one entity
pub const METHOD_LIST: &str = "bevy/list";

/// Fetch the values of a set of components on one entity
pub const METHOD_GET: &str = "bevy/get";

/// Request id chosen by the caller
pub type RequestId = u64;

/// A JSON-RPC request envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    pub id: RequestId,
    pub params: Value,
}

impl Request {
    fn new(method: &str, id: RequestId, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            id,
            params,
        }
    }
}

/// Error object carried by a failed envelope or a per-item failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemError {
    pub code: i64,
    pub message: String,
}

/// Raw response envelope, before the result is checked against a method's shape
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ItemError>,
}

/// One row of a `bevy/query` result
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueriedEntity {
    pub entity: EntityId,
    /// Values of the requested (optional) components that the entity carries
    #[serde(default)]
    pub components: Map<String, Value>,
    #[serde(default)]
    pub has: HashMap<String, bool>,
}

/// Result of `bevy/get`: values and per-component failures side by side
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComponentValuesResult {
    #[serde(default)]
    pub components: HashMap<String, ParamValue>,
    #[serde(default)]
    pub errors: HashMap<String, ItemError>,
}

// ============================================================================
// Encoding
// ============================================================================

/// Build a `bevy/query` request listing every entity
///
/// `option_paths` are components to return when present; entities that lack
/// them are still listed.
pub fn encode_list_entities(id: RequestId, option_paths: &[&str]) -> Request {
    let data = if option_paths.is_empty() {
        json!({})
    } else {
        json!({ "option": option_paths })
    };
    Request::new(METHOD_QUERY, id, json!({ "data": data }))
}

/// Build a `bevy/list` request for one entity
pub fn encode_list_components(id: RequestId, entity: EntityId) -> Request {
    Request::new(METHOD_LIST, id, json!({ "entity": entity }))
}

/// Build a `bevy/get` request for a set of components on one entity
pub fn encode_get_values(id: RequestId, entity: EntityId, component_paths: &[&str]) -> Request {
    Request::new(
        METHOD_GET,
        id,
        json!({
            "entity": entity,
            "components": component_paths,
        }),
    )
}

// ============================================================================
// Decoding
// ============================================================================

fn decode_result<T: serde::de::DeserializeOwned>(envelope: Value, method: &str) -> RemoteResult<T> {
    if !envelope.is_object() {
        return Err(RemoteError::Protocol(format!(
            "{} response is not a JSON-RPC envelope",
            method
        )));
    }

    let envelope: Envelope = serde_json::from_value(envelope)
        .map_err(|e| RemoteError::Protocol(format!("malformed {} envelope: {}", method, e)))?;

    if let Some(error) = envelope.error {
        return Err(RemoteError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = envelope.result.ok_or_else(|| {
        RemoteError::Protocol(format!("{} response has no `result` field", method))
    })?;

    serde_json::from_value(result)
        .map_err(|e| RemoteError::Protocol(format!("unexpected {} result shape: {}", method, e)))
}

/// Decode a `bevy/query` response
pub fn decode_list_entities(envelope: Value) -> RemoteResult<Vec<QueriedEntity>> {
    decode_result(envelope, METHOD_QUERY)
}

/// Decode a `bevy/list` response
pub fn decode_list_components(envelope: Value) -> RemoteResult<Vec<String>> {
    decode_result(envelope, METHOD_LIST)
}

/// Decode a `bevy/get` response
///
/// Per-component errors are not a failure of the call; they come back in
/// [`ComponentValuesResult::errors`].
pub fn decode_get_values(envelope: Value) -> RemoteResult<ComponentValuesResult> {
    decode_result(envelope, METHOD_GET)
}

// ============================================================================
// Parameter values
// ============================================================================

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ParamValueVisitor)
    }
}

struct ParamValueVisitor;

impl<'de> Visitor<'de> for ParamValueVisitor {
    type Value = ParamValue;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a reflected component value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(number_text(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<ParamValue, E> {
        Ok(ParamValue::Leaf("null".to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<ParamValue, E> {
        self.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<ParamValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ParamValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<ParamValue>()? {
            let name = items.len().to_string();
            items.push(Parameter { name, value });
        }
        Ok(ParamValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ParamValue, A::Error> {
        let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, value)) = map.next_entry::<String, ParamValue>()? {
            fields.push(Parameter { name, value });
        }
        Ok(ParamValue::Object(fields))
    }
}

/// Render a float the way JSON text does: plain decimals between 1e-6 and
/// 1e21, exponent form (`1e+21`, `1.5e-7`) outside that range
fn number_text(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let magnitude = v.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", v);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => text,
        };
    }
    v.to_string()
}
