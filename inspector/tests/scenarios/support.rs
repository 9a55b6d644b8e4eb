//! Scripted transport and fixtures

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bevy_inspector::config::WellKnownPaths;
use bevy_inspector::error::{RemoteError, RemoteResult};
use bevy_inspector::protocol::{Request, METHOD_GET, METHOD_LIST, METHOD_QUERY};
use bevy_inspector::transport::Transport;
use bevy_inspector::RemoteCache;
use serde_json::{json, Value};

pub const PARENT: &str = "bevy_hierarchy::components::parent::Parent";
pub const CHILDREN: &str = "bevy_hierarchy::components::children::Children";
pub const NAME: &str = "bevy_core::name::Name";

/// Answers requests from per-method queues
///
/// The last queued answer for a method is sticky, so one scripted response
/// serves any number of calls.
#[derive(Default)]
pub struct ScriptedTransport {
    answers: Mutex<HashMap<String, VecDeque<RemoteResult<Value>>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, method: &str, answer: RemoteResult<Value>) {
        self.answers
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(answer);
    }

    /// Queue a successful envelope wrapping `result`
    pub fn result(&self, method: &str, result: Value) {
        self.answer(method, Ok(json!({ "jsonrpc": "2.0", "id": 0, "result": result })));
    }

    pub fn query(&self, rows: Value) {
        self.result(METHOD_QUERY, rows);
    }

    pub fn list(&self, paths: Value) {
        self.result(METHOD_LIST, paths);
    }

    pub fn get(&self, components: Value, errors: Value) {
        self.result(
            METHOD_GET,
            json!({ "components": components, "errors": errors }),
        );
    }

    pub fn fail(&self, method: &str, message: &str) {
        self.answer(method, Err(RemoteError::Transport(message.to_string())));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> RemoteResult<Value> {
        self.requests.lock().unwrap().push(request.clone());

        let mut answers = self.answers.lock().unwrap();
        let queue = answers.get_mut(&request.method).ok_or_else(|| {
            RemoteError::Transport(format!("no scripted answer for {}", request.method))
        })?;
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(RemoteError::Transport("empty script".to_string())))
        }
    }

    fn endpoint(&self) -> &str {
        "scripted"
    }
}

pub fn cache_over(transport: &Arc<ScriptedTransport>) -> RemoteCache {
    RemoteCache::new(transport.clone(), WellKnownPaths::default())
}

/// Entity 1 "World" with children 2 and 3; 3 is unnamed
pub fn small_world() -> Value {
    json!([
        { "entity": 1, "components": { NAME: { "name": "World", "hash": 1 }, CHILDREN: [2, 3] } },
        { "entity": 2, "components": { NAME: { "name": "Player", "hash": 2 }, PARENT: 1 } },
        { "entity": 3, "components": { PARENT: 1 } }
    ])
}
