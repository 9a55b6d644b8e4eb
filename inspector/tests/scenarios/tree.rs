//! Tree projection over a scripted remote

use std::sync::Arc;

use bevy_inspector::protocol::{METHOD_GET, METHOD_LIST, METHOD_QUERY};
use bevy_inspector::tree::UNREFLECTABLE_MESSAGE;
use bevy_inspector::{event_channel, CacheEvent, CacheEventSender, InspectorTree, Node};
use serde_json::json;

use crate::support::{cache_over, small_world, ScriptedTransport, CHILDREN, NAME, PARENT};

fn tree_over(transport: &Arc<ScriptedTransport>) -> InspectorTree {
    InspectorTree::new(Arc::new(cache_over(transport)))
}

fn component(entity: u64, path: &str) -> Node {
    Node::Component {
        entity,
        path: path.to_string(),
    }
}

fn keys(path: &[&str]) -> Vec<String> {
    path.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn test_roots_are_parentless_entities() {
    let transport = ScriptedTransport::new();
    transport.query(small_world());
    let tree = tree_over(&transport);

    let roots = tree.children(None).await;

    assert_eq!(roots, vec![Node::Entity { id: 1 }]);
    let item = tree.tree_item(&roots[0]);
    assert_eq!(item.label, "World");
    assert_eq!(item.tooltip.as_deref(), Some("World - 1"));
    assert!(item.collapsible);
}

#[tokio::test]
async fn test_entity_expands_to_components() {
    let transport = ScriptedTransport::new();
    transport.list(json!(["game::physics::Velocity<f32>", NAME]));
    let tree = tree_over(&transport);

    let nodes = tree.children(Some(&Node::Entity { id: 4 })).await;

    assert_eq!(nodes.len(), 2);
    let labels: Vec<_> = nodes.iter().map(|n| tree.tree_item(n).label).collect();
    assert!(labels.contains(&"Velocity".to_string()));
    assert!(labels.contains(&"Name".to_string()));

    let velocity = tree.tree_item(&component(4, "game::physics::Velocity<f32>"));
    assert_eq!(
        velocity.description.as_deref(),
        Some("game::physics::Velocity<f32>")
    );
    assert_eq!(
        velocity.tooltip.as_deref(),
        Some("game::physics::Velocity<f32>")
    );
}

#[tokio::test]
async fn test_entity_without_components_is_still_expandable() {
    let transport = ScriptedTransport::new();
    transport.query(json!([{ "entity": 8 }]));
    transport.list(json!([]));
    let tree = tree_over(&transport);

    let roots = tree.children(None).await;
    assert!(tree.tree_item(&roots[0]).collapsible);
    assert!(tree.children(Some(&roots[0])).await.is_empty());
}

#[tokio::test]
async fn test_component_expands_to_parameters() {
    let transport = ScriptedTransport::new();
    transport.get(
        json!({ "Transform": { "translation": { "x": 1, "y": 2, "z": 3 } } }),
        json!({}),
    );
    let tree = tree_over(&transport);

    let params = tree.children(Some(&component(1, "Transform"))).await;

    let translation = Node::ParameterBranch {
        entity: 1,
        component: "Transform".to_string(),
        key_path: keys(&["translation"]),
    };
    assert_eq!(params, vec![translation.clone()]);
    let item = tree.tree_item(&translation);
    assert_eq!(item.label, "translation");
    assert!(item.collapsible);

    let axes = tree.children(Some(&translation)).await;
    let rendered: Vec<_> = axes
        .iter()
        .map(|n| {
            let item = tree.tree_item(n);
            assert!(!item.collapsible);
            (item.label, item.description.unwrap())
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("x".to_string(), "1".to_string()),
            ("y".to_string(), "2".to_string()),
            ("z".to_string(), "3".to_string()),
        ]
    );
    // Branch expansion resolves through the cache without another request
    assert_eq!(transport.count(METHOD_GET), 1);
}

#[tokio::test]
async fn test_array_parameters_are_indexed() {
    let transport = ScriptedTransport::new();
    transport.get(json!({ "game::Path": { "points": [[0, 1], [2, 3]] } }), json!({}));
    let tree = tree_over(&transport);

    tree.children(Some(&component(1, "game::Path"))).await;
    let points = Node::ParameterBranch {
        entity: 1,
        component: "game::Path".to_string(),
        key_path: keys(&["points"]),
    };
    let items = tree.children(Some(&points)).await;

    let labels: Vec<_> = items.iter().map(|n| tree.tree_item(n).label).collect();
    assert_eq!(labels, vec!["0", "1"]);
    let second_y = Node::ParameterLeaf {
        entity: 1,
        component: "game::Path".to_string(),
        key_path: keys(&["points", "1", "1"]),
    };
    assert_eq!(tree.tree_item(&second_y).description.as_deref(), Some("3"));
}

#[tokio::test]
async fn test_unreflectable_component_yields_one_diagnostic() {
    let transport = ScriptedTransport::new();
    transport.get(
        json!({}),
        json!({ "Foo": { "code": -1, "message": "not reflected" } }),
    );
    let tree = tree_over(&transport);

    let nodes = tree.children(Some(&component(1, "Foo"))).await;

    assert_eq!(
        nodes,
        vec![Node::Diagnostic {
            message: UNREFLECTABLE_MESSAGE.to_string()
        }]
    );
    let item = tree.tree_item(&nodes[0]);
    assert!(!item.collapsible);
    assert!(tree.children(Some(&nodes[0])).await.is_empty());
    assert!(tree.cache().component(1, "Foo").unwrap().parameters().is_empty());
}

#[tokio::test]
async fn test_children_and_parent_components_follow_hierarchy() {
    let transport = ScriptedTransport::new();
    transport.query(small_world());
    let tree = tree_over(&transport);
    tree.children(None).await;

    let children = tree.children(Some(&component(1, CHILDREN))).await;
    let parent = tree.children(Some(&component(2, PARENT))).await;

    assert_eq!(children, vec![Node::Entity { id: 2 }, Node::Entity { id: 3 }]);
    assert_eq!(parent, vec![Node::Entity { id: 1 }]);
    assert_eq!(tree.tree_item(&children[1]).label, "3");
    assert_eq!(transport.count(METHOD_GET), 0);
}

#[tokio::test]
async fn test_reexpanding_refetches() {
    let transport = ScriptedTransport::new();
    transport.list(json!(["game::Foo"]));
    let tree = tree_over(&transport);
    let entity = Node::Entity { id: 1 };

    tree.children(Some(&entity)).await;
    tree.children(Some(&entity)).await;

    assert_eq!(transport.count(METHOD_LIST), 2);
}

#[tokio::test]
async fn test_failures_hide_children_by_default() {
    let transport = ScriptedTransport::new();
    transport.fail(METHOD_QUERY, "connection refused");
    let tree = tree_over(&transport);

    assert!(tree.children(None).await.is_empty());
}

#[tokio::test]
async fn test_failures_become_error_leaves_when_enabled() {
    let transport = ScriptedTransport::new();
    transport.fail(METHOD_QUERY, "connection refused");
    transport.fail(METHOD_GET, "timed out");
    let tree = tree_over(&transport).with_show_errors(true);

    let roots = tree.children(None).await;
    let values = tree.children(Some(&component(1, "game::Foo"))).await;

    assert_eq!(roots.len(), 1);
    assert!(tree.tree_item(&roots[0]).label.contains("connection refused"));
    assert_eq!(values.len(), 1);
    assert!(matches!(&values[0], Node::Diagnostic { message } if message.contains("timed out")));
}

#[tokio::test]
async fn test_refetch_is_visible_through_existing_nodes() {
    let transport = ScriptedTransport::new();
    transport.get(json!({ "game::Hp": { "value": 10 } }), json!({}));
    transport.get(json!({ "game::Hp": { "value": 4 } }), json!({}));
    let tree = tree_over(&transport);
    let hp = component(1, "game::Hp");

    let nodes = tree.children(Some(&hp)).await;
    assert_eq!(tree.tree_item(&nodes[0]).description.as_deref(), Some("10"));

    tree.children(Some(&hp)).await;
    assert_eq!(tree.tree_item(&nodes[0]).description.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_refresh_signal() {
    let transport = ScriptedTransport::new();
    let (tx, mut rx) = event_channel();
    let cache = cache_over(&transport).with_events(CacheEventSender::new(tx));
    let tree = InspectorTree::new(Arc::new(cache));

    tree.refresh(Some(Node::Entity { id: 5 }));
    tree.refresh(None);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.stale_node(), Some(Node::Entity { id: 5 }));
    assert_eq!(rx.recv().await.unwrap(), CacheEvent::Refresh { node: None });
}
