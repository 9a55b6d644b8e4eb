//! Smoke test against a running app with the remote plugin enabled
//!
//! Uses the endpoint from .inspector.toml / BEVY_REMOTE_URL / BEVY_REMOTE_PORT.

use std::sync::Arc;

use bevy_inspector::{InspectorConfig, InspectorTree, Node, RemoteCache};

#[tokio::test]
#[ignore = "integration test - requires a running app with the remote plugin"]
async fn live_walk_first_root() {
    let config = InspectorConfig::load().expect("Failed to load config");
    let cache = Arc::new(RemoteCache::connect(&config).expect("Failed to build transport"));
    let tree = InspectorTree::new(cache.clone()).with_show_errors(true);

    let roots = tree.children(None).await;
    assert!(!roots.is_empty(), "expected at least one root entity");
    assert!(
        roots.iter().all(|n| matches!(n, Node::Entity { .. })),
        "listing failed: {:?}",
        roots
    );

    let components = tree.children(Some(&roots[0])).await;
    for node in &components {
        let item = tree.tree_item(node);
        println!("{} ({:?})", item.label, item.description);
    }
    assert!(!cache.is_empty());
}
