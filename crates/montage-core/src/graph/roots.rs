//! Process-wide table of named root graphs.
//!
//! The table has its own lock, separate from every node lock, so looking up or
//! registering a root never waits on a render pass.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::EffectNode;
use crate::catalog::PluginCatalog;
use crate::error::{GraphError, GraphResult, Target};

static ROOTS: LazyLock<RwLock<BTreeMap<String, Arc<EffectNode>>>> =
    LazyLock::new(|| RwLock::new(BTreeMap::new()));

/// Create an empty root container and register it under `name`.
pub fn create_root(name: &str, catalog: Arc<PluginCatalog>) -> GraphResult<Arc<EffectNode>> {
    if name.is_empty() {
        return Err(GraphError::Malformed("root names must not be empty"));
    }
    let mut roots = ROOTS.write();
    if roots.contains_key(name) {
        return Err(GraphError::DuplicateName(name.to_owned()));
    }
    let node = EffectNode::new_root(name, catalog);
    roots.insert(name.to_owned(), Arc::clone(&node));
    #[cfg(feature = "tracing")]
    tracing::debug!(root = name, "create_root");
    Ok(node)
}

/// Register an already built root under its instance name.
pub fn register_root(node: Arc<EffectNode>) -> GraphResult<()> {
    if !node.is_root() {
        return Err(GraphError::Malformed("only parentless nodes can be roots"));
    }
    if node.is_leaf() {
        return Err(GraphError::LeafNode(node.instance_name().to_owned()));
    }
    let mut roots = ROOTS.write();
    if roots.contains_key(node.instance_name()) {
        return Err(GraphError::DuplicateName(node.instance_name().to_owned()));
    }
    roots.insert(node.instance_name().to_owned(), node);
    Ok(())
}

/// Remove a root from the table and return it.
pub fn delete_root(name: &str) -> GraphResult<Arc<EffectNode>> {
    ROOTS
        .write()
        .remove(name)
        .ok_or_else(|| GraphError::not_found(Target::Root, name))
}

/// Look up a root by name.
pub fn root(name: &str) -> GraphResult<Arc<EffectNode>> {
    ROOTS
        .read()
        .get(name)
        .cloned()
        .ok_or_else(|| GraphError::not_found(Target::Root, name))
}

/// Names of every registered root, sorted.
pub fn root_names() -> Vec<String> {
    ROOTS.read().keys().cloned().collect()
}
