//! Child registry and the structural operations of containers.

use std::sync::Arc;

use super::{EffectNode, NodeKind};
use crate::catalog::PluginTypeId;
use crate::error::{GraphError, GraphResult, Target};
use crate::key::Key;
use crate::slot::Scope;

/// Children of one container, indexed by instance id and instance name.
///
/// Instance ids start at 1 and are never reused within a container.
#[derive(Debug)]
pub struct NodeRegistry {
    children: Vec<Arc<EffectNode>>,
    next_id: u32,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            next_id: 1,
        }
    }

    /// Child matching `key`.
    pub fn get(&self, key: &Key) -> Option<&Arc<EffectNode>> {
        self.children
            .iter()
            .find(|c| key.matches(c.instance_id, Some(&c.instance_name)))
    }

    /// Returns true if a child already uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.instance_name == name)
    }

    pub(crate) fn contains_serial(&self, serial: u64) -> bool {
        self.children.iter().any(|c| c.serial == serial)
    }

    /// Children in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EffectNode>> {
        self.children.iter()
    }

    /// Child instance ids in creation order.
    pub fn ids(&self) -> Vec<u32> {
        self.children.iter().map(|c| c.instance_id).collect()
    }

    /// Child instance names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|c| c.instance_name.clone())
            .collect()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the container has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Pick the id and name for the next child.
    ///
    /// A missing name becomes `<base>_<id>`, bumped until it is free.
    fn reserve(&self, name: Option<&str>, base: &str) -> GraphResult<(u32, String)> {
        let id = self.next_id;
        match name.filter(|n| !n.is_empty()) {
            Some(name) if self.contains_name(name) => {
                Err(GraphError::DuplicateName(name.to_owned()))
            }
            Some(name) => Ok((id, name.to_owned())),
            None => {
                let mut n = id;
                let mut candidate = format!("{base}_{n}");
                while self.contains_name(&candidate) {
                    n += 1;
                    candidate = format!("{base}_{n}");
                }
                Ok((id, candidate))
            }
        }
    }

    fn insert(&mut self, node: Arc<EffectNode>) {
        self.next_id = node.instance_id + 1;
        self.children.push(node);
    }

    fn remove(&mut self, serial: u64) -> Option<Arc<EffectNode>> {
        let index = self.children.iter().position(|c| c.serial == serial)?;
        Some(self.children.remove(index))
    }
}

impl EffectNode {
    pub(super) fn owns(&self, serial: u64) -> bool {
        self.state
            .read()
            .container()
            .is_some_and(|c| c.children.contains_serial(serial))
    }

    /// Create a typeless container child.
    ///
    /// Without a name the child is called `group_<id>`.
    pub fn create_empty_child(&self, name: Option<&str>) -> GraphResult<Arc<EffectNode>> {
        let mut state = self.state.write();
        let NodeKind::Container(c) = &mut state.kind else {
            return Err(self.leaf_error());
        };
        let (id, name) = c.children.reserve(name, "group")?;
        let child = EffectNode::new_container(
            self.this.clone(),
            id,
            name,
            Arc::clone(&self.catalog),
        );
        c.children.insert(Arc::clone(&child));
        #[cfg(feature = "tracing")]
        tracing::debug!(parent = %self.instance_name, child = %child.instance_name, "create_empty_child");
        Ok(child)
    }

    /// Instantiate a leaf child of a registered type.
    ///
    /// Without a name the child is called `<type name>_<id>`.
    pub fn create_child(
        &self,
        node_type: impl Into<Key>,
        name: Option<&str>,
    ) -> GraphResult<Arc<EffectNode>> {
        let node_type = node_type.into().validated()?;
        let mut state = self.state.write();
        let NodeKind::Container(c) = &mut state.kind else {
            return Err(self.leaf_error());
        };
        let (type_id, type_name, plugin) = self.catalog.instantiate(&node_type)?;
        let (id, name) = c.children.reserve(name, &type_name)?;
        let child = EffectNode::new_leaf(
            self.this.clone(),
            id,
            name,
            type_id,
            type_name,
            plugin,
            Arc::clone(&self.catalog),
        )?;
        c.children.insert(Arc::clone(&child));
        #[cfg(feature = "tracing")]
        tracing::debug!(parent = %self.instance_name, child = %child.instance_name, kind = %child.type_name, "create_child");
        Ok(child)
    }

    /// Delete a child that has no live connections.
    ///
    /// Edges between the child's own descendants go with it. Returns the
    /// detached child; it stays usable as long as the caller holds it but
    /// can no longer connect to its former siblings.
    pub fn delete_child(&self, key: impl Into<Key>) -> GraphResult<Arc<EffectNode>> {
        let key = key.into().validated()?;
        let mut state = self.state.write();
        let NodeKind::Container(c) = &mut state.kind else {
            return Err(self.leaf_error());
        };
        let child = c
            .children
            .get(&key)
            .cloned()
            .ok_or_else(|| GraphError::not_found(Target::Child, &key))?;
        if child.state.read().has_live_connections() {
            return Err(GraphError::ChildConnected(child.instance_name.clone()));
        }
        c.children.remove(child.serial);
        #[cfg(feature = "tracing")]
        tracing::debug!(parent = %self.instance_name, child = %child.instance_name, "delete_child");
        Ok(child)
    }

    /// Disconnect every edge touching a child, then delete it.
    pub fn force_delete_child(&self, key: impl Into<Key>) -> GraphResult<Arc<EffectNode>> {
        let key = key.into().validated()?;
        let child = self.child(&key)?;

        let (outputs, sources) = {
            let state = child.state.read();
            let outputs = state.connected_outputs.ids().to_vec();
            let sources: Vec<_> = state
                .connected_inputs
                .ids()
                .iter()
                .filter_map(|&id| state.inputs.by_id(id)?.source().cloned())
                .collect();
            (outputs, sources)
        };

        for id in outputs {
            tolerate_race(child.unlink(Scope::External, &Key::from(id)))?;
        }
        for source in sources {
            if let Some(node) = source.node.upgrade() {
                tolerate_race(node.unlink(source.scope, &Key::from(source.slot)))?;
            }
        }
        self.delete_child(key)
    }

    /// Child matching `key`.
    pub fn child(&self, key: impl Into<Key>) -> GraphResult<Arc<EffectNode>> {
        let key = key.into().validated()?;
        let state = self.state.read();
        let c = state.container().ok_or_else(|| self.leaf_error())?;
        c.children
            .get(&key)
            .cloned()
            .ok_or_else(|| GraphError::not_found(Target::Child, key))
    }

    /// Children in creation order. Empty for leaves.
    pub fn children(&self) -> Vec<Arc<EffectNode>> {
        self.state
            .read()
            .container()
            .map(|c| c.children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Child instance ids in creation order.
    pub fn child_ids(&self) -> Vec<u32> {
        self.state
            .read()
            .container()
            .map(|c| c.children.ids())
            .unwrap_or_default()
    }

    /// Child instance names in creation order.
    pub fn child_names(&self) -> Vec<String> {
        self.state
            .read()
            .container()
            .map(|c| c.children.names())
            .unwrap_or_default()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.state
            .read()
            .container()
            .map_or(0, |c| c.children.len())
    }

    /// Ids of the types this node can instantiate.
    pub fn type_ids(&self) -> Vec<PluginTypeId> {
        self.catalog.type_ids()
    }

    /// Names of the types this node can instantiate.
    pub fn type_names(&self) -> Vec<String> {
        self.catalog.type_names()
    }

    /// Type name for a type id.
    pub fn type_name_of(&self, id: PluginTypeId) -> Option<&str> {
        self.catalog.type_name_of(id)
    }

    /// Type id for a type name.
    pub fn type_id_of(&self, name: &str) -> Option<PluginTypeId> {
        self.catalog.type_id_of(name)
    }
}

/// An edge removed by another thread in the meantime is fine here.
fn tolerate_race(result: GraphResult<()>) -> GraphResult<()> {
    match result {
        Err(GraphError::NotConnected { .. } | GraphError::Contended { .. }) => Ok(()),
        other => other,
    }
}
