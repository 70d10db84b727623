//! Id-independent snapshots of a subtree.
//!
//! [`NodeDescription`] records names, slot names and connection topology by
//! declaration position, never by id, so a graph rebuilt from a description
//! describes itself identically even though every id is fresh.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{EffectNode, NodeState};
use crate::catalog::PluginCatalog;
use crate::error::{GraphError, GraphResult};
use crate::key::Key;
use crate::slot::{Endpoint, OutputSlot, Scope, Slot};

/// One end of an [`Edge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Child name, or `None` for the described container itself (its
    /// internal slots).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// Declaration position of the slot.
    pub port: usize,
}

impl PortRef {
    /// Port of a named child.
    pub fn child(node: &str, port: usize) -> Self {
        Self {
            node: Some(node.to_owned()),
            port,
        }
    }

    /// Internal port of the container itself.
    pub fn container(port: usize) -> Self {
        Self { node: None, port }
    }
}

/// A connection inside a container, from an output to an input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Output side.
    pub from: PortRef,
    /// Input side.
    pub to: PortRef,
}

/// Snapshot of a node and its subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Instance name.
    pub name: String,
    /// Plugin type for leaves, absent for containers.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub type_name: Option<String>,
    /// External input names in declaration order; empty for unnamed slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// External output names in declaration order; empty for unnamed slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    /// Children in creation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescription>,
    /// Connections owned by this container, in connection order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<Edge>,
}

impl NodeDescription {
    /// Child description by name.
    pub fn child(&self, name: &str) -> Option<&NodeDescription> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Number of nodes in the subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

fn names<'a, S: Slot + 'a>(slots: impl Iterator<Item = &'a S>) -> Vec<String> {
    slots
        .map(|s| s.name().unwrap_or_default().to_owned())
        .collect()
}

impl EffectNode {
    /// Enumerate this node, its slots, its children and the connections
    /// between them.
    pub fn describe(&self) -> NodeDescription {
        let state = self.state.read();
        let mut desc = NodeDescription {
            name: self.instance_name.clone(),
            type_name: self.type_id.map(|_| self.type_name.clone()),
            inputs: names(state.inputs.iter()),
            outputs: names(state.outputs.iter()),
            children: Vec::new(),
            edges: Vec::new(),
        };
        let Some(c) = state.container() else {
            return desc;
        };

        desc.children = c.children.iter().map(|child| child.describe()).collect();

        for &id in c.connected_internal_outputs.ids() {
            let Some(port) = c.internal_outputs.position_of(id) else {
                continue;
            };
            let Some(link) = c.internal_outputs.by_id(id).and_then(OutputSlot::link) else {
                continue;
            };
            if let Some(to) = self.port_of(&state, &link.target) {
                desc.edges.push(Edge {
                    from: PortRef::container(port),
                    to,
                });
            }
        }

        for child in c.children.iter() {
            // Collect first: the child lock must be released before any
            // sibling is locked.
            let links: Vec<(usize, Endpoint)> = {
                let cs = child.state.read();
                cs.connected_outputs
                    .ids()
                    .iter()
                    .filter_map(|&id| {
                        let port = cs.outputs.position_of(id)?;
                        let link = cs.outputs.by_id(id)?.link()?;
                        Some((port, link.target.clone()))
                    })
                    .collect()
            };
            for (port, target) in links {
                if let Some(to) = self.port_of(&state, &target) {
                    desc.edges.push(Edge {
                        from: PortRef::child(&child.instance_name, port),
                        to,
                    });
                }
            }
        }
        desc
    }

    /// Position of an input endpoint, relative to this container.
    fn port_of(&self, state: &NodeState, target: &Endpoint) -> Option<PortRef> {
        if target.serial == self.serial {
            let (slots, _) = state.inputs_of(target.scope)?;
            return Some(PortRef::container(slots.position_of(target.slot)?));
        }
        let node = target.node.upgrade()?;
        let port = node.state.read().inputs.position_of(target.slot)?;
        Some(PortRef::child(&node.instance_name, port))
    }

    /// Rebuild a child (and its subtree) from a description.
    ///
    /// A failure part-way removes whatever was already built.
    pub fn build_child(&self, desc: &NodeDescription) -> GraphResult<Arc<EffectNode>> {
        match &desc.type_name {
            Some(node_type) => {
                if !desc.children.is_empty() || !desc.edges.is_empty() {
                    return Err(GraphError::Malformed(
                        "a typed node cannot own children or edges",
                    ));
                }
                self.create_child(node_type.as_str(), Some(&desc.name))
            }
            None => {
                let child = self.create_empty_child(Some(&desc.name))?;
                if let Err(err) = child.populate(desc) {
                    if let Err(_cleanup) = self.force_delete_child(child.instance_id) {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            parent = %self.instance_name,
                            child = %child.instance_name,
                            error = %_cleanup,
                            "failed to remove partially built child"
                        );
                    }
                    return Err(err);
                }
                Ok(child)
            }
        }
    }

    /// Build a detached root from a description. Register it with
    /// [`register_root`](super::register_root) to make it globally visible.
    pub fn root_from_description(
        desc: &NodeDescription,
        catalog: Arc<PluginCatalog>,
    ) -> GraphResult<Arc<EffectNode>> {
        if desc.type_name.is_some() {
            return Err(GraphError::Malformed("a root graph must be a container"));
        }
        if desc.name.is_empty() {
            return Err(GraphError::Malformed("root names must not be empty"));
        }
        let root = EffectNode::new_root(&desc.name, catalog);
        root.populate(desc)?;
        Ok(root)
    }

    fn populate(&self, desc: &NodeDescription) -> GraphResult<()> {
        for name in &desc.inputs {
            self.create_input(Some(name))?;
        }
        for name in &desc.outputs {
            self.create_output(Some(name))?;
        }
        for child in &desc.children {
            self.build_child(child)?;
        }
        for edge in &desc.edges {
            self.connect_edge(edge)?;
        }
        Ok(())
    }

    fn connect_edge(&self, edge: &Edge) -> GraphResult<()> {
        let (out_node, out_scope) = self.edge_end(&edge.from)?;
        let (in_node, in_scope) = self.edge_end(&edge.to)?;

        let out_id = {
            let state = out_node.state.read();
            let (slots, _) = state.outputs_of(out_scope).ok_or_else(|| out_node.leaf_error())?;
            slots
                .at(edge.from.port)
                .map(Slot::id)
                .ok_or(GraphError::Malformed("edge starts at an undeclared output"))?
        };
        let in_id = {
            let state = in_node.state.read();
            let (slots, _) = state.inputs_of(in_scope).ok_or_else(|| in_node.leaf_error())?;
            slots
                .at(edge.to.port)
                .map(Slot::id)
                .ok_or(GraphError::Malformed("edge ends at an undeclared input"))?
        };
        super::connect::link(
            &out_node,
            out_scope,
            &Key::from(out_id),
            &in_node,
            in_scope,
            &Key::from(in_id),
        )
    }

    /// The node and slot scope an edge end refers to.
    fn edge_end(&self, port: &PortRef) -> GraphResult<(Arc<EffectNode>, Scope)> {
        match &port.node {
            None => {
                let this = self
                    .this
                    .upgrade()
                    .ok_or_else(|| GraphError::NoParent(self.instance_name.clone()))?;
                Ok((this, Scope::Internal))
            }
            Some(name) => Ok((self.child(name.as_str())?, Scope::External)),
        }
    }
}
