//! Connection protocol.
//!
//! Every connect call resolves its endpoints to concrete slots before touching
//! any of them. Only when both slots exist and are free does the output adopt
//! the input, after which both connection-reference sets are updated. All of
//! this happens while both nodes are write-locked, so no observer ever sees a
//! connection recorded on one side only.

use std::sync::Arc;

use parking_lot::RwLockWriteGuard;

use super::{EffectNode, NodeState, Ports, input_target, output_target};
use crate::error::{GraphError, GraphResult};
use crate::key::Key;
use crate::slot::{Endpoint, InputSlot, Link, OutputSlot, Scope, Slot};

/// Connection request in primitive form.
///
/// Each endpoint is given by id or by name, never both. `output_scope` and
/// `input_scope` pick the connection shape:
///
/// | output | input | shape | target node |
/// |--------|-------|-------|-------------|
/// | external | external | sibling | required (a child of this node's parent) |
/// | internal | external | parent to child | required (a child of this node) |
/// | external | internal | child to parent | must be absent |
/// | internal | internal | internal bridge | must be absent |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Output slot id.
    pub output_id: Option<u32>,
    /// Output slot name.
    pub output_name: Option<String>,
    /// Scope of the output slot on this node.
    pub output_scope: Scope,
    /// Target node id.
    pub node_id: Option<u32>,
    /// Target node name.
    pub node_name: Option<String>,
    /// Input slot id.
    pub input_id: Option<u32>,
    /// Input slot name.
    pub input_name: Option<String>,
    /// Scope of the input slot on the target node.
    pub input_scope: Scope,
}

/// Write guards over the two ends of a connection, taken in serial order.
enum PairGuard<'a> {
    Same(RwLockWriteGuard<'a, NodeState>),
    Split {
        out: RwLockWriteGuard<'a, NodeState>,
        input: RwLockWriteGuard<'a, NodeState>,
    },
}

impl<'a> PairGuard<'a> {
    fn lock(out: &'a EffectNode, input: &'a EffectNode) -> Self {
        if out.serial == input.serial {
            Self::Same(out.state.write())
        } else if out.serial < input.serial {
            let out = out.state.write();
            let input = input.state.write();
            Self::Split { out, input }
        } else {
            let input = input.state.write();
            let out = out.state.write();
            Self::Split { out, input }
        }
    }

    fn ports(
        &mut self,
        out_scope: Scope,
        in_scope: Scope,
    ) -> (
        Option<Ports<'_, OutputSlot>>,
        Option<Ports<'_, InputSlot>>,
    ) {
        match self {
            Self::Same(state) => state.split_ports(out_scope, in_scope),
            Self::Split { out, input } => {
                (out.output_ports(out_scope), input.input_ports(in_scope))
            }
        }
    }
}

fn optional_key(id: Option<u32>, name: Option<&str>) -> GraphResult<Option<Key>> {
    let id = id.filter(|&id| id != 0);
    let name = name.filter(|n| !n.is_empty());
    if id.is_none() && name.is_none() {
        Ok(None)
    } else {
        Key::from_parts(id, name).map(Some)
    }
}

impl EffectNode {
    /// Connect an external output of this node to an external input of a
    /// node with the same parent (this node included).
    pub fn connect_sibling(
        &self,
        output: impl Into<Key>,
        node: impl Into<Key>,
        input: impl Into<Key>,
    ) -> GraphResult<()> {
        let output = output.into().validated()?;
        let node = node.into().validated()?;
        let input = input.into().validated()?;
        let parent = self.attached_parent()?;
        let target = parent.child(node)?;
        link(self, Scope::External, &output, &target, Scope::External, &input)
    }

    /// Connect an internal output of this container to an external input of
    /// one of its children.
    pub fn connect_parent_to_child(
        &self,
        internal_output: impl Into<Key>,
        node: impl Into<Key>,
        input: impl Into<Key>,
    ) -> GraphResult<()> {
        let output = internal_output.into().validated()?;
        let node = node.into().validated()?;
        let input = input.into().validated()?;
        let target = self.child(node)?;
        link(self, Scope::Internal, &output, &target, Scope::External, &input)
    }

    /// Connect an external output of this node to an internal input of its
    /// parent.
    pub fn connect_child_to_parent(
        &self,
        output: impl Into<Key>,
        internal_input: impl Into<Key>,
    ) -> GraphResult<()> {
        let output = output.into().validated()?;
        let input = internal_input.into().validated()?;
        let parent = self.attached_parent()?;
        link(self, Scope::External, &output, &parent, Scope::Internal, &input)
    }

    /// Connect an internal output of this container straight to one of its
    /// internal inputs.
    pub fn connect_internal_bridge(
        &self,
        internal_output: impl Into<Key>,
        internal_input: impl Into<Key>,
    ) -> GraphResult<()> {
        let output = internal_output.into().validated()?;
        let input = internal_input.into().validated()?;
        link(self, Scope::Internal, &output, self, Scope::Internal, &input)
    }

    /// Connect from a primitive request. See [`ConnectRequest`] for the
    /// accepted shapes.
    pub fn connect(&self, request: &ConnectRequest) -> GraphResult<()> {
        let output = Key::from_parts(request.output_id, request.output_name.as_deref())?;
        let input = Key::from_parts(request.input_id, request.input_name.as_deref())?;
        let node = optional_key(request.node_id, request.node_name.as_deref())?;

        match (request.output_scope, request.input_scope, node) {
            (Scope::External, Scope::External, Some(node)) => {
                self.connect_sibling(output, node, input)
            }
            (Scope::Internal, Scope::External, Some(node)) => {
                self.connect_parent_to_child(output, node, input)
            }
            (Scope::External, Scope::Internal, None) => self.connect_child_to_parent(output, input),
            (Scope::Internal, Scope::Internal, None) => self.connect_internal_bridge(output, input),
            (_, Scope::External, None) => Err(GraphError::Malformed(
                "neither a node id nor a node name was supplied",
            )),
            (_, Scope::Internal, Some(_)) => Err(GraphError::Malformed(
                "internal inputs belong to a fixed node; no target node is accepted",
            )),
        }
    }

    /// Disconnect an external output from whatever input it feeds.
    pub fn disconnect_output(&self, output: impl Into<Key>) -> GraphResult<()> {
        let output = output.into().validated()?;
        self.unlink(Scope::External, &output)
    }

    /// Disconnect an internal output from whatever input it feeds.
    pub fn disconnect_internal_output(&self, internal_output: impl Into<Key>) -> GraphResult<()> {
        let output = internal_output.into().validated()?;
        self.unlink(Scope::Internal, &output)
    }

    /// Tear down the connection leaving the output `key` of `scope`.
    ///
    /// The destination is read under a shared lock, then both ends are
    /// write-locked in serial order and the link is checked again before
    /// anything is cleared.
    pub(super) fn unlink(&self, scope: Scope, key: &Key) -> GraphResult<()> {
        let target = output_target(scope);
        let (out_id, dest) = {
            let state = self.state.read();
            let (slots, _) = state.outputs_of(scope).ok_or_else(|| self.leaf_error())?;
            let slot = slots
                .get(key)
                .ok_or_else(|| GraphError::not_found(target, key))?;
            let link = slot.link().ok_or_else(|| GraphError::NotConnected {
                target,
                key: key.clone(),
            })?;
            (slot.id(), link.target.clone())
        };
        let contended = || GraphError::Contended {
            target,
            key: key.clone(),
        };

        let Some(dest_node) = dest.node.upgrade() else {
            // The destination is gone; only this side is left to clear.
            let mut state = self.state.write();
            let Ports { slots, refs } = state.output_ports(scope).ok_or_else(contended)?;
            let slot = slots.by_id_mut(out_id).ok_or_else(contended)?;
            if !slot.link().is_some_and(|l| l.target.same_as(&dest)) {
                return Err(contended());
            }
            refs.remove(out_id);
            slot.release();
            return Ok(());
        };

        let mut guard = PairGuard::lock(self, &dest_node);
        let (Some(out), Some(input)) = guard.ports(scope, dest.scope) else {
            return Err(contended());
        };
        let Ports {
            slots: out_slots,
            refs: out_refs,
        } = out;
        let Ports {
            slots: in_slots,
            refs: in_refs,
        } = input;
        let out_slot = out_slots.by_id_mut(out_id).ok_or_else(contended)?;
        if !out_slot.link().is_some_and(|l| l.target.same_as(&dest)) {
            return Err(contended());
        }

        out_refs.remove(out_id);
        in_refs.remove(dest.slot);
        if let Some(in_slot) = in_slots.by_id_mut(dest.slot) {
            in_slot.clear_source();
        }
        out_slot.release();

        #[cfg(feature = "tracing")]
        tracing::debug!(node = %self.instance_name, output = %key, "disconnect");
        Ok(())
    }
}

/// Resolve both slots under the pair lock and join them.
pub(super) fn link(
    out_node: &EffectNode,
    out_scope: Scope,
    out_key: &Key,
    in_node: &EffectNode,
    in_scope: Scope,
    in_key: &Key,
) -> GraphResult<()> {
    let out_target = output_target(out_scope);
    let in_target = input_target(in_scope);

    let mut guard = PairGuard::lock(out_node, in_node);
    let (out, input) = guard.ports(out_scope, in_scope);
    let Ports {
        slots: out_slots,
        refs: out_refs,
    } = out.ok_or_else(|| out_node.leaf_error())?;
    let Ports {
        slots: in_slots,
        refs: in_refs,
    } = input.ok_or_else(|| in_node.leaf_error())?;

    let out_slot = out_slots
        .get_mut(out_key)
        .ok_or_else(|| GraphError::not_found(out_target, out_key))?;
    let in_slot = in_slots
        .get_mut(in_key)
        .ok_or_else(|| GraphError::not_found(in_target, in_key))?;
    if out_slot.is_connected() {
        return Err(GraphError::AlreadyConnected {
            target: out_target,
            key: out_key.clone(),
        });
    }
    if in_slot.is_connected() {
        return Err(GraphError::AlreadyConnected {
            target: in_target,
            key: in_key.clone(),
        });
    }

    let out_id = out_slot.id();
    let in_id = in_slot.id();
    let adopted = out_slot.adopt(Link {
        target: Endpoint {
            node: in_node.this.clone(),
            serial: in_node.serial,
            slot: in_id,
            scope: in_scope,
        },
        cell: Arc::clone(in_slot.cell()),
    });
    if !adopted {
        return Err(GraphError::AlreadyConnected {
            target: out_target,
            key: out_key.clone(),
        });
    }
    in_slot.set_source(Endpoint {
        node: out_node.this.clone(),
        serial: out_node.serial,
        slot: out_id,
        scope: out_scope,
    });
    out_refs.add(out_id);
    in_refs.add(in_id);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        from = %out_node.instance_name,
        output = out_id.index(),
        to = %in_node.instance_name,
        input = in_id.index(),
        "connect"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PluginCatalog;
    use crate::error::Target;
    use crate::plugin::{EffectPlugin, NodeSetup, RenderContext};

    struct Through;

    impl EffectPlugin for Through {
        fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
            setup.add_input("in")?;
            setup.add_output("out")?;
            Ok(())
        }

        fn render(&mut self, ctx: &mut RenderContext<'_>) {
            if let Some(frame) = ctx.input("in") {
                ctx.emit("out", frame);
            }
        }
    }

    fn root() -> Arc<EffectNode> {
        let mut catalog = PluginCatalog::new();
        catalog.register("through", "passes frames", || Through).unwrap();
        EffectNode::new_root("root", Arc::new(catalog))
    }

    #[test]
    fn sibling_connect_records_both_sides() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        let b = root.create_child("through", Some("b")).unwrap();

        a.connect_sibling("out", "b", "in").unwrap();
        assert_eq!(a.connected_output_count(Scope::External).unwrap(), 1);
        assert_eq!(b.connected_input_count(Scope::External).unwrap(), 1);
        assert!(a.outputs(Scope::External).unwrap()[0].connected);
    }

    #[test]
    fn busy_output_rejects_second_target() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        let b = root.create_child("through", Some("b")).unwrap();
        let c = root.create_child("through", Some("c")).unwrap();

        a.connect_sibling("out", "b", "in").unwrap();
        let err = a.connect_sibling("out", "c", "in").unwrap_err();
        assert!(matches!(
            err,
            GraphError::AlreadyConnected {
                target: Target::Output,
                ..
            }
        ));
        assert_eq!(b.connected_input_count(Scope::External).unwrap(), 1);
        assert_eq!(c.connected_input_count(Scope::External).unwrap(), 0);
    }

    #[test]
    fn busy_input_rejects_second_source() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        let b = root.create_child("through", Some("b")).unwrap();
        root.create_child("through", Some("c")).unwrap();

        a.connect_sibling("out", "c", "in").unwrap();
        let err = b.connect_sibling("out", "c", "in").unwrap_err();
        assert!(matches!(
            err,
            GraphError::AlreadyConnected {
                target: Target::Input,
                ..
            }
        ));
        assert_eq!(b.connected_output_count(Scope::External).unwrap(), 0);
    }

    #[test]
    fn lookup_failure_touches_nothing() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        let b = root.create_child("through", Some("b")).unwrap();

        assert!(a.connect_sibling("out", "b", "nope").unwrap_err().is_not_found());
        assert!(a.connect_sibling("out", "zz", "in").unwrap_err().is_not_found());
        assert!(a.connect_sibling("nope", "b", "in").unwrap_err().is_not_found());
        assert_eq!(a.connected_output_count(Scope::External).unwrap(), 0);
        assert_eq!(b.connected_input_count(Scope::External).unwrap(), 0);
    }

    #[test]
    fn self_loop_is_a_sibling_connection() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        a.connect_sibling("out", "a", "in").unwrap();
        assert_eq!(a.connected_input_count(Scope::External).unwrap(), 1);
        a.disconnect_output("out").unwrap();
        assert_eq!(a.connected_input_count(Scope::External).unwrap(), 0);
    }

    #[test]
    fn root_has_no_siblings() {
        let root = root();
        root.create_output(Some("out")).unwrap();
        assert!(matches!(
            root.connect_sibling("out", "root", "in"),
            Err(GraphError::NoParent(_))
        ));
    }

    #[test]
    fn parent_child_and_bridge_shapes() {
        let root = root();
        let group = root.create_empty_child(Some("group")).unwrap();
        group.create_input(Some("src")).unwrap();
        group.create_output(Some("dst")).unwrap();
        let inner = group.create_child("through", Some("inner")).unwrap();

        group.connect_parent_to_child("src", "inner", "in").unwrap();
        inner.connect_child_to_parent("out", "dst").unwrap();
        assert_eq!(group.connected_output_count(Scope::Internal).unwrap(), 1);
        assert_eq!(group.connected_input_count(Scope::Internal).unwrap(), 1);

        group.disconnect_internal_output("src").unwrap();
        inner.disconnect_output("out").unwrap();
        group.connect_internal_bridge("src", "dst").unwrap();
        assert_eq!(group.connected_input_count(Scope::Internal).unwrap(), 1);
        assert_eq!(inner.connected_input_count(Scope::External).unwrap(), 0);
    }

    #[test]
    fn leaf_has_no_internal_side() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        assert!(matches!(
            a.connect_internal_bridge("out", "in"),
            Err(GraphError::LeafNode(_))
        ));
        assert!(matches!(
            a.disconnect_internal_output("out"),
            Err(GraphError::LeafNode(_))
        ));
    }

    #[test]
    fn request_validation() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        root.create_child("through", Some("b")).unwrap();

        let both = ConnectRequest {
            output_id: Some(1),
            output_name: Some("out".into()),
            node_name: Some("b".into()),
            input_name: Some("in".into()),
            ..ConnectRequest::default()
        };
        assert!(matches!(a.connect(&both), Err(GraphError::Malformed(_))));

        let no_node = ConnectRequest {
            output_name: Some("out".into()),
            input_name: Some("in".into()),
            ..ConnectRequest::default()
        };
        assert!(matches!(a.connect(&no_node), Err(GraphError::Malformed(_))));

        let ok = ConnectRequest {
            output_id: Some(1),
            node_name: Some("b".into()),
            input_name: Some("in".into()),
            ..ConnectRequest::default()
        };
        a.connect(&ok).unwrap();
        assert_eq!(a.connected_output_count(Scope::External).unwrap(), 1);
    }

    #[test]
    fn disconnect_twice_fails() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        root.create_child("through", Some("b")).unwrap();
        a.connect_sibling("out", "b", "in").unwrap();

        a.disconnect_output("out").unwrap();
        assert!(matches!(
            a.disconnect_output("out"),
            Err(GraphError::NotConnected { .. })
        ));
    }

    #[test]
    fn deleted_child_cannot_reach_former_siblings() {
        let root = root();
        let a = root.create_child("through", Some("a")).unwrap();
        root.create_child("through", Some("b")).unwrap();
        root.delete_child("a").unwrap();
        assert!(matches!(
            a.connect_sibling("out", "b", "in"),
            Err(GraphError::NoParent(_))
        ));
    }
}
