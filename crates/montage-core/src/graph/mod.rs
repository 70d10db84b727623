//! The effect node graph.
//!
//! An [`EffectNode`] is either a **leaf**, wrapping one
//! [`EffectPlugin`](crate::EffectPlugin), or a **container** owning child
//! nodes plus a second, internal set of slots that mirror its external ones.
//! The role is fixed when the node is built.
//!
//! # Slots and the internal bridge
//!
//! Declaring an external input on a container also declares the paired
//! internal output (same name, same position); an external output pairs with
//! an internal input. During a render pass a non-root container copies each
//! external input into its paired internal output before rendering its
//! children, then copies each internal input to its paired external output.
//!
//! ```text
//!              ┌──────────── container ─────────────┐
//!   input #0 ──┼─► internal output #0 ──► child ──► internal input #0 ─┼──► output #0
//!              └────────────────────────────────────┘
//! ```
//!
//! # Connection shapes
//!
//! | Method | From | To |
//! |--------|------|----|
//! | [`connect_sibling`](EffectNode::connect_sibling) | external output | external input of a node with the same parent |
//! | [`connect_parent_to_child`](EffectNode::connect_parent_to_child) | internal output | external input of a child |
//! | [`connect_child_to_parent`](EffectNode::connect_child_to_parent) | external output | internal input of the parent |
//! | [`connect_internal_bridge`](EffectNode::connect_internal_bridge) | internal output | internal input of the same node |
//!
//! An output feeds at most one input and an input listens to at most one
//! output. Fan-out goes through an explicit duplication node.
//!
//! # Locking
//!
//! Every node guards its mutable state with its own non-reentrant
//! `parking_lot::RwLock`. Public methods lock once and work on the held state.
//! Each node also carries a process-unique serial; operations that touch two
//! nodes lock them in ascending serial order. A child is always built after
//! its parent, so serial order is tree order, which is also the order in which
//! a render pass locks a container and then its children.

mod children;
mod connect;
mod describe;
mod render;
mod roots;

pub use children::NodeRegistry;
pub use connect::ConnectRequest;
pub use describe::{Edge, NodeDescription, PortRef};
pub use roots::{create_root, delete_root, register_root, root, root_names};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::catalog::{PluginCatalog, PluginTypeId};
use crate::error::{GraphError, GraphResult, Target};
use crate::frame::Frame;
use crate::key::Key;
use crate::plugin::{EffectPlugin, NodeSetup};
use crate::refs::ConnectionRefs;
use crate::slot::{InputSlot, OutputSlot, Scope, Slot, SlotId, SlotRegistry};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Summary of one declared slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInfo {
    /// Slot id.
    pub id: SlotId,
    /// Slot name, if declared with one.
    pub name: Option<String>,
    /// Whether the slot is part of a live connection.
    pub connected: bool,
}

/// One vertex of the effect graph.
pub struct EffectNode {
    serial: u64,
    this: Weak<EffectNode>,
    parent: Weak<EffectNode>,
    instance_id: u32,
    instance_name: String,
    type_id: Option<PluginTypeId>,
    type_name: String,
    catalog: Arc<PluginCatalog>,
    state: RwLock<NodeState>,
}

impl std::fmt::Debug for EffectNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectNode")
            .field("serial", &self.serial)
            .field("instance_id", &self.instance_id)
            .field("instance_name", &self.instance_name)
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

pub(crate) struct NodeState {
    visited: bool,
    inputs: SlotRegistry<InputSlot>,
    outputs: SlotRegistry<OutputSlot>,
    connected_inputs: ConnectionRefs,
    connected_outputs: ConnectionRefs,
    kind: NodeKind,
}

pub(crate) enum NodeKind {
    Leaf(Box<dyn EffectPlugin>),
    Container(Container),
}

pub(crate) struct Container {
    internal_inputs: SlotRegistry<InputSlot>,
    internal_outputs: SlotRegistry<OutputSlot>,
    connected_internal_inputs: ConnectionRefs,
    connected_internal_outputs: ConnectionRefs,
    children: NodeRegistry,
}

impl Container {
    fn new() -> Self {
        Self {
            internal_inputs: SlotRegistry::new(Scope::Internal),
            internal_outputs: SlotRegistry::new(Scope::Internal),
            connected_internal_inputs: ConnectionRefs::new(),
            connected_internal_outputs: ConnectionRefs::new(),
            children: NodeRegistry::new(),
        }
    }
}

/// Mutable view of one slot registry and its connection-reference set.
pub(crate) struct Ports<'a, S> {
    pub slots: &'a mut SlotRegistry<S>,
    pub refs: &'a mut ConnectionRefs,
}

impl NodeState {
    fn new(
        inputs: SlotRegistry<InputSlot>,
        outputs: SlotRegistry<OutputSlot>,
        kind: NodeKind,
    ) -> Self {
        Self {
            visited: false,
            inputs,
            outputs,
            connected_inputs: ConnectionRefs::new(),
            connected_outputs: ConnectionRefs::new(),
            kind,
        }
    }

    pub(crate) fn container(&self) -> Option<&Container> {
        match &self.kind {
            NodeKind::Container(c) => Some(c),
            NodeKind::Leaf(_) => None,
        }
    }

    pub(crate) fn inputs_of(
        &self,
        scope: Scope,
    ) -> Option<(&SlotRegistry<InputSlot>, &ConnectionRefs)> {
        match scope {
            Scope::External => Some((&self.inputs, &self.connected_inputs)),
            Scope::Internal => self
                .container()
                .map(|c| (&c.internal_inputs, &c.connected_internal_inputs)),
        }
    }

    pub(crate) fn outputs_of(
        &self,
        scope: Scope,
    ) -> Option<(&SlotRegistry<OutputSlot>, &ConnectionRefs)> {
        match scope {
            Scope::External => Some((&self.outputs, &self.connected_outputs)),
            Scope::Internal => self
                .container()
                .map(|c| (&c.internal_outputs, &c.connected_internal_outputs)),
        }
    }

    /// Borrow one output side and one input side of this node at once.
    /// `None` marks an internal side requested on a leaf.
    pub(crate) fn split_ports(
        &mut self,
        out_scope: Scope,
        in_scope: Scope,
    ) -> (
        Option<Ports<'_, OutputSlot>>,
        Option<Ports<'_, InputSlot>>,
    ) {
        let NodeState {
            inputs,
            outputs,
            connected_inputs,
            connected_outputs,
            kind,
            ..
        } = self;
        let (internal_out, internal_in) = match kind {
            NodeKind::Container(c) => (
                Some(Ports {
                    slots: &mut c.internal_outputs,
                    refs: &mut c.connected_internal_outputs,
                }),
                Some(Ports {
                    slots: &mut c.internal_inputs,
                    refs: &mut c.connected_internal_inputs,
                }),
            ),
            NodeKind::Leaf(_) => (None, None),
        };
        let out = match out_scope {
            Scope::External => Some(Ports {
                slots: outputs,
                refs: connected_outputs,
            }),
            Scope::Internal => internal_out,
        };
        let input = match in_scope {
            Scope::External => Some(Ports {
                slots: inputs,
                refs: connected_inputs,
            }),
            Scope::Internal => internal_in,
        };
        (out, input)
    }

    pub(crate) fn output_ports(&mut self, scope: Scope) -> Option<Ports<'_, OutputSlot>> {
        self.split_ports(scope, Scope::External).0
    }

    pub(crate) fn input_ports(&mut self, scope: Scope) -> Option<Ports<'_, InputSlot>> {
        self.split_ports(Scope::External, scope).1
    }

    fn has_live_connections(&self) -> bool {
        !self.connected_inputs.is_empty() || !self.connected_outputs.is_empty()
    }
}

pub(crate) fn input_target(scope: Scope) -> Target {
    match scope {
        Scope::External => Target::Input,
        Scope::Internal => Target::InternalInput,
    }
}

pub(crate) fn output_target(scope: Scope) -> Target {
    match scope {
        Scope::External => Target::Output,
        Scope::Internal => Target::InternalOutput,
    }
}

fn slot_infos<S: Slot>(slots: &SlotRegistry<S>) -> Vec<SlotInfo> {
    slots
        .iter()
        .map(|s| SlotInfo {
            id: s.id(),
            name: s.name().map(str::to_owned),
            connected: s.is_connected(),
        })
        .collect()
}

impl EffectNode {
    fn assemble(
        parent: Weak<EffectNode>,
        instance_id: u32,
        instance_name: String,
        type_id: Option<PluginTypeId>,
        type_name: String,
        catalog: Arc<PluginCatalog>,
        state: NodeState,
    ) -> Arc<Self> {
        let serial = NEXT_SERIAL.fetch_add(1, Ordering::Relaxed);
        Arc::new_cyclic(|this| Self {
            serial,
            this: this.clone(),
            parent,
            instance_id,
            instance_name,
            type_id,
            type_name,
            catalog,
            state: RwLock::new(state),
        })
    }

    pub(crate) fn new_container(
        parent: Weak<EffectNode>,
        instance_id: u32,
        instance_name: String,
        catalog: Arc<PluginCatalog>,
    ) -> Arc<Self> {
        let state = NodeState::new(
            SlotRegistry::new(Scope::External),
            SlotRegistry::new(Scope::External),
            NodeKind::Container(Container::new()),
        );
        Self::assemble(
            parent,
            instance_id,
            instance_name,
            None,
            String::new(),
            catalog,
            state,
        )
    }

    /// Build a leaf and let its plugin declare the slots.
    pub(crate) fn new_leaf(
        parent: Weak<EffectNode>,
        instance_id: u32,
        instance_name: String,
        type_id: PluginTypeId,
        type_name: String,
        mut plugin: Box<dyn EffectPlugin>,
        catalog: Arc<PluginCatalog>,
    ) -> GraphResult<Arc<Self>> {
        let mut inputs = SlotRegistry::new(Scope::External);
        let mut outputs = SlotRegistry::new(Scope::External);
        plugin.init(&mut NodeSetup::new(&mut inputs, &mut outputs))?;
        let state = NodeState::new(inputs, outputs, NodeKind::Leaf(plugin));
        Ok(Self::assemble(
            parent,
            instance_id,
            instance_name,
            Some(type_id),
            type_name,
            catalog,
            state,
        ))
    }

    /// Create a detached root container.
    ///
    /// The root is not entered in the process-wide root table; use
    /// [`create_root`] or [`register_root`] for that. Roots carry instance id 0
    /// because they are addressed by name only.
    pub fn new_root(name: &str, catalog: Arc<PluginCatalog>) -> Arc<Self> {
        Self::new_container(Weak::new(), 0, name.to_owned(), catalog)
    }

    /// Process-unique serial, also the lock order between nodes.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Id within the parent's child registry (0 for roots).
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// Name, unique among the parent's children.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Plugin type id, `None` for containers.
    pub fn type_id(&self) -> Option<PluginTypeId> {
        self.type_id
    }

    /// Plugin type name, empty for containers.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The catalog children of this node are instantiated from.
    pub fn catalog(&self) -> &Arc<PluginCatalog> {
        &self.catalog
    }

    /// Returns true if the node wraps a plugin. Typed nodes are always leaves.
    pub fn is_leaf(&self) -> bool {
        self.type_id.is_some()
    }

    /// The owning container, if it is still alive.
    pub fn parent(&self) -> Option<Arc<EffectNode>> {
        self.parent.upgrade()
    }

    /// Returns true if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.upgrade().is_none()
    }

    /// Returns true while the node is marked during a render pass.
    pub fn is_visited(&self) -> bool {
        self.state.read().visited
    }

    /// Parent that still lists this node among its children.
    fn attached_parent(&self) -> GraphResult<Arc<EffectNode>> {
        let parent = self
            .parent
            .upgrade()
            .ok_or_else(|| GraphError::NoParent(self.instance_name.clone()))?;
        if parent.owns(self.serial) {
            Ok(parent)
        } else {
            Err(GraphError::NoParent(self.instance_name.clone()))
        }
    }

    fn leaf_error(&self) -> GraphError {
        GraphError::LeafNode(self.instance_name.clone())
    }

    // --- slot declaration ---

    /// Declare an external input. On a container this also declares the
    /// paired internal output.
    pub fn create_input(&self, name: Option<&str>) -> GraphResult<SlotId> {
        let mut state = self.state.write();
        let NodeState { inputs, kind, .. } = &mut *state;
        let NodeKind::Container(c) = kind else {
            return Err(self.leaf_error());
        };
        let id = inputs.create(name)?;
        if let Err(err) = c.internal_outputs.create(name) {
            inputs.delete(&Key::from(id));
            return Err(err);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(node = %self.instance_name, slot = id.index(), "create_input");
        Ok(id)
    }

    /// Declare an external output. On a container this also declares the
    /// paired internal input.
    pub fn create_output(&self, name: Option<&str>) -> GraphResult<SlotId> {
        let mut state = self.state.write();
        let NodeState { outputs, kind, .. } = &mut *state;
        let NodeKind::Container(c) = kind else {
            return Err(self.leaf_error());
        };
        let id = outputs.create(name)?;
        if let Err(err) = c.internal_inputs.create(name) {
            outputs.delete(&Key::from(id));
            return Err(err);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(node = %self.instance_name, slot = id.index(), "create_output");
        Ok(id)
    }

    /// Remove an external input together with its internal mirror.
    ///
    /// Fails with [`GraphError::SlotInUse`] while either of the two is
    /// connected.
    pub fn delete_input(&self, key: impl Into<Key>) -> GraphResult<()> {
        let key = key.into().validated()?;
        let mut state = self.state.write();
        let NodeState { inputs, kind, .. } = &mut *state;
        let NodeKind::Container(c) = kind else {
            return Err(self.leaf_error());
        };
        let index = inputs
            .position(&key)
            .ok_or_else(|| GraphError::not_found(Target::Input, &key))?;
        if inputs.at(index).is_some_and(Slot::is_connected) {
            return Err(GraphError::SlotInUse {
                target: Target::Input,
                key,
            });
        }
        if let Some(mirror) = c.internal_outputs.at(index)
            && mirror.is_connected()
        {
            return Err(GraphError::SlotInUse {
                target: Target::InternalOutput,
                key: mirror.id().into(),
            });
        }
        inputs.delete_at(index);
        c.internal_outputs.delete_at(index);
        Ok(())
    }

    /// Remove an external output together with its internal mirror.
    pub fn delete_output(&self, key: impl Into<Key>) -> GraphResult<()> {
        let key = key.into().validated()?;
        let mut state = self.state.write();
        let NodeState { outputs, kind, .. } = &mut *state;
        let NodeKind::Container(c) = kind else {
            return Err(self.leaf_error());
        };
        let index = outputs
            .position(&key)
            .ok_or_else(|| GraphError::not_found(Target::Output, &key))?;
        if outputs.at(index).is_some_and(Slot::is_connected) {
            return Err(GraphError::SlotInUse {
                target: Target::Output,
                key,
            });
        }
        if let Some(mirror) = c.internal_inputs.at(index)
            && mirror.is_connected()
        {
            return Err(GraphError::SlotInUse {
                target: Target::InternalInput,
                key: mirror.id().into(),
            });
        }
        outputs.delete_at(index);
        c.internal_inputs.delete_at(index);
        Ok(())
    }

    // --- slot queries ---

    /// Inputs of the given scope in declaration order.
    pub fn inputs(&self, scope: Scope) -> GraphResult<Vec<SlotInfo>> {
        let state = self.state.read();
        let (slots, _) = state.inputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(slot_infos(slots))
    }

    /// Outputs of the given scope in declaration order.
    pub fn outputs(&self, scope: Scope) -> GraphResult<Vec<SlotInfo>> {
        let state = self.state.read();
        let (slots, _) = state.outputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(slot_infos(slots))
    }

    /// Number of external inputs.
    pub fn input_count(&self) -> usize {
        self.state.read().inputs.len()
    }

    /// Number of external outputs.
    pub fn output_count(&self) -> usize {
        self.state.read().outputs.len()
    }

    /// Ids of the connected inputs of the given scope, oldest first.
    pub fn connected_inputs(&self, scope: Scope) -> GraphResult<Vec<SlotId>> {
        let state = self.state.read();
        let (_, refs) = state.inputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(refs.ids().to_vec())
    }

    /// Ids of the connected outputs of the given scope, oldest first.
    pub fn connected_outputs(&self, scope: Scope) -> GraphResult<Vec<SlotId>> {
        let state = self.state.read();
        let (_, refs) = state.outputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(refs.ids().to_vec())
    }

    /// Number of connected inputs of the given scope.
    pub fn connected_input_count(&self, scope: Scope) -> GraphResult<usize> {
        let state = self.state.read();
        let (_, refs) = state.inputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(refs.len())
    }

    /// Number of connected outputs of the given scope.
    pub fn connected_output_count(&self, scope: Scope) -> GraphResult<usize> {
        let state = self.state.read();
        let (_, refs) = state.outputs_of(scope).ok_or_else(|| self.leaf_error())?;
        Ok(refs.len())
    }

    /// Returns true if any external slot is part of a connection.
    pub fn has_live_connections(&self) -> bool {
        self.state.read().has_live_connections()
    }

    /// Latest frame delivered to an external input.
    pub fn input_value(&self, key: impl Into<Key>) -> GraphResult<Option<Frame>> {
        let key = key.into();
        let state = self.state.read();
        state
            .inputs
            .get(&key)
            .map(InputSlot::value)
            .ok_or_else(|| GraphError::not_found(Target::Input, key))
    }

    /// Latest frame emitted on an external output.
    pub fn output_value(&self, key: impl Into<Key>) -> GraphResult<Option<Frame>> {
        let key = key.into();
        let state = self.state.read();
        state
            .outputs
            .get(&key)
            .map(|s| s.last_value().cloned())
            .ok_or_else(|| GraphError::not_found(Target::Output, key))
    }
}
