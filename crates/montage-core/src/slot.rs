//! Slots and the per-node slot registries.
//!
//! An [`OutputSlot`] holds at most one [`Link`] to an [`InputSlot`]; an input
//! records at most one source. Values cross a link when the owning node emits:
//! the output stores its frame and copies it into the connected input's value
//! cell. The cell is shared (`Arc`) so the copy never needs the destination
//! node's lock.
//!
//! A [`SlotRegistry`] owns the slots of one direction and scope for one node.
//! Ids are assigned from 1 and never reused, so a stored id stays a valid,
//! collision-free handle after deletions. Declaration order is preserved; the
//! container bridge pairs external and internal slots by position.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{GraphError, GraphResult};
use crate::frame::Frame;
use crate::graph::EffectNode;
use crate::key::Key;

/// Identifier of a slot, unique within its registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u32);

impl SlotId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl From<SlotId> for Key {
    fn from(id: SlotId) -> Self {
        Key::Id(id.0)
    }
}

/// Whether a slot faces outward (siblings, parent) or inward (the container's
/// own children).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Visible to siblings and to the parent.
    #[default]
    External,
    /// Mirror slot, visible only inside a container.
    Internal,
}

pub(crate) type ValueCell = Arc<Mutex<Option<Frame>>>;

/// One end of a connection, as seen from the other end.
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    pub node: Weak<EffectNode>,
    pub serial: u64,
    pub slot: SlotId,
    pub scope: Scope,
}

impl Endpoint {
    pub fn same_as(&self, other: &Endpoint) -> bool {
        self.serial == other.serial && self.slot == other.slot && self.scope == other.scope
    }
}

/// Live connection held by an output.
#[derive(Clone, Debug)]
pub(crate) struct Link {
    pub target: Endpoint,
    pub cell: ValueCell,
}

/// Behaviour shared by both slot directions, used by [`SlotRegistry`].
pub trait Slot {
    /// Build a fresh, unconnected slot.
    fn new(id: SlotId, name: Option<String>) -> Self;
    /// Slot id.
    fn id(&self) -> SlotId;
    /// Slot name, if it was declared with one.
    fn name(&self) -> Option<&str>;
    /// Returns true while the slot is part of a connection.
    fn is_connected(&self) -> bool;
}

/// Receiving end of a connection.
#[derive(Debug)]
pub struct InputSlot {
    id: SlotId,
    name: Option<String>,
    value: ValueCell,
    source: Option<Endpoint>,
}

impl InputSlot {
    /// The most recent frame delivered to this input.
    pub fn value(&self) -> Option<Frame> {
        self.value.lock().clone()
    }

    pub(crate) fn cell(&self) -> &ValueCell {
        &self.value
    }

    pub(crate) fn source(&self) -> Option<&Endpoint> {
        self.source.as_ref()
    }

    pub(crate) fn set_source(&mut self, source: Endpoint) {
        self.source = Some(source);
    }

    /// Forget the source and drop the stale value.
    pub(crate) fn clear_source(&mut self) {
        self.source = None;
        *self.value.lock() = None;
    }

    #[cfg(test)]
    pub(crate) fn store(&self, frame: Frame) {
        *self.value.lock() = Some(frame);
    }
}

impl Slot for InputSlot {
    fn new(id: SlotId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            value: Arc::new(Mutex::new(None)),
            source: None,
        }
    }

    fn id(&self) -> SlotId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_connected(&self) -> bool {
        self.source.is_some()
    }
}

/// Sending end of a connection.
#[derive(Debug)]
pub struct OutputSlot {
    id: SlotId,
    name: Option<String>,
    last: Option<Frame>,
    link: Option<Link>,
}

impl OutputSlot {
    /// The most recent frame emitted on this output.
    pub fn last_value(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    /// Store `frame` and forward a copy to the connected input, if any.
    pub fn emit(&mut self, frame: Frame) {
        if let Some(link) = &self.link {
            *link.cell.lock() = Some(frame.clone());
        }
        self.last = Some(frame);
    }

    /// Drop the last value here and in the connected input.
    pub fn clear(&mut self) {
        if let Some(link) = &self.link {
            *link.cell.lock() = None;
        }
        self.last = None;
    }

    /// Emit `frame`, or [`clear`](Self::clear) when there is none.
    pub fn forward(&mut self, frame: Option<Frame>) {
        match frame {
            Some(frame) => self.emit(frame),
            None => self.clear(),
        }
    }

    pub(crate) fn link(&self) -> Option<&Link> {
        self.link.as_ref()
    }

    /// Attach to an input. Fails if this output is already connected.
    pub(crate) fn adopt(&mut self, link: Link) -> bool {
        if self.link.is_some() {
            return false;
        }
        self.link = Some(link);
        true
    }

    pub(crate) fn release(&mut self) -> Option<Link> {
        self.link.take()
    }
}

impl Slot for OutputSlot {
    fn new(id: SlotId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            last: None,
            link: None,
        }
    }

    fn id(&self) -> SlotId {
        self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }
}

/// Ordered, id- and name-indexed container of slots.
#[derive(Debug)]
pub struct SlotRegistry<S> {
    slots: Vec<S>,
    next_id: u32,
    scope: Scope,
}

impl<S: Slot> SlotRegistry<S> {
    /// Creates an empty registry for slots of the given scope.
    pub fn new(scope: Scope) -> Self {
        Self {
            slots: Vec::new(),
            next_id: 1,
            scope,
        }
    }

    /// Scope of every slot in this registry.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Declare a new slot and return its id.
    ///
    /// An empty name is treated as no name. A duplicate name fails without
    /// consuming an id.
    pub fn create(&mut self, name: Option<&str>) -> GraphResult<SlotId> {
        let name = name.filter(|n| !n.is_empty());
        if let Some(name) = name
            && self.by_name(name).is_some()
        {
            return Err(GraphError::DuplicateName(name.to_owned()));
        }
        let id = SlotId(self.next_id);
        self.next_id += 1;
        self.slots.push(S::new(id, name.map(str::to_owned)));
        Ok(id)
    }

    /// Look a slot up by id or name.
    pub fn get(&self, key: &Key) -> Option<&S> {
        self.slots.iter().find(|s| key.matches(s.id().0, s.name()))
    }

    /// Mutable lookup by id or name.
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut S> {
        self.slots
            .iter_mut()
            .find(|s| key.matches(s.id().0, s.name()))
    }

    /// Look a slot up by id.
    pub fn by_id(&self, id: SlotId) -> Option<&S> {
        self.slots.iter().find(|s| s.id() == id)
    }

    /// Mutable lookup by id.
    pub fn by_id_mut(&mut self, id: SlotId) -> Option<&mut S> {
        self.slots.iter_mut().find(|s| s.id() == id)
    }

    /// Look a slot up by name.
    pub fn by_name(&self, name: &str) -> Option<&S> {
        self.slots.iter().find(|s| s.name() == Some(name))
    }

    /// Mutable lookup by name.
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut S> {
        self.slots.iter_mut().find(|s| s.name() == Some(name))
    }

    /// Declaration position of the slot matching `key`.
    pub fn position(&self, key: &Key) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| key.matches(s.id().0, s.name()))
    }

    /// Declaration position of the slot with this id.
    pub fn position_of(&self, id: SlotId) -> Option<usize> {
        self.slots.iter().position(|s| s.id() == id)
    }

    /// Slot at a declaration position.
    pub fn at(&self, index: usize) -> Option<&S> {
        self.slots.get(index)
    }

    /// Mutable slot at a declaration position.
    pub fn at_mut(&mut self, index: usize) -> Option<&mut S> {
        self.slots.get_mut(index)
    }

    /// Remove the slot matching `key` and return it.
    pub fn delete(&mut self, key: &Key) -> Option<S> {
        let index = self.position(key)?;
        Some(self.slots.remove(index))
    }

    /// Remove the slot at a declaration position.
    pub(crate) fn delete_at(&mut self, index: usize) -> Option<S> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    /// Slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.slots.iter()
    }

    /// Mutable slots in declaration order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut S> {
        self.slots.iter_mut()
    }

    /// Slot ids in declaration order.
    pub fn ids(&self) -> Vec<SlotId> {
        self.slots.iter().map(|s| s.id()).collect()
    }

    /// Slot names in declaration order (`None` for unnamed slots).
    pub fn names(&self) -> Vec<Option<String>> {
        self.slots
            .iter()
            .map(|s| s.name().map(str::to_owned))
            .collect()
    }

    /// Name of the slot with this id.
    pub fn name_of(&self, id: SlotId) -> Option<&str> {
        self.by_id(id).and_then(|s| s.name())
    }

    /// Id of the slot with this name.
    pub fn id_of(&self, name: &str) -> Option<SlotId> {
        self.by_name(name).map(|s| s.id())
    }

    /// Number of declared slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is declared.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
