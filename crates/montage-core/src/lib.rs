//! Montage Core - the effect node graph
//!
//! This crate provides the graph every montage effect chain runs in: nodes
//! connected through typed input/output slots, nested containers with internal
//! mirror slots, and a render pass that orders the work on every frame.
//!
//! # Core Abstractions
//!
//! ## Payload
//!
//! - [`Frame`] - Immutable RGBA video frame, cheap to copy across connections
//!
//! ## Slots
//!
//! - [`SlotRegistry`] - Id- and name-indexed slot container with stable ids
//! - [`InputSlot`] / [`OutputSlot`] - The two ends of a connection
//! - [`ConnectionRefs`] - Which slots of a registry are currently connected
//! - [`Key`] - Lookup by id or by name
//!
//! ## Nodes
//!
//! - [`EffectNode`] - Graph vertex, either a leaf or a container
//! - [`EffectPlugin`] - Processing contract implemented by leaf effects
//! - [`PluginCatalog`] - Instantiable node types
//! - [`NodeDescription`] - Id-independent snapshot used for persistence
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use montage_core::{EffectNode, EffectPlugin, Frame, GraphResult, NodeSetup, PluginCatalog, RenderContext};
//!
//! struct Gray;
//!
//! impl EffectPlugin for Gray {
//!     fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
//!         setup.add_output("out").map(|_| ())
//!     }
//!
//!     fn render(&mut self, ctx: &mut RenderContext<'_>) {
//!         ctx.emit("out", Frame::solid(4, 4, 0x8080_80ff));
//!     }
//! }
//!
//! # fn main() -> GraphResult<()> {
//! let mut catalog = PluginCatalog::new();
//! catalog.register("gray", "solid gray frames", || Gray)?;
//!
//! let root = EffectNode::new_root("main", Arc::new(catalog));
//! let group = root.create_empty_child(Some("group"))?;
//! group.create_input(Some("in"))?;
//! let source = root.create_child("gray", Some("source"))?;
//! source.connect_sibling("out", "group", "in")?;
//!
//! root.render();
//! assert!(group.input_value("in")?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - `tracing` - emit `tracing` events for graph mutations and render passes

pub mod catalog;
pub mod error;
pub mod frame;
pub mod graph;
pub mod key;
pub mod plugin;
pub mod refs;
pub mod slot;

pub use catalog::{PluginCatalog, PluginType, PluginTypeId};
pub use error::{GraphError, GraphResult, Target};
pub use frame::{Frame, channels, rgba};
pub use graph::{
    ConnectRequest, Edge, EffectNode, NodeDescription, NodeRegistry, PortRef, SlotInfo,
    create_root, delete_root, register_root, root, root_names,
};
pub use key::Key;
pub use plugin::{EffectPlugin, NodeSetup, RenderContext};
pub use refs::ConnectionRefs;
pub use slot::{InputSlot, OutputSlot, Scope, Slot, SlotId, SlotRegistry};
