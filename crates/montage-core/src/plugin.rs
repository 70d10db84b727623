//! Leaf-processing contract.
//!
//! A leaf node wraps one [`EffectPlugin`]. The plugin is initialised exactly
//! once, when the node is built, and declares the node's slots through
//! [`NodeSetup`]. Afterwards the graph calls [`EffectPlugin::render`] whenever
//! the scheduler reaches the node; the plugin reads its inputs and emits its
//! outputs through a [`RenderContext`].
//!
//! # Example
//!
//! ```rust
//! use montage_core::{EffectPlugin, NodeSetup, RenderContext, GraphResult};
//!
//! struct Passthrough;
//!
//! impl EffectPlugin for Passthrough {
//!     fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
//!         setup.add_input("in")?;
//!         setup.add_output("out")?;
//!         Ok(())
//!     }
//!
//!     fn render(&mut self, ctx: &mut RenderContext<'_>) {
//!         if let Some(frame) = ctx.input("in") {
//!             ctx.emit("out", frame);
//!         }
//!     }
//! }
//! ```

use crate::error::GraphResult;
use crate::frame::Frame;
use crate::key::Key;
use crate::slot::{InputSlot, OutputSlot, Slot, SlotId, SlotRegistry};

/// Processing unit embedded in a leaf node.
///
/// Plugins live inside the node's lock and may be rendered from any thread,
/// hence the `Send + Sync` bound.
pub trait EffectPlugin: Send + Sync {
    /// Declare the node's inputs and outputs. Called once, before the node is
    /// attached to a graph.
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()>;

    /// Produce outputs from the current inputs.
    fn render(&mut self, ctx: &mut RenderContext<'_>);
}

/// Slot declaration handle passed to [`EffectPlugin::init`].
pub struct NodeSetup<'a> {
    inputs: &'a mut SlotRegistry<InputSlot>,
    outputs: &'a mut SlotRegistry<OutputSlot>,
}

impl<'a> NodeSetup<'a> {
    pub(crate) fn new(
        inputs: &'a mut SlotRegistry<InputSlot>,
        outputs: &'a mut SlotRegistry<OutputSlot>,
    ) -> Self {
        Self { inputs, outputs }
    }

    /// Declare a named input.
    pub fn add_input(&mut self, name: &str) -> GraphResult<SlotId> {
        self.inputs.create(Some(name))
    }

    /// Declare a named output.
    pub fn add_output(&mut self, name: &str) -> GraphResult<SlotId> {
        self.outputs.create(Some(name))
    }

    /// Declare an unnamed input, addressable only by id or position.
    pub fn add_anonymous_input(&mut self) -> GraphResult<SlotId> {
        self.inputs.create(None)
    }

    /// Declare an unnamed output, addressable only by id or position.
    pub fn add_anonymous_output(&mut self) -> GraphResult<SlotId> {
        self.outputs.create(None)
    }
}

/// Slot access for one render call.
///
/// Reading or writing a slot the plugin never declared is a bug in the
/// plugin, so those accessors panic instead of returning an error.
pub struct RenderContext<'a> {
    inputs: &'a SlotRegistry<InputSlot>,
    outputs: &'a mut SlotRegistry<OutputSlot>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        inputs: &'a SlotRegistry<InputSlot>,
        outputs: &'a mut SlotRegistry<OutputSlot>,
    ) -> Self {
        Self { inputs, outputs }
    }

    /// Current value of the input named `name`.
    ///
    /// # Panics
    ///
    /// Panics if the node has no such input.
    pub fn input(&self, name: &str) -> Option<Frame> {
        match self.inputs.by_name(name) {
            Some(slot) => slot.value(),
            None => panic!("render read undeclared input '{name}'"),
        }
    }

    /// Current value of the input at declaration position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn input_at(&self, index: usize) -> Option<Frame> {
        match self.inputs.at(index) {
            Some(slot) => slot.value(),
            None => panic!(
                "render read input #{index} but only {} are declared",
                self.inputs.len()
            ),
        }
    }

    /// Emit `frame` on the output named `name`.
    ///
    /// # Panics
    ///
    /// Panics if the node has no such output.
    pub fn emit(&mut self, name: &str, frame: Frame) {
        match self.outputs.get_mut(&Key::from(name)) {
            Some(slot) => slot.emit(frame),
            None => panic!("render wrote undeclared output '{name}'"),
        }
    }

    /// Emit `frame` on the output at declaration position `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn emit_at(&mut self, index: usize, frame: Frame) {
        let declared = self.outputs.len();
        match self.outputs.at_mut(index) {
            Some(slot) => slot.emit(frame),
            None => panic!("render wrote output #{index} but only {declared} are declared"),
        }
    }

    /// Emit `frame` on the output named `name`, or clear it when there is no
    /// frame so downstream inputs see the absence.
    ///
    /// # Panics
    ///
    /// Panics if the node has no such output.
    pub fn forward(&mut self, name: &str, frame: Option<Frame>) {
        match self.outputs.get_mut(&Key::from(name)) {
            Some(slot) => slot.forward(frame),
            None => panic!("render wrote undeclared output '{name}'"),
        }
    }

    /// Returns true if the output at `index` currently feeds another slot.
    pub fn output_connected(&self, index: usize) -> bool {
        self.outputs.at(index).is_some_and(Slot::is_connected)
    }

    /// Number of declared inputs.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of declared outputs.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }
}
