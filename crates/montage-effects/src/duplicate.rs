//! Explicit fan-out.
//!
//! An output feeds exactly one input, so a frame needed by two consumers goes
//! through a `Duplicate` first. Both outputs share the input's pixel buffer.

use montage_core::{EffectPlugin, GraphResult, NodeSetup, RenderContext};

/// Copies `in` to `out0` and `out1`.
///
/// ## Slots
///
/// | Direction | Name |
/// |-----------|------|
/// | input | `in` |
/// | output | `out0` |
/// | output | `out1` |
#[derive(Debug, Clone, Copy, Default)]
pub struct Duplicate;

impl EffectPlugin for Duplicate {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        setup.add_input("in")?;
        setup.add_output("out0")?;
        setup.add_output("out1")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let frame = ctx.input("in");
        ctx.forward("out0", frame.clone());
        ctx.forward("out1", frame);
    }
}
