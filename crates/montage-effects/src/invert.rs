//! Colour inversion.
//!
//! ```text
//! (r, g, b, a) → (255 - r, 255 - g, 255 - b, a)
//! ```

use montage_core::{EffectPlugin, Frame, GraphResult, NodeSetup, RenderContext};

/// Inverts the colour channels of every pixel; alpha is kept.
///
/// ## Slots
///
/// | Direction | Name |
/// |-----------|------|
/// | input | `in` |
/// | output | `out` |
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl Invert {
    /// Invert a single RGBA pixel.
    #[inline]
    pub fn pixel(px: u32) -> u32 {
        px ^ 0xffff_ff00
    }

    /// Invert a whole frame.
    pub fn apply(frame: &Frame) -> Frame {
        frame.map_pixels(Self::pixel)
    }
}

impl EffectPlugin for Invert {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        setup.add_input("in")?;
        setup.add_output("out")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let out = ctx.input("in").map(|frame| Self::apply(&frame));
        ctx.forward("out", out);
    }
}
