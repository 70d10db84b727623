//! Solid colour source.
//!
//! Emits one frame per render on its single output `out`. Timestamps count
//! up from 0, one per emitted frame.

use montage_core::{EffectPlugin, Frame, GraphResult, NodeSetup, RenderContext};

/// Default frame width.
pub const DEFAULT_WIDTH: u32 = 64;
/// Default frame height.
pub const DEFAULT_HEIGHT: u32 = 36;
/// Default colour: opaque mid gray.
pub const DEFAULT_COLOR: u32 = 0x8080_80ff;

/// Source node producing frames filled with a single colour.
///
/// ## Slots
///
/// | Direction | Name |
/// |-----------|------|
/// | output | `out` |
#[derive(Debug, Clone)]
pub struct SolidColor {
    width: u32,
    height: u32,
    color: u32,
    next_pts: i64,
}

impl Default for SolidColor {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_COLOR)
    }
}

impl SolidColor {
    /// Create a source with the given frame size and RGBA colour.
    pub fn new(width: u32, height: u32, color: u32) -> Self {
        Self {
            width,
            height,
            color,
            next_pts: 0,
        }
    }

    /// Colour of the emitted frames.
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Change the colour for subsequent frames.
    pub fn set_color(&mut self, color: u32) {
        self.color = color;
    }

    /// Frame size as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl EffectPlugin for SolidColor {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        setup.add_output("out")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let frame = Frame::solid(self.width, self.height, self.color).with_pts(self.next_pts);
        self.next_pts += 1;
        ctx.emit("out", frame);
    }
}
