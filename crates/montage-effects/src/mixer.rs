//! Two-input blend.
//!
//! ## Signal Flow
//!
//! ```text
//! out = a × (1 - mix) + b × mix      (per channel, alpha included)
//! ```
//!
//! With only one input present the mixer passes it through unchanged. Frames
//! of different sizes are not blended; `a` wins.

use montage_core::{EffectPlugin, Frame, GraphResult, NodeSetup, RenderContext, channels, rgba};

/// Blends inputs `a` and `b` into `out`.
///
/// ## Slots
///
/// | Direction | Name |
/// |-----------|------|
/// | input | `a` |
/// | input | `b` |
/// | output | `out` |
#[derive(Debug, Clone, Copy)]
pub struct Mixer {
    mix: f32,
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Mixer {
    /// Create a mixer; `mix` is clamped to `0.0..=1.0`.
    pub fn new(mix: f32) -> Self {
        Self {
            mix: mix.clamp(0.0, 1.0),
        }
    }

    /// Weight of input `b`.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Set the weight of input `b`, clamped to `0.0..=1.0`.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Blend two pixels.
    pub fn pixel(&self, a: u32, b: u32) -> u32 {
        let [ar, ag, ab, aa] = channels(a);
        let [br, bg, bb, ba] = channels(b);
        let lerp = |x: u8, y: u8| {
            let v = f32::from(x) + (f32::from(y) - f32::from(x)) * self.mix;
            v.round().clamp(0.0, 255.0) as u8
        };
        rgba(lerp(ar, br), lerp(ag, bg), lerp(ab, bb), lerp(aa, ba))
    }

    /// Blend two frames of equal size. Returns `a` unchanged otherwise.
    pub fn blend(&self, a: &Frame, b: &Frame) -> Frame {
        if a.width() != b.width() || a.height() != b.height() {
            return a.clone();
        }
        let pixels = a
            .pixels()
            .iter()
            .zip(b.pixels())
            .map(|(&pa, &pb)| self.pixel(pa, pb))
            .collect();
        Frame::new(a.width(), a.height(), pixels).with_pts(a.pts())
    }
}

impl EffectPlugin for Mixer {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        setup.add_input("a")?;
        setup.add_input("b")?;
        setup.add_output("out")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let out = match (ctx.input("a"), ctx.input("b")) {
            (Some(a), Some(b)) => Some(self.blend(&a, &b)),
            (Some(only), None) | (None, Some(only)) => Some(only),
            (None, None) => None,
        };
        ctx.forward("out", out);
    }
}
