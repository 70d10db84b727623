//! Observing sink.
//!
//! A [`FrameProbe`] has one input and no outputs. Every render stores the
//! current input frame in a shared [`ProbeHandle`], which the caller keeps to
//! look at what reached the end of a chain. Clones of a probe share the same
//! handle.

use std::sync::Arc;

use montage_core::{EffectPlugin, Frame, GraphResult, NodeSetup, RenderContext};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct ProbeState {
    last: Option<Frame>,
    renders: u64,
    frames: u64,
}

/// Read side of a probe.
#[derive(Debug, Clone, Default)]
pub struct ProbeHandle {
    state: Arc<Mutex<ProbeState>>,
}

impl ProbeHandle {
    /// Last frame received, if any.
    pub fn last(&self) -> Option<Frame> {
        self.state.lock().last.clone()
    }

    /// Number of times the probe was rendered.
    pub fn renders(&self) -> u64 {
        self.state.lock().renders
    }

    /// Number of renders that found a frame on the input.
    pub fn frames(&self) -> u64 {
        self.state.lock().frames
    }
}

/// Sink recording its input.
///
/// ## Slots
///
/// | Direction | Name |
/// |-----------|------|
/// | input | `in` |
#[derive(Debug, Clone, Default)]
pub struct FrameProbe {
    handle: ProbeHandle,
}

impl FrameProbe {
    /// Create a probe with a fresh handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle observing this probe and all of its clones.
    pub fn handle(&self) -> ProbeHandle {
        self.handle.clone()
    }
}

impl EffectPlugin for FrameProbe {
    fn init(&mut self, setup: &mut NodeSetup<'_>) -> GraphResult<()> {
        setup.add_input("in")?;
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let frame = ctx.input("in");
        let mut state = self.handle.state.lock();
        state.renders += 1;
        if let Some(frame) = frame {
            state.frames += 1;
            state.last = Some(frame);
        }
    }
}
