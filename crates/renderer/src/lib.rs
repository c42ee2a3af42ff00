//! CRT display renderer for cathode.
//!
//! The crate binds a [`crtconfig::CrtSettings`] bundle to a GLSL fragment
//! shader and drives it from a `winit` preview window:
//!
//! ```text
//!   cathode CLI
//!        │ RendererConfig
//!        ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ GpuState::render()
//!                          │                                    │
//!                     ControlPanel ── new CrtSettings ──▶ update_crt_uniforms ─▶ UBO
//! ```
//!
//! [`update_crt_uniforms`] is the seam between the settings model and any
//! shader program: it writes the fourteen knobs by uniform name into a
//! [`UniformSink`]. The GPU implementation packs them into a std140 block
//! next to the `size` and `time` uniforms the renderer owns.

mod binding;
mod compile;
mod gpu;
mod panel;
mod runtime;
mod types;
mod window;

use anyhow::Result;

pub use binding::{update_crt_uniforms, UniformSink};
pub use compile::BUNDLED_CRT_SHADER;
pub use panel::{ControlPanel, PanelKey, PanelUpdate};
pub use runtime::{
    loop_time, BoxedTimeSource, FixedTimeSource, FrameScheduler, LoopingTimeSource, RenderPolicy,
    TimeSample, TimeSource, LOOP_PERIOD, LOOP_SPAN,
};
pub use types::{
    AdapterProfile, Antialiasing, ColorSpaceMode, ContentSource, CrossfadeCurve, RendererConfig,
};

/// Entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the preview window and blocks until it is closed.
    pub fn run(&mut self) -> Result<()> {
        window::run(&self.config)
    }
}
