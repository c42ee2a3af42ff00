//! GPU side of the CRT preview.
//!
//! - `context` owns wgpu instance/device/surface wiring and rebuilds the
//!   swapchain when the window resizes.
//! - `content` loads the image sampled by `sampleContent`, or generates the
//!   test pattern when there is none.
//! - `pipeline` compiles the wrapped GLSL into the single CRT render pipeline.
//! - `uniforms` mirrors the `CrtParams` block and is the GPU [`UniformSink`].
//! - `timeline` eases between settings bundles when presets change.
//! - `state` glues everything together behind `GpuState`.
//!
//! [`UniformSink`]: crate::binding::UniformSink

mod content;
mod context;
mod pipeline;
mod state;
mod timeline;
mod uniforms;

pub(crate) use state::GpuState;
