//! Scene renderer for vitrine hero backdrops.
//!
//! The crate glues the winit window, the `wgpu` pipelines, and the CPU scene
//! model together. The overall flow is:
//!
//! ```text
//!   CLI / show engine
//!          │ RendererConfig / SwapRequest
//!          ▼
//!   WindowRuntime ──▶ winit event loop ──▶ GpuState::render()
//!          ▲                     │
//!          │                     └─▶ warmup gate ─▶ spins/bursts ─▶ draw
//!   advance signals (spacebar)
//! ```
//!
//! `GpuState` owns every GPU resource (surface, device, pipelines, per-layer
//! buffers) and mutates scene transforms once per display refresh from the
//! elapsed time alone. `Renderer` is the thin blocking entry point for
//! single-scene runs; show mode drives the same window thread through
//! [`WindowRuntime`].

pub mod runtime;
pub mod scene;
pub mod types;

mod gpu;
mod window;

pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FrameScheduler, RenderPolicy,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use types::{
    Antialiasing, Axis, GlyphSpec, LayerSpec, MeshEffectKind, MeshEffectSpec, MeshSpec,
    ParticleSpec, RenderMode, RendererConfig, SceneSpec, StarfieldSpec, SwapRequest,
    COMPACT_BREAKPOINT,
};
pub use window::WindowRuntime;

use anyhow::Result;

/// Blocking entry point that owns the chosen configuration.
///
/// The heavy lifting lives inside the window thread; `Renderer` simply
/// launches it and waits for the window to close.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Launches the renderer and blocks until the surface is closed.
    pub fn run(&mut self) -> Result<()> {
        let runtime = WindowRuntime::spawn(self.config.clone())?;
        runtime.wait()
    }
}
