//! GPU backend: surface/device setup, WGSL pipelines, and the per-frame
//! scene state that turns the CPU scene model into draw calls.

mod context;
mod pipelines;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
