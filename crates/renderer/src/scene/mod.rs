//! CPU-side scene model: procedural geometry generators, the named-node
//! transform graph, and the small time-driven envelopes (burst, warmup gate,
//! fades) that the GPU layer reads each frame. Everything here is pure with
//! respect to elapsed time and an injected random source, which is what makes
//! the per-frame behaviour testable without a GPU.

pub mod burst;
pub mod fade;
pub mod gate;
pub mod glyphs;
pub mod graph;
pub mod mesh;
pub mod particles;
pub mod starfield;

pub use burst::BurstEnvelope;
pub use fade::{FadeCurve, FadeEnvelope};
pub use gate::{GateState, WarmupGate, DEFAULT_WARMUP};
pub use glyphs::{GlyphField, GlyphSprite};
pub use graph::{apply_spins, spin_angle, NodeTransform, SceneGraph, SpinEffect};
pub use mesh::{MeshData, MeshNode, MeshPrimitive};
pub use particles::ParticleField;
pub use starfield::Starfield;
