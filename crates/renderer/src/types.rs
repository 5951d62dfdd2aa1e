use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::RenderPolicy;

/// Viewport widths below this render the compact particle budgets.
pub const COMPACT_BREAKPOINT: u32 = 768;

/// How the renderer should present frames.
///
/// * `Windowed` opens a resizable preview window.
/// * `Kiosk` claims a borderless fullscreen surface for lobby/showroom
///   displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Windowed,
    Kiosk,
}

/// Anti-aliasing policy for the render pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl Default for Antialiasing {
    fn default() -> Self {
        Self::Auto
    }
}

/// Rotation axis for spin effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Fully resolved description of a hero scene, ready for the GPU layer.
///
/// Construction happens outside this crate (CLI bindings translate pack
/// manifests); the renderer never touches manifest files itself.
#[derive(Debug, Clone)]
pub struct SceneSpec {
    pub name: String,
    /// Clear color, linear RGBA.
    pub background: [f32; 4],
    /// Warmup gate duration before the scene content is revealed.
    pub warmup: Option<Duration>,
    /// Camera yaw rate in radians per second.
    pub camera_orbit: f32,
    pub layers: Vec<LayerSpec>,
}

impl SceneSpec {
    /// Minimal procedural scene used when an asset-driven layer cannot load.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: [0.0, 0.0, 0.0, 1.0],
            warmup: None,
            camera_orbit: 0.1,
            layers: vec![LayerSpec::Particles(ParticleSpec::default())],
        }
    }
}

#[derive(Debug, Clone)]
pub enum LayerSpec {
    Particles(ParticleSpec),
    Starfield(StarfieldSpec),
    Glyphs(GlyphSpec),
    Mesh(MeshSpec),
}

/// Random point cloud in a cube, spun as a group.
#[derive(Debug, Clone)]
pub struct ParticleSpec {
    pub count: u32,
    pub count_compact: u32,
    /// Half-extent of the spawn cube.
    pub extent: f32,
    /// Group yaw rate in radians per second.
    pub spin: f32,
    pub point_size: f32,
    pub opacity: f32,
}

impl Default for ParticleSpec {
    fn default() -> Self {
        Self {
            count: 5000,
            count_compact: 2000,
            extent: 5.0,
            spin: 0.1,
            point_size: 0.05,
            opacity: 0.8,
        }
    }
}

impl ParticleSpec {
    /// Point budget for the given viewport width.
    pub fn budget(&self, viewport_width: u32) -> u32 {
        if viewport_width < COMPACT_BREAKPOINT {
            self.count_compact
        } else {
            self.count
        }
    }
}

/// Monochrome points on a spherical shell around the camera.
#[derive(Debug, Clone)]
pub struct StarfieldSpec {
    pub count: u32,
    pub count_compact: u32,
    pub radius: f32,
    pub depth: f32,
    pub star_size: f32,
    pub fade: bool,
}

impl Default for StarfieldSpec {
    fn default() -> Self {
        Self {
            count: 5000,
            count_compact: 2000,
            radius: 100.0,
            depth: 50.0,
            star_size: 0.5,
            fade: true,
        }
    }
}

impl StarfieldSpec {
    pub fn budget(&self, viewport_width: u32) -> u32 {
        if viewport_width < COMPACT_BREAKPOINT {
            self.count_compact
        } else {
            self.count
        }
    }
}

/// Bobbing glyph sprites sampled from a bitmap atlas.
#[derive(Debug, Clone)]
pub struct GlyphSpec {
    pub atlas: PathBuf,
    pub columns: u32,
    pub rows: u32,
    pub charset: Vec<char>,
    pub count: u32,
    /// Edge length of the spawn cube.
    pub spread: f32,
    pub bob_amplitude: f32,
    /// Uniform bob speed range, radians per second.
    pub bob_speed: (f32, f32),
    /// Per-glyph yaw rate in radians per second.
    pub spin: f32,
    pub glyph_size: f32,
    pub color: [f32; 3],
}

/// Loaded 3D asset with per-node effects.
#[derive(Debug, Clone)]
pub struct MeshSpec {
    pub source: PathBuf,
    pub scale: f32,
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub effects: Vec<MeshEffectSpec>,
}

#[derive(Debug, Clone)]
pub struct MeshEffectSpec {
    /// Named node the effect drives; `None` applies to every node.
    pub node: Option<String>,
    pub kind: MeshEffectKind,
}

#[derive(Debug, Clone)]
pub enum MeshEffectKind {
    /// Displace vertices along their normals, ramping `delta * rate` up to 1.
    Burst { rate: f32 },
    /// Rotate about an axis, `elapsed * rate` radians.
    Spin { axis: Axis, rate: f32 },
}

/// Scene replacement request issued by the show engine.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub scene: SceneSpec,
    pub crossfade: Duration,
    pub antialiasing: Antialiasing,
    pub policy: RenderPolicy,
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window or surface size in physical pixels.
    pub surface_size: (u32, u32),
    /// The scene to present.
    pub scene: SceneSpec,
    /// Presentation mode (preview window vs fullscreen kiosk).
    pub mode: RenderMode,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// High-level render behaviour requested by the caller.
    pub policy: RenderPolicy,
    /// Seed for procedural generation; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RendererConfig {
    /// Provides a 1280x720 windowed configuration with the fallback scene.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            scene: SceneSpec::fallback("fallback"),
            mode: RenderMode::Windowed,
            antialiasing: Antialiasing::default(),
            policy: RenderPolicy::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_budget_below_breakpoint() {
        let spec = ParticleSpec::default();
        assert_eq!(spec.budget(767), 2000);
        assert_eq!(spec.budget(480), 2000);
    }

    #[test]
    fn full_budget_at_breakpoint_and_above() {
        let spec = ParticleSpec::default();
        assert_eq!(spec.budget(768), 5000);
        assert_eq!(spec.budget(1920), 5000);
    }

    #[test]
    fn starfield_budget_uses_same_breakpoint() {
        let spec = StarfieldSpec::default();
        assert_eq!(spec.budget(COMPACT_BREAKPOINT - 1), spec.count_compact);
        assert_eq!(spec.budget(COMPACT_BREAKPOINT), spec.count);
    }

    #[test]
    fn fallback_scene_is_procedural() {
        let scene = SceneSpec::fallback("fallback");
        assert_eq!(scene.layers.len(), 1);
        assert!(matches!(scene.layers[0], LayerSpec::Particles(_)));
    }
}
