use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

/// Per-frame globals shared by every pipeline. Layout is std140: mat4s then
/// vec4s, 160 bytes total.
#[repr(C, align(16))]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct SceneGlobals {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// width, height, aspect, unused
    pub resolution: [f32; 4],
    /// elapsed seconds, delta seconds, frame index, fade level
    pub time: [f32; 4],
}

impl SceneGlobals {
    pub fn new(width: u32, height: u32) -> Self {
        let mut globals = Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            resolution: [0.0; 4],
            time: [0.0, 0.0, 0.0, 1.0],
        };
        globals.set_resolution(width, height);
        globals
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        self.resolution = [w, h, w / h, 0.0];
    }

    pub fn set_time(&mut self, elapsed: f32, delta: f32, frame: u64) {
        self.time[0] = elapsed;
        self.time[1] = delta;
        self.time[2] = frame as f32;
    }

    pub fn set_fade(&mut self, fade: f32) {
        self.time[3] = fade.clamp(0.0, 1.0);
    }

    pub fn set_camera(&mut self, view: Mat4, proj: Mat4) {
        self.view = view.to_cols_array_2d();
        self.proj = proj.to_cols_array_2d();
    }
}

/// Per-layer uniform block: model transform plus material-ish parameters.
#[repr(C, align(16))]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct LayerUniform {
    pub model: [[f32; 4]; 4],
    /// rgb tint + layer opacity
    pub tint: [f32; 4],
    /// sprite size, burst value, atlas cell width, atlas cell height
    pub params: [f32; 4],
    /// glyph spin rate, bob amplitude, unused, unused
    pub extra: [f32; 4],
}

impl LayerUniform {
    pub fn new() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            tint: [1.0, 1.0, 1.0, 1.0],
            params: [0.0; 4],
            extra: [0.0; 4],
        }
    }

    pub fn set_model(&mut self, model: Mat4) {
        self.model = model.to_cols_array_2d();
    }
}

/// Uniform for the warmup overlay pass.
#[repr(C, align(16))]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct OverlayUniform {
    /// progress, elapsed seconds, aspect, unused
    pub params: [f32; 4],
}

impl OverlayUniform {
    pub fn new() -> Self {
        Self { params: [0.0; 4] }
    }

    pub fn update(&mut self, progress: f32, elapsed: f32, aspect: f32) {
        self.params = [progress.clamp(0.0, 1.0), elapsed, aspect, 0.0];
    }
}

const CAMERA_DISTANCE: f32 = 5.0;
const CAMERA_FOV_DEGREES: f32 = 45.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 400.0;

/// Orbiting view/projection pair for the given surface and camera yaw.
pub(crate) fn camera_matrices(size: PhysicalSize<u32>, orbit_angle: f32) -> (Mat4, Mat4) {
    let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
    let proj = Mat4::perspective_rh(
        CAMERA_FOV_DEGREES.to_radians(),
        aspect,
        CAMERA_NEAR,
        CAMERA_FAR,
    );
    let eye = Vec3::new(
        CAMERA_DISTANCE * orbit_angle.sin(),
        0.0,
        CAMERA_DISTANCE * orbit_angle.cos(),
    );
    let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
    (view, proj)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_blocks_are_std140_sized() {
        assert_eq!(std::mem::size_of::<SceneGlobals>() % 16, 0);
        assert_eq!(std::mem::size_of::<LayerUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<OverlayUniform>(), 16);
    }

    #[test]
    fn resolution_guards_against_zero_height() {
        let mut globals = SceneGlobals::new(100, 0);
        globals.set_resolution(100, 0);
        assert_eq!(globals.resolution[1], 1.0);
        assert!(globals.resolution[2].is_finite());
    }

    #[test]
    fn fade_is_clamped() {
        let mut globals = SceneGlobals::new(1, 1);
        globals.set_fade(2.0);
        assert_eq!(globals.time[3], 1.0);
        globals.set_fade(-1.0);
        assert_eq!(globals.time[3], 0.0);
    }

    #[test]
    fn camera_orbits_at_constant_distance() {
        for step in 0..16 {
            let angle = step as f32 * 0.5;
            let (view, _proj) = camera_matrices(PhysicalSize::new(1280, 720), angle);
            let eye = view.inverse().col(3).truncate();
            assert!((eye.length() - CAMERA_DISTANCE).abs() < 1e-4);
        }
    }

    #[test]
    fn same_orbit_angle_gives_same_view() {
        let size = PhysicalSize::new(800, 600);
        let (a, _) = camera_matrices(size, 1.25);
        let (b, _) = camera_matrices(size, 1.25);
        assert_eq!(a, b);
    }
}
