//! Starfield generation: monochrome points on a spherical shell far outside
//! the main scene, with per-star brightness used both as tint and as the
//! fade-with-distance alpha.

use std::f32::consts::TAU;

use rand::Rng;

use crate::types::StarfieldSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct Starfield {
    positions: Vec<[f32; 3]>,
    brightness: Vec<f32>,
}

impl Starfield {
    /// Generates `count` stars with radii in `[radius, radius + depth]`.
    pub fn generate<R: Rng + ?Sized>(spec: &StarfieldSpec, count: u32, rng: &mut R) -> Self {
        let count = count as usize;
        let mut positions = Vec::with_capacity(count);
        let mut brightness = Vec::with_capacity(count);
        for _ in 0..count {
            // Uniform direction: z uniform in [-1, 1], azimuth uniform.
            let z: f32 = rng.gen_range(-1.0..=1.0);
            let azimuth: f32 = rng.gen_range(0.0..TAU);
            let ring = (1.0 - z * z).max(0.0).sqrt();
            let radius = spec.radius + rng.gen::<f32>() * spec.depth;
            positions.push([
                ring * azimuth.cos() * radius,
                ring * azimuth.sin() * radius,
                z * radius,
            ]);
            brightness.push(0.4 + 0.6 * rng.gen::<f32>());
        }
        Self {
            positions,
            brightness,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn brightness(&self) -> &[f32] {
        &self.brightness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn stars_sit_on_the_shell() {
        let spec = StarfieldSpec::default();
        let mut rng = StdRng::seed_from_u64(21);
        let field = Starfield::generate(&spec, 2000, &mut rng);
        assert_eq!(field.len(), 2000);
        for position in field.positions() {
            let norm =
                (position[0].powi(2) + position[1].powi(2) + position[2].powi(2)).sqrt();
            assert!(
                norm >= spec.radius - 1e-3 && norm <= spec.radius + spec.depth + 1e-3,
                "star at radius {norm} escaped the shell"
            );
        }
    }

    #[test]
    fn brightness_is_visible() {
        let spec = StarfieldSpec::default();
        let mut rng = StdRng::seed_from_u64(22);
        let field = Starfield::generate(&spec, 500, &mut rng);
        for value in field.brightness() {
            assert!((0.4..=1.0).contains(value));
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let spec = StarfieldSpec::default();
        let mut a = StdRng::seed_from_u64(5);
        let mut b = StdRng::seed_from_u64(5);
        assert_eq!(
            Starfield::generate(&spec, 128, &mut a),
            Starfield::generate(&spec, 128, &mut b)
        );
    }
}
