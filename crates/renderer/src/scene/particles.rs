//! Particle field generation. A field is a fixed-size set of points with
//! uniformly random positions inside a cube and uniformly random colors,
//! produced once per mount from an injected random source. Positions never
//! change afterwards; motion comes from the group transform in the scene
//! graph.

use rand::Rng;

use crate::types::ParticleSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl ParticleField {
    /// Generates exactly `count` particles inside `[-extent, extent]^3`.
    pub fn generate<R: Rng + ?Sized>(spec: &ParticleSpec, count: u32, rng: &mut R) -> Self {
        let count = count as usize;
        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);
        for _ in 0..count {
            positions.push([
                rng.gen_range(-spec.extent..=spec.extent),
                rng.gen_range(-spec.extent..=spec.extent),
                rng.gen_range(-spec.extent..=spec.extent),
            ]);
            colors.push([rng.gen::<f32>(), rng.gen::<f32>(), rng.gen::<f32>()]);
        }
        Self { positions, colors }
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

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }
}
