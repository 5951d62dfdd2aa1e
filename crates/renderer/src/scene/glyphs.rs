//! Glyph rain: character sprites scattered in a cube, each bobbing on Y at
//! its own speed. Home positions and speeds are fixed at generation; the
//! per-frame offset is a pure function of elapsed time so the GPU can derive
//! it in the vertex shader.

use rand::Rng;

use crate::types::GlyphSpec;

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSprite {
    pub home: [f32; 3],
    /// Index into the layer charset (and thus into the atlas grid).
    pub glyph: u32,
    /// Bob frequency in radians per second.
    pub bob_speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphField {
    sprites: Vec<GlyphSprite>,
}

impl GlyphField {
    pub fn generate<R: Rng + ?Sized>(spec: &GlyphSpec, rng: &mut R) -> Self {
        let half = spec.spread * 0.5;
        let glyph_count = spec.charset.len().max(1) as u32;
        let sprites = (0..spec.count)
            .map(|_| GlyphSprite {
                home: [
                    rng.gen_range(-half..=half),
                    rng.gen_range(-half..=half),
                    rng.gen_range(-half..=half),
                ],
                glyph: rng.gen_range(0..glyph_count),
                bob_speed: rng.gen_range(spec.bob_speed.0..=spec.bob_speed.1),
            })
            .collect();
        Self { sprites }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn sprites(&self) -> &[GlyphSprite] {
        &self.sprites
    }
}

/// Vertical offset of a bobbing sprite at `elapsed` seconds.
pub fn bob_offset(elapsed: f32, speed: f32, amplitude: f32) -> f32 {
    (elapsed * speed).sin() * amplitude
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spec() -> GlyphSpec {
        GlyphSpec {
            atlas: "textures/atlas.png".into(),
            columns: 4,
            rows: 3,
            charset: "<{}/>()*#@$%".chars().collect(),
            count: 150,
            spread: 40.0,
            bob_amplitude: 2.0,
            bob_speed: (0.02, 0.05),
            spin: 1.2,
            glyph_size: 0.4,
            color: [0.29, 0.87, 0.50],
        }
    }

    #[test]
    fn generates_requested_population() {
        let mut rng = StdRng::seed_from_u64(31);
        let field = GlyphField::generate(&spec(), &mut rng);
        assert_eq!(field.len(), 150);
    }

    #[test]
    fn sprites_stay_inside_the_spread() {
        let mut rng = StdRng::seed_from_u64(32);
        let field = GlyphField::generate(&spec(), &mut rng);
        for sprite in field.sprites() {
            for component in &sprite.home {
                assert!((-20.0..=20.0).contains(component));
            }
        }
    }

    #[test]
    fn glyph_indices_address_the_charset() {
        let spec = spec();
        let mut rng = StdRng::seed_from_u64(33);
        let field = GlyphField::generate(&spec, &mut rng);
        let charset_len = spec.charset.len() as u32;
        for sprite in field.sprites() {
            assert!(sprite.glyph < charset_len);
        }
    }

    #[test]
    fn bob_speeds_are_drawn_from_the_range() {
        let mut rng = StdRng::seed_from_u64(34);
        let field = GlyphField::generate(&spec(), &mut rng);
        for sprite in field.sprites() {
            assert!((0.02..=0.05).contains(&sprite.bob_speed));
        }
    }

    #[test]
    fn bob_offset_is_bounded_and_pure() {
        for step in 0..200 {
            let elapsed = step as f32 * 0.37;
            let offset = bob_offset(elapsed, 0.04, 2.0);
            assert!(offset.abs() <= 2.0 + f32::EPSILON);
            assert_eq!(offset, bob_offset(elapsed, 0.04, 2.0));
        }
    }
}
