//! Translates scene pack manifests into renderer specs. The renderer never
//! reads manifests itself; this is the only place the two vocabularies meet.

use std::time::Duration;

use renderer::{
    Antialiasing, Axis, GlyphSpec, LayerSpec, MeshEffectKind, MeshEffectSpec, MeshSpec,
    ParticleSpec, SceneSpec, StarfieldSpec,
};
use scenepack::{EffectKind, LayerSource, LocalPack};
use showconfig::AntialiasSetting;

/// Builds a renderer scene from a loaded pack. `warmup_override` (CLI or
/// show schedule) wins over the manifest's own warmup.
pub fn scene_spec_from_pack(pack: &LocalPack, warmup_override: Option<Duration>) -> SceneSpec {
    let manifest = pack.manifest();
    let layers = pack
        .layers()
        .map(|layer| layer_spec(pack, &layer.source))
        .collect();

    SceneSpec {
        name: manifest
            .name
            .clone()
            .unwrap_or_else(|| pack.root().display().to_string()),
        background: manifest.background,
        warmup: warmup_override.or_else(|| manifest.warmup_duration()),
        camera_orbit: manifest.camera_orbit,
        layers,
    }
}

fn layer_spec(pack: &LocalPack, source: &LayerSource) -> LayerSpec {
    match source {
        LayerSource::Particles {
            count,
            count_compact,
            extent,
            spin,
            point_size,
            opacity,
        } => LayerSpec::Particles(ParticleSpec {
            count: *count,
            count_compact: *count_compact,
            extent: *extent,
            spin: *spin,
            point_size: *point_size,
            opacity: *opacity,
        }),
        LayerSource::Starfield {
            count,
            count_compact,
            radius,
            depth,
            star_size,
            fade,
        } => LayerSpec::Starfield(StarfieldSpec {
            count: *count,
            count_compact: *count_compact,
            radius: *radius,
            depth: *depth,
            star_size: *star_size,
            fade: *fade,
        }),
        LayerSource::Glyphs {
            atlas,
            columns,
            rows,
            charset,
            count,
            spread,
            bob_amplitude,
            bob_speed,
            spin,
            glyph_size,
            color,
        } => LayerSpec::Glyphs(GlyphSpec {
            atlas: pack.asset_path(atlas),
            columns: *columns,
            rows: *rows,
            charset: charset.chars().collect(),
            count: *count,
            spread: *spread,
            bob_amplitude: *bob_amplitude,
            bob_speed: (bob_speed[0], bob_speed[1]),
            spin: *spin,
            glyph_size: *glyph_size,
            color: *color,
        }),
        LayerSource::Mesh {
            source,
            scale,
            position,
            color,
            effects,
        } => LayerSpec::Mesh(MeshSpec {
            source: pack.asset_path(source),
            scale: *scale,
            position: *position,
            color: *color,
            effects: effects
                .iter()
                .map(|effect| MeshEffectSpec {
                    node: effect.node.clone(),
                    kind: match &effect.kind {
                        EffectKind::Burst { rate } => MeshEffectKind::Burst { rate: *rate },
                        EffectKind::Spin { axis, rate } => MeshEffectKind::Spin {
                            axis: map_axis(*axis),
                            rate: *rate,
                        },
                    },
                })
                .collect(),
        }),
    }
}

fn map_axis(axis: scenepack::Axis) -> Axis {
    match axis {
        scenepack::Axis::X => Axis::X,
        scenepack::Axis::Y => Axis::Y,
        scenepack::Axis::Z => Axis::Z,
    }
}

pub fn map_antialias(setting: AntialiasSetting) -> Antialiasing {
    match setting {
        AntialiasSetting::Auto => Antialiasing::Auto,
        AntialiasSetting::Off => Antialiasing::Off,
        AntialiasSetting::Samples2 => Antialiasing::Samples(2),
        AntialiasSetting::Samples4 => Antialiasing::Samples(4),
        AntialiasSetting::Samples8 => Antialiasing::Samples(8),
        AntialiasSetting::Samples16 => Antialiasing::Samples(16),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MANIFEST: &str = r#"
name = "Gaming Worlds"
background = [0.02, 0.03, 0.05, 1.0]
warmup = 2.5
camera_orbit = 0.2

[[layers]]
name = "dust"
type = "particles"
count = 4000
count_compact = 1500

[[layers]]
name = "station"
type = "mesh"
source = "models/station.glb"
scale = 1.2
position = [0.0, -1.0, 0.0]

[[layers.effects]]
kind = "spin"
node = "SpaceStation"
axis = "y"
rate = 0.1
"#;

    fn load_pack(dir: &std::path::Path) -> LocalPack {
        fs::write(dir.join("scene.toml"), MANIFEST).unwrap();
        fs::create_dir_all(dir.join("models")).unwrap();
        fs::write(dir.join("models/station.glb"), b"glb").unwrap();
        LocalPack::load(dir).expect("load pack")
    }

    #[test]
    fn maps_manifest_into_scene_spec() {
        let temp = tempfile::tempdir().unwrap();
        let pack = load_pack(temp.path());
        let spec = scene_spec_from_pack(&pack, None);

        assert_eq!(spec.name, "Gaming Worlds");
        assert_eq!(spec.warmup, Some(Duration::from_millis(2500)));
        assert_eq!(spec.camera_orbit, 0.2);
        assert_eq!(spec.layers.len(), 2);

        match &spec.layers[0] {
            LayerSpec::Particles(particles) => {
                assert_eq!(particles.count, 4000);
                assert_eq!(particles.count_compact, 1500);
            }
            other => panic!("expected particles, got {other:?}"),
        }
        match &spec.layers[1] {
            LayerSpec::Mesh(mesh) => {
                assert!(mesh.source.ends_with("models/station.glb"));
                assert!(mesh.source.is_absolute() || mesh.source.starts_with(temp.path()));
                assert_eq!(mesh.effects.len(), 1);
                assert!(matches!(
                    mesh.effects[0].kind,
                    MeshEffectKind::Spin { axis: Axis::Y, .. }
                ));
            }
            other => panic!("expected mesh, got {other:?}"),
        }
    }

    #[test]
    fn warmup_override_wins_over_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let pack = load_pack(temp.path());
        let spec = scene_spec_from_pack(&pack, Some(Duration::from_secs(1)));
        assert_eq!(spec.warmup, Some(Duration::from_secs(1)));
    }

    #[test]
    fn antialias_settings_map_to_sample_counts() {
        assert_eq!(map_antialias(AntialiasSetting::Auto), Antialiasing::Auto);
        assert_eq!(map_antialias(AntialiasSetting::Off), Antialiasing::Off);
        assert_eq!(
            map_antialias(AntialiasSetting::Samples16),
            Antialiasing::Samples(16)
        );
    }
}
