//! Manifest schema for scene packs. A pack directory carries a `scene.toml`
//! describing the hero scene: presentation hints (background, warmup, camera
//! orbit) and an ordered list of layers, each either procedural (particles,
//! starfield, glyphs) or asset-driven (mesh). `validate` returns
//! human-readable issues so pack and cache loaders can reject broken packs
//! without panicking.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "scene.toml";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScenePackManifest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Clear color, linear RGBA.
    #[serde(default = "default_background")]
    pub background: [f32; 4],
    /// Warmup gate duration in seconds; `None` uses the renderer default.
    #[serde(default)]
    pub warmup: Option<f32>,
    /// Camera yaw rate in radians per second.
    #[serde(default = "default_camera_orbit")]
    pub camera_orbit: f32,
    #[serde(default)]
    pub layers: Vec<SceneLayer>,
}

fn default_background() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_camera_orbit() -> f32 {
    0.1
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SceneLayer {
    pub name: String,
    #[serde(flatten)]
    pub source: LayerSource,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerSource {
    Particles {
        #[serde(default = "default_particle_count")]
        count: u32,
        #[serde(default = "default_particle_count_compact")]
        count_compact: u32,
        /// Half-extent of the spawn cube.
        #[serde(default = "default_extent")]
        extent: f32,
        /// Group yaw rate in radians per second.
        #[serde(default = "default_particle_spin")]
        spin: f32,
        #[serde(default = "default_point_size")]
        point_size: f32,
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
    Starfield {
        #[serde(default = "default_particle_count")]
        count: u32,
        #[serde(default = "default_particle_count_compact")]
        count_compact: u32,
        #[serde(default = "default_star_radius")]
        radius: f32,
        #[serde(default = "default_star_depth")]
        depth: f32,
        #[serde(default = "default_star_size")]
        star_size: f32,
        #[serde(default = "default_true")]
        fade: bool,
    },
    Glyphs {
        atlas: PathBuf,
        columns: u32,
        rows: u32,
        charset: String,
        #[serde(default = "default_glyph_count")]
        count: u32,
        #[serde(default = "default_glyph_spread")]
        spread: f32,
        #[serde(default = "default_bob_amplitude")]
        bob_amplitude: f32,
        /// Uniform bob speed range, radians per second.
        #[serde(default = "default_bob_speed")]
        bob_speed: [f32; 2],
        /// Per-glyph yaw rate in radians per second.
        #[serde(default = "default_glyph_spin")]
        spin: f32,
        #[serde(default = "default_glyph_size")]
        glyph_size: f32,
        #[serde(default = "default_glyph_color")]
        color: [f32; 3],
    },
    Mesh {
        source: PathBuf,
        #[serde(default = "default_mesh_scale")]
        scale: f32,
        #[serde(default)]
        position: [f32; 3],
        #[serde(default = "default_mesh_color")]
        color: [f32; 3],
        #[serde(default)]
        effects: Vec<MeshEffect>,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MeshEffect {
    /// Named node the effect drives; `None` applies to the whole asset.
    #[serde(default)]
    pub node: Option<String>,
    #[serde(flatten)]
    pub kind: EffectKind,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EffectKind {
    /// Displace vertices along their normals, ramping `delta * rate` up to 1.
    Burst {
        #[serde(default = "default_burst_rate")]
        rate: f32,
    },
    /// Rotate about an axis, `elapsed * rate` radians.
    Spin {
        axis: Axis,
        rate: f32,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

fn default_particle_count() -> u32 {
    5000
}

fn default_particle_count_compact() -> u32 {
    2000
}

fn default_extent() -> f32 {
    5.0
}

fn default_particle_spin() -> f32 {
    0.1
}

fn default_point_size() -> f32 {
    0.05
}

fn default_opacity() -> f32 {
    0.8
}

fn default_star_radius() -> f32 {
    100.0
}

fn default_star_depth() -> f32 {
    50.0
}

fn default_star_size() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_glyph_count() -> u32 {
    150
}

fn default_glyph_spread() -> f32 {
    40.0
}

fn default_bob_amplitude() -> f32 {
    2.0
}

fn default_bob_speed() -> [f32; 2] {
    [0.02, 0.05]
}

fn default_glyph_spin() -> f32 {
    1.2
}

fn default_glyph_size() -> f32 {
    0.4
}

fn default_glyph_color() -> [f32; 3] {
    [0.29, 0.87, 0.50]
}

fn default_mesh_scale() -> f32 {
    1.0
}

fn default_mesh_color() -> [f32; 3] {
    [0.36, 0.56, 0.73]
}

fn default_burst_rate() -> f32 {
    0.5
}

impl ScenePackManifest {
    pub fn warmup_duration(&self) -> Option<Duration> {
        self.warmup.map(Duration::from_secs_f32)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.layers.is_empty() {
            issues.push("manifest must declare at least one layer".to_string());
        }
        if !self.camera_orbit.is_finite() {
            issues.push("camera_orbit must be finite".to_string());
        }
        if let Some(warmup) = self.warmup {
            if !warmup.is_finite() || warmup < 0.0 {
                issues.push("warmup must be a non-negative number of seconds".to_string());
            }
        }
        for layer in &self.layers {
            if layer.name.trim().is_empty() {
                issues.push("layer names must not be empty".to_string());
            }
            layer.source.collect_issues(&layer.name, &mut issues);
        }
        issues
    }
}

impl LayerSource {
    fn collect_issues(&self, layer: &str, issues: &mut Vec<String>) {
        match self {
            LayerSource::Particles {
                count,
                count_compact,
                extent,
                spin,
                point_size,
                opacity,
            } => {
                if *count == 0 || *count_compact == 0 {
                    issues.push(format!("layer '{layer}' particle counts must be > 0"));
                }
                if *count_compact > *count {
                    issues.push(format!(
                        "layer '{layer}' count_compact ({count_compact}) exceeds count ({count})"
                    ));
                }
                if *extent <= 0.0 {
                    issues.push(format!("layer '{layer}' extent must be > 0"));
                }
                if !spin.is_finite() {
                    issues.push(format!("layer '{layer}' spin must be finite"));
                }
                if *point_size <= 0.0 {
                    issues.push(format!("layer '{layer}' point_size must be > 0"));
                }
                if !(0.0..=1.0).contains(opacity) {
                    issues.push(format!("layer '{layer}' opacity must be within [0, 1]"));
                }
            }
            LayerSource::Starfield {
                count,
                count_compact,
                radius,
                depth,
                star_size,
                ..
            } => {
                if *count == 0 || *count_compact == 0 {
                    issues.push(format!("layer '{layer}' star counts must be > 0"));
                }
                if *radius <= 0.0 || *depth < 0.0 {
                    issues.push(format!(
                        "layer '{layer}' requires radius > 0 and depth >= 0"
                    ));
                }
                if *star_size <= 0.0 {
                    issues.push(format!("layer '{layer}' star_size must be > 0"));
                }
            }
            LayerSource::Glyphs {
                atlas,
                columns,
                rows,
                charset,
                count,
                spread,
                bob_amplitude,
                bob_speed,
                glyph_size,
                ..
            } => {
                if atlas.as_os_str().is_empty() {
                    issues.push(format!("layer '{layer}' atlas path must not be empty"));
                }
                if *columns == 0 || *rows == 0 {
                    issues.push(format!("layer '{layer}' atlas grid must be at least 1x1"));
                }
                if charset.is_empty() {
                    issues.push(format!("layer '{layer}' charset must not be empty"));
                }
                if charset.chars().count() as u64 > u64::from(*columns) * u64::from(*rows) {
                    issues.push(format!(
                        "layer '{layer}' charset has more glyphs than atlas cells"
                    ));
                }
                if *count == 0 {
                    issues.push(format!("layer '{layer}' glyph count must be > 0"));
                }
                if *spread <= 0.0 {
                    issues.push(format!("layer '{layer}' spread must be > 0"));
                }
                if *bob_amplitude < 0.0 {
                    issues.push(format!("layer '{layer}' bob_amplitude must be >= 0"));
                }
                if bob_speed[0] > bob_speed[1] || bob_speed[0] < 0.0 {
                    issues.push(format!(
                        "layer '{layer}' bob_speed must be an ascending non-negative range"
                    ));
                }
                if *glyph_size <= 0.0 {
                    issues.push(format!("layer '{layer}' glyph_size must be > 0"));
                }
            }
            LayerSource::Mesh {
                source,
                scale,
                effects,
                ..
            } => {
                if source.as_os_str().is_empty() {
                    issues.push(format!("layer '{layer}' mesh source must not be empty"));
                }
                if *scale <= 0.0 {
                    issues.push(format!("layer '{layer}' scale must be > 0"));
                }
                for effect in effects {
                    match &effect.kind {
                        EffectKind::Burst { rate } => {
                            if !rate.is_finite() || *rate <= 0.0 {
                                issues.push(format!(
                                    "layer '{layer}' burst rate must be a positive number"
                                ));
                            }
                        }
                        EffectKind::Spin { rate, .. } => {
                            if !rate.is_finite() {
                                issues.push(format!("layer '{layer}' spin rate must be finite"));
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "Gaming Worlds"
background = [0.02, 0.03, 0.05, 1.0]
warmup = 2.5
camera_orbit = 0.1

[[layers]]
name = "dust"
type = "particles"
count = 5000
count_compact = 2000

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

[[layers.effects]]
kind = "burst"
rate = 0.5
"#;

    #[test]
    fn parses_sample_manifest() {
        let manifest: ScenePackManifest = toml::from_str(SAMPLE).expect("parse manifest");
        assert_eq!(manifest.name.as_deref(), Some("Gaming Worlds"));
        assert_eq!(manifest.layers.len(), 2);
        assert!(manifest.validate().is_empty());
        assert_eq!(
            manifest.warmup_duration(),
            Some(Duration::from_millis(2500))
        );
        match &manifest.layers[1].source {
            LayerSource::Mesh { effects, .. } => {
                assert_eq!(effects.len(), 2);
                assert!(matches!(
                    effects[0].kind,
                    EffectKind::Spin { axis: Axis::Y, .. }
                ));
                assert_eq!(effects[0].node.as_deref(), Some("SpaceStation"));
                assert!(matches!(effects[1].kind, EffectKind::Burst { .. }));
            }
            other => panic!("expected mesh layer, got {other:?}"),
        }
    }

    #[test]
    fn particle_defaults_match_hero_scene() {
        let manifest: ScenePackManifest = toml::from_str(
            r#"
[[layers]]
name = "dust"
type = "particles"
"#,
        )
        .unwrap();
        match manifest.layers[0].source {
            LayerSource::Particles {
                count,
                count_compact,
                extent,
                spin,
                ..
            } => {
                assert_eq!(count, 5000);
                assert_eq!(count_compact, 2000);
                assert_eq!(extent, 5.0);
                assert_eq!(spin, 0.1);
            }
            _ => panic!("expected particles layer"),
        }
    }

    #[test]
    fn empty_manifest_is_invalid() {
        let manifest: ScenePackManifest = toml::from_str("name = \"Empty\"").unwrap();
        let issues = manifest.validate();
        assert!(issues.iter().any(|i| i.contains("at least one layer")));
    }

    #[test]
    fn rejects_compact_count_above_full_count() {
        let manifest: ScenePackManifest = toml::from_str(
            r#"
[[layers]]
name = "dust"
type = "particles"
count = 100
count_compact = 200
"#,
        )
        .unwrap();
        let issues = manifest.validate();
        assert!(issues.iter().any(|i| i.contains("count_compact")));
    }

    #[test]
    fn rejects_oversized_charset() {
        let manifest: ScenePackManifest = toml::from_str(
            r#"
[[layers]]
name = "rain"
type = "glyphs"
atlas = "textures/atlas.png"
columns = 2
rows = 1
charset = "<{}/"
"#,
        )
        .unwrap();
        let issues = manifest.validate();
        assert!(issues.iter().any(|i| i.contains("atlas cells")));
    }
}
