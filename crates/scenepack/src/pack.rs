//! Filesystem-backed scene packs. `LocalPack` wraps a pack directory and its
//! parsed manifest; `ensure_layer_assets` confirms every asset a layer
//! references is actually on disk so later load errors point at asset
//! contents rather than missing files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::manifest::{LayerSource, ScenePackManifest, MANIFEST_FILE};

#[derive(Debug, Error)]
pub enum PackError {
    #[error("manifest not found at {0}")]
    ManifestMissing(PathBuf),

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    #[error("manifest validation failed: {0:?}")]
    ManifestValidation(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct LocalPack {
    root: PathBuf,
    manifest: ScenePackManifest,
}

impl LocalPack {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(PackError::ManifestMissing(manifest_path));
        }

        let manifest_raw = fs::read_to_string(&manifest_path)?;
        let manifest: ScenePackManifest = toml::from_str(&manifest_raw)?;
        let issues = manifest.validate();
        if !issues.is_empty() {
            return Err(PackError::ManifestValidation(issues));
        }

        Ok(Self { root, manifest })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn manifest(&self) -> &ScenePackManifest {
        &self.manifest
    }

    /// Resolves a manifest-relative asset path against the pack root.
    pub fn asset_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn layers(&self) -> impl Iterator<Item = &crate::manifest::SceneLayer> {
        self.manifest.layers.iter()
    }
}

/// Confirms that every asset referenced by the manifest exists on disk and
/// returns the resolved paths.
pub fn ensure_layer_assets(pack: &LocalPack) -> Result<Vec<PathBuf>, PackError> {
    let mut missing = Vec::new();
    let mut resolved = Vec::new();
    for layer in pack.layers() {
        let required: Option<&Path> = match &layer.source {
            LayerSource::Glyphs { atlas, .. } => Some(atlas.as_path()),
            LayerSource::Mesh { source, .. } => Some(source.as_path()),
            LayerSource::Particles { .. } | LayerSource::Starfield { .. } => None,
        };
        if let Some(relative) = required {
            let full = pack.asset_path(relative);
            if full.exists() {
                resolved.push(full);
            } else {
                missing.push(full);
            }
        }
    }
    if !missing.is_empty() {
        return Err(PackError::ManifestValidation(
            missing
                .into_iter()
                .map(|p| format!("missing scene asset: {}", p.display()))
                .collect(),
        ));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pack(dir: &Path, manifest: &str, extra_files: &[(&str, &[u8])]) {
        fs::write(dir.join(MANIFEST_FILE), manifest).expect("write manifest");
        for (path, contents) in extra_files {
            let full_path = dir.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).expect("create dirs");
            }
            fs::write(full_path, contents).expect("write file");
        }
    }

    const MESH_MANIFEST: &str = r#"
name = "Demo"

[[layers]]
name = "hero"
type = "mesh"
source = "models/hero.glb"
"#;

    #[test]
    fn loads_valid_pack() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), MESH_MANIFEST, &[("models/hero.glb", b"glb")]);

        let pack = LocalPack::load(temp.path()).expect("load pack");
        assert_eq!(pack.manifest().name.as_deref(), Some("Demo"));
        assert!(pack.asset_path(Path::new("models/hero.glb")).exists());
        let assets = ensure_layer_assets(&pack).expect("assets exist");
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn detects_missing_asset() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), MESH_MANIFEST, &[]);

        let pack = LocalPack::load(temp.path()).expect("load pack");
        let err = ensure_layer_assets(&pack).unwrap_err();
        assert!(matches!(err, PackError::ManifestValidation(_)));
    }

    #[test]
    fn missing_manifest_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestMissing(_)));
    }

    #[test]
    fn invalid_manifest_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(temp.path(), "name = \"No layers\"", &[]);
        let err = LocalPack::load(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::ManifestValidation(_)));
    }

    #[test]
    fn procedural_packs_need_no_assets() {
        let temp = tempfile::tempdir().unwrap();
        write_pack(
            temp.path(),
            r#"
[[layers]]
name = "dust"
type = "particles"
"#,
            &[],
        );
        let pack = LocalPack::load(temp.path()).expect("load pack");
        assert!(ensure_layer_assets(&pack).expect("no assets needed").is_empty());
    }
}
