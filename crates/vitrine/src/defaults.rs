//! Bundled procedural scenes installed into the user's data directory so a
//! bare `vitrine` launch has something to show. Asset-driven scenes are not
//! bundled; they come from packs or the gallery.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::paths::AppPaths;

pub struct BundledScene {
    pub name: &'static str,
    pub manifest: &'static str,
}

pub const BUNDLED_SCENES: &[BundledScene] = &[
    BundledScene {
        name: "orbitals",
        manifest: r#"name = "Orbitals"
description = "Rainbow particle field drifting through a slow starfield"
background = [0.0, 0.01, 0.03, 1.0]
warmup = 2.5
camera_orbit = 0.1

[[layers]]
name = "dust"
type = "particles"
count = 5000
count_compact = 2000
extent = 5.0
spin = 0.1
point_size = 0.05
opacity = 0.8

[[layers]]
name = "stars"
type = "starfield"
count = 5000
count_compact = 2000
radius = 100.0
depth = 50.0
"#,
    },
    BundledScene {
        name: "deep-field",
        manifest: r#"name = "Deep Field"
description = "Sparse starfield for understated lobby walls"
background = [0.0, 0.0, 0.0, 1.0]
warmup = 2.0
camera_orbit = 0.05

[[layers]]
name = "stars"
type = "starfield"
count = 3000
count_compact = 1200
radius = 80.0
depth = 60.0
star_size = 0.4
"#,
    },
];

#[derive(Debug, Clone)]
pub struct InstalledScene {
    pub name: &'static str,
    pub path: PathBuf,
    pub installed: bool,
}

pub fn list(paths: &AppPaths) -> Vec<InstalledScene> {
    BUNDLED_SCENES
        .iter()
        .map(|scene| {
            let path = scene_dir(paths, scene.name);
            let installed = path.join(scenepack::MANIFEST_FILE).exists();
            InstalledScene {
                name: scene.name,
                path,
                installed,
            }
        })
        .collect()
}

/// Installs every bundled scene that is not already present. Existing packs
/// are left untouched so local edits survive a re-sync.
pub fn sync(paths: &AppPaths, dry_run: bool) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for scene in BUNDLED_SCENES {
        let dir = scene_dir(paths, scene.name);
        let manifest_path = dir.join(scenepack::MANIFEST_FILE);
        if manifest_path.exists() {
            debug!(scene = scene.name, "bundled scene already installed");
            continue;
        }
        if dry_run {
            info!(scene = scene.name, path = %manifest_path.display(), "would install bundled scene");
            written.push(manifest_path);
            continue;
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create scene directory {}", dir.display()))?;
        fs::write(&manifest_path, scene.manifest)
            .with_context(|| format!("failed to write {}", manifest_path.display()))?;
        info!(scene = scene.name, path = %manifest_path.display(), "installed bundled scene");
        written.push(manifest_path);
    }
    Ok(written)
}

fn scene_dir(paths: &AppPaths, name: &str) -> PathBuf {
    paths.data_dir().join("scenes").join(name)
}
