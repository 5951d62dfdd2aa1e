//! Resolves scene handles into ready-to-render packs, hiding the difference
//! between local directories and cached gallery downloads. The CLI and show
//! engine hand it `SceneHandle`s; it walks its search roots for local packs
//! and keeps a per-scene cache directory for gallery bundles, refetching
//! when the cache is missing, corrupt, or a refresh is forced.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use crate::gallery::GalleryClient;
use crate::pack::{ensure_layer_assets, LocalPack, PackError};
use crate::SceneHandle;

#[derive(Debug)]
pub enum SceneSource {
    Local(LocalPack),
    CachedGallery(GalleryScene),
}

#[derive(Debug)]
pub struct GalleryScene {
    pub id: String,
    pub cache_dir: PathBuf,
    pub pack: LocalPack,
}

#[derive(Debug)]
pub struct SceneRepository {
    local_roots: Vec<PathBuf>,
    cache_root: PathBuf,
}

impl SceneRepository {
    pub fn new(local_roots: Vec<PathBuf>, cache_root: PathBuf) -> Self {
        Self {
            local_roots,
            cache_root,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![PathBuf::from("scenes")], PathBuf::from("cache/gallery"))
    }

    pub fn resolve(
        &self,
        handle: &SceneHandle,
        client: Option<&GalleryClient>,
        refresh_remote: bool,
    ) -> Result<SceneSource> {
        match handle {
            SceneHandle::LocalPack(path) => {
                let pack = self.load_local_pack(path)?;
                Ok(SceneSource::Local(pack))
            }
            SceneHandle::Gallery(id) => {
                let scene = if let Some(client) = client {
                    self.ensure_gallery_cached(id, client, refresh_remote)?
                } else {
                    self.load_cached_gallery(id)?
                };
                Ok(SceneSource::CachedGallery(scene))
            }
        }
    }

    fn load_local_pack(&self, path: &Path) -> Result<LocalPack> {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("scene pack path must not be empty"));
        }

        debug!(requested = %path.display(), roots = ?self.local_roots, "resolving local scene pack");
        let candidates = if path.is_absolute() || path.exists() {
            vec![path.to_path_buf()]
        } else {
            self.local_roots
                .iter()
                .map(|root| root.join(path))
                .collect()
        };

        for candidate in candidates {
            if candidate.exists() {
                match LocalPack::load(&candidate) {
                    Ok(pack) => {
                        check_assets(&pack, &candidate)?;
                        debug!(path = %candidate.display(), "loaded local scene pack");
                        return Ok(pack);
                    }
                    Err(err) => {
                        warn!(path = %candidate.display(), error = %err, "failed to load local scene pack");
                        return Err(anyhow!(err));
                    }
                }
            }
        }

        warn!(requested = %path.display(), roots = ?self.local_roots, "scene pack missing");
        Err(anyhow!(
            "unable to locate scene pack '{}'. searched roots: {:?}",
            path.display(),
            self.local_roots
        ))
    }

    fn ensure_gallery_cached(
        &self,
        id: &str,
        client: &GalleryClient,
        refresh: bool,
    ) -> Result<GalleryScene> {
        let cache_dir = self.cache_root.join(id);
        if refresh && cache_dir.exists() {
            fs::remove_dir_all(&cache_dir)?;
        }

        if cache_dir.exists() {
            match self.load_cached_gallery(id) {
                Ok(scene) => return Ok(scene),
                Err(err) => {
                    // Cache is corrupt; rebuild it.
                    fs::remove_dir_all(&cache_dir)?;
                    warn!(scene = id, error = %err, "gallery cache invalid, refetching");
                }
            }
        }

        let pack = client.fetch_and_cache(id, &cache_dir)?;
        check_assets(&pack, &cache_dir)?;
        Ok(GalleryScene {
            id: id.to_string(),
            cache_dir,
            pack,
        })
    }

    fn load_cached_gallery(&self, id: &str) -> Result<GalleryScene> {
        let cache_dir = self.cache_root.join(id);
        if !cache_dir.exists() {
            bail!("no cached scene '{}' found at {}", id, cache_dir.display());
        }
        let pack = LocalPack::load(&cache_dir).map_err(|err| anyhow!(err))?;
        check_assets(&pack, &cache_dir)?;
        Ok(GalleryScene {
            id: id.to_string(),
            cache_dir,
            pack,
        })
    }
}

fn check_assets(pack: &LocalPack, origin: &Path) -> Result<()> {
    ensure_layer_assets(pack).map_err(|err| match err {
        PackError::ManifestValidation(items) => anyhow!(
            "scene pack '{}' failed validation: {:?}",
            origin.display(),
            items
        ),
        other => anyhow!(other),
    })?;
    Ok(())
}

/// Lifts the pack out of any resolved source for renderer bindings.
pub fn scene_pack(source: &SceneSource) -> &LocalPack {
    match source {
        SceneSource::Local(pack) => pack,
        SceneSource::CachedGallery(scene) => &scene.pack,
    }
}
