mod gallery;
mod manifest;
mod pack;
mod path;
mod repository;

pub mod handle;

pub use gallery::{
    unpack_archive, CatalogEntry, GalleryClient, GalleryConfig, DEFAULT_GALLERY_BASE,
};
pub use manifest::{
    Axis, EffectKind, LayerSource, MeshEffect, SceneLayer, ScenePackManifest, MANIFEST_FILE,
};
pub use pack::{ensure_layer_assets, LocalPack, PackError};
pub use path::PathResolver;
pub use repository::{scene_pack, GalleryScene, SceneRepository, SceneSource};

use std::path::{Path, PathBuf};

/// Reference to a scene: either a pack directory on disk or an entry in the
/// hosted gallery, written `gallery://<id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneHandle {
    Gallery(String),
    LocalPack(PathBuf),
}

impl SceneHandle {
    pub fn from_input(input: &str) -> Self {
        if let Some(id) = input.strip_prefix("gallery://") {
            Self::Gallery(id.to_string())
        } else {
            Self::LocalPack(PathBuf::from(input))
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalPack(_))
    }

    pub fn expects_layout(&self) -> Option<&Path> {
        match self {
            Self::LocalPack(path) => Some(path.as_path()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gallery_scheme() {
        assert_eq!(
            SceneHandle::from_input("gallery://gaming-worlds"),
            SceneHandle::Gallery("gaming-worlds".into())
        );
    }

    #[test]
    fn parses_local_path() {
        assert!(matches!(
            SceneHandle::from_input("scenes/orbitals"),
            SceneHandle::LocalPack(path) if path == PathBuf::from("scenes/orbitals")
        ));
    }
}
