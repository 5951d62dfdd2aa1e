use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "VITRINE_CONFIG_DIR";
pub const ENV_DATA_DIR: &str = "VITRINE_DATA_DIR";
pub const ENV_CACHE_DIR: &str = "VITRINE_CACHE_DIR";

const QUALIFIER: &str = "dev";
const ORGANISATION: &str = "Afioniq";
const APPLICATION: &str = "vitrine";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;

        Ok(Self {
            config_dir: env_override(ENV_CONFIG_DIR)
                .unwrap_or_else(|| project_dirs.config_dir().to_path_buf()),
            data_dir: env_override(ENV_DATA_DIR)
                .unwrap_or_else(|| project_dirs.data_dir().to_path_buf()),
            cache_dir: env_override(ENV_CACHE_DIR)
                .unwrap_or_else(|| project_dirs.cache_dir().to_path_buf()),
        })
    }

    pub fn from_dirs(
        config_dir: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_dir: config_dir.into(),
            data_dir: data_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Search roots for local scene packs, most specific first.
    pub fn scene_roots(&self) -> Vec<PathBuf> {
        vec![
            self.config_dir.join("scenes"),
            self.data_dir.join("scenes"),
        ]
    }

    /// Search roots for show configuration files.
    pub fn show_roots(&self) -> Vec<PathBuf> {
        vec![self.config_dir.join("shows"), self.data_dir.join("shows")]
    }

    pub fn gallery_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("gallery")
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    env::var_os(name).and_then(|value| {
        if value.is_empty() {
            None
        } else {
            Some(PathBuf::from(value))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roots_are_derived_from_dirs() {
        let paths = AppPaths::from_dirs("/cfg", "/data", "/cache");
        assert_eq!(
            paths.scene_roots(),
            vec![PathBuf::from("/cfg/scenes"), PathBuf::from("/data/scenes")]
        );
        assert_eq!(
            paths.show_roots(),
            vec![PathBuf::from("/cfg/shows"), PathBuf::from("/data/shows")]
        );
        assert_eq!(paths.gallery_cache_dir(), PathBuf::from("/cache/gallery"));
    }
}
