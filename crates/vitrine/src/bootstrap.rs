use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use renderer::RendererConfig;
use scenepack::handle::{normalize_gallery_reference, parse_scene_handle};
use scenepack::{PathResolver, SceneHandle};
use tracing::debug;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Scene shown when the CLI is launched with no handle at all.
pub const DEFAULT_SCENE: &str = "orbitals";

pub fn bootstrap_filesystem(paths: &AppPaths) -> Result<()> {
    let directories = vec![
        paths.config_dir().to_path_buf(),
        paths.data_dir().to_path_buf(),
        paths.cache_dir().to_path_buf(),
        paths.gallery_cache_dir(),
        paths.data_dir().join("scenes"),
    ];

    for dir in directories {
        ensure_directory(&dir)?;
    }

    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            debug!(path = %path.display(), "reusing existing directory");
            Ok(())
        } else {
            bail!("filesystem entry at {} is not a directory", path.display());
        }
    } else {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create vitrine directory at {}", path.display()))?;
        debug!(path = %path.display(), "created vitrine directory");
        Ok(())
    }
}

pub fn resolve_scene_handle(resolver: &PathResolver, args: &RunArgs) -> Result<SceneHandle> {
    if let Some(ref gallery) = args.gallery {
        let normalized = normalize_gallery_reference(gallery)?;
        return parse_scene_handle(resolver, &normalized);
    }

    if let Some(ref scene) = args.scene {
        return parse_scene_handle(resolver, scene);
    }

    Ok(SceneHandle::LocalPack(DEFAULT_SCENE.into()))
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("expected WxH format, e.g. 1920x1080"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        anyhow::bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

pub struct SingleRunConfig {
    pub renderer_config: RendererConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            scene: None,
            gallery: None,
            show: None,
            kiosk: false,
            size: None,
            fps: None,
            still: None,
            seed: None,
            refresh: false,
            cache_only: false,
            gallery_base: None,
            antialias: renderer::Antialiasing::Auto,
            warmup_ms: None,
            init_defaults: false,
        }
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_surface_size(" 1280 X 720 ").unwrap(), (1280, 720));
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("0x720").is_err());
        assert!(parse_surface_size("axb").is_err());
    }

    #[test]
    fn gallery_flag_wins_over_positional() {
        let resolver = PathResolver::with_cwd("/");
        let mut args = args();
        args.scene = Some("scenes/demo".into());
        args.gallery = Some("gaming-worlds".into());
        let handle = resolve_scene_handle(&resolver, &args).unwrap();
        assert_eq!(handle, SceneHandle::Gallery("gaming-worlds".into()));
    }

    #[test]
    fn defaults_to_bundled_scene() {
        let resolver = PathResolver::with_cwd("/");
        let handle = resolve_scene_handle(&resolver, &args()).unwrap();
        assert_eq!(handle, SceneHandle::LocalPack(DEFAULT_SCENE.into()));
    }
}
