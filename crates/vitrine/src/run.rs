use std::time::Duration;

use anyhow::{Context, Result};
use renderer::{RenderMode, RenderPolicy, Renderer, RendererConfig};
use scenepack::{
    scene_pack, GalleryClient, GalleryConfig, PathResolver, SceneHandle, SceneRepository,
    SceneSource,
};
use tracing_subscriber::EnvFilter;

use crate::bindings::scene_spec_from_pack;
use crate::bootstrap::{
    self, parse_surface_size, resolve_scene_handle, SingleRunConfig, DEFAULT_SCENE,
};
use crate::cli::{Cli, Command, DefaultsAction, DefaultsCommand, RunArgs};
use crate::defaults;
use crate::paths::AppPaths;
use crate::show;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        data = %paths.data_dir().display(),
        cache = %paths.cache_dir().display(),
        "resolved vitrine paths"
    );

    if let Some(Command::Defaults(command)) = cli.command {
        return run_defaults(command, &paths);
    }

    bootstrap::bootstrap_filesystem(&paths)?;
    if cli.run.init_defaults {
        let written = defaults::sync(&paths, false)?;
        tracing::info!(installed = written.len(), "defaults initialised");
        return Ok(());
    }

    let repo = SceneRepository::new(paths.scene_roots(), paths.gallery_cache_dir());
    let client = build_client(&cli.run)?;

    if let Some(path) = cli.run.show.as_ref() {
        show::run_show(&cli.run, &repo, client.as_ref(), path, &paths)
    } else {
        let context = prepare_single_run(&cli.run, &repo, client.as_ref(), &paths)?;
        run_single(context)
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_defaults(command: DefaultsCommand, paths: &AppPaths) -> Result<()> {
    match command.action {
        DefaultsAction::Sync(args) => {
            let written = defaults::sync(paths, args.dry_run)?;
            if args.dry_run {
                for path in &written {
                    println!("would install {}", path.display());
                }
            }
            println!(
                "{} bundled scene(s) {}",
                written.len(),
                if args.dry_run { "pending" } else { "installed" }
            );
            Ok(())
        }
        DefaultsAction::List => {
            for scene in defaults::list(paths) {
                println!(
                    "{:<12} {:<9} {}",
                    scene.name,
                    if scene.installed { "installed" } else { "missing" },
                    scene.path.display()
                );
            }
            Ok(())
        }
        DefaultsAction::Where => {
            println!("config: {}", paths.config_dir().display());
            println!("data:   {}", paths.data_dir().display());
            println!("cache:  {}", paths.cache_dir().display());
            for root in paths.scene_roots() {
                println!("scenes: {}", root.display());
            }
            println!("gallery cache: {}", paths.gallery_cache_dir().display());
            Ok(())
        }
    }
}

fn build_client(args: &RunArgs) -> Result<Option<GalleryClient>> {
    if args.cache_only {
        tracing::info!("remote fetch disabled (--cache-only)");
        return Ok(None);
    }

    let config = match args.gallery_base.as_deref() {
        Some(base) => GalleryConfig::new(base).context("invalid gallery base url")?,
        None => GalleryConfig::default(),
    };
    Ok(Some(
        GalleryClient::new(config).context("failed to construct gallery client")?,
    ))
}

fn prepare_single_run(
    args: &RunArgs,
    repo: &SceneRepository,
    client: Option<&GalleryClient>,
    paths: &AppPaths,
) -> Result<SingleRunConfig> {
    let resolver = PathResolver::new()?;
    let handle = resolve_scene_handle(&resolver, args)?;
    tracing::info!(?handle, "bootstrapping vitrine scene daemon");
    if matches!(handle, SceneHandle::Gallery(_)) && args.refresh && client.is_none() {
        tracing::warn!("refresh requested but remote fetch is disabled; using cache only");
    }

    let refresh = args.refresh && !args.cache_only;
    let source = match repo.resolve(&handle, client, refresh) {
        Ok(source) => source,
        // A bare launch points at the bundled scene; install defaults once
        // and retry before giving up.
        Err(err) if args.scene.is_none() && args.gallery.is_none() => {
            tracing::info!(error = %err, "default scene missing; installing bundled defaults");
            defaults::sync(paths, false)?;
            repo.resolve(&handle, client, refresh)
                .with_context(|| format!("failed to resolve bundled scene '{DEFAULT_SCENE}'"))?
        }
        Err(err) => return Err(err),
    };

    match &source {
        SceneSource::Local(pack) => {
            tracing::info!(root = %pack.root().display(), "loaded local scene pack");
        }
        SceneSource::CachedGallery(scene) => {
            tracing::info!(
                scene = %scene.id,
                cache = %scene.cache_dir.display(),
                refreshed = refresh,
                "loaded gallery scene"
            );
        }
    }

    let warmup_override = args.warmup_ms.map(Duration::from_millis);
    let scene = scene_spec_from_pack(scene_pack(&source), warmup_override);

    let requested_size = args
        .size
        .as_ref()
        .map(|value| parse_surface_size(value))
        .transpose()?;
    let fallback_surface = requested_size.unwrap_or(if args.kiosk {
        (1920, 1080)
    } else {
        (1280, 720)
    });

    let policy = match args.still {
        Some(time) => RenderPolicy::Still { time: Some(time) },
        None => RenderPolicy::Animate {
            target_fps: match args.fps {
                Some(fps) if fps > 0.0 => Some(fps),
                _ => None,
            },
        },
    };

    let renderer_config = RendererConfig {
        surface_size: fallback_surface,
        scene,
        mode: if args.kiosk {
            RenderMode::Kiosk
        } else {
            RenderMode::Windowed
        },
        antialiasing: args.antialias,
        policy,
        seed: args.seed,
    };

    Ok(SingleRunConfig { renderer_config })
}

fn run_single(config: SingleRunConfig) -> Result<()> {
    let mut renderer = Renderer::new(config.renderer_config);
    renderer.run()
}
