//! Show mode: rotates hero scenes in a single window on a schedule. The
//! engine couples the scheduler with the scene cache and feeds swap requests
//! to the renderer thread; spacebar presses skip ahead.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use renderer::{
    Antialiasing, RenderMode, RenderPolicy, RendererConfig, SceneSpec, SwapRequest, WindowRuntime,
};
use scenepack::{scene_pack, GalleryClient, PathResolver, SceneHandle, SceneRepository};
use scheduler::{ScheduledScene, Scheduler, SelectionChange, TargetId};
use showconfig::ShowConfig;
use tracing::{debug, error, info, warn};

use crate::bindings::{map_antialias, scene_spec_from_pack};
use crate::bootstrap::parse_surface_size;
use crate::cli::RunArgs;
use crate::paths::AppPaths;

const ENGINE_TICK: Duration = Duration::from_millis(120);

pub fn run_show(
    args: &RunArgs,
    repo: &SceneRepository,
    client: Option<&GalleryClient>,
    path: &Path,
    paths: &AppPaths,
) -> Result<()> {
    let (config, config_path) = load_config(path, paths)?;
    info!(config = %config_path.display(), "loaded show configuration");

    let show_name = select_show(&config)?.to_string();
    let mut cache = SceneCache::new(repo, client, args.cache_only)?;
    let bootstrap = select_bootstrap_scene(&config, &show_name, &mut cache)?;

    let requested_size = args
        .size
        .as_ref()
        .map(|value| parse_surface_size(value))
        .transpose()?;
    let fallback_surface = requested_size.unwrap_or((1280, 720));

    let renderer_config = RendererConfig {
        surface_size: fallback_surface,
        scene: bootstrap,
        mode: if args.kiosk {
            RenderMode::Kiosk
        } else {
            RenderMode::Windowed
        },
        antialiasing: args.antialias,
        policy: RenderPolicy::Animate {
            target_fps: normalize_fps(args.fps),
        },
        seed: args.seed,
    };
    let runtime = WindowRuntime::spawn(renderer_config)?;

    let seed = args.seed.unwrap_or_else(seed_from_time);
    let options = EngineOptions {
        cache_only: args.cache_only,
        refresh_all: args.refresh,
        global_fps: normalize_fps(args.fps),
        global_antialias: args.antialias,
        warmup_override: args.warmup_ms.map(Duration::from_millis),
    };
    let (mut engine, initial) = ShowEngine::new(&config, cache, seed, options, &show_name)?;

    let initial_action = engine.activate(initial);
    if !apply_actions(&runtime, initial_action.into_iter().collect()) {
        return runtime.shutdown();
    }

    loop {
        if !runtime.is_running() {
            break;
        }

        let advances = runtime.take_advance_requests();
        if advances > 0 {
            info!(requests = advances, "show advance requested via spacebar");
        }
        for _ in 0..advances {
            if !apply_actions(&runtime, engine.skip(Instant::now())) {
                return runtime.shutdown();
            }
        }

        std::thread::sleep(ENGINE_TICK);
        if !apply_actions(&runtime, engine.tick(Instant::now())) {
            break;
        }
    }

    runtime.shutdown()
}

fn load_config(path: &Path, paths: &AppPaths) -> Result<(ShowConfig, PathBuf)> {
    let mut candidates = Vec::new();
    if path.is_dir() {
        candidates.push(path.join("show.toml"));
    } else {
        candidates.push(path.to_path_buf());
    }
    if !path.is_absolute() {
        for root in paths.show_roots() {
            candidates.push(root.join(path));
        }
    }
    debug!(?candidates, "show config search candidates");

    let resolved = candidates
        .into_iter()
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| anyhow::anyhow!("no show configuration found at '{}'", path.display()))?;
    let contents = fs::read_to_string(&resolved)
        .with_context(|| format!("failed to read show config at {}", resolved.display()))?;
    let config = ShowConfig::from_toml_str(&contents)?;
    Ok((config, resolved))
}

fn select_show(config: &ShowConfig) -> Result<&str> {
    if let Some(show) = config.targets.get("_default") {
        return Ok(show.as_str());
    }
    if let Some(show) = config.default_show() {
        return Ok(show);
    }
    bail!("show mode requires defaults.show or a '_default' target");
}

fn select_bootstrap_scene(
    config: &ShowConfig,
    show_name: &str,
    cache: &mut SceneCache<'_>,
) -> Result<SceneSpec> {
    let show = config
        .show(show_name)
        .ok_or_else(|| anyhow::anyhow!("show '{show_name}' not found in configuration"))?;
    let first = show
        .scenes
        .first()
        .ok_or_else(|| anyhow::anyhow!("show '{show_name}' has no scenes"))?;
    cache.resolve(&first.handle, false)
}

fn normalize_fps(value: Option<f32>) -> Option<f32> {
    value.and_then(|fps| if fps > 0.0 { Some(fps) } else { None })
}

fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

struct SwapAction {
    handle: String,
    request: SwapRequest,
}

fn apply_actions(runtime: &WindowRuntime, actions: Vec<SwapAction>) -> bool {
    for action in actions {
        info!(
            handle = %action.handle,
            scene = %action.request.scene.name,
            crossfade_ms = action.request.crossfade.as_millis(),
            "swapping scene"
        );
        if let Err(err) = runtime.swap_scene(action.request) {
            error!(handle = %action.handle, error = ?err, "failed to swap scene");
            return false;
        }
    }
    true
}

struct EngineOptions {
    cache_only: bool,
    refresh_all: bool,
    global_fps: Option<f32>,
    global_antialias: Antialiasing,
    warmup_override: Option<Duration>,
}

/// Resolves handles to renderer scene specs, memoizing per handle so a
/// rotation does not reload packs every cycle.
struct SceneCache<'a> {
    repo: &'a SceneRepository,
    client: Option<&'a GalleryClient>,
    cache_only: bool,
    resolver: PathResolver,
    entries: HashMap<String, SceneSpec>,
}

impl<'a> SceneCache<'a> {
    fn new(
        repo: &'a SceneRepository,
        client: Option<&'a GalleryClient>,
        cache_only: bool,
    ) -> Result<Self> {
        Ok(Self {
            repo,
            client,
            cache_only,
            resolver: PathResolver::new()?,
            entries: HashMap::new(),
        })
    }

    fn resolve(&mut self, handle: &str, refresh: bool) -> Result<SceneSpec> {
        if !refresh {
            if let Some(spec) = self.entries.get(handle) {
                debug!(handle, "using cached scene spec");
                return Ok(spec.clone());
            }
        }

        let scene_handle = scenepack::handle::parse_scene_handle(&self.resolver, handle)?;
        debug!(handle = %handle, refresh, "resolving scene handle");
        let source = self
            .repo
            .resolve(&scene_handle, self.client, refresh && !self.cache_only)
            .with_context(|| format!("failed to resolve scene '{handle}'"))?;
        let pack = scene_pack(&source);
        if matches!(scene_handle, SceneHandle::Gallery(_)) {
            debug!(root = %pack.root().display(), "loaded gallery scene pack");
        }
        let spec = scene_spec_from_pack(pack, None);
        self.entries.insert(handle.to_string(), spec.clone());
        Ok(spec)
    }
}

struct ShowEngine<'a> {
    cache: SceneCache<'a>,
    scheduler: Scheduler,
    options: EngineOptions,
    refreshed: HashSet<String>,
    target: TargetId,
    show_name: String,
    show_len: usize,
}

impl<'a> ShowEngine<'a> {
    fn new(
        config: &ShowConfig,
        cache: SceneCache<'a>,
        seed: u64,
        options: EngineOptions,
        show_name: &str,
    ) -> Result<(Self, SelectionChange)> {
        let show_len = config
            .show(show_name)
            .map(|show| show.scenes.len())
            .unwrap_or(0);
        let mut scheduler = Scheduler::new(config, seed);
        let target = TargetId::new("window:0");
        let initial = scheduler.set_target(target.clone(), show_name, Instant::now())?;
        info!(show = show_name, scenes = show_len, seed, "show rotation registered");

        Ok((
            Self {
                cache,
                scheduler,
                options,
                refreshed: HashSet::new(),
                target,
                show_name: show_name.to_string(),
                show_len,
            },
            initial,
        ))
    }

    fn tick(&mut self, now: Instant) -> Vec<SwapAction> {
        let changes = self.scheduler.tick(now);
        changes
            .into_iter()
            .filter_map(|change| self.activate(change))
            .collect()
    }

    fn skip(&mut self, now: Instant) -> Vec<SwapAction> {
        match self.scheduler.skip_target(&self.target, now) {
            Some(change) => self.activate(change).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn activate(&mut self, mut change: SelectionChange) -> Option<SwapAction> {
        let mut attempts = 0;
        loop {
            let handle = change.scene.handle.clone();
            let needs_refresh = self.should_refresh(&handle, &change.scene);

            match self.cache.resolve(&handle, needs_refresh) {
                Ok(mut spec) => {
                    if needs_refresh {
                        self.refreshed.insert(handle.clone());
                    }
                    spec.warmup = self
                        .options
                        .warmup_override
                        .or(change.scene.warmup)
                        .or(spec.warmup);

                    let crossfade = if self.show_len <= 1 {
                        Duration::ZERO
                    } else {
                        change.scene.crossfade
                    };
                    let fps = change.scene.fps.or(self.options.global_fps);
                    let antialiasing = change
                        .scene
                        .antialias
                        .map(map_antialias)
                        .unwrap_or(self.options.global_antialias);

                    debug!(
                        handle = %handle,
                        duration_ms = change.scene.duration.as_millis(),
                        crossfade_ms = crossfade.as_millis(),
                        refresh = needs_refresh,
                        "prepared swap action"
                    );
                    return Some(SwapAction {
                        handle,
                        request: SwapRequest {
                            scene: spec,
                            crossfade,
                            antialiasing,
                            policy: RenderPolicy::Animate { target_fps: fps },
                        },
                    });
                }
                Err(err) => {
                    warn!(handle = %handle, error = ?err, "failed to load scene; skipping");
                    attempts += 1;
                    if attempts >= self.show_len.max(1) {
                        warn!(show = %self.show_name, "all show scenes failed to load");
                        return None;
                    }
                    match self.scheduler.skip_target(&self.target, Instant::now()) {
                        Some(next) => change = next,
                        None => return None,
                    }
                }
            }
        }
    }

    fn should_refresh(&self, handle: &str, scene: &ScheduledScene) -> bool {
        if self.options.cache_only {
            return false;
        }
        if !(self.options.refresh_all || scene.refresh_once) {
            return false;
        }
        !self.refreshed.contains(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_pack(root: &Path, name: &str) {
        let pack_dir = root.join(name);
        fs::create_dir_all(&pack_dir).unwrap();
        fs::write(
            pack_dir.join("scene.toml"),
            format!(
                "name = \"{name}\"\nwarmup = 2.0\n\n[[layers]]\nname = \"dust\"\ntype = \"particles\"\n"
            ),
        )
        .unwrap();
    }

    fn options() -> EngineOptions {
        EngineOptions {
            cache_only: false,
            refresh_all: false,
            global_fps: None,
            global_antialias: Antialiasing::Auto,
            warmup_override: None,
        }
    }

    #[test]
    fn select_show_requires_a_default() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[shows.solo]
mode = "continuous"
scene_duration = 60

[[shows.solo.scenes]]
handle = "demo"
"#,
        )
        .unwrap();
        let err = select_show(&config).unwrap_err();
        assert!(err.to_string().contains("defaults.show"));
    }

    #[test]
    fn select_show_prefers_default_target() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
show = "solo"

[shows.solo]
mode = "continuous"
scene_duration = 60

[[shows.solo.scenes]]
handle = "demo"

[shows.alt]
mode = "continuous"
scene_duration = 60

[[shows.alt.scenes]]
handle = "other"

[targets]
"_default" = "alt"
"#,
        )
        .unwrap();
        assert_eq!(select_show(&config).unwrap(), "alt");
    }

    #[test]
    fn engine_rotates_scenes_on_schedule() {
        let temp = tempdir().unwrap();
        let packs_root = temp.path().join("scenes");
        write_pack(&packs_root, "demo");
        write_pack(&packs_root, "alt");

        let repo = SceneRepository::new(vec![packs_root], temp.path().join("cache"));
        let cache = SceneCache::new(&repo, None, false).unwrap();

        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
show = "solo"

[shows.solo]
mode = "continuous"
scene_duration = 1

[[shows.solo.scenes]]
handle = "demo"

[[shows.solo.scenes]]
handle = "alt"
"#,
        )
        .unwrap();

        let start = Instant::now();
        let (mut engine, initial) = ShowEngine::new(&config, cache, 99, options(), "solo").unwrap();
        let action = engine.activate(initial).expect("initial action");
        assert_eq!(action.handle, "demo");
        assert_eq!(action.request.scene.name, "demo");

        let advances = engine.tick(start + Duration::from_secs(1));
        assert_eq!(advances.len(), 1);
        assert_eq!(advances[0].handle, "alt");
    }

    #[test]
    fn engine_skips_missing_scenes() {
        let temp = tempdir().unwrap();
        let packs_root = temp.path().join("scenes");
        write_pack(&packs_root, "valid");

        let repo = SceneRepository::new(vec![packs_root], temp.path().join("cache"));
        let cache = SceneCache::new(&repo, None, false).unwrap();

        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
show = "solo"

[shows.solo]
mode = "continuous"
scene_duration = 1

[[shows.solo.scenes]]
handle = "missing"

[[shows.solo.scenes]]
handle = "valid"
"#,
        )
        .unwrap();

        let (mut engine, initial) = ShowEngine::new(&config, cache, 55, options(), "solo").unwrap();
        let action = engine.activate(initial).expect("fallback to valid scene");
        assert_eq!(action.handle, "valid");
    }

    #[test]
    fn warmup_override_flows_into_requests() {
        let temp = tempdir().unwrap();
        let packs_root = temp.path().join("scenes");
        write_pack(&packs_root, "demo");

        let repo = SceneRepository::new(vec![packs_root], temp.path().join("cache"));
        let cache = SceneCache::new(&repo, None, false).unwrap();

        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
show = "solo"

[shows.solo]
mode = "continuous"
scene_duration = 1

[[shows.solo.scenes]]
handle = "demo"
"#,
        )
        .unwrap();

        let mut opts = options();
        opts.warmup_override = Some(Duration::from_millis(900));
        let (mut engine, initial) = ShowEngine::new(&config, cache, 7, opts, "solo").unwrap();
        let action = engine.activate(initial).expect("action");
        assert_eq!(action.request.scene.warmup, Some(Duration::from_millis(900)));
        // Single-scene shows swap without a crossfade.
        assert_eq!(action.request.crossfade, Duration::ZERO);
    }

    #[test]
    fn manifest_warmup_survives_when_no_override() {
        let temp = tempdir().unwrap();
        let packs_root = temp.path().join("scenes");
        write_pack(&packs_root, "demo");

        let repo = SceneRepository::new(vec![packs_root], temp.path().join("cache"));
        let cache = SceneCache::new(&repo, None, false).unwrap();

        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
show = "solo"

[shows.solo]
mode = "continuous"
scene_duration = 1

[[shows.solo.scenes]]
handle = "demo"
"#,
        )
        .unwrap();

        let (mut engine, initial) =
            ShowEngine::new(&config, cache, 7, options(), "solo").unwrap();
        let action = engine.activate(initial).expect("action");
        assert_eq!(action.request.scene.warmup, Some(Duration::from_secs(2)));
    }
}
