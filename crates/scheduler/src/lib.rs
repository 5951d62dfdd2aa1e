//! Rotation scheduler for show mode. Each display target tracks its place in
//! a show; `tick` advances rotations whose current scene has run out its
//! duration, and `skip_target` jumps ahead on demand (spacebar).
//! Shuffle shows reshuffle their order each full cycle with a seeded RNG so
//! runs are reproducible.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::prelude::*;
use showconfig::{AntialiasSetting, RotationMode, ShowConfig};

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("show '{0}' not found")]
    UnknownShow(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetId(pub String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        TargetId(id.into())
    }
}

/// A scene selection with every show/global default already folded in.
#[derive(Debug, Clone)]
pub struct ScheduledScene {
    pub handle: String,
    pub duration: Duration,
    pub fps: Option<f32>,
    pub antialias: Option<AntialiasSetting>,
    pub warmup: Option<Duration>,
    pub refresh_once: bool,
    pub crossfade: Duration,
}

#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub target: TargetId,
    pub scene: ScheduledScene,
    pub started_at: Instant,
}

pub struct Scheduler {
    shows: HashMap<String, ShowRuntime>,
    targets: HashMap<TargetId, TargetState>,
    rng: StdRng,
}

fn normalize_fps(value: Option<f32>) -> Option<f32> {
    value.and_then(|fps| if fps > 0.0 { Some(fps) } else { None })
}

impl Scheduler {
    pub fn new(config: &ShowConfig, seed: u64) -> Self {
        let shows = config
            .shows
            .iter()
            .map(|(name, show)| (name.clone(), ShowRuntime::from_config(show, &config.defaults)))
            .collect();
        Self {
            shows,
            targets: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_target(
        &mut self,
        target: TargetId,
        show: &str,
        now: Instant,
    ) -> Result<SelectionChange, SchedulerError> {
        let runtime = self
            .shows
            .get(show)
            .ok_or_else(|| SchedulerError::UnknownShow(show.to_string()))?
            .clone();

        let state = TargetState::new(runtime, now, &mut self.rng);
        let scene = state.current_scheduled_scene();
        self.targets.insert(target.clone(), state);
        Ok(SelectionChange {
            target,
            scene,
            started_at: now,
        })
    }

    pub fn remove_target(&mut self, target: &TargetId) {
        self.targets.remove(target);
    }

    pub fn skip_target(&mut self, target: &TargetId, now: Instant) -> Option<SelectionChange> {
        let state = self.targets.get_mut(target)?;
        if state.show.scenes.len() <= 1 {
            return None;
        }
        state.advance_to_next(now, &mut self.rng);
        let scene = state.current_scheduled_scene();
        Some(SelectionChange {
            target: target.clone(),
            scene,
            started_at: now,
        })
    }

    pub fn tick(&mut self, now: Instant) -> Vec<SelectionChange> {
        let mut changes = Vec::new();
        for (target, state) in self.targets.iter_mut() {
            if state.advance_if_elapsed(now, &mut self.rng) {
                let scene = state.current_scheduled_scene();
                changes.push(SelectionChange {
                    target: target.clone(),
                    scene,
                    started_at: now,
                });
            }
        }
        changes
    }
}

#[derive(Clone)]
struct ShowRuntime {
    mode: RotationMode,
    crossfade: Duration,
    scenes: Vec<RuntimeScene>,
}

impl ShowRuntime {
    fn from_config(src: &showconfig::Show, defaults: &showconfig::Defaults) -> Self {
        let scenes = src
            .scenes
            .iter()
            .map(|scene| RuntimeScene {
                handle: scene.handle.clone(),
                duration: scene.duration.unwrap_or(src.scene_duration),
                fps: normalize_fps(scene.fps)
                    .or_else(|| normalize_fps(src.fps))
                    .or_else(|| normalize_fps(defaults.fps)),
                antialias: scene.antialias.or(src.antialias).or(defaults.antialias),
                warmup: scene.warmup.or(defaults.warmup),
                refresh_once: scene.refresh_once,
            })
            .collect();
        Self {
            mode: src.mode.clone(),
            crossfade: src.crossfade,
            scenes,
        }
    }
}

#[derive(Clone)]
struct RuntimeScene {
    handle: String,
    duration: Duration,
    fps: Option<f32>,
    antialias: Option<AntialiasSetting>,
    warmup: Option<Duration>,
    refresh_once: bool,
}

struct TargetState {
    show: ShowRuntime,
    order: Vec<usize>,
    cursor: usize,
    last_started: Instant,
}

impl TargetState {
    fn new(show: ShowRuntime, now: Instant, rng: &mut StdRng) -> Self {
        let order = build_order(show.scenes.len(), &show.mode, rng);
        Self {
            show,
            order,
            cursor: 0,
            last_started: now,
        }
    }

    fn current_index(&self) -> usize {
        self.order[self.cursor]
    }

    fn advance_if_elapsed(&mut self, now: Instant, rng: &mut StdRng) -> bool {
        if self.show.scenes.len() <= 1 {
            return false;
        }
        let idx = self.current_index();
        let scene = &self.show.scenes[idx];
        if now.duration_since(self.last_started) >= scene.duration {
            self.advance_to_next(now, rng);
            true
        } else {
            false
        }
    }

    fn advance_to_next(&mut self, now: Instant, rng: &mut StdRng) {
        if self.show.scenes.len() <= 1 {
            self.last_started = now;
            return;
        }
        self.cursor += 1;
        if self.cursor >= self.order.len() {
            self.order = build_order(self.show.scenes.len(), &self.show.mode, rng);
            self.cursor = 0;
        }
        self.last_started = now;
    }

    fn current_scheduled_scene(&self) -> ScheduledScene {
        let idx = self.current_index();
        let scene = &self.show.scenes[idx];
        ScheduledScene {
            handle: scene.handle.clone(),
            duration: scene.duration,
            fps: scene.fps,
            antialias: scene.antialias,
            warmup: scene.warmup,
            refresh_once: scene.refresh_once,
            crossfade: self.show.crossfade,
        }
    }
}

fn build_order(len: usize, mode: &RotationMode, rng: &mut StdRng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    match mode {
        RotationMode::Continuous => {}
        RotationMode::Shuffle => {
            order.shuffle(rng);
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use showconfig::ShowConfig;

    const CONFIG: &str = r#"
version = 1

[shows.test]
mode = "continuous"
scene_duration = 1

[[shows.test.scenes]]
handle = "one"
[[shows.test.scenes]]
handle = "two"

"#;

    #[test]
    fn advances_continuous_show() {
        let config = ShowConfig::from_toml_str(CONFIG).unwrap();
        let mut scheduler = Scheduler::new(&config, 1);
        let target = TargetId::new("window:0");
        let mut now = Instant::now();
        let first = scheduler.set_target(target.clone(), "test", now).unwrap();
        assert_eq!(first.scene.handle, "one");
        now += Duration::from_secs(1);
        let changes = scheduler.tick(now);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].scene.handle, "two");
    }

    #[test]
    fn unknown_show_is_an_error() {
        let config = ShowConfig::from_toml_str(CONFIG).unwrap();
        let mut scheduler = Scheduler::new(&config, 1);
        let err = scheduler
            .set_target(TargetId::new("window:0"), "nope", Instant::now())
            .unwrap_err();
        assert!(matches!(err, SchedulerError::UnknownShow(_)));
    }

    #[test]
    fn shuffle_generates_order() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[shows.test]
mode = "shuffle"
scene_duration = 1

[[shows.test.scenes]]
handle = "one"
[[shows.test.scenes]]
handle = "two"
[[shows.test.scenes]]
handle = "three"
"#,
        )
        .unwrap();
        let mut scheduler = Scheduler::new(&config, 42);
        let target = TargetId::new("window:0");
        let first = scheduler
            .set_target(target.clone(), "test", Instant::now())
            .unwrap();
        assert!(matches!(
            first.scene.handle.as_str(),
            "one" | "two" | "three"
        ));
    }

    #[test]
    fn applies_global_defaults() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
fps = 48
antialias = "8"
warmup = "2.5s"

[shows.test]
mode = "continuous"
scene_duration = 1

[[shows.test.scenes]]
handle = "scenes/demo"
"#,
        )
        .unwrap();

        let mut scheduler = Scheduler::new(&config, 7);
        let target = TargetId::new("window:0");
        let change = scheduler
            .set_target(target.clone(), "test", Instant::now())
            .unwrap();
        assert_eq!(change.scene.fps, Some(48.0));
        assert_eq!(change.scene.antialias, Some(AntialiasSetting::Samples8));
        assert_eq!(change.scene.warmup, Some(Duration::from_millis(2500)));
        assert_eq!(change.scene.crossfade, Duration::from_secs_f32(1.0));
    }

    #[test]
    fn zero_fps_treated_as_uncapped() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[shows.test]
mode = "continuous"
scene_duration = 1
fps = 0

[[shows.test.scenes]]
handle = "scenes/demo"
fps = 0
"#,
        )
        .unwrap();

        let mut scheduler = Scheduler::new(&config, 3);
        let target = TargetId::new("window:1");
        let change = scheduler
            .set_target(target.clone(), "test", Instant::now())
            .unwrap();
        assert_eq!(change.scene.fps, None, "fps=0 should map to uncapped");
    }

    #[test]
    fn skip_advances_rotation() {
        let config = ShowConfig::from_toml_str(CONFIG).unwrap();
        let mut scheduler = Scheduler::new(&config, 11);
        let target = TargetId::new("window:0");
        let first = scheduler
            .set_target(target.clone(), "test", Instant::now())
            .unwrap();
        assert_eq!(first.scene.handle, "one");
        let skipped = scheduler
            .skip_target(&target, Instant::now())
            .expect("skip result");
        assert_eq!(skipped.scene.handle, "two");
    }

    #[test]
    fn single_scene_show_never_advances() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[shows.test]
mode = "continuous"
scene_duration = 1

[[shows.test.scenes]]
handle = "only"
"#,
        )
        .unwrap();
        let mut scheduler = Scheduler::new(&config, 5);
        let target = TargetId::new("window:0");
        let now = Instant::now();
        scheduler.set_target(target.clone(), "test", now).unwrap();
        assert!(scheduler.tick(now + Duration::from_secs(10)).is_empty());
        assert!(scheduler.skip_target(&target, now).is_none());
    }
}
