//! Show configuration for vitrine: a TOML document describing which hero
//! scenes play on which display target, how long each one runs, and how
//! swaps between them are faded.
//!
//! A "show" is an ordered (or shuffled) rotation of scene handles. Targets
//! map window/output selectors onto shows; `_default` catches everything
//! without an explicit mapping.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse show configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid show configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    Continuous,
    Shuffle,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShowConfig {
    pub version: u32,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub shows: BTreeMap<String, Show>,
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Defaults {
    pub show: Option<String>,
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub warmup: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Show {
    pub mode: RotationMode,
    #[serde(
        default = "default_scene_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub scene_duration: Duration,
    #[serde(
        default = "default_crossfade",
        deserialize_with = "deserialize_duration"
    )]
    pub crossfade: Duration,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    #[serde(default)]
    pub scenes: Vec<ShowScene>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShowScene {
    pub handle: String,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub fps: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_antialias_opt")]
    pub antialias: Option<AntialiasSetting>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub warmup: Option<Duration>,
    #[serde(default)]
    pub refresh_once: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }
}

/// A show scene with show- and global-level defaults folded in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScene {
    pub handle: String,
    pub duration: Duration,
    pub fps: Option<f32>,
    pub antialias: Option<AntialiasSetting>,
    pub warmup: Option<Duration>,
    pub refresh_once: bool,
    pub crossfade: Duration,
}

fn default_crossfade() -> Duration {
    Duration::from_secs_f32(1.0)
}

fn default_scene_duration() -> Duration {
    Duration::from_secs(60)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_opt(deserializer).map(|d| d.unwrap_or(default_scene_duration()))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            let raw = value.to_string();
            Some(parse_antialias(&raw).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl ShowConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ShowConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn show(&self, name: &str) -> Option<&Show> {
        self.shows.get(name)
    }

    pub fn default_show(&self) -> Option<&str> {
        self.defaults.show.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.shows.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one show".into(),
            ));
        }

        for (name, show) in &self.shows {
            if show.scenes.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "show '{name}' must contain at least one scene"
                )));
            }

            if show.scene_duration.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "show '{name}' scene_duration must be greater than zero"
                )));
            }

            if let Some(fps) = show.fps {
                if fps < 0.0 {
                    return Err(ConfigError::Invalid(format!("show '{name}' fps must be >= 0")));
                }
            }

            for scene in &show.scenes {
                if scene.handle.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "show '{name}' contains a scene with empty handle"
                    )));
                }

                if let Some(duration) = scene.duration {
                    if duration.is_zero() {
                        return Err(ConfigError::Invalid(format!(
                            "show '{name}' scene '{}' duration must be > 0",
                            scene.handle
                        )));
                    }
                }

                if let Some(fps) = scene.fps {
                    if fps < 0.0 {
                        return Err(ConfigError::Invalid(format!(
                            "show '{name}' scene '{}' fps must be >= 0",
                            scene.handle
                        )));
                    }
                }
            }
        }

        if let Some(default_show) = &self.defaults.show {
            if !self.shows.contains_key(default_show) {
                return Err(ConfigError::Invalid(format!(
                    "defaults.show references unknown show '{default_show}'"
                )));
            }
        }

        for (selector, show) in &self.targets {
            if selector.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "target selector may not be empty".into(),
                ));
            }

            validate_target_selector(selector)?;

            if !self.shows.contains_key(show) {
                return Err(ConfigError::Invalid(format!(
                    "target '{selector}' references unknown show '{show}'"
                )));
            }
        }

        if let Some(fps) = self.defaults.fps {
            if fps < 0.0 {
                return Err(ConfigError::Invalid("defaults.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

fn validate_target_selector(selector: &str) -> Result<(), ConfigError> {
    if selector == "_default" {
        return Ok(());
    }

    if let Some(rest) = selector.strip_prefix("window:") {
        if rest.is_empty() {
            return Err(ConfigError::Invalid(
                "window selector must include a window index or title".into(),
            ));
        }
        return Ok(());
    }

    if let Some(rest) = selector.strip_prefix("output:") {
        if rest.is_empty() {
            return Err(ConfigError::Invalid(
                "output selector must include an output name".into(),
            ));
        }
        return Ok(());
    }

    if selector.chars().all(|ch| ch.is_ascii_digit()) {
        return Ok(());
    }

    Err(ConfigError::Invalid(format!(
        "target selector '{selector}' is invalid; expected 'window:<index-or-title>', 'output:<name>', '_default', or a numeric window index"
    )))
}

impl Show {
    pub fn resolved_scene(&self, index: usize, defaults: &Defaults) -> Option<ResolvedScene> {
        let scene = self.scenes.get(index)?;
        let duration = scene.duration.unwrap_or(self.scene_duration);
        let fps = scene.fps.or(self.fps).or(defaults.fps);
        let antialias = scene.antialias.or(self.antialias).or(defaults.antialias);
        let warmup = scene.warmup.or(defaults.warmup);

        Some(ResolvedScene {
            handle: scene.handle.clone(),
            duration,
            fps,
            antialias,
            warmup,
            refresh_once: scene.refresh_once,
            crossfade: self.crossfade,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[defaults]
show = "lobby"
fps = 0
antialias = "auto"
warmup = "2.5s"

[shows.lobby]
mode = "continuous"
scene_duration = "300s"
crossfade = "1s"

[[shows.lobby.scenes]]
handle = "scenes/orbitals"

[[shows.lobby.scenes]]
handle = "gallery://gaming-worlds"
duration = "120s"
fps = 60
antialias = 4
refresh_once = true

[shows.studio]
mode = "shuffle"
scene_duration = "90s"

[[shows.studio.scenes]]
handle = "scenes/terminal"

[targets]
"window:2" = "studio"
"_default" = "lobby"
"#;

    #[test]
    fn parses_sample_config() {
        let config = ShowConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert!(config.shows.contains_key("lobby"));
        assert_eq!(config.defaults.show.as_deref(), Some("lobby"));
        assert_eq!(config.defaults.warmup, Some(Duration::from_millis(2500)));
        assert_eq!(
            config.targets.get("window:2").map(|s| s.as_str()),
            Some("studio")
        );
    }

    #[test]
    fn rejects_unknown_show() {
        let config = r#"
version = 1

[shows.main]
mode = "continuous"
scene_duration = 60

[[shows.main.scenes]]
handle = "scenes/demo"

[defaults]
show = "missing"
"#;
        let err = ShowConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_invalid_selector() {
        let config = r#"
version = 1

[shows.main]
mode = "continuous"
scene_duration = 60

[[shows.main.scenes]]
handle = "scenes/demo"

[targets]
"badselector" = "main"
"#;
        let err = ShowConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_scene_duration() {
        let config = r#"
version = 1

[shows.main]
mode = "continuous"
scene_duration = 0

[[shows.main.scenes]]
handle = "scenes/demo"
"#;
        let err = ShowConfig::from_toml_str(config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn resolves_scene_with_defaults() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
fps = 24
antialias = "4"
warmup = "2s"

[shows.main]
mode = "continuous"
scene_duration = "5s"

[[shows.main.scenes]]
handle = "scenes/demo"
"#,
        )
        .unwrap();

        let show = config.show("main").unwrap();
        let resolved = show.resolved_scene(0, &config.defaults).unwrap();
        assert_eq!(resolved.handle, "scenes/demo");
        assert_eq!(resolved.duration, Duration::from_secs(5));
        assert_eq!(resolved.fps, Some(24.0));
        assert_eq!(resolved.antialias, Some(AntialiasSetting::Samples4));
        assert_eq!(resolved.warmup, Some(Duration::from_secs(2)));
        assert_eq!(resolved.crossfade, Duration::from_secs_f32(1.0));
        assert!(!resolved.refresh_once);
    }

    #[test]
    fn scene_warmup_overrides_default() {
        let config = ShowConfig::from_toml_str(
            r#"
version = 1

[defaults]
warmup = "2s"

[shows.main]
mode = "continuous"
scene_duration = "5s"

[[shows.main.scenes]]
handle = "scenes/demo"
warmup = "2.5s"
"#,
        )
        .unwrap();

        let show = config.show("main").unwrap();
        let resolved = show.resolved_scene(0, &config.defaults).unwrap();
        assert_eq!(resolved.warmup, Some(Duration::from_millis(2500)));
    }
}
