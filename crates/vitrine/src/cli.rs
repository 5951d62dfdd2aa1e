use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::Antialiasing;

#[derive(Parser, Debug)]
#[command(
    name = "vitrine",
    author,
    version,
    about = "Decorative hero-scene renderer for marketing displays",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scene handle (e.g. `gallery://gaming-worlds` or `scenes/orbitals`)
    #[arg(value_name = "HANDLE")]
    pub scene: Option<String>,

    /// Convenience flag for specifying a gallery URL or id.
    #[arg(long, value_name = "URL")]
    pub gallery: Option<String>,

    /// Rotate scenes using the supplied show TOML file or directory.
    #[arg(long, value_name = "PATH")]
    pub show: Option<PathBuf>,

    /// Claim a borderless fullscreen kiosk surface instead of a window.
    #[arg(long)]
    pub kiosk: bool,

    /// Override the render resolution (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Optional FPS cap for continuous rendering (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Render a single still frame at the given timestamp (seconds).
    #[arg(long, value_name = "SECONDS")]
    pub still: Option<f32>,

    /// Seed for procedural generation; pins particle layouts across runs.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Force refresh of cached gallery scenes before launch.
    #[arg(long)]
    pub refresh: bool,

    /// Skip any remote fetches and rely on cached gallery scenes.
    #[arg(long)]
    pub cache_only: bool,

    /// Gallery base URL; can also be supplied via `VITRINE_GALLERY_BASE`.
    #[arg(long, env = "VITRINE_GALLERY_BASE", value_name = "URL")]
    pub gallery_base: Option<String>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,

    /// Warmup gate duration override in milliseconds.
    #[arg(long, value_name = "MILLISECONDS")]
    pub warmup_ms: Option<u64>,

    /// Initialise defaults (creates directories, installs bundled scenes) then exit.
    #[arg(long)]
    pub init_defaults: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage bundled defaults (scene packs, paths).
    Defaults(DefaultsCommand),
}

#[derive(Parser, Debug)]
pub struct DefaultsCommand {
    #[command(subcommand)]
    pub action: DefaultsAction,
}

#[derive(Subcommand, Debug)]
pub enum DefaultsAction {
    /// Copy bundled scenes into user directories.
    Sync(DefaultsSyncArgs),
    /// Show bundled scenes and whether they exist locally.
    List,
    /// Print resolved directories for config, data, and cache roots.
    Where,
}

#[derive(Parser, Debug, Default)]
pub struct DefaultsSyncArgs {
    /// Preview which scenes would be installed without writing to disk.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("anti-alias mode must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
        _ => {
            let samples: u32 = normalized.parse().map_err(|_| {
                format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
            })?;

            if samples == 0 || samples == 1 {
                return Ok(Antialiasing::Off);
            }

            if !matches!(samples, 2 | 4 | 8 | 16) {
                return Err(format!(
                    "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                ));
            }

            Ok(Antialiasing::Samples(samples))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scene_handle_and_flags() {
        let cli = Cli::try_parse_from([
            "vitrine",
            "gallery://gaming-worlds",
            "--kiosk",
            "--fps",
            "60",
            "--seed",
            "42",
            "--antialias",
            "4",
        ])
        .expect("parse");
        assert_eq!(cli.run.scene.as_deref(), Some("gallery://gaming-worlds"));
        assert!(cli.run.kiosk);
        assert_eq!(cli.run.fps, Some(60.0));
        assert_eq!(cli.run.seed, Some(42));
        assert_eq!(cli.run.antialias, Antialiasing::Samples(4));
    }

    #[test]
    fn antialias_accepts_names_and_counts() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias("off").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("8").unwrap(), Antialiasing::Samples(8));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn parses_defaults_subcommand() {
        let cli = Cli::try_parse_from(["vitrine", "defaults", "sync", "--dry-run"]).expect("parse");
        match cli.command {
            Some(Command::Defaults(DefaultsCommand {
                action: DefaultsAction::Sync(args),
            })) => assert!(args.dry_run),
            other => panic!("expected defaults sync, got {other:?}"),
        }
    }
}
