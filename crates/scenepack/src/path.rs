//! Path expansion rules shared by CLI handles and repository lookups, so both
//! agree on how `~` and `${VAR}` references in scene paths resolve.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::BaseDirs;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PathResolver {
    cwd: PathBuf,
}

impl PathResolver {
    pub fn new() -> Result<Self> {
        let cwd = env::current_dir().context("failed to resolve current working directory")?;
        Ok(Self { cwd })
    }

    pub fn with_cwd<P: Into<PathBuf>>(cwd: P) -> Self {
        Self { cwd: cwd.into() }
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn expand_path(&self, input: &str) -> Result<PathBuf> {
        let expanded = expand_home(&expand_env_vars(input)?)?;
        let path = PathBuf::from(expanded);
        debug!(original = %input, expanded = %path.display(), "expanded scene path");
        Ok(path)
    }

    /// Expands the input and, for relative paths, prefers a working-directory
    /// candidate when it exists; otherwise the relative path is returned for
    /// the repository to try against its search roots.
    pub fn normalize_local_path(&self, input: &str) -> Result<PathBuf> {
        let expanded = self.expand_path(input)?;
        if expanded.as_os_str().is_empty() {
            anyhow::bail!("local scene path must not be empty");
        }
        if expanded.is_absolute() {
            return Ok(expanded);
        }

        let candidate = self.cwd.join(&expanded);
        if candidate.exists() {
            debug!(original = %input, normalized = %candidate.display(), "using cwd scene path");
            return Ok(candidate);
        }
        Ok(expanded)
    }
}

fn expand_home(input: &str) -> Result<String> {
    if !input.starts_with('~') {
        return Ok(input.to_string());
    }
    let base_dirs =
        BaseDirs::new().ok_or_else(|| anyhow!("unable to determine home directory for '~'"))?;
    let home = base_dirs.home_dir();
    match input.strip_prefix("~/") {
        Some(rest) => Ok(home.join(rest).to_string_lossy().into_owned()),
        None if input == "~" => Ok(home.to_string_lossy().into_owned()),
        None => anyhow::bail!("user-specific home expansion ('{input}') is not supported"),
    }
}

/// Only the braced `${VAR}` form is expanded; a bare `$` passes through.
fn expand_env_vars(input: &str) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| anyhow!("missing closing '}}' in environment variable reference"))?;
        let name = &after[..end];
        if name.is_empty() {
            anyhow::bail!("environment variable name must not be empty");
        }
        let value =
            env::var(name).map_err(|_| anyhow!("environment variable '{name}' is not set"))?;
        output.push_str(&value);
        rest = &after[end + 1..];
    }
    output.push_str(rest);
    Ok(output)
}
