//! Normalizes user-supplied scene references into [`SceneHandle`]s.

use anyhow::{bail, Context, Result};

use crate::path::PathResolver;
use crate::SceneHandle;

/// Accepts `gallery://<id>`, a bare gallery id, or a gallery web URL whose
/// last path segment is the id, and canonicalizes to `gallery://<id>`.
pub fn normalize_gallery_reference(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("gallery reference must not be empty");
    }

    if let Some(rest) = trimmed.strip_prefix("gallery://") {
        let id = rest.trim();
        if id.is_empty() {
            bail!("gallery id missing after scheme");
        }
        return Ok(format!("gallery://{}", id));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let id_candidate = trimmed
            .split('/')
            .rev()
            .find(|segment| !segment.is_empty())
            .map(|segment| segment.split(&['?', '#'][..]).next().unwrap_or(segment))
            .filter(|id| !id.is_empty());

        match id_candidate {
            Some(id) => return Ok(format!("gallery://{}", id)),
            None => bail!("unable to extract scene id from gallery url"),
        }
    }

    Ok(format!("gallery://{}", trimmed))
}

pub fn parse_scene_handle(resolver: &PathResolver, input: &str) -> Result<SceneHandle> {
    if let Some(stripped) = input.strip_prefix("gallery://") {
        let id = stripped.trim();
        if id.is_empty() {
            bail!("gallery id missing after scheme");
        }
        return Ok(SceneHandle::Gallery(id.to_string()));
    }

    let normalized = resolver
        .normalize_local_path(input)
        .with_context(|| format!("failed to resolve local scene path '{input}'"))?;
    Ok(SceneHandle::LocalPack(normalized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bare_id() {
        assert_eq!(
            normalize_gallery_reference("gaming-worlds").unwrap(),
            "gallery://gaming-worlds"
        );
    }

    #[test]
    fn normalizes_web_url() {
        assert_eq!(
            normalize_gallery_reference("https://scenes.afioniq.dev/view/gaming-worlds?ref=home")
                .unwrap(),
            "gallery://gaming-worlds"
        );
    }

    #[test]
    fn keeps_scheme_form() {
        assert_eq!(
            normalize_gallery_reference("gallery://orbitals").unwrap(),
            "gallery://orbitals"
        );
    }

    #[test]
    fn rejects_empty_reference() {
        assert!(normalize_gallery_reference("  ").is_err());
        assert!(normalize_gallery_reference("gallery://").is_err());
    }

    #[test]
    fn parses_local_handle() {
        let resolver = PathResolver::with_cwd("/");
        let handle = parse_scene_handle(&resolver, "scenes/orbitals").unwrap();
        assert!(matches!(handle, SceneHandle::LocalPack(_)));
    }
}
