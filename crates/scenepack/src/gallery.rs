//! Client for the hosted scene gallery. The gallery is a static file tree: a
//! `catalog.json` index mapping scene ids to zip bundles, each bundle being a
//! complete scene pack (manifest plus assets). Downloads are unpacked into
//! the repository's cache directory and then loaded like any local pack.

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pack::LocalPack;

pub const DEFAULT_GALLERY_BASE: &str = "https://scenes.afioniq.dev/";

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub base: Url,
}

impl GalleryConfig {
    pub fn new(base: impl AsRef<str>) -> Result<Self> {
        let raw = base.as_ref().trim();
        if raw.is_empty() {
            bail!("gallery base url must not be empty");
        }
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if raw.ends_with('/') {
            raw.to_string()
        } else {
            format!("{raw}/")
        };
        Ok(Self {
            base: Url::parse(&normalized)?,
        })
    }
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_GALLERY_BASE).expect("default gallery base parses"),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Bundle location, absolute or relative to the gallery base.
    pub archive: String,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    scenes: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct GalleryClient {
    http: Client,
    config: GalleryConfig,
}

impl GalleryClient {
    pub fn new(config: GalleryConfig) -> Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let url = self.config.base.join("catalog.json")?;
        debug!(%url, "fetching gallery catalog");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .context("gallery catalog request failed")?;
        let body = response.text()?;
        let catalog: CatalogResponse = serde_json::from_str(&body).map_err(|err| {
            let snippet = body.chars().take(200).collect::<String>();
            anyhow!("gallery catalog is not valid JSON ({err}); first 200 bytes: {snippet}")
        })?;
        Ok(catalog.scenes)
    }

    pub fn fetch_entry(&self, id: &str) -> Result<CatalogEntry> {
        if id.trim().is_empty() {
            bail!("gallery scene id must not be empty");
        }
        self.fetch_catalog()?
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| anyhow!("scene '{id}' not found in gallery catalog"))
    }

    pub fn fetch_and_cache(&self, id: &str, cache_dir: &Path) -> Result<LocalPack> {
        let entry = self.fetch_entry(id)?;
        let url = self
            .resolve_archive_url(&entry.archive)
            .with_context(|| format!("resolving bundle url '{}'", entry.archive))?;
        debug!(%url, scene = %entry.id, "downloading scene bundle");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("requesting bundle {url}"))?
            .error_for_status()
            .context("gallery bundle request failed")?;
        let bytes = response.bytes()?;
        unpack_archive(&bytes, cache_dir)
            .with_context(|| format!("unpacking scene bundle for '{id}'"))?;
        LocalPack::load(cache_dir).map_err(|err| anyhow!(err))
    }

    fn resolve_archive_url(&self, src: &str) -> Result<Url> {
        if src.starts_with("http://") || src.starts_with("https://") {
            return Ok(Url::parse(src)?);
        }
        let trimmed = src.trim_start_matches('/');
        self.config
            .base
            .join(trimmed)
            .context("joining bundle url against gallery base")
    }
}

/// Unpacks a zip bundle into `dir`, rejecting entries that would escape it.
pub fn unpack_archive(bytes: &[u8], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("scene bundle is not a zip archive")?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            bail!("scene bundle entry '{}' escapes the bundle root", entry.name());
        };
        let destination = dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&destination)?;
            continue;
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut contents)?;
        fs::write(&destination, contents)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_bundle(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, contents) in entries {
                writer
                    .start_file(*name, FileOptions::default())
                    .expect("start zip entry");
                writer.write_all(contents.as_bytes()).expect("write entry");
            }
            writer.finish().expect("finish zip");
        }
        cursor.into_inner()
    }

    #[test]
    fn unpacks_bundle_into_cache_dir() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = build_bundle(&[
            (
                "scene.toml",
                "name = \"Bundle\"\n\n[[layers]]\nname = \"dust\"\ntype = \"particles\"\n",
            ),
            ("textures/atlas.png", "png"),
        ]);

        unpack_archive(&bundle, temp.path()).expect("unpack");
        assert!(temp.path().join("scene.toml").exists());
        assert!(temp.path().join("textures/atlas.png").exists());

        let pack = LocalPack::load(temp.path()).expect("load unpacked pack");
        assert_eq!(pack.manifest().name.as_deref(), Some("Bundle"));
    }

    #[test]
    fn rejects_escaping_entries() {
        let temp = tempfile::tempdir().unwrap();
        let bundle = build_bundle(&[("../outside.txt", "nope")]);
        let err = unpack_archive(&bundle, temp.path()).unwrap_err();
        assert!(err.to_string().contains("escapes"));
    }

    #[test]
    fn config_normalizes_trailing_slash() {
        let config = GalleryConfig::new("https://example.com/gallery").unwrap();
        assert_eq!(config.base.as_str(), "https://example.com/gallery/");
    }

    #[test]
    fn rejects_empty_base() {
        assert!(GalleryConfig::new("  ").is_err());
    }
}
