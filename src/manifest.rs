use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to load manifest from {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("manifest {} is malformed", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("skeleton '{0}' not found in manifest")]
    SkeletonNotFound(String),
    #[error("skeleton '{0}' missing json/binary path")]
    MissingSkeletonData(String),
}

/// Maps skeleton names to their data, atlas and texture files. It only
/// describes where assets live; loading them is the engine's business.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkeletonManifest {
    #[serde(default)]
    pub skeletons: BTreeMap<String, SkeletonEntry>,
}

/// Files making up one skeleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkeletonEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atlas: Option<String>,
    /// Texture variants keyed by `"1x"`, `"2x"` or `"fallback"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<HashMap<String, String>>,
}

impl SkeletonManifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn skeleton_names(&self) -> impl Iterator<Item = &str> {
        self.skeletons.keys().map(String::as_str)
    }
}

/// Options controlling which asset variants are chosen for a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    #[serde(default = "default_texture_scale")]
    pub texture_scale: u8,
    #[serde(default = "default_prefer_webp")]
    pub prefer_webp: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            texture_scale: default_texture_scale(),
            prefer_webp: default_prefer_webp(),
        }
    }
}

fn default_texture_scale() -> u8 {
    1
}

fn default_prefer_webp() -> bool {
    true
}

/// Resolved asset locations for one skeleton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonData {
    pub name: String,
    pub skeleton_data_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atlas_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_path: Option<String>,
    pub scale: u8,
    /// Set by the engine once the files are actually resident.
    #[serde(default)]
    pub loaded: bool,
}

/// Resolves the asset paths for `name`, preferring binary skeleton data.
pub fn load_skeleton(
    manifest: &SkeletonManifest,
    name: &str,
    options: &LoadOptions,
) -> Result<SkeletonData, ManifestError> {
    let entry = manifest
        .skeletons
        .get(name)
        .ok_or_else(|| ManifestError::SkeletonNotFound(name.to_string()))?;
    let skeleton_data_path = entry
        .binary
        .as_ref()
        .or(entry.json.as_ref())
        .cloned()
        .ok_or_else(|| ManifestError::MissingSkeletonData(name.to_string()))?;

    Ok(SkeletonData {
        name: name.to_string(),
        skeleton_data_path,
        atlas_path: entry.atlas.clone(),
        texture_path: entry
            .textures
            .as_ref()
            .and_then(|textures| select_texture(textures, options)),
        scale: options.texture_scale,
        loaded: false,
    })
}

fn select_texture(textures: &HashMap<String, String>, options: &LoadOptions) -> Option<String> {
    let scaled = format!("{}x", options.texture_scale);
    if options.prefer_webp {
        if let Some(path) = textures.get(&scaled) {
            return Some(path.clone());
        }
    }
    textures
        .get("fallback")
        .or_else(|| textures.get("1x"))
        .cloned()
}

/// Explicit manifest cache. The first successful load is reused until
/// [`ManifestCache::clear`].
#[derive(Debug, Default)]
pub struct ManifestCache {
    cached: Option<Arc<SkeletonManifest>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(
        &mut self,
        path: P,
    ) -> Result<Arc<SkeletonManifest>, ManifestError> {
        if let Some(manifest) = &self.cached {
            return Ok(Arc::clone(manifest));
        }
        let manifest = Arc::new(SkeletonManifest::load(path)?);
        self.cached = Some(Arc::clone(&manifest));
        Ok(manifest)
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// Forgets the cached manifest so the next load re-reads it.
    pub fn clear(&mut self) {
        self.cached = None;
    }
}

/// Resolves every skeleton in `names` through the cached manifest.
///
/// Only a manifest that cannot be loaded fails the whole call. Each name gets
/// its own result, in the order given.
pub fn load_essential_skeletons<P: AsRef<Path>>(
    cache: &mut ManifestCache,
    path: P,
    names: &[&str],
    options: &LoadOptions,
) -> Result<Vec<Result<SkeletonData, ManifestError>>, ManifestError> {
    let manifest = cache.load(path)?;
    Ok(names
        .iter()
        .map(|name| load_skeleton(&manifest, name, options))
        .collect())
}
