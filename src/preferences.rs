use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::observable::Subscription;
use crate::settings::GraphicsSettings;

pub const LOW_GRAPHICS_KEY: &str = "etidorhpa_low_graphics";
/// Key used before the project was renamed. Read for migration, never written.
pub const LEGACY_LOW_GRAPHICS_KEY: &str = "septerra_low_graphics";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("unable to access preference file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preference file {} is not a JSON object of strings", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// String key/value storage for user preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Volatile store, mostly useful in tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a flat JSON object. Every write rewrites the file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PreferenceError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| PreferenceError::Format {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(PreferenceError::Io { path, source }),
        };
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.read().get(key).cloned())
    }

    /// The in-memory value only changes once the file has been written.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.write();
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        let contents =
            serde_json::to_string_pretty(&updated).map_err(|source| PreferenceError::Format {
                path: self.path.clone(),
                source,
            })?;
        fs::write(&self.path, contents).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })?;
        *values = updated;
        Ok(())
    }
}

/// Copies the legacy low-graphics value to the current key when only the
/// legacy key is set. The legacy key is left in place so older builds still
/// find it. Returns whether a value was migrated.
pub fn migrate_low_graphics_preference(
    store: &dyn PreferenceStore,
) -> Result<bool, PreferenceError> {
    if store.get(LOW_GRAPHICS_KEY)?.is_some() {
        return Ok(false);
    }
    let Some(legacy) = store.get(LEGACY_LOW_GRAPHICS_KEY)? else {
        return Ok(false);
    };
    store.set(LOW_GRAPHICS_KEY, &legacy)?;
    log::info!(
        "Migrated low-graphics preference from {LEGACY_LOW_GRAPHICS_KEY} to {LOW_GRAPHICS_KEY}"
    );
    Ok(true)
}

/// Reads the stored low-graphics choice, or `fallback` when none is stored.
pub fn read_low_graphics_preference(
    store: &dyn PreferenceStore,
    fallback: bool,
) -> Result<bool, PreferenceError> {
    migrate_low_graphics_preference(store)?;
    Ok(store
        .get(LOW_GRAPHICS_KEY)?
        .map_or(fallback, |value| value == "true"))
}

pub fn save_low_graphics_preference(
    store: &dyn PreferenceStore,
    enabled: bool,
) -> Result<(), PreferenceError> {
    store.set(LOW_GRAPHICS_KEY, if enabled { "true" } else { "false" })
}

/// Saves every low-graphics change made through `settings` until the returned
/// subscription is dropped. Write failures are logged, not propagated.
#[must_use = "dropping the subscription stops persisting changes"]
pub fn persist_on_change(
    settings: &GraphicsSettings,
    store: Arc<dyn PreferenceStore>,
) -> Subscription {
    settings.subscribe_low_graphics(move |enabled| {
        if let Err(err) = save_low_graphics_preference(store.as_ref(), enabled) {
            log::warn!("Failed to save low-graphics preference: {err}");
        }
    })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::quality::QualityTier;

    #[test]
    fn missing_preference_uses_fallback() {
        let store = MemoryPreferenceStore::new();
        assert!(read_low_graphics_preference(&store, true).unwrap());
        assert!(!read_low_graphics_preference(&store, false).unwrap());
    }

    #[test]
    fn legacy_value_is_migrated_and_kept() {
        let store = MemoryPreferenceStore::new();
        store.set(LEGACY_LOW_GRAPHICS_KEY, "true").unwrap();
        assert!(read_low_graphics_preference(&store, false).unwrap());
        assert_eq!(store.get(LOW_GRAPHICS_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(
            store.get(LEGACY_LOW_GRAPHICS_KEY).unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn current_key_wins_over_legacy() {
        let store = MemoryPreferenceStore::new();
        store.set(LEGACY_LOW_GRAPHICS_KEY, "true").unwrap();
        store.set(LOW_GRAPHICS_KEY, "false").unwrap();
        assert!(!migrate_low_graphics_preference(&store).unwrap());
        assert!(!read_low_graphics_preference(&store, true).unwrap());
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        {
            let store = FilePreferenceStore::open(&path).unwrap();
            save_low_graphics_preference(&store, true).unwrap();
        }
        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert!(read_low_graphics_preference(&reopened, false).unwrap());
    }

    #[test]
    fn failed_write_leaves_value_unchanged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("prefs.json");
        let store = FilePreferenceStore::open(&path).unwrap();

        assert!(matches!(
            save_low_graphics_preference(&store, true),
            Err(PreferenceError::Io { .. })
        ));
        assert_eq!(store.get(LOW_GRAPHICS_KEY).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            FilePreferenceStore::open(&path),
            Err(PreferenceError::Format { .. })
        ));
    }

    #[test]
    fn settings_changes_are_persisted() {
        let store = Arc::new(MemoryPreferenceStore::new());
        let settings = GraphicsSettings::new(QualityTier::High);
        let subscription = persist_on_change(&settings, store.clone());

        settings.set_low_graphics(true);
        assert_eq!(store.get(LOW_GRAPHICS_KEY).unwrap().as_deref(), Some("true"));

        drop(subscription);
        settings.set_low_graphics(false);
        assert_eq!(store.get(LOW_GRAPHICS_KEY).unwrap().as_deref(), Some("true"));
    }
}
