use std::path::Path;

use crate::manifest::{load_essential_skeletons, LoadOptions, ManifestCache, SkeletonData};

/// Skeletons loaded at boot when nothing else is requested.
pub const ESSENTIAL_SKELETONS: &[&str] = &["character-pro"];

/// Something that could not be loaded during boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootFailure {
    /// `None` when the manifest itself could not be loaded.
    pub skeleton: Option<String>,
    pub message: String,
}

/// Outcome of the boot sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootReport {
    pub skeletons: Vec<SkeletonData>,
    pub failures: Vec<BootFailure>,
}

impl BootReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolves the essential skeletons from the manifest at `manifest_path`.
///
/// Boot never aborts on missing assets: a manifest that cannot be read yields
/// an empty skeleton set, and skeletons that cannot be resolved are skipped.
/// Every failure is logged and recorded in the report.
pub fn boot<P: AsRef<Path>>(
    cache: &mut ManifestCache,
    manifest_path: P,
    essential: &[&str],
    options: &LoadOptions,
) -> BootReport {
    let manifest_path = manifest_path.as_ref();
    let mut report = BootReport::default();

    let results = match load_essential_skeletons(cache, manifest_path, essential, options) {
        Ok(results) => results,
        Err(err) => {
            log::error!("Error loading skeleton manifest: {:#}", anyhow::Error::from(err));
            report.failures.push(BootFailure {
                skeleton: None,
                message: format!("failed to load manifest from {}", manifest_path.display()),
            });
            return report;
        }
    };

    for (name, result) in essential.iter().zip(results) {
        match result {
            Ok(data) => report.skeletons.push(data),
            Err(err) => {
                log::error!("Error loading skeleton {name}: {err}");
                report.failures.push(BootFailure {
                    skeleton: Some(name.to_string()),
                    message: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "Skeleton metadata loaded: {:?}",
        report
            .skeletons
            .iter()
            .map(|data| data.name.as_str())
            .collect::<Vec<_>>()
    );
    report
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn manifest_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"skeletons": {"character-pro": {"json": "spine/character-pro.json"}}}"#,
        )
        .unwrap();
        file
    }

    #[test]
    fn boot_loads_essential_skeletons() {
        let file = manifest_file();
        let mut cache = ManifestCache::new();
        let report = boot(&mut cache, file.path(), ESSENTIAL_SKELETONS, &LoadOptions::default());
        assert!(report.is_complete());
        assert_eq!(report.skeletons.len(), 1);
        assert_eq!(report.skeletons[0].name, "character-pro");
    }

    #[test]
    fn missing_skeleton_does_not_abort_boot() {
        let file = manifest_file();
        let mut cache = ManifestCache::new();
        let report = boot(
            &mut cache,
            file.path(),
            &["dragon", "character-pro"],
            &LoadOptions::default(),
        );
        assert_eq!(report.skeletons.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].skeleton.as_deref(), Some("dragon"));
        assert_eq!(report.failures[0].message, "skeleton 'dragon' not found in manifest");
    }

    #[test]
    fn unreadable_manifest_boots_empty() {
        let mut cache = ManifestCache::new();
        let report = boot(
            &mut cache,
            "no/such/manifest.json",
            ESSENTIAL_SKELETONS,
            &LoadOptions::default(),
        );
        assert!(report.skeletons.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].skeleton.is_none());
    }
}
