/// Run manifest describing how a batch of samples was produced.
use crate::class_map::ClassMap;
use crate::error::Result;
use crate::label::LabelPolicy;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-class placement counts for one run, keyed by class name.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct ClassPresence {
    pub instances: BTreeMap<String, u64>,
}

impl ClassPresence {
    /// Counts one placement per id; ids missing from the map get a `class_N` name.
    pub fn from_class_ids(class_map: &ClassMap, class_ids: impl IntoIterator<Item = u32>) -> Self {
        let mut presence = Self::default();
        for id in class_ids {
            let name = class_map
                .name_of(id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("class_{}", id));
            *presence.instances.entry(name).or_insert(0) += 1;
        }
        presence
    }

    pub fn total(&self) -> u64 {
        self.instances.values().sum()
    }
}

/// Input locations of a run.
#[derive(Serialize, Debug, Clone)]
pub struct InputInfo {
    pub backgrounds: PathBuf,
    pub sprites: PathBuf,
    pub class_map: PathBuf,
    pub background_count: usize,
    pub sprite_identities: usize,
}

#[derive(Serialize, Debug)]
pub struct RunManifest {
    pub start_index: u64,
    /// One past the last written index.
    pub end_index: u64,
    pub count: u64,
    /// Scene `i` is rendered from seed `base_seed + i`.
    pub base_seed: u64,
    pub jobs: usize,
    pub label_policy: LabelPolicy,
    pub inputs: InputInfo,
    pub classes: ClassMap,
    pub class_presence: ClassPresence,
}

pub struct ManifestGenerator {
    output_dir: PathBuf,
}

impl ManifestGenerator {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// Writes `manifest.json` at the output root. A later run replaces it.
    pub fn write(&self, manifest: &RunManifest) -> Result<PathBuf> {
        let manifest_path = self.output_dir.join(MANIFEST_FILE);
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(&manifest_path, manifest_json)?;

        info!("Generated manifest: {}", manifest_path.display());
        self.print_manifest_summary(manifest);
        Ok(manifest_path)
    }

    fn print_manifest_summary(&self, manifest: &RunManifest) {
        info!("Manifest Summary:");
        info!(
            "  Samples: {} (indices {}..{})",
            manifest.count,
            manifest.start_index,
            manifest.end_index
        );
        info!("  Base seed: {}", manifest.base_seed);
        info!("  Aircraft placed: {}", manifest.class_presence.total());
        for (name, count) in &manifest.class_presence.instances {
            info!("    {}: {}", name, count);
        }
    }
}
