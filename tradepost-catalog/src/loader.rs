//! Reads dataset source files from disk.
//!
//! Only the server loads files. Every `*.json` file below the dataset
//! directory is one dataset, except `manifest.json`. Files are visited in
//! sorted path order so registration order is stable across runs.

use crate::error::{CatalogError, CatalogResult};
use crate::model::Dataset;
use crate::raw::RawDataset;
use crate::store::CatalogStore;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MANIFEST_FILE: &str = "manifest.json";

/// Parses one dataset file.
pub fn load_raw_dataset(path: &Path) -> CatalogResult<RawDataset> {
    let contents = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    let raw: RawDataset = serde_json::from_str(&contents)?;
    if raw.categories.is_empty() {
        return Err(CatalogError::InvalidRecord {
            path: path.to_path_buf(),
            reason: "no categories declared".into(),
        });
    }
    Ok(raw)
}

/// Loads and builds every dataset file below `dir`.
///
/// Unreadable or malformed files are logged and skipped; only a missing or
/// unreadable `dir` is an error.
pub fn load_dataset_dir(dir: &Path) -> CatalogResult<Vec<Dataset>> {
    let mut files = Vec::new();
    collect_json_files(dir, &mut files)?;
    files.sort();

    let mut datasets = Vec::with_capacity(files.len());
    for path in files {
        match load_raw_dataset(&path) {
            Ok(raw) => {
                let dataset = Dataset::from_raw(&raw);
                if dataset.id.is_empty() {
                    warn!("Skipping {}: DatasetName is empty", path.display());
                    continue;
                }
                datasets.push(dataset);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }
    info!("Loaded {} datasets from {}", datasets.len(), dir.display());
    Ok(datasets)
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> CatalogResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| CatalogError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| CatalogError::io(dir, e))?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
            continue;
        }
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
        let is_manifest = path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE);
        if is_json && !is_manifest {
            out.push(path);
        }
    }
    Ok(())
}

impl CatalogStore {
    /// Loads every dataset below `dir` and registers it. Returns how many
    /// datasets were registered.
    pub fn load_dir(&mut self, dir: &Path) -> CatalogResult<usize> {
        let datasets = load_dataset_dir(dir)?;
        let count = datasets.len();
        for dataset in datasets {
            self.register_dataset(dataset);
        }
        Ok(count)
    }
}
