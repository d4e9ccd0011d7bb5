//! Dataset persistence: search-path discovery, memoized loading, and
//! atomic saves.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use crate::dataset::Dataset;
use crate::error::{Error, Result};

/// Standard dataset file name probed in each search directory.
pub const DATA_FILENAME: &str = "ouilookup.json";

/// Default ordered search directories: user-local data, a `data` directory
/// alongside the installed binary, then the system-wide path.
pub fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".local").join("ouilookup"));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            paths.push(dir.join("data"));
        }
    }

    paths.push(PathBuf::from("/var/lib/ouilookup"));

    paths
}

/// A dataset together with the path it was loaded from.
#[derive(Debug)]
pub struct LoadedDataset {
    pub path: PathBuf,
    pub dataset: Dataset,
}

/// Owner of the persisted dataset for one process invocation.
///
/// `load()` is memoized: once a dataset has been read, the same in-memory
/// instance is returned for the rest of the handle's lifetime even if the
/// underlying file changes. A refresh in another process becomes visible
/// only after `invalidate()` or a process restart.
pub struct DatasetStore {
    explicit_path: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
    cache: OnceCell<LoadedDataset>,
}

impl DatasetStore {
    /// Create a store using the default search paths.
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            search_paths: default_search_paths(),
            cache: OnceCell::new(),
        }
    }

    /// Create a store pinned to an explicit data file, bypassing search.
    pub fn with_data_file(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_path: Some(path.into()),
            search_paths: default_search_paths(),
            cache: OnceCell::new(),
        }
    }

    /// Replace the search directory list.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// The search directories probed when no explicit path is set.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Locate the dataset file: the explicit path if set, otherwise the
    /// first search directory containing `ouilookup.json`. No merging
    /// across locations.
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.explicit_path {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(Error::NotFound(format!(
                "dataset file {}",
                path.display()
            )));
        }

        for dir in &self.search_paths {
            let candidate = dir.join(DATA_FILENAME);
            if candidate.is_file() {
                log::debug!("located dataset file {:?}", candidate);
                return Ok(candidate);
            }
        }

        log::warn!(
            "no {} found in any of {:?}",
            DATA_FILENAME,
            self.search_paths
        );
        Err(Error::NotFound(format!(
            "{} in search paths {:?}; run an update first",
            DATA_FILENAME, self.search_paths
        )))
    }

    /// Load the dataset, memoized for the lifetime of this handle.
    pub fn load(&self) -> Result<&LoadedDataset> {
        self.cache.get_or_try_init(|| {
            let path = self.locate()?;
            let dataset = read_dataset(&path)?;
            log::debug!(
                "loaded dataset from {:?} ({} vendors)",
                path,
                dataset.vendors.len()
            );
            Ok(LoadedDataset { path, dataset })
        })
    }

    /// Drop the memoized dataset so the next `load()` re-reads storage.
    pub fn invalidate(&mut self) {
        self.cache.take();
    }

    /// Pin the store to `path` for subsequent loads and refreshes.
    pub fn set_data_file(&mut self, path: impl Into<PathBuf>) {
        self.explicit_path = Some(path.into());
    }

    /// Resolve where a refresh should write: the explicit path, else the
    /// path of the currently-loaded dataset, else the first search
    /// directory joined with the standard filename.
    pub fn update_target(&self) -> PathBuf {
        if let Some(ref path) = self.explicit_path {
            return path.clone();
        }
        if let Some(loaded) = self.cache.get() {
            return loaded.path.clone();
        }
        self.search_paths
            .first()
            .map(|dir| dir.join(DATA_FILENAME))
            .unwrap_or_else(|| PathBuf::from(DATA_FILENAME))
    }

    /// Persist a dataset to `target`, atomically from a reader's
    /// perspective: the document is written to a sibling temp file, synced
    /// and renamed into place, so a concurrent load never observes a
    /// truncated write.
    pub fn save(&self, dataset: &Dataset, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Write(format!("create {}: {}", parent.display(), e))
            })?;
        }

        let content = dataset
            .to_json()
            .map_err(|e| Error::Write(format!("encode dataset: {}", e)))?;

        let tmp_path = temp_sibling(target);
        let result = (|| {
            let mut tmp = fs::File::create(&tmp_path).map_err(|e| {
                Error::Write(format!("create {}: {}", tmp_path.display(), e))
            })?;
            tmp.write_all(content.as_bytes())
                .map_err(|e| Error::Write(format!("write {}: {}", tmp_path.display(), e)))?;
            tmp.sync_all()
                .map_err(|e| Error::Write(format!("sync {}: {}", tmp_path.display(), e)))?;
            drop(tmp);

            fs::rename(&tmp_path, target).map_err(|e| {
                Error::Write(format!(
                    "rename {} to {}: {}",
                    tmp_path.display(),
                    target.display(),
                    e
                ))
            })
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }

        result
    }
}

impl Default for DatasetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Sibling temp path used to stage a save before the atomic rename.
fn temp_sibling(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DATA_FILENAME.into());
    name.push(".tmp");
    target.with_file_name(name)
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::NotFound(format!("dataset file {}: {}", path.display(), e)))?;
    Dataset::from_json(&content)
        .map_err(|e| Error::Corrupt(format!("{}: {}", path.display(), e)))
}
