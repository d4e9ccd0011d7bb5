//! Top-level handle tying the store, parser and lookup engine together,
//! including the refresh pipeline that rebuilds the dataset from the
//! upstream registry.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::dataset::{Dataset, DatasetMeta, DatasetStatus};
use crate::error::{Error, Result};
use crate::lookup::{self, QueryMatch};
use crate::registry;
use crate::store::DatasetStore;

/// Canonical upstream registry location.
pub const DEFAULT_SOURCE_URL: &str = "https://standards-oui.ieee.org/oui/oui.txt";

/// File name for the staged download inside the scratch directory.
const SOURCE_FILENAME: &str = "oui.txt";

/// Default bound on the registry download; the upstream imposes none.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// OUI lookup handle.
///
/// Owns the dataset store (and with it the per-process memoized dataset)
/// and exposes the three operations: [`query`](Self::query),
/// [`status`](Self::status) and [`update`](Self::update) /
/// [`update_from_file`](Self::update_from_file).
///
/// # Example
///
/// ```ignore
/// use ouilookup::OuiLookup;
///
/// let lookup = OuiLookup::new();
/// let results = lookup.query(&["00:00:0C:12:34:56"])?;
/// for m in &results {
///     println!("{}: {:?}", m.token, m.organization);
/// }
/// ```
pub struct OuiLookup {
    store: DatasetStore,
    source_url: String,
    fetch_timeout: Duration,
}

impl OuiLookup {
    /// Create a handle using the default search paths and source URL.
    pub fn new() -> Self {
        Self::with_store(DatasetStore::new())
    }

    /// Create a handle pinned to an explicit data file.
    pub fn with_data_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_store(DatasetStore::with_data_file(path))
    }

    /// Create a handle over a caller-configured store.
    pub fn with_store(store: DatasetStore) -> Self {
        Self {
            store,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Override the registry source URL.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Override the download timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The configured registry source URL.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Access the underlying store.
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Look up one or more address expressions against the cached dataset.
    ///
    /// Loads the dataset on first use; see [`DatasetStore::load`] for the
    /// memoization behavior.
    pub fn query<S: AsRef<str>>(&self, expression: &[S]) -> Result<Vec<QueryMatch>> {
        let loaded = self.store.load()?;
        Ok(lookup::query(&loaded.dataset, expression))
    }

    /// Report metadata about the cached dataset and the file backing it.
    pub fn status(&self) -> Result<DatasetStatus> {
        let loaded = self.store.load()?;
        Ok(DatasetStatus {
            meta: loaded.dataset.meta.clone(),
            data_file: loaded.path.display().to_string(),
        })
    }

    /// Drop the memoized dataset so the next operation re-reads storage.
    pub fn reload(&mut self) {
        self.store.invalidate();
    }

    /// Download the registry from the configured URL and rebuild the
    /// dataset.
    ///
    /// The download is staged into a scratch directory that is removed on
    /// every exit path, success or failure.
    pub fn update(&mut self) -> Result<DatasetStatus> {
        log::debug!("update() from {}", self.source_url);

        let scratch = tempfile::Builder::new()
            .prefix("ouilookup-")
            .tempdir()
            .map_err(|e| Error::Write(format!("create scratch directory: {}", e)))?;
        let source_file = scratch.path().join(SOURCE_FILENAME);

        self.fetch_source(&source_file)?;

        let source_url = self.source_url.clone();
        self.rebuild_from(&source_file, &source_url)
    }

    /// Rebuild the dataset from a locally supplied registry file.
    pub fn update_from_file(&mut self, source_file: &Path) -> Result<DatasetStatus> {
        log::debug!("update_from_file({:?})", source_file);

        let source_url = source_file.display().to_string();
        self.rebuild_from(source_file, &source_url)
    }

    fn fetch_source(&self, dest: &Path) -> Result<()> {
        log::debug!("downloading {} to {:?}", self.source_url, dest);

        let agent = ureq::AgentBuilder::new()
            .timeout(self.fetch_timeout)
            .build();
        let response = agent
            .get(&self.source_url)
            .call()
            .map_err(|e| Error::Fetch(format!("{}: {}", self.source_url, e)))?;

        let mut raw = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut raw)
            .map_err(|e| Error::Fetch(format!("reading {}: {}", self.source_url, e)))?;

        fs::write(dest, &raw)
            .map_err(|e| Error::Write(format!("write {}: {}", dest.display(), e)))?;

        log::info!("downloaded {} bytes from {}", raw.len(), self.source_url);
        Ok(())
    }

    /// Parse a source file and atomically replace the dataset.
    ///
    /// Any step's failure aborts the whole refresh and leaves the previous
    /// dataset file, if any, untouched.
    fn rebuild_from(&mut self, source_file: &Path, source_url: &str) -> Result<DatasetStatus> {
        if !source_file.is_file() {
            return Err(Error::NotFound(format!(
                "source data file {}",
                source_file.display()
            )));
        }

        let raw = fs::read(source_file).map_err(|e| {
            Error::NotFound(format!("source data file {}: {}", source_file.display(), e))
        })?;

        let timestamp = fs::metadata(source_file)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        // Digests describe the bytes as acquired, before any
        // decompression.
        let source_bytes = raw.len() as u64;
        let source_md5 = hex_digest(&Md5::digest(&raw));
        let source_sha1 = hex_digest(&Sha1::digest(&raw));
        let source_sha256 = hex_digest(&Sha256::digest(&raw));

        let text = if is_gzip(&raw) {
            log::debug!("source is gzip compressed, decompressing");
            let mut decoder = GzDecoder::new(&raw[..]);
            let mut decompressed = Vec::new();
            decoder.read_to_end(&mut decompressed).map_err(|e| {
                Error::Corrupt(format!(
                    "gzip decompression of {}: {}",
                    source_file.display(),
                    e
                ))
            })?;
            decompressed
        } else {
            raw
        };

        let entries = registry::parse(&text);
        if entries.is_empty() {
            log::warn!("parsed zero vendors from {}", source_file.display());
        }

        let meta = DatasetMeta {
            source_bytes,
            source_data_file: source_file.display().to_string(),
            source_md5,
            source_sha1,
            source_sha256,
            source_url: source_url.to_string(),
            timestamp,
            vendor_count: entries.len() as u64,
        };

        let dataset = Dataset::from_entries(meta, entries);
        let target = self.store.update_target();
        self.store.save(&dataset, &target)?;
        log::info!(
            "saved dataset with {} vendors to {:?}",
            dataset.vendors.len(),
            target
        );

        // Re-point the store so a query in this same process sees the new
        // data.
        self.store.set_data_file(&target);
        self.store.invalidate();

        Ok(DatasetStatus {
            meta: dataset.meta,
            data_file: target.display().to_string(),
        })
    }
}

impl Default for OuiLookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Check for the gzip magic bytes.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Lowercase hex rendering of a digest.
fn hex_digest(bytes: impl AsRef<[u8]>) -> String {
    bytes
        .as_ref()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DATA_FILENAME;
    use std::io::Write;

    const REGISTRY: &[u8] = b"\
00-00-0C   (hex)        CISCO SYSTEMS, INC.
00-00-AA   (hex)        XEROX CORPORATION
";

    fn handle_in(dir: &Path) -> OuiLookup {
        OuiLookup::with_store(
            DatasetStore::new().with_search_paths(vec![dir.to_path_buf()]),
        )
    }

    fn write_registry(dir: &Path, raw: &[u8]) -> std::path::PathBuf {
        let path = dir.join("oui.txt");
        fs::write(&path, raw).unwrap();
        path
    }

    #[test]
    fn test_update_from_file_builds_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), REGISTRY);

        let mut lookup = handle_in(dir.path());
        let status = lookup.update_from_file(&source).unwrap();

        assert_eq!(status.meta.vendor_count, 2);
        assert_eq!(status.meta.source_bytes, REGISTRY.len() as u64);
        assert_eq!(status.data_file, dir.path().join(DATA_FILENAME).display().to_string());
        assert!(dir.path().join(DATA_FILENAME).is_file());
    }

    #[test]
    fn test_update_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut lookup = handle_in(dir.path());

        let result = lookup.update_from_file(&dir.path().join("absent.txt"));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(!dir.path().join(DATA_FILENAME).exists());
    }

    #[test]
    fn test_query_after_update_same_process() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), REGISTRY);

        let mut lookup = handle_in(dir.path());
        lookup.update_from_file(&source).unwrap();

        let results = lookup.query(&["00000C000000"]).unwrap();
        assert_eq!(
            results[0].organization.as_deref(),
            Some("CISCO SYSTEMS, INC.")
        );
    }

    #[test]
    fn test_update_idempotent_for_identical_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), REGISTRY);

        let mut lookup = handle_in(dir.path());
        let first = lookup.update_from_file(&source).unwrap();
        let second = lookup.update_from_file(&source).unwrap();

        assert_eq!(first.meta.source_md5, second.meta.source_md5);
        assert_eq!(first.meta.source_sha1, second.meta.source_sha1);
        assert_eq!(first.meta.source_sha256, second.meta.source_sha256);
        assert_eq!(first.meta.vendor_count, second.meta.vendor_count);

        let loaded = lookup.store().load().unwrap();
        assert_eq!(loaded.dataset.vendors.len(), 2);
    }

    #[test]
    fn test_update_from_gzip_source() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(REGISTRY).unwrap();
        let compressed = encoder.finish().unwrap();
        let source = write_registry(dir.path(), &compressed);

        let mut lookup = handle_in(dir.path());
        let status = lookup.update_from_file(&source).unwrap();

        // Vendors come from the decompressed text, provenance from the
        // acquired bytes.
        assert_eq!(status.meta.vendor_count, 2);
        assert_eq!(status.meta.source_bytes, compressed.len() as u64);
    }

    #[test]
    fn test_update_with_explicit_data_file_target() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), REGISTRY);
        let target = dir.path().join("custom").join("my-data.json");

        let mut lookup = OuiLookup::with_data_file(&target);
        let status = lookup.update_from_file(&source).unwrap();

        assert_eq!(status.data_file, target.display().to_string());
        assert!(target.is_file());
    }

    #[test]
    fn test_empty_registry_is_a_valid_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), b"nothing to see\n");

        let mut lookup = handle_in(dir.path());
        let status = lookup.update_from_file(&source).unwrap();

        assert_eq!(status.meta.vendor_count, 0);
        assert!(lookup.query(&["00000C000000"]).unwrap()[0]
            .organization
            .is_none());
    }

    #[test]
    fn test_status_reports_loaded_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_registry(dir.path(), REGISTRY);

        let mut lookup = handle_in(dir.path());
        lookup.update_from_file(&source).unwrap();

        let status = lookup.status().unwrap();
        assert_eq!(status.meta.vendor_count, 2);
        assert_eq!(
            status.data_file,
            dir.path().join(DATA_FILENAME).display().to_string()
        );
    }

    #[test]
    fn test_is_gzip() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08]));
        assert!(!is_gzip(b"00-00-0C   (hex)"));
        assert!(!is_gzip(&[0x1f]));
    }

    #[test]
    fn test_hex_digest() {
        assert_eq!(hex_digest(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(
            hex_digest(&Md5::digest(b"")),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_builder_defaults() {
        let lookup = OuiLookup::new();
        assert_eq!(lookup.source_url(), DEFAULT_SOURCE_URL);
        assert_eq!(lookup.fetch_timeout, DEFAULT_FETCH_TIMEOUT);

        let custom = OuiLookup::new()
            .with_source_url("http://127.0.0.1:1/oui.txt")
            .with_fetch_timeout(Duration::from_secs(5));
        assert_eq!(custom.source_url(), "http://127.0.0.1:1/oui.txt");
        assert_eq!(custom.fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_fetch_failure_maps_to_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens on this port; the connection fails immediately.
        let mut lookup = handle_in(dir.path())
            .with_source_url("http://127.0.0.1:9/oui.txt")
            .with_fetch_timeout(Duration::from_secs(2));

        let result = lookup.update();
        assert!(matches!(result, Err(Error::Fetch(_))));
        assert!(!dir.path().join(DATA_FILENAME).exists());
    }
}
