//! Dataset document types and their JSON codec.
//!
//! A dataset is the parsed vendor table plus provenance metadata, persisted
//! as a pretty-printed JSON object. Key order is deterministic everywhere:
//! meta fields are declared (and therefore serialized) in alphabetical
//! order, and the vendor table is a `BTreeMap` so keys are sorted both on
//! disk and when iterated at query time. Numeric meta fields are serialized
//! as strings, matching the historical on-disk format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::registry::VendorEntry;

/// Provenance metadata recorded with every refresh.
///
/// Created fresh on each successful refresh and never mutated afterward; a
/// refresh produces a wholly new dataset rather than patching an old one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetMeta {
    /// Byte length of the acquired source file.
    #[serde(with = "stringified")]
    pub source_bytes: u64,
    /// Path the raw source bytes were read from (scratch path for
    /// downloads).
    pub source_data_file: String,
    /// MD5 digest of the source bytes, lowercase hex.
    pub source_md5: String,
    /// SHA-1 digest of the source bytes, lowercase hex.
    pub source_sha1: String,
    /// SHA-256 digest of the source bytes, lowercase hex.
    pub source_sha256: String,
    /// URL or local path the source was acquired from.
    pub source_url: String,
    /// Retrieval instant, UTC.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Number of assignment lines parsed from the source, duplicate
    /// prefixes included.
    #[serde(with = "stringified")]
    pub vendor_count: u64,
}

/// The persisted lookup table: provenance metadata plus the
/// prefix-to-organization mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    pub meta: DatasetMeta,
    pub vendors: BTreeMap<String, String>,
}

impl Dataset {
    /// Assemble a dataset from parsed vendor entries.
    ///
    /// Entries are folded in source order, so a later occurrence of a
    /// prefix overwrites an earlier one.
    pub fn from_entries(meta: DatasetMeta, entries: Vec<VendorEntry>) -> Self {
        let mut vendors = BTreeMap::new();
        for entry in entries {
            vendors.insert(entry.prefix, entry.organization);
        }
        Self { meta, vendors }
    }

    /// Serialize to the canonical on-disk document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Decode a dataset from its on-disk document.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// Status report for a loaded dataset: its metadata plus the path of the
/// data file backing it.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetStatus {
    #[serde(flatten)]
    pub meta: DatasetMeta,
    pub data_file: String,
}

/// Integer fields serialized as strings for on-disk compatibility.
mod stringified {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Timestamps serialized as `YYYY-MM-DDTHH:MM:SS+00:00`.
mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const SERIALIZE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S+00:00";
    const DESERIALIZE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(SERIALIZE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&s, DESERIALIZE_FORMAT)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
