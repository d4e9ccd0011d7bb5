//! OuiLookup - hardware address vendor lookup backed by a locally cached
//! IEEE registry dataset.
//!
//! This crate resolves hardware network-interface address prefixes
//! (organizationally unique identifiers, OUI) to the name of the
//! registering organization, using a periodically-refreshed copy of the
//! public IEEE registry text file.
//!
//! # Features
//!
//! - **Query**: normalize address expressions in any common notation
//!   (`00:00:0C...`, `00-00-0c...`, `0000.0C00...`, bare hex) and match
//!   them against the vendor table
//! - **Status**: report provenance metadata (byte length, MD5/SHA-1/
//!   SHA-256 digests, retrieval timestamp, vendor count) of the cached
//!   dataset
//! - **Update**: download the registry from `standards-oui.ieee.org` (or
//!   parse a locally supplied copy) and atomically replace the dataset
//! - **Discoverable cache**: the dataset file is found through an ordered
//!   search-path list, first match wins, and memoized per process
//!
//! # Quick Start
//!
//! ```ignore
//! use ouilookup::OuiLookup;
//!
//! let mut lookup = OuiLookup::new();
//!
//! // Build the local dataset (downloads ~2 MB of registry text)
//! lookup.update()?;
//!
//! // Query one or more addresses in a single expression
//! for m in lookup.query(&["00:00:0c:12:34:56, 00-00-aa-00-00-00"])? {
//!     match m.organization {
//!         Some(name) => println!("{} -> {}", m.token, name),
//!         None => println!("{} -> unknown", m.token),
//!     }
//! }
//!
//! // Inspect the cached dataset
//! let status = lookup.status()?;
//! println!("{} vendors", status.meta.vendor_count);
//! ```
//!
//! # Matching semantics
//!
//! The vendor table is consulted in its stored (sorted-key) order and the
//! first entry whose prefix is a string prefix of the query token wins.
//! This is deliberately not a longest-prefix match; downstream consumers
//! depend on the historical behavior. Unknown tokens yield a null match
//! rather than an error.

mod error;
mod manager;

pub mod dataset;
pub mod lookup;
pub mod registry;
pub mod store;

// Re-export core types
pub use error::{Error, Result};

// Re-export the dataset model
pub use dataset::{Dataset, DatasetMeta, DatasetStatus, VendorEntry};

// Re-export the lookup engine types
pub use lookup::QueryMatch;

// Re-export the store
pub use store::{default_search_paths, DatasetStore, DATA_FILENAME};

// Re-export the top-level handle
pub use manager::{OuiLookup, DEFAULT_FETCH_TIMEOUT, DEFAULT_SOURCE_URL};
