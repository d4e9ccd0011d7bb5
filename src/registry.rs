//! IEEE registry text format parser.
//!
//! The upstream registry is an informal plain-text publication where each
//! assignment occupies one line of the form:
//!
//! ```text
//! 00-00-0C   (hex)        CISCO SYSTEMS, INC.
//! ```
//!
//! Lines without both the `(hex)` marker and a hyphen are ignored. The
//! parser is a pure transformation: it never rejects input, and an input
//! with no matching lines simply yields an empty table.

/// A single registry assignment: a hardware address prefix and the
/// organization that registered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorEntry {
    /// Uppercase hexadecimal prefix with separators removed.
    ///
    /// The legacy OUI form is 6 hex digits, but no length is enforced;
    /// whatever precedes the marker passes through as-is.
    pub prefix: String,
    /// Registering organization name.
    pub organization: String,
}

/// Marker token identifying an assignment line.
const HEX_MARKER: &str = "(hex)";

/// Parse raw registry bytes into an ordered sequence of vendor entries.
///
/// Input is treated as UTF-8 text; carriage returns are stripped before
/// splitting so CRLF and LF sources parse identically. Duplicate prefixes
/// are all emitted in source order — collapsing them (last occurrence
/// wins) is the dataset's concern, not the parser's. The vendor count of
/// the source is the length of the returned sequence.
pub fn parse(raw: &[u8]) -> Vec<VendorEntry> {
    let text = String::from_utf8_lossy(raw).replace('\r', "");

    let mut vendors = Vec::new();
    for line in text.split('\n') {
        if !line.contains(HEX_MARKER) || !line.contains('-') {
            continue;
        }

        let marker = line.find(HEX_MARKER).unwrap_or(line.len());

        let prefix = line[..marker]
            .trim_end_matches(' ')
            .replace('-', "")
            .to_uppercase();
        let organization = line[marker..]
            .replace(HEX_MARKER, "")
            .replace('\t', "")
            .trim()
            .to_string();

        vendors.push(VendorEntry {
            prefix,
            organization,
        });
    }

    vendors
}
