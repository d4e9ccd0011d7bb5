//! Query normalization and prefix matching against a loaded dataset.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::dataset::Dataset;

/// Result of looking up one normalized query token.
///
/// Serializes as a one-entry JSON object, `{"<TOKEN>": <name or null>}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMatch {
    /// The normalized token that was looked up.
    pub token: String,
    /// The matched organization name, or `None` when no stored prefix is a
    /// prefix of the token.
    pub organization: Option<String>,
}

impl Serialize for QueryMatch {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.token, &self.organization)?;
        map.end()
    }
}

/// Normalize a query expression into lookup tokens.
///
/// Each expression item is split on whitespace and commas; the `:`, `-`
/// and `.` separators are removed from every token; tokens are uppercased
/// and empty ones dropped. Token order is preserved and defines result
/// order.
pub fn normalize_terms<S: AsRef<str>>(expression: &[S]) -> Vec<String> {
    let mut terms = Vec::new();

    for item in expression {
        for token in item
            .as_ref()
            .split(|c: char| c.is_whitespace() || c == ',')
        {
            let term: String = token
                .chars()
                .filter(|&c| !matches!(c, ':' | '-' | '.'))
                .collect::<String>()
                .to_uppercase();
            if !term.is_empty() {
                terms.push(term);
            }
        }
    }

    terms
}

/// Look up each normalized token of `expression` in the dataset's vendor
/// table.
///
/// Matching iterates the table in its stored (sorted-key) order and takes
/// the first entry whose prefix is a string prefix of the token; it is not
/// a longest-prefix match. Unmatched tokens are reported with a `None`
/// organization rather than omitted. Lookups never fail: tokens of any
/// length or content are well-defined queries.
pub fn query<S: AsRef<str>>(dataset: &Dataset, expression: &[S]) -> Vec<QueryMatch> {
    let terms = normalize_terms(expression);
    log::debug!("query normalized to terms {:?}", terms);

    terms
        .into_iter()
        .map(|term| {
            let organization = dataset
                .vendors
                .iter()
                .find(|(prefix, _)| term.starts_with(prefix.as_str()))
                .map(|(_, name)| name.clone());
            QueryMatch {
                token: term,
                organization,
            }
        })
        .collect()
}
