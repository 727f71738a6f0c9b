use std::collections::{BTreeMap, BTreeSet};

use crate::types::Fqdn;

/// Symbol → FQDNs whose path contains that symbol as a segment.
///
/// Every FQDN is filed under each of its non-empty segments, so
/// `Kernel` and `Http` both find `\App\Http\Kernel`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FqdnIndex {
    entries: BTreeMap<String, BTreeSet<Fqdn>>,
}

impl FqdnIndex {
    #[must_use]
    pub fn from_fqdns<'a>(fqdns: impl IntoIterator<Item = &'a Fqdn>) -> Self {
        let mut entries: BTreeMap<String, BTreeSet<Fqdn>> = BTreeMap::new();
        for fqdn in fqdns {
            for segment in fqdn.segments() {
                entries
                    .entry(segment.to_string())
                    .or_default()
                    .insert(fqdn.clone());
            }
        }
        Self { entries }
    }

    /// Adopt a pre-built mapping, e.g. one read back from disk.
    ///
    /// Entries whose FQDN does not contain the key as a segment are dropped,
    /// as are buckets left empty.
    #[must_use]
    pub fn from_mapping(mapping: BTreeMap<String, BTreeSet<Fqdn>>) -> Self {
        let mut entries = BTreeMap::new();
        for (symbol, fqdns) in mapping {
            let (kept, dropped): (BTreeSet<Fqdn>, BTreeSet<Fqdn>) = fqdns
                .into_iter()
                .partition(|f| f.segments().any(|s| s == symbol));
            if !dropped.is_empty() {
                tracing::warn!(
                    symbol = %symbol,
                    dropped = dropped.len(),
                    "index entries not containing their symbol"
                );
            }
            if !kept.is_empty() {
                entries.insert(symbol, kept);
            }
        }
        Self { entries }
    }

    /// `None` when the symbol was never indexed.
    #[must_use]
    pub fn lookup(&self, symbol: &str) -> Option<&BTreeSet<Fqdn>> {
        self.entries.get(symbol)
    }

    #[must_use]
    pub fn as_mapping(&self) -> &BTreeMap<String, BTreeSet<Fqdn>> {
        &self.entries
    }

    /// Number of indexed symbols (keys).
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct FQDNs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
