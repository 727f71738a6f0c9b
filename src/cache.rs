use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::config::Settings;
use crate::error::Error;
use crate::extract::ScanReport;
use crate::index::FqdnIndex;
use crate::store;

/// Result of a full rebuild.
#[derive(Debug)]
pub struct Rebuild {
    pub index: Arc<FqdnIndex>,
    pub report: ScanReport,
    pub path: PathBuf,
    /// False when the scan was cancelled: the partial index is returned but
    /// neither persisted nor cached.
    pub saved: bool,
}

/// Loaded indexes keyed by project key. Passed explicitly to whoever needs
/// lookups; there is no process-wide instance.
///
/// Value is `Arc<FqdnIndex>` so readers keep a consistent snapshot while a
/// rebuild swaps in a new one.
pub struct IndexCache {
    cache_root: PathBuf,
    entries: DashMap<String, Arc<FqdnIndex>>,
}

impl IndexCache {
    #[must_use]
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            entries: DashMap::new(),
        }
    }

    #[must_use]
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    #[must_use]
    pub fn index_path(&self, roots: &[PathBuf]) -> PathBuf {
        store::index_path(&self.cache_root, roots)
    }

    /// In-memory index, else the persisted one. `Ok(None)` when neither exists:
    /// the caller decides whether to rebuild.
    /// Uses `entry()` API to avoid a race between the miss and the insert.
    pub fn get(&self, roots: &[PathBuf]) -> Result<Option<Arc<FqdnIndex>>, Error> {
        match self.entries.entry(store::project_key(roots)) {
            Entry::Occupied(e) => Ok(Some(Arc::clone(e.get()))),
            Entry::Vacant(e) => {
                let Some(index) = store::load(&self.index_path(roots))? else {
                    return Ok(None);
                };
                let index = Arc::new(index);
                e.insert(Arc::clone(&index));
                Ok(Some(index))
            }
        }
    }

    /// Scan `roots`, build a fresh index, persist it and replace the cached one.
    pub fn rebuild(
        &self,
        roots: &[PathBuf],
        settings: &Settings,
        cancel: &AtomicBool,
    ) -> Result<Rebuild, Error> {
        let (index, report) = crate::build_index(roots, settings, cancel);
        let index = Arc::new(index);
        let path = self.index_path(roots);

        if report.cancelled {
            tracing::info!("scan cancelled; partial index not saved");
            return Ok(Rebuild {
                index,
                report,
                path,
                saved: false,
            });
        }

        store::save(&index, &path)?;
        self.entries
            .insert(store::project_key(roots), Arc::clone(&index));
        tracing::info!(
            path = %path.display(),
            fqdns = index.len(),
            errors = report.errors.len(),
            "index rebuilt"
        );
        Ok(Rebuild {
            index,
            report,
            path,
            saved: true,
        })
    }

    /// `get`, falling back to a full rebuild when no index exists yet.
    pub fn get_or_build(
        &self,
        roots: &[PathBuf],
        settings: &Settings,
        cancel: &AtomicBool,
    ) -> Result<Arc<FqdnIndex>, Error> {
        if let Some(index) = self.get(roots)? {
            return Ok(index);
        }
        tracing::info!("no index for this project yet; building");
        Ok(self.rebuild(roots, settings, cancel)?.index)
    }

    /// Drop the in-memory copy. The file on disk stays; the next `get`
    /// reloads it. Returns whether anything was cached.
    pub fn invalidate(&self, roots: &[PathBuf]) -> bool {
        self.entries.remove(&store::project_key(roots)).is_some()
    }
}
