use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ignore::WalkBuilder;

/// Which files a scan considers.
#[derive(Debug, Clone)]
pub struct WalkFilter<'a> {
    /// A directory is skipped when its name contains any of these.
    pub folders_to_exclude: &'a [String],
    /// A file is kept when its name ends with any of these.
    pub file_extensions_to_include: &'a [String],
}

impl WalkFilter<'_> {
    fn keeps_file(&self, name: &str) -> bool {
        self.file_extensions_to_include
            .iter()
            .any(|ext| name.ends_with(ext.as_str()))
    }
}

/// Collect candidate files under `roots`. Order is unspecified.
///
/// Walks everything, .gitignore included: vendor code is exactly what an
/// import index needs to see. Unreadable entries are logged and skipped.
pub fn find_source_files(roots: &[PathBuf], filter: &WalkFilter<'_>) -> Vec<PathBuf> {
    let Some((first, rest)) = roots.split_first() else {
        return Vec::new();
    };

    let mut builder = WalkBuilder::new(first);
    for root in rest {
        builder.add(root);
    }

    // filter_entry needs 'static
    let excluded = filter.folders_to_exclude.to_vec();
    let walker = builder
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .filter_entry(move |entry| {
            if entry.depth() > 0 && entry.file_type().is_some_and(|ft| ft.is_dir()) {
                if let Some(name) = entry.file_name().to_str() {
                    return !is_excluded_dir(name, &excluded);
                }
            }
            true
        })
        .build_parallel();

    let found: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    walker.run(|| {
        let found = &found;
        Box::new(move |entry| {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("walk: {e}");
                    return ignore::WalkState::Continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return ignore::WalkState::Continue;
            }
            if is_candidate(entry.path(), filter) {
                found
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(entry.into_path());
            }
            ignore::WalkState::Continue
        })
    });

    let files = found
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    tracing::debug!(roots = roots.len(), files = files.len(), "source files found");
    files
}

fn is_excluded_dir(name: &str, excluded: &[String]) -> bool {
    excluded
        .iter()
        .any(|ex| !ex.is_empty() && name.contains(ex.as_str()))
}

/// Whether `path` has one of the included extensions.
#[must_use]
pub fn is_candidate(path: &Path, filter: &WalkFilter<'_>) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| filter.keeps_file(name))
}
