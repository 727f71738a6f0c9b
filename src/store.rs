//! On-disk persistence for `FqdnIndex`.
//!
//! One JSON file per project: `<cache_root>/<project_key>.namespaces.index.json`,
//! an object of symbol → array of FQDN strings. Always replaced wholesale.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::Error;
use crate::index::FqdnIndex;
use crate::types::Fqdn;

const INDEX_SUFFIX: &str = ".namespaces.index.json";

/// Stable hash of the ordered root folder list.
///
/// Order matters: the same folders opened in a different order are a
/// different project key.
#[must_use]
pub fn project_key(roots: &[PathBuf]) -> String {
    let mut hasher = Sha256::new();
    for root in roots {
        hasher.update(root.to_string_lossy().as_bytes());
        // Separator so ["ab", "c"] and ["a", "bc"] differ.
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Where the index for `roots` lives under `cache_root`.
#[must_use]
pub fn index_path(cache_root: &Path, roots: &[PathBuf]) -> PathBuf {
    cache_root.join(format!("{}{INDEX_SUFFIX}", project_key(roots)))
}

/// Write the full mapping. Parent directories are created.
pub fn save(index: &FqdnIndex, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, index.as_mapping()).map_err(|e| {
        Error::IndexFormat {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    tracing::debug!(path = %path.display(), symbols = index.symbol_count(), "index saved");
    Ok(())
}

/// Read an index back. `Ok(None)` when no index has been saved there yet.
pub fn load(path: &Path) -> Result<Option<FqdnIndex>, Error> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no index on disk");
            return Ok(None);
        }
        Err(e) => return Err(Error::io(path, e)),
    };
    let mapping: BTreeMap<String, BTreeSet<Fqdn>> =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::IndexFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
    let index = FqdnIndex::from_mapping(mapping);
    tracing::debug!(path = %path.display(), symbols = index.symbol_count(), "index loaded");
    Ok(Some(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FqdnIndex {
        let fqdns: Vec<Fqdn> = ["App\\Models\\User", "App\\Http\\Kernel", "Closure"]
            .iter()
            .map(|n| Fqdn::parse(n).unwrap())
            .collect();
        FqdnIndex::from_fqdns(&fqdns)
    }

    #[test]
    fn project_key_is_stable_and_order_sensitive() {
        let a = vec![PathBuf::from("/work/a"), PathBuf::from("/work/b")];
        let b = vec![PathBuf::from("/work/b"), PathBuf::from("/work/a")];
        assert_eq!(project_key(&a), project_key(&a.clone()));
        assert_ne!(project_key(&a), project_key(&b));
        assert_eq!(project_key(&a).len(), 64);

        let split1 = vec![PathBuf::from("ab"), PathBuf::from("c")];
        let split2 = vec![PathBuf::from("a"), PathBuf::from("bc")];
        assert_ne!(project_key(&split1), project_key(&split2));
    }

    #[test]
    fn index_path_uses_key_and_suffix() {
        let roots = vec![PathBuf::from("/work/a")];
        let path = index_path(Path::new("/cache"), &roots);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(&project_key(&roots)));
        assert!(name.ends_with(".namespaces.index.json"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/x.namespaces.index.json");
        let index = sample();

        save(&index, &path).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded.as_mapping(), index.as_mapping());
    }

    #[test]
    fn saved_file_is_object_of_string_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i.json");
        save(&sample(), &path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["User"], serde_json::json!(["\\App\\Models\\User"]));
        assert_eq!(raw["App"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn load_garbage_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load(&path), Err(Error::IndexFormat { .. })));
    }
}
