//! Pull FQDNs out of PHP source text.
//!
//! Extraction is per file and stateless across files: the namespace context
//! starts at the root for every call. Batch extraction fans out over rayon
//! and merges afterwards, so no file ever sees another file's state.

pub mod scanner;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::error::Error;
use crate::types::{Fqdn, Keyword};
use scanner::{Declaration, DeclarationError, LineScanner};

/// Outcome of a batch extraction.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub fqdns: BTreeSet<Fqdn>,
    /// Per-file failures. Order is not meaningful.
    pub errors: Vec<Error>,
    pub files_scanned: usize,
    /// Stopped early; `fqdns` holds what the scanned files produced.
    pub cancelled: bool,
}

/// Every type declared in `content`, qualified by the namespace in effect.
pub fn extract(content: &str) -> Result<BTreeSet<Fqdn>, DeclarationError> {
    let mut fqdns = BTreeSet::new();
    if !mentions_keyword(content.as_bytes()) {
        return Ok(fqdns);
    }

    let mut scanner = LineScanner::new();
    let mut namespace = String::new();

    for line in content.lines() {
        match scanner.scan(line)? {
            Some(Declaration::Namespace(path)) => {
                namespace.clear();
                namespace.push_str(path);
            }
            Some(Declaration::Type { name, .. }) => {
                fqdns.insert(Fqdn::new(&namespace, name));
            }
            None => {}
        }
    }
    Ok(fqdns)
}

/// Read and extract one file. Undecodable or malformed files are errors for
/// this file only.
pub fn extract_file(path: &Path) -> Result<BTreeSet<Fqdn>, Error> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|_| Error::Decode {
        path: path.to_path_buf(),
    })?;
    extract(&content).map_err(|e| Error::MalformedDeclaration {
        path: path.to_path_buf(),
        line: e.line,
        keyword: e.keyword,
        text: e.text,
    })
}

/// Extract every file in parallel and merge.
///
/// Setting `cancel` stops the batch between files; files already in flight
/// finish and their results are kept.
pub fn extract_all(paths: &[PathBuf], cancel: &AtomicBool) -> ScanReport {
    let results: Vec<Option<Result<BTreeSet<Fqdn>, Error>>> = paths
        .par_iter()
        .map(|path| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            Some(extract_file(path))
        })
        .collect();

    let mut report = ScanReport::default();
    for result in results {
        match result {
            Some(Ok(fqdns)) => {
                report.files_scanned += 1;
                report.fqdns.extend(fqdns);
            }
            Some(Err(e)) => {
                report.files_scanned += 1;
                tracing::warn!("{e}");
                report.errors.push(e);
            }
            None => report.cancelled = true,
        }
    }

    tracing::debug!(
        files = report.files_scanned,
        fqdns = report.fqdns.len(),
        errors = report.errors.len(),
        cancelled = report.cancelled,
        "extraction finished"
    );
    report
}

/// Fast byte check via memchr::memmem. A file mentioning no trigger keyword
/// at all can neither declare a type nor hold a malformed declaration.
fn mentions_keyword(buf: &[u8]) -> bool {
    Keyword::ALL
        .iter()
        .any(|k| memchr::memmem::find(buf, k.as_str().as_bytes()).is_some())
}
