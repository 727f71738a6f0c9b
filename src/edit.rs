use std::fs;
use std::path::Path;

use crate::document::{Document, TextDocument};
use crate::error::Error;
use crate::planner;
use crate::types::{Fqdn, Insertion};

/// Read a document from disk. Non-UTF-8 content is a `Decode` error.
pub fn read_document(path: &Path) -> Result<TextDocument, Error> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| Error::Decode {
        path: path.to_path_buf(),
    })?;
    Ok(TextDocument::new(text))
}

/// Plan an import into a file without touching it.
pub fn plan_file(path: &Path, fqdn: &Fqdn) -> Result<Insertion, Error> {
    let doc = read_document(path)?;
    planner::plan(&doc, fqdn).map_err(|e| e.with_path(path))
}

/// Plan, insert and write back. A no-op leaves the file untouched.
///
/// 1. Read file
/// 2. Plan against the current text (fail-fast on no anchor)
/// 3. Splice the directive's text at its offset
/// 4. Write file
pub fn apply_to_file(path: &Path, fqdn: &Fqdn) -> Result<Insertion, Error> {
    let mut doc = read_document(path)?;
    let outcome = planner::plan(&doc, fqdn).map_err(|e| e.with_path(path))?;

    if let Insertion::Insert(directive) = &outcome {
        doc.insert_text(directive.offset, &directive.text);
        fs::write(path, doc.as_str()).map_err(|e| Error::io(path, e))?;
        tracing::info!(path = %path.display(), line = directive.line, fqdn = %fqdn, "import added");
    }
    Ok(outcome)
}
