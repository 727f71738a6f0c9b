#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,   // Rust naming conventions
    clippy::similar_names,             // common in parser code
    clippy::missing_errors_doc,        // error variants are documented on `Error`
    clippy::missing_panics_doc,        // only static regexes expect()
)]

pub mod cache;
pub mod config;
pub mod document;
pub mod edit;
pub mod error;
pub mod extract;
pub mod format;
pub mod index;
pub mod planner;
pub mod store;
pub mod types;
pub mod walk;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use config::Settings;
use document::TextDocument;
use error::Error;
use extract::ScanReport;
use index::FqdnIndex;
use types::{Fqdn, Insertion};

/// Full scan: walk → extract (parallel) → build.
/// Every call builds a fresh index; nothing is reused from earlier scans.
#[must_use]
pub fn build_index(
    roots: &[PathBuf],
    settings: &Settings,
    cancel: &AtomicBool,
) -> (FqdnIndex, ScanReport) {
    let files = walk::find_source_files(roots, &settings.filter());
    tracing::info!(files = files.len(), "scanning");
    let report = extract::extract_all(&files, cancel);
    let index = FqdnIndex::from_fqdns(&report.fqdns);
    (index, report)
}

/// Plan an import into document text held by the caller.
pub fn plan_import(text: &str, fqdn: &Fqdn) -> Result<Insertion, Error> {
    planner::plan(&TextDocument::new(text), fqdn)
}
