//! Rendering of the inserted `use` line and of CLI output.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::Path;

use crate::extract::ScanReport;
use crate::index::FqdnIndex;
use crate::types::{Fqdn, Insertion, InsertionDirective};

/// `indentation + "use " + path + ";" + spacing`.
#[must_use]
pub fn import_statement(fqdn: &Fqdn, indentation: &str, spacing: &str) -> String {
    format!("{indentation}use {};{spacing}", fqdn.import_path())
}

/// Leading whitespace of a line, verbatim.
#[must_use]
pub fn indentation_of(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

/// Terminator used by the document: `\r\n` if it appears anywhere, else `\n`.
#[must_use]
pub fn line_ending(text: &str) -> &'static str {
    if memchr::memmem::find(text.as_bytes(), b"\r\n").is_some() {
        "\r\n"
    } else {
        "\n"
    }
}

/// Spacing after an import placed below a declaration line.
///
/// One blank line between the declaration and what follows means the file
/// keeps blocks apart with a blank line; the new import then gets one too.
/// Any other gap gets a plain terminator.
#[must_use]
pub fn spacing_for_gap(blank_lines: usize, eol: &str) -> String {
    if blank_lines == 1 {
        format!("{eol}{eol}")
    } else {
        eol.to_string()
    }
}

/// Build header for lookup results: `# Lookup: "Kernel" - 2 matches`
#[must_use]
pub fn lookup_header(symbol: &str, count: usize) -> String {
    let noun = if count == 1 { "match" } else { "matches" };
    format!("# Lookup: \"{symbol}\" - {count} {noun}")
}

/// Numbered candidate list, for picking with `--pick N`.
#[must_use]
pub fn candidates(fqdns: &BTreeSet<Fqdn>) -> String {
    let mut out = String::new();
    for (i, f) in fqdns.iter().enumerate() {
        let _ = writeln!(out, "{:>3}  {f}", i + 1);
    }
    out
}

/// Human summary of a planned insertion.
#[must_use]
pub fn insertion(path: &Path, fqdn: &Fqdn, outcome: &Insertion) -> String {
    match outcome {
        Insertion::AlreadyImported { line } => format!(
            "{}:{line}: {} already imported",
            path.display(),
            fqdn.import_path()
        ),
        Insertion::Insert(d) => directive(path, d),
    }
}

fn directive(path: &Path, d: &InsertionDirective) -> String {
    format!(
        "{}:{}: insert at byte {} (anchor: {})\n{}",
        path.display(),
        d.line,
        d.offset,
        d.anchor,
        d.text.trim_end_matches(['\r', '\n'])
    )
}

/// Summary printed after an index build.
#[must_use]
pub fn scan_summary(index: &FqdnIndex, report: &ScanReport, saved_to: &Path) -> String {
    let mut out = format!(
        "# Index: {} files, {} classes, {} symbols → {}",
        report.files_scanned,
        index.len(),
        index.symbol_count(),
        saved_to.display()
    );
    if report.cancelled {
        out.push_str("\n(cancelled: partial index, not saved)");
    }
    out
}

/// Per-file failures, listed once at the end of a scan. Empty when none.
#[must_use]
pub fn scan_failures(report: &ScanReport) -> String {
    if report.errors.is_empty() {
        return String::new();
    }
    let mut out = format!("{} files failed:", report.errors.len());
    for e in &report.errors {
        let _ = write!(out, "\n  {e}");
    }
    out
}
