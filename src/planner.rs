//! Decide where a new `use` statement goes in a document.
//!
//! One pass over the lines collects the file-level imports, the first type
//! declaration (the boundary), and the fallback anchors. `use` lines at or
//! after the boundary, or nested in a non-namespace brace scope, are trait
//! uses and never take part in ordering.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{self, Document};
use crate::error::Error;
use crate::extract::scanner::{self, LineScanner};
use crate::format;
use crate::types::{AnchorKind, Fqdn, ImportKind, ImportLine, Insertion, InsertionDirective, Keyword};

static USE_STMT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*use\s+([^;]+?)\s*;").expect("static regex"));

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+as\s+").expect("static regex"));

static FUNCTION_OR_CONST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:function|const)\s+").expect("static regex"));

static DECLARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*declare\s*\(").expect("static regex"));

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<\?php").expect("static regex"));

/// Everything the planner needs from one read of the document.
#[derive(Debug, Default)]
struct Survey {
    imports: Vec<ImportLine>,
    /// Start of the first class/interface/trait/enum line.
    boundary: Option<usize>,
    namespace: Option<Range<usize>>,
    /// Last `declare(...)` before the boundary.
    declare: Option<Range<usize>>,
    /// Full line ranges, in order.
    lines: Vec<Range<usize>>,
}

/// Plan the insertion of `fqdn` into `doc`.
///
/// Returns `AlreadyImported` when any `use` line in the document already
/// names the FQDN. `Error::NoAnchor` when the document has no imports, no
/// namespace and no opening tag.
pub fn plan<D: Document + ?Sized>(doc: &D, fqdn: &Fqdn) -> Result<Insertion, Error> {
    let survey = survey(doc);
    let target = fqdn.import_path();

    if let Some(existing) = survey
        .imports
        .iter()
        .find(|i| i.imports(target))
    {
        tracing::debug!(line = existing.line, fqdn = %fqdn, "already imported");
        return Ok(Insertion::AlreadyImported {
            line: existing.line,
        });
    }

    let eol = format::line_ending(doc.text_in_range(0..doc.len()));
    let file_level: Vec<&ImportLine> = survey
        .imports
        .iter()
        .filter(|i| i.kind != ImportKind::TraitUse)
        .collect();

    let mut last_smaller: Option<&ImportLine> = None;
    let mut first_plain: Option<&ImportLine> = None;
    for import in file_level.iter().copied() {
        if import.kind != ImportKind::Plain {
            continue;
        }
        first_plain.get_or_insert(import);
        if target > import.path.as_str() {
            last_smaller = Some(import);
        } else {
            break;
        }
    }

    let directive = if let Some(anchor) = last_smaller {
        after_line(doc, anchor.range.clone(), AnchorKind::AfterImport, fqdn, eol, None)
    } else if let Some(next) = first_plain.or_else(|| file_level.first().copied()) {
        before_line(doc, next.range.clone(), fqdn, eol)
    } else if let Some(ns) = survey.namespace.clone() {
        after_line(doc, ns, AnchorKind::Namespace, fqdn, eol, Some(&survey))
    } else if let Some(declare) = survey.declare.clone() {
        after_line(doc, declare, AnchorKind::Declare, fqdn, eol, Some(&survey))
    } else if let Some(tag) = doc.find_all(&OPEN_TAG).first() {
        let line = doc.line_at(tag.start);
        after_line(doc, line, AnchorKind::OpenTag, fqdn, eol, None)
    } else {
        return Err(Error::NoAnchor { path: None });
    };

    tracing::debug!(
        anchor = ?directive.anchor,
        offset = directive.offset,
        line = directive.line,
        "planned import"
    );
    Ok(Insertion::Insert(directive))
}

fn survey<D: Document + ?Sized>(doc: &D) -> Survey {
    let mut survey = Survey::default();
    let mut scanner = LineScanner::new();
    let mut depth = 0usize;
    // Depth reached by `namespace X {` blocks; anything deeper is a type body.
    let mut namespace_depth = 0usize;

    for range in document::lines(doc) {
        survey.lines.push(range.clone());
        let line = doc.text_in_range(range.clone()).trim_end_matches(['\r', '\n']);
        let content = scanner.code(line);
        if content.trim().is_empty() {
            continue;
        }

        let keyword = scanner::trigger(content);
        match keyword {
            Some(Keyword::Namespace) => {
                if survey.namespace.is_none() {
                    survey.namespace = Some(range.clone());
                }
            }
            Some(_) => {
                survey.boundary.get_or_insert(range.start);
            }
            None => {
                if let Some(mut import) = parse_use(content, range.clone(), scanner.line()) {
                    if survey.boundary.is_some() || depth > namespace_depth {
                        import.kind = ImportKind::TraitUse;
                    }
                    survey.imports.push(import);
                } else if survey.boundary.is_none() && DECLARE.is_match(content) {
                    survey.declare = Some(range.clone());
                }
            }
        }

        let opens = content.matches('{').count();
        let closes = content.matches('}').count();
        if keyword == Some(Keyword::Namespace) && opens > 0 {
            namespace_depth = depth + 1;
        }
        depth = (depth + opens).saturating_sub(closes);
        namespace_depth = namespace_depth.min(depth);
    }
    survey
}

/// Parse one `use` statement line.
fn parse_use(content: &str, range: Range<usize>, line: usize) -> Option<ImportLine> {
    let caps = USE_STMT.captures(content)?;
    let body = caps.get(1)?.as_str();

    let mut members = Vec::new();
    let (kind, path) = if let Some(m) = FUNCTION_OR_CONST.find(body) {
        (ImportKind::FunctionOrConst, &body[m.end()..])
    } else if let Some(brace) = body.find('{') {
        // `use App\{Alpha, Beta as B};`
        let prefix = body[..brace].trim().trim_start_matches('\\').trim_end_matches('\\');
        let inner = body[brace + 1..].trim_end().trim_end_matches('}');
        members.extend(
            inner
                .split(',')
                .map(without_alias)
                .filter(|m| !m.is_empty())
                .map(|m| format!("{prefix}\\{m}")),
        );
        (ImportKind::Group, prefix)
    } else if body.contains(',') {
        // `use App\Alpha, App\Beta;`
        members.extend(
            body.split(',')
                .map(without_alias)
                .filter(|m| !m.is_empty())
                .map(String::from),
        );
        (ImportKind::Group, body)
    } else if let Some(m) = ALIAS.find(body) {
        (ImportKind::Aliased, &body[..m.start()])
    } else {
        (ImportKind::Plain, body)
    };

    Some(ImportLine {
        range,
        line,
        path: path.trim().trim_start_matches('\\').to_string(),
        kind,
        members,
    })
}

/// `App\Beta as B` → `App\Beta`, without a leading separator.
fn without_alias(item: &str) -> &str {
    let item = ALIAS.find(item).map_or(item, |m| &item[..m.start()]);
    item.trim().trim_start_matches('\\')
}

/// Insert on the line after `anchor`. When `survey` is given, blank-line
/// spacing follows the gap below the anchor.
fn after_line<D: Document + ?Sized>(
    doc: &D,
    anchor: Range<usize>,
    kind: AnchorKind,
    fqdn: &Fqdn,
    eol: &str,
    survey: Option<&Survey>,
) -> InsertionDirective {
    let anchor_text = doc.text_in_range(anchor.clone());
    let indentation = format::indentation_of(anchor_text).to_string();
    let terminated = anchor_text.ends_with('\n');

    let (offset, spacing) = match survey {
        Some(s) => {
            let blanks = blank_lines_after(doc, s, &anchor);
            let offset = if blanks == 1 {
                // Land below the single blank line so it stays above the import.
                s.lines
                    .iter()
                    .find(|r| r.start == anchor.end)
                    .map_or(anchor.end, |r| r.end)
            } else {
                anchor.end
            };
            (offset, format::spacing_for_gap(blanks, eol))
        }
        None => (anchor.end, eol.to_string()),
    };

    let statement = format::import_statement(fqdn, &indentation, &spacing);
    let text = if terminated {
        statement
    } else {
        format!("{eol}{statement}")
    };
    let line = line_number(doc, offset) + usize::from(!terminated);

    InsertionDirective {
        offset,
        line,
        anchor: kind,
        indentation,
        spacing,
        text,
    }
}

/// Insert in front of `next`, matching its indentation.
fn before_line<D: Document + ?Sized>(
    doc: &D,
    next: Range<usize>,
    fqdn: &Fqdn,
    eol: &str,
) -> InsertionDirective {
    let indentation = format::indentation_of(doc.text_in_range(next.clone())).to_string();
    let spacing = eol.to_string();
    InsertionDirective {
        offset: next.start,
        line: line_number(doc, next.start),
        anchor: AnchorKind::BeforeImport,
        text: format::import_statement(fqdn, &indentation, &spacing),
        indentation,
        spacing,
    }
}

/// Consecutive whitespace-only lines directly below `anchor`.
fn blank_lines_after<D: Document + ?Sized>(doc: &D, survey: &Survey, anchor: &Range<usize>) -> usize {
    survey
        .lines
        .iter()
        .skip_while(|r| r.start < anchor.end)
        .take_while(|r| doc.text_in_range((*r).clone()).trim().is_empty())
        .count()
}

/// 1-based line number of the line starting at `offset`.
fn line_number<D: Document + ?Sized>(doc: &D, offset: usize) -> usize {
    memchr::memchr_iter(b'\n', doc.text_in_range(0..offset).as_bytes()).count() + 1
}
