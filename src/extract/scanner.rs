//! Single-pass line scanner. No grammar: comment state is a flag, comments
//! are cut out of each line, and declarations are matched only at statement
//! start of what remains.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Keyword;

/// Keyword-named variables (`$class`, `$namespace`). Lines mentioning them are skipped.
static KEYWORD_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:namespace|class|interface|trait|enum)\b").expect("static regex")
});

/// Trigger: a keyword as the first token, optionally after class modifiers.
static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:abstract|final|readonly)\s+)*(namespace|class|interface|trait|enum)\b",
    )
    .expect("static regex")
});

static NAMESPACE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*namespace(?:\s+\\?([\p{L}_][\p{L}\p{N}_]*(?:\\[\p{L}_][\p{L}\p{N}_]*)*))?\s*[;{]",
    )
    .expect("static regex")
});

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:abstract|final|readonly)\s+)*(?:class|interface|trait|enum)\s+([\p{L}_][\p{L}\p{N}_]*)",
    )
    .expect("static regex")
});

/// A declaration found on a code line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration<'a> {
    /// Namespace path without leading separator; empty for `namespace {`.
    Namespace(&'a str),
    Type { keyword: Keyword, name: &'a str },
}

/// Keyword at statement start, but the declaration after it does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationError {
    /// 1-based.
    pub line: usize,
    pub keyword: Keyword,
    pub text: String,
}

/// Stateful scanner. Feed it every line of one file, in order.
#[derive(Debug, Default)]
pub struct LineScanner {
    in_block_comment: bool,
    line: usize,
}

impl LineScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based number of the line most recently fed.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Advance over one line and return its code part: the text outside
    /// `//`, `#` and `/* */` comments. Empty for comment-only lines.
    pub fn code<'a>(&mut self, line: &'a str) -> &'a str {
        self.line += 1;

        if self.in_block_comment {
            let Some(close) = line.find("*/") else {
                return "";
            };
            self.in_block_comment = false;
            return strip_line_comment(&line[close + 2..]);
        }
        if line.trim_start().starts_with('#') {
            return "";
        }

        let open = line.find("/*");
        match (open, line.find("//")) {
            (_, Some(s)) if open.is_none_or(|o| s < o) => &line[..s],
            (Some(o), _) => match line[o + 2..].find("*/") {
                // `/* note */ class Foo`: the code follows the comment.
                Some(c) if line[..o].trim().is_empty() => {
                    strip_line_comment(&line[o + 2 + c + 2..])
                }
                Some(_) => &line[..o],
                None => {
                    self.in_block_comment = true;
                    &line[..o]
                }
            },
            _ => line,
        }
    }

    /// Strip comments from a line and, if code remains, extract a declaration.
    pub fn scan<'a>(&mut self, line: &'a str) -> Result<Option<Declaration<'a>>, DeclarationError> {
        let code = self.code(line);
        if code.trim().is_empty() {
            return Ok(None);
        }
        declaration(code).map_err(|keyword| DeclarationError {
            line: self.line,
            keyword,
            text: line.trim().to_string(),
        })
    }
}

fn strip_line_comment(text: &str) -> &str {
    text.find("//").map_or(text, |i| &text[..i])
}

/// Extract a declaration from one code line, ignoring comment state.
/// `Err(keyword)` when the keyword is present but the pattern fails.
pub(crate) fn declaration(line: &str) -> Result<Option<Declaration<'_>>, Keyword> {
    if KEYWORD_VARIABLE.is_match(line) {
        return Ok(None);
    }
    let Some(keyword) = trigger(line) else {
        return Ok(None);
    };

    if keyword == Keyword::Namespace {
        let caps = NAMESPACE_DECL.captures(line).ok_or(keyword)?;
        let path = caps.get(1).map_or("", |m| m.as_str());
        return Ok(Some(Declaration::Namespace(path)));
    }

    let caps = TYPE_DECL.captures(line).ok_or(keyword)?;
    let name = caps.get(1).ok_or(keyword)?.as_str();
    Ok(Some(Declaration::Type { keyword, name }))
}

/// Which keyword (if any) opens this line as a statement.
pub(crate) fn trigger(line: &str) -> Option<Keyword> {
    let caps = TRIGGER.captures(line)?;
    let word = caps.get(1)?.as_str();
    Keyword::ALL.into_iter().find(|k| k.as_str() == word)
}
