//! The slice of a text document the planner needs.
//!
//! Hosts (an editor buffer, a file on disk) implement `Document`; the
//! planner reads through it and never mutates. `insert_text` exists so a
//! caller can apply the directive through the same handle.

use std::ops::Range;

use regex::Regex;

pub trait Document {
    /// Full text of the line containing `offset`, terminator included.
    /// An offset at or past the end yields the (possibly empty) last line.
    fn line_at(&self, offset: usize) -> Range<usize>;

    /// Ranges of every non-overlapping match of `pattern`.
    fn find_all(&self, pattern: &Regex) -> Vec<Range<usize>>;

    fn text_in_range(&self, range: Range<usize>) -> &str;

    fn insert_text(&mut self, offset: usize, text: &str);

    /// Total length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterate the full-line ranges of a document, top to bottom.
pub fn lines<D: Document + ?Sized>(doc: &D) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut offset = 0;
    std::iter::from_fn(move || {
        if offset >= doc.len() {
            return None;
        }
        let range = doc.line_at(offset);
        offset = range.end;
        Some(range)
    })
}

/// In-memory document over an owned `String`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
}

impl TextDocument {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl Document for TextDocument {
    fn line_at(&self, offset: usize) -> Range<usize> {
        let offset = offset.min(self.text.len());
        let start = memchr::memrchr(b'\n', &self.text.as_bytes()[..offset]).map_or(0, |i| i + 1);
        let end = memchr::memchr(b'\n', &self.text.as_bytes()[offset..])
            .map_or(self.text.len(), |i| offset + i + 1);
        start..end
    }

    fn find_all(&self, pattern: &Regex) -> Vec<Range<usize>> {
        pattern.find_iter(&self.text).map(|m| m.range()).collect()
    }

    fn text_in_range(&self, range: Range<usize>) -> &str {
        &self.text[range]
    }

    fn insert_text(&mut self, offset: usize, text: &str) {
        self.text.insert_str(offset, text);
    }

    fn len(&self) -> usize {
        self.text.len()
    }
}
