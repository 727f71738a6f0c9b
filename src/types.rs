use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Namespace separator. Also the leading character of every `Fqdn`.
pub const SEPARATOR: char = '\\';

/// Keywords that trigger a declaration match on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Namespace,
    Class,
    Interface,
    Trait,
    Enum,
}

impl Keyword {
    pub const ALL: [Keyword; 5] = [
        Self::Namespace,
        Self::Class,
        Self::Interface,
        Self::Trait,
        Self::Enum,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified symbol name: `\Vendor\Package\Symbol`.
///
/// Always starts with the separator. The root namespace gives `\Symbol`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fqdn(String);

impl Fqdn {
    /// Build from a namespace (`""`, `"App"` or `"\App"`) and a bare symbol.
    #[must_use]
    pub fn new(namespace: &str, symbol: &str) -> Self {
        let namespace = namespace.trim_matches(SEPARATOR);
        if namespace.is_empty() {
            Self(format!("{SEPARATOR}{symbol}"))
        } else {
            Self(format!("{SEPARATOR}{namespace}{SEPARATOR}{symbol}"))
        }
    }

    /// Validate a qualified name typed by a user or stored in an index file.
    /// A missing leading separator is added.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidFqdn {
            name: name.to_string(),
            reason,
        };
        let body = name.trim().strip_prefix(SEPARATOR).unwrap_or(name.trim());
        if body.is_empty() {
            return Err(invalid("empty name"));
        }
        for segment in body.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(invalid("empty namespace segment"));
            }
            if !is_identifier(segment) {
                return Err(invalid("segment is not a php identifier"));
            }
        }
        Ok(Self(format!("{SEPARATOR}{body}")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form written after `use`: no leading separator.
    #[must_use]
    pub fn import_path(&self) -> &str {
        &self.0[SEPARATOR.len_utf8()..]
    }

    /// Non-empty path segments, namespace first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }
}

impl TryFrom<String> for Fqdn {
    type Error = Error;

    fn try_from(name: String) -> Result<Self, Error> {
        Self::parse(&name)
    }
}

impl From<Fqdn> for String {
    fn from(fqdn: Fqdn) -> String {
        fqdn.0
    }
}

impl fmt::Display for Fqdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PHP identifier: letter or underscore first, then also digits.
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// What kind of `use` line the planner found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `use A\B;`, the only kind that can anchor an insertion.
    Plain,
    /// `use A\B as C;`
    Aliased,
    /// `use function A\f;` / `use const A\C;`
    FunctionOrConst,
    /// `use A\{B, C};`
    Group,
    /// `use SomeTrait;` inside a class body.
    TraitUse,
}

/// An existing `use` line in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    /// Full line range, terminator included.
    pub range: Range<usize>,
    /// 1-based line number.
    pub line: usize,
    /// Referenced path without leading separator (`App\Alpha`). For a group
    /// import, the shared prefix.
    pub path: String,
    pub kind: ImportKind,
    /// Full paths a group import brings in; empty for the other kinds.
    pub members: Vec<String>,
}

impl ImportLine {
    /// Whether this line already imports `path` (no leading separator).
    ///
    /// Function and const imports never do: they name functions, not classes.
    #[must_use]
    pub fn imports(&self, path: &str) -> bool {
        match self.kind {
            ImportKind::Plain | ImportKind::Aliased | ImportKind::TraitUse => self.path == path,
            ImportKind::Group => self.members.iter().any(|m| m == path),
            ImportKind::FunctionOrConst => false,
        }
    }
}

/// Which line the new import goes after (or before).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    /// After the last import that sorts before the target.
    AfterImport,
    /// Before the first import: the target sorts ahead of all of them.
    BeforeImport,
    Namespace,
    Declare,
    OpenTag,
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AfterImport => write!(f, "preceding import"),
            Self::BeforeImport => write!(f, "following import"),
            Self::Namespace => write!(f, "namespace declaration"),
            Self::Declare => write!(f, "declare statement"),
            Self::OpenTag => write!(f, "opening tag"),
        }
    }
}

/// Where and what to insert. The caller performs the mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionDirective {
    /// Byte offset into the document.
    pub offset: usize,
    /// 1-based line the inserted import will occupy.
    pub line: usize,
    pub anchor: AnchorKind,
    pub indentation: String,
    /// Line terminator(s) following the statement.
    pub spacing: String,
    /// Exact text to insert at `offset`.
    pub text: String,
}

/// Outcome of planning an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Insert(InsertionDirective),
    /// The document already imports this FQDN.
    AlreadyImported { line: usize },
}
