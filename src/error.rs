use std::path::{Path, PathBuf};

use crate::types::Keyword;

/// Every error phpns can produce. Displayed as user-facing messages.
///
/// File-scoped variants carry the path so a batch scan can report
/// `(path, message)` pairs once the walk is done.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File content is not valid UTF-8 text.
    #[error("{}: not valid UTF-8 text", .path.display())]
    Decode { path: PathBuf },

    /// A trigger keyword sits at statement start but the declaration after it
    /// does not parse.
    #[error("{}:{line}: malformed {keyword} declaration: {text}", .path.display())]
    MalformedDeclaration {
        path: PathBuf,
        line: usize,
        keyword: Keyword,
        text: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document has no imports, no namespace declaration and no `<?php` tag.
    #[error("cannot find the opening php tag nor a namespace declaration{}", describe(.path.as_deref()))]
    NoAnchor { path: Option<PathBuf> },

    #[error("{}: invalid index file: {source}", .path.display())]
    IndexFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid fully-qualified name \"{name}\": {reason}")]
    InvalidFqdn { name: String, reason: &'static str },
}

fn describe(path: Option<&Path>) -> String {
    match path {
        Some(p) => format!(" in {}: is this a php file?", p.display()),
        None => ": is this a php file?".to_string(),
    }
}

impl Error {
    /// Exit code used by the CLI.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::IndexFormat { .. } => 2,
            Self::Decode { .. }
            | Self::MalformedDeclaration { .. }
            | Self::NoAnchor { .. }
            | Self::InvalidFqdn { .. } => 3,
            Self::Config { .. } => 4,
        }
    }

    /// The file this error is about, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Decode { path }
            | Self::MalformedDeclaration { path, .. }
            | Self::Io { path, .. }
            | Self::IndexFormat { path, .. }
            | Self::Config { path, .. } => Some(path),
            Self::NoAnchor { path } => path.as_deref(),
            Self::InvalidFqdn { .. } => None,
        }
    }

    /// Attach a document path to an error raised on bare text.
    #[must_use]
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::NoAnchor { path: None } => Self::NoAnchor {
                path: Some(path.to_path_buf()),
            },
            other => other,
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_declaration_message_names_line_and_keyword() {
        let err = Error::MalformedDeclaration {
            path: PathBuf::from("src/Foo.php"),
            line: 7,
            keyword: Keyword::Class,
            text: "class {".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("src/Foo.php:7"), "{msg}");
        assert!(msg.contains("class declaration"), "{msg}");
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.path(), Some(Path::new("src/Foo.php")));
    }

    #[test]
    fn no_anchor_picks_up_document_path() {
        let err = Error::NoAnchor { path: None }.with_path(Path::new("notes.txt"));
        assert_eq!(err.path(), Some(Path::new("notes.txt")));
        assert!(err.to_string().contains("notes.txt"));
    }
}
