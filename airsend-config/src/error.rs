//! Error types for configuration loading.

use thiserror::Error;

/// Errors raised by the document parser in strict mode.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A line could not be parsed as a key-value entry or list element.
    #[error("malformed entry on line {line}")]
    MalformedEntry { line: usize },

    /// Indentation that is not a multiple of two spaces, or uses tabs.
    #[error("bad indentation on line {line}")]
    BadIndent { line: usize },

    /// A line indented deeper than any entry that could own it.
    #[error("unexpected indentation on line {line}")]
    UnexpectedIndent { line: usize },
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}
