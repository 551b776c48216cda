//! Error types for the SDF reader and writer.
//!
//! This module provides a unified error type [`SdfError`] that covers
//! all error conditions that can occur during lexing, parsing, document
//! building, and the file-level collaborators built on top of them.

use thiserror::Error;

/// Result type alias using [`SdfError`].
pub type Result<T> = std::result::Result<T, SdfError>;

/// Unified error type for all SDF operations.
#[derive(Error, Debug)]
pub enum SdfError {
    // ============ Parsing Errors ============
    /// Unrecognized character or malformed token
    #[error("Lexer error at line {line}, column {column} (offset {offset}): {message}")]
    LexError {
        line: usize,
        column: usize,
        offset: usize,
        message: String,
    },

    /// Grammar violation
    #[error("Syntax error at line {line}, column {column} near '{token}': {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        token: String,
        message: String,
    },

    /// Document-level invariant violation
    #[error("Semantic error: {message}")]
    SemanticError { message: String },

    // ============ I/O Errors ============
    /// Error reading an input file
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing an output file
    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Output file already exists and overwriting was not requested
    #[error("Output file '{path}' already exists (use --force to overwrite)")]
    OutputExists { path: String },

    /// Output location is not a directory
    #[error("Not a directory: '{path}'")]
    NotADirectory { path: String },

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SdfError {
    /// Create a lexer error
    pub fn lex(line: usize, column: usize, offset: usize, message: impl Into<String>) -> Self {
        Self::LexError {
            line,
            column,
            offset,
            message: message.into(),
        }
    }

    /// Create a syntax error
    pub fn syntax(
        line: usize,
        column: usize,
        token: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SyntaxError {
            line,
            column,
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create a semantic error
    pub fn semantic(message: impl Into<String>) -> Self {
        Self::SemanticError {
            message: message.into(),
        }
    }

    /// Source line of the error, if it carries a position.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::LexError { line, .. } | Self::SyntaxError { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SdfError::lex(3, 7, 42, "unexpected character '@'");
        assert_eq!(
            err.to_string(),
            "Lexer error at line 3, column 7 (offset 42): unexpected character '@'"
        );
        assert_eq!(err.line(), Some(3));

        let err = SdfError::syntax(1, 2, ")", "expected keyword");
        assert_eq!(
            err.to_string(),
            "Syntax error at line 1, column 2 near ')': expected keyword"
        );

        let err = SdfError::semantic("duplicate header item DESIGN");
        assert_eq!(err.line(), None);
    }
}
