use thiserror::Error;

#[derive(Debug, Error)]
/// Errors surfaced to the host by document operations.
pub enum ReparseError {
    #[error("edit range {start}..{end} is outside the buffer (length {len})")]
    /// The host sent an edit range that does not fit the current buffer.
    ///
    /// This means the host and the document are out of sync; the document is left untouched.
    EditOutOfBounds {
        /// Requested start char offset.
        start: usize,
        /// Requested end char offset (exclusive).
        end: usize,
        /// Buffer length in chars.
        len: usize,
    },

    #[error("document is closed")]
    /// The operation targeted a document after `on_close`.
    DocumentClosed,

    #[error("invalid configuration: {0}")]
    /// A serialized [`ReparseConfig`](crate::ReparseConfig) could not be decoded.
    Config(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Failure while lexing a single work unit.
///
/// Lexer failures are recovered locally: the unit is dropped and the line stays stale.
pub enum LexError {
    #[error("scope nesting exceeds {max} levels at column {column}")]
    /// Scope braces nested deeper than the depth counter can represent.
    DepthOverflow {
        /// Column of the offending brace.
        column: usize,
        /// Maximum supported depth.
        max: u16,
    },

    #[error("malformed input at column {column}: {message}")]
    /// Input a custom lexer could not handle.
    Malformed {
        /// Column where lexing stopped.
        column: usize,
        /// Lexer specific detail.
        message: String,
    },
}
