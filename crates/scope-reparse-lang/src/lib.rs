#![warn(missing_docs)]
//! `scope-reparse-lang` - data-driven lexical configuration for `scope-reparse`.
//!
//! This crate intentionally stays lightweight and does **not** contain a lexer. It provides
//! small structs describing the handful of lexical features the scope re-parser needs to
//! track across lines: comments, quoted literals, multi-line strings and scope braces.

/// Comment tokens/config for a given language.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentConfig {
    /// Line comment token (e.g. `//`, `#`).
    pub line: Option<String>,
    /// Block comment start token (e.g. `/*`).
    pub block_start: Option<String>,
    /// Block comment end token (e.g. `*/`).
    pub block_end: Option<String>,
}

impl CommentConfig {
    /// Create a config that supports only line comments.
    pub fn line(token: impl Into<String>) -> Self {
        Self {
            line: Some(token.into()),
            block_start: None,
            block_end: None,
        }
    }

    /// Create a config that supports only block comments.
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            line: None,
            block_start: Some(start.into()),
            block_end: Some(end.into()),
        }
    }

    /// Create a config that supports both line and block comments.
    pub fn line_and_block(
        line: impl Into<String>,
        block_start: impl Into<String>,
        block_end: impl Into<String>,
    ) -> Self {
        Self {
            line: Some(line.into()),
            block_start: Some(block_start.into()),
            block_end: Some(block_end.into()),
        }
    }

    /// Line comment token, if configured and non-empty.
    pub fn line_token(&self) -> Option<&str> {
        self.line.as_deref().filter(|s| !s.is_empty())
    }

    /// Block comment `(start, end)` tokens, if both are configured and non-empty.
    pub fn block_tokens(&self) -> Option<(&str, &str)> {
        let start = self.block_start.as_deref().filter(|s| !s.is_empty())?;
        let end = self.block_end.as_deref().filter(|s| !s.is_empty())?;
        Some((start, end))
    }

    /// Returns `true` if a line comment token is configured.
    pub fn has_line(&self) -> bool {
        self.line_token().is_some()
    }

    /// Returns `true` if both block comment tokens are configured.
    pub fn has_block(&self) -> bool {
        self.block_tokens().is_some()
    }
}

/// Lexical description of a language, as far as scope highlighting is concerned.
///
/// Only constructs that change how *following* characters are interpreted matter here:
/// anything that can hide a scope brace (comments, literals) and the braces themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Comment tokens.
    pub comments: CommentConfig,
    /// Single-line literal delimiters (e.g. `"` and `'`). A literal left open at the end of a
    /// line is closed implicitly.
    pub quotes: Vec<char>,
    /// Escape character inside literals (e.g. `\`).
    pub escape: Option<char>,
    /// Delimiter of a literal that may span lines (e.g. Java text blocks, `"""`).
    pub multiline_string: Option<String>,
    /// Character opening a nested scope.
    pub scope_open: char,
    /// Character closing a nested scope.
    pub scope_close: char,
}

impl LanguageConfig {
    /// Java: `//` and `/* */` comments, `"`/`'` literals, `"""` text blocks, `{}` scopes.
    pub fn java() -> Self {
        Self {
            comments: CommentConfig::line_and_block("//", "/*", "*/"),
            quotes: vec!['"', '\''],
            escape: Some('\\'),
            multiline_string: Some("\"\"\"".to_string()),
            scope_open: '{',
            scope_close: '}',
        }
    }

    /// C-family languages (C, C++, C#, JavaScript without template literals).
    pub fn c_family() -> Self {
        Self {
            multiline_string: None,
            ..Self::java()
        }
    }

    /// Multi-line string delimiter, if configured and non-empty.
    pub fn multiline_string_token(&self) -> Option<&str> {
        self.multiline_string.as_deref().filter(|s| !s.is_empty())
    }

    /// Length (in chars) of the longest multi-char token this config recognizes.
    ///
    /// A lexer that scans a bounded window of a line needs this many characters of
    /// lookahead (minus one) to never split a token at the window edge.
    pub fn max_token_len(&self) -> usize {
        let block = self.comments.block_tokens();
        [
            self.comments
                .line_token()
                .map_or(0, |token| token.chars().count()),
            block.map_or(0, |(start, _)| start.chars().count()),
            block.map_or(0, |(_, end)| end.chars().count()),
            self.multiline_string_token()
                .map_or(0, |token| token.chars().count()),
            // An escape consumes the escaped character too.
            if self.escape.is_some() { 2 } else { 1 },
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self::java()
    }
}
