//! Line lexer.
//!
//! Lexing is line-local: a line is scanned from the [`LexState`] the previous line ended in, and
//! long lines can be scanned in column windows. Only the constructs that change how later
//! characters are read are recognized: comments, literals and scope braces.

use crate::error::LexError;
use scope_reparse_lang::LanguageConfig;
use std::ops::Range;

/// Lexical mode carried across characters (and, for some modes, across lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LexMode {
    /// Plain code.
    #[default]
    Code,
    /// Inside a line comment (ends with the line).
    LineComment,
    /// Inside a single-line literal opened by the given quote character.
    Quoted(char),
    /// Inside a block comment.
    BlockComment,
    /// Inside a multi-line string.
    TextBlock,
}

/// State of the lexer between two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LexState {
    /// Current mode.
    pub mode: LexMode,
    /// Scope brace nesting depth.
    pub depth: u16,
}

impl LexState {
    /// Build a state.
    pub fn new(mode: LexMode, depth: u16) -> Self {
        Self { mode, depth }
    }
}

/// What a run of characters is, as far as scope painting is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeKind {
    /// Code (including scope braces).
    Code,
    /// Comment text and delimiters.
    Comment,
    /// Literal text and delimiters.
    Literal,
}

impl ScopeKind {
    /// Stable numeric code of the kind.
    pub fn code(self) -> u32 {
        match self {
            ScopeKind::Code => 0,
            ScopeKind::Comment => 1,
            ScopeKind::Literal => 2,
        }
    }
}

/// A run of columns of one line sharing depth and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeSegment {
    /// Columns within the line content.
    pub columns: Range<usize>,
    /// Scope nesting depth.
    pub depth: u16,
    /// Kind of text.
    pub kind: ScopeKind,
}

/// Append `len` columns starting at `column`, extending the last segment when it matches.
pub fn push_segment(
    out: &mut Vec<ScopeSegment>,
    column: usize,
    len: usize,
    depth: u16,
    kind: ScopeKind,
) {
    if len == 0 {
        return;
    }
    if let Some(last) = out.last_mut()
        && last.columns.end == column
        && last.depth == depth
        && last.kind == kind
    {
        last.columns.end = column + len;
        return;
    }
    out.push(ScopeSegment {
        columns: column..column + len,
        depth,
        kind,
    });
}

/// A lexer that can scan a line, or a window of it, from a carried-over state.
///
/// Implementations must be deterministic: the result may only depend on the arguments.
pub trait LineLexer {
    /// Characters needed after a window so that no token is split at the window edge.
    fn lookahead(&self) -> usize;

    /// Scan `chars[..limit]` starting in `state`.
    ///
    /// `chars` may extend past `limit` by up to [`lookahead`](LineLexer::lookahead) characters;
    /// a token starting before `limit` may use them. When `chars` ends before the lookahead is
    /// exhausted, the line ends there. `base_col` is the column of `chars[0]`.
    ///
    /// Returns the state after the scan and the number of characters consumed (at least
    /// `limit`, more when the last token runs into the lookahead).
    fn scan(
        &self,
        state: LexState,
        chars: &[char],
        limit: usize,
        base_col: usize,
        out: &mut Vec<ScopeSegment>,
    ) -> Result<(LexState, usize), LexError>;

    /// State the next line starts in, given the state at the end of this line.
    fn finish_line(&self, state: LexState) -> LexState;
}

/// [`LineLexer`] driven by a [`LanguageConfig`].
#[derive(Debug, Clone)]
pub struct ConfigLexer {
    line_comment: Option<Vec<char>>,
    block_comment: Option<(Vec<char>, Vec<char>)>,
    text_block: Option<Vec<char>>,
    quotes: Vec<char>,
    escape: Option<char>,
    scope_open: char,
    scope_close: char,
    lookahead: usize,
}

impl ConfigLexer {
    /// Build a lexer for `config`.
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            line_comment: config.comments.line_token().map(|t| t.chars().collect()),
            block_comment: config
                .comments
                .block_tokens()
                .map(|(start, end)| (start.chars().collect(), end.chars().collect())),
            text_block: config.multiline_string_token().map(|t| t.chars().collect()),
            quotes: config.quotes.clone(),
            escape: config.escape,
            scope_open: config.scope_open,
            scope_close: config.scope_close,
            lookahead: config.max_token_len().saturating_sub(1),
        }
    }

    fn escape_len(&self, chars: &[char], at: usize) -> Option<usize> {
        let escape = self.escape?;
        (chars[at] == escape).then(|| 2.min(chars.len() - at))
    }

    /// Scan one token at `at`: returns its length plus the depth and kind it is painted with.
    fn token(
        &self,
        state: &mut LexState,
        chars: &[char],
        at: usize,
        column: usize,
        limit: usize,
    ) -> Result<(usize, u16, ScopeKind), LexError> {
        let rest = &chars[at..];
        let depth = state.depth;

        let token = match state.mode {
            LexMode::Code => {
                if let Some(line) = self.line_comment.as_deref().filter(|t| rest.starts_with(t)) {
                    state.mode = LexMode::LineComment;
                    (line.len(), depth, ScopeKind::Comment)
                } else if let Some((start, _)) = self
                    .block_comment
                    .as_ref()
                    .filter(|(start, _)| rest.starts_with(start))
                {
                    state.mode = LexMode::BlockComment;
                    (start.len(), depth, ScopeKind::Comment)
                } else if let Some(delim) = self.text_block.as_deref().filter(|t| rest.starts_with(t))
                {
                    state.mode = LexMode::TextBlock;
                    (delim.len(), depth, ScopeKind::Literal)
                } else if self.quotes.contains(&rest[0]) {
                    state.mode = LexMode::Quoted(rest[0]);
                    (1, depth, ScopeKind::Literal)
                } else if rest[0] == self.scope_open {
                    state.depth = depth.checked_add(1).ok_or(LexError::DepthOverflow {
                        column,
                        max: u16::MAX,
                    })?;
                    (1, depth, ScopeKind::Code)
                } else if rest[0] == self.scope_close {
                    state.depth = depth.saturating_sub(1);
                    (1, state.depth, ScopeKind::Code)
                } else {
                    (1, depth, ScopeKind::Code)
                }
            }
            LexMode::LineComment => (limit - at, depth, ScopeKind::Comment),
            LexMode::Quoted(quote) => {
                if let Some(len) = self.escape_len(chars, at) {
                    (len, depth, ScopeKind::Literal)
                } else {
                    if rest[0] == quote {
                        state.mode = LexMode::Code;
                    }
                    (1, depth, ScopeKind::Literal)
                }
            }
            LexMode::BlockComment => match &self.block_comment {
                Some((_, end)) if rest.starts_with(end) => {
                    state.mode = LexMode::Code;
                    (end.len(), depth, ScopeKind::Comment)
                }
                _ => (1, depth, ScopeKind::Comment),
            },
            LexMode::TextBlock => {
                if let Some(len) = self.escape_len(chars, at) {
                    (len, depth, ScopeKind::Literal)
                } else {
                    match self.text_block.as_deref() {
                        Some(delim) if rest.starts_with(delim) => {
                            state.mode = LexMode::Code;
                            (delim.len(), depth, ScopeKind::Literal)
                        }
                        _ => (1, depth, ScopeKind::Literal),
                    }
                }
            }
        };
        Ok(token)
    }
}

impl Default for ConfigLexer {
    fn default() -> Self {
        Self::new(&LanguageConfig::default())
    }
}

impl LineLexer for ConfigLexer {
    fn lookahead(&self) -> usize {
        self.lookahead
    }

    fn scan(
        &self,
        mut state: LexState,
        chars: &[char],
        limit: usize,
        base_col: usize,
        out: &mut Vec<ScopeSegment>,
    ) -> Result<(LexState, usize), LexError> {
        let limit = limit.min(chars.len());
        let mut at = 0;
        while at < limit {
            let column = base_col + at;
            let (len, depth, kind) = self.token(&mut state, chars, at, column, limit)?;
            push_segment(out, column, len, depth, kind);
            at += len;
        }
        Ok((state, at))
    }

    fn finish_line(&self, state: LexState) -> LexState {
        match state.mode {
            LexMode::LineComment | LexMode::Quoted(_) => LexState::new(LexMode::Code, state.depth),
            LexMode::Code | LexMode::BlockComment | LexMode::TextBlock => state,
        }
    }
}
