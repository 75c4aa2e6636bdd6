//! Cursor over a token list, with fixed-offset lookahead and rewind marks.

use crate::lexer::{Token, TokenKind};
use crate::span::Span;

/// A saved cursor position. Restore it with [`TokenCursor::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Cursor over an owned token list.
#[derive(Debug)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Token `offset` positions ahead of the current one.
    pub fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    pub fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.peek(offset).map(|t| t.kind)
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind(0) == Some(kind)
    }

    /// Consume the current token if it has the given kind.
    pub fn match_and_remove(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            None
        }
    }

    /// Whether the next two tokens have the given kinds.
    pub fn next_two_match(&self, first: TokenKind, second: TokenKind) -> bool {
        self.peek_kind(0) == Some(first) && self.peek_kind(1) == Some(second)
    }

    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// All tokens consumed.
    pub fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Span of the current token, or the end of the last token once exhausted.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(token) => token.span,
            None => self
                .tokens
                .last()
                .map(|t| Span::point(t.span.end))
                .unwrap_or_default(),
        }
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => self.current_span(),
        }
    }

    /// Description of the current token for error messages.
    pub fn describe_current(&self) -> String {
        match self.peek(0) {
            Some(token) if token.text.is_empty() => token.kind.name().to_string(),
            Some(token) => format!("{} '{}'", token.kind.name(), token.text),
            None => "end of input".to_string(),
        }
    }
}
