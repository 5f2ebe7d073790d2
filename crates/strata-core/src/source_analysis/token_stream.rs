// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Buffered token stream with lookahead and backtracking.

use super::{lex_with_eof, Token, TokenKind};

/// A saved stream position, restored with [`TokenStream::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// The tokens of one file. The last token is always [`TokenKind::Eof`].
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenStream {
    /// Wraps lexed tokens, appending an EOF token if the input lacks one.
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind().is_eof()) {
            let span = tokens.last().map(Token::span).unwrap_or_default();
            let end = super::Span::empty(
                span.end(),
                super::LineColumn::new(span.end_line().max(1), span.end_column() + 1),
            );
            tokens.push(Token::new(TokenKind::Eof, "", end));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self::new(lex_with_eof(source))
    }

    /// Consumes and returns the next token, or `None` at end of input.
    pub fn next(&mut self) -> Option<&Token> {
        let index = self.position;
        if self.tokens[index].kind().is_eof() {
            return None;
        }
        self.position += 1;
        Some(&self.tokens[index])
    }

    /// Looks `k` tokens ahead without consuming. Lookahead past the end
    /// yields the EOF token.
    #[must_use]
    pub fn peek(&self, k: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + k).min(last)]
    }

    /// The most recently consumed token.
    #[must_use]
    pub fn previous(&self) -> Option<&Token> {
        self.position.checked_sub(1).map(|index| &self.tokens[index])
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.peek(0).kind().is_eof()
    }

    #[must_use]
    pub fn mark(&self) -> Checkpoint {
        Checkpoint(self.position)
    }

    pub fn reset(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.0.min(self.tokens.len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_and_peek() {
        let mut stream = TokenStream::from_source("<?php $a = 1;");
        assert_eq!(stream.peek(0).text(), "$a");
        assert_eq!(stream.peek(2).text(), "1");
        assert_eq!(stream.next().map(|t| t.text().clone()), Some("$a".into()));
        assert_eq!(stream.previous().map(|t| t.text().clone()), Some("$a".into()));
        assert_eq!(stream.peek(0).text(), "=");
    }

    #[test]
    fn next_returns_none_at_end() {
        let mut stream = TokenStream::from_source("<?php ;");
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert!(stream.is_at_end());
    }

    #[test]
    fn peek_past_end_yields_eof() {
        let stream = TokenStream::from_source("<?php $a");
        assert!(stream.peek(10).kind().is_eof());
    }

    #[test]
    fn mark_and_reset_backtrack() {
        let mut stream = TokenStream::from_source("<?php a b c");
        let checkpoint = stream.mark();
        stream.next();
        stream.next();
        assert_eq!(stream.peek(0).text(), "c");
        stream.reset(checkpoint);
        assert_eq!(stream.peek(0).text(), "a");
    }

    #[test]
    fn new_appends_missing_eof() {
        let tokens = crate::source_analysis::lex("<?php $a");
        let stream = TokenStream::new(tokens);
        assert!(stream.peek(1).kind().is_eof());
    }
}
