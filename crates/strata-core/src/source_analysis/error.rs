// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for lexing and parsing.
//!
//! Every error carries a [`Span`] and integrates with [`miette`] so the CLI
//! can render it against the offending source file.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::fmt;

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

use super::Span;

/// A lexical error encountered during tokenization.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(strata::lex))]
pub struct LexError {
    #[source]
    pub kind: LexErrorKind,
    #[label("here")]
    pub span: Span,
}

impl LexError {
    #[must_use]
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated block comment")]
    UnterminatedComment,

    #[error("unterminated heredoc, missing closing identifier '{0}'")]
    UnterminatedHeredoc(EcoString),

    #[error("invalid UTF-8 byte sequence")]
    InvalidUtf8,
}

/// The expected set carried by grammar errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected(Vec<EcoString>);

impl Expected {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = impl Into<EcoString>>) -> Self {
        Self(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn items(&self) -> &[EcoString] {
        &self.0
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("nothing"),
            [only] => f.write_str(only),
            items => write!(f, "one of {}", items.join(", ")),
        }
    }
}

/// Why a late-bound keyword was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeViolation {
    /// `self`, `parent` or `static` outside any type body.
    OutsideType,
    /// `parent` inside a class that declares no parent.
    NoParent { class: EcoString },
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Lex(LexErrorKind),

    #[error("Unexpected token: {found}, expected {expected}")]
    UnexpectedToken { expected: Expected, found: EcoString },

    #[error("Unexpected end of token stream, expected {expected}")]
    TokenStreamEnd { expected: Expected },

    #[error("{}", scope_message(.keyword, .reason))]
    Scope {
        keyword: EcoString,
        reason: ScopeViolation,
    },

    #[error("Nesting depth exceeds the maximum of {max}")]
    NestingTooDeep { max: usize },
}

fn scope_message(keyword: &str, reason: &ScopeViolation) -> String {
    match reason {
        ScopeViolation::OutsideType => {
            format!("The keyword \"{keyword}\" was used outside of a class/method scope.")
        }
        ScopeViolation::NoParent { class } => format!(
            "The keyword \"{keyword}\" was used but the class \"{class}\" does not declare a parent."
        ),
    }
}

impl ParseErrorKind {
    /// Only grammar violations allow the parser to resynchronize at the next
    /// statement. Everything else aborts the file.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnexpectedToken { .. })
    }
}

/// A parse error with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(strata::parse))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    #[label("here")]
    pub span: Span,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        Self::new(ParseErrorKind::Lex(error.kind), error.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::LineColumn;

    fn at(offset: u32) -> Span {
        Span::empty(offset, LineColumn::new(1, offset + 1))
    }

    #[test]
    fn lex_error_display() {
        let err = LexError::new(LexErrorKind::UnexpectedCharacter('`'), at(0));
        assert_eq!(err.to_string(), "unexpected character '`'");
    }

    #[test]
    fn scope_error_message_names_keyword() {
        let err = ParseError::new(
            ParseErrorKind::Scope {
                keyword: "static".into(),
                reason: ScopeViolation::OutsideType,
            },
            at(3),
        );
        assert_eq!(
            err.to_string(),
            "The keyword \"static\" was used outside of a class/method scope."
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unexpected_token_lists_expected_set() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: Expected::new(["'case'", "'default'", "'}'"]),
                found: "$a".into(),
            },
            at(0),
        );
        assert_eq!(
            err.to_string(),
            "Unexpected token: $a, expected one of 'case', 'default', '}'"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn lex_error_converts_to_fatal_parse_error() {
        let err: ParseError = LexError::new(LexErrorKind::UnterminatedString, at(4)).into();
        assert_eq!(err.kind, ParseErrorKind::Lex(LexErrorKind::UnterminatedString));
        assert!(!err.is_recoverable());
    }
}
