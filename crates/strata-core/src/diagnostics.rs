// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics collected over a whole run.
//!
//! **DDD Context:** Source Analysis
//!
//! Parse errors, trait collisions and duplicate declarations all end up as a
//! [`Diagnostic`] tied to a file and span. Nothing is printed here; callers
//! render the list once the run is over.

use ecow::EcoString;
use serde::Serialize;

use crate::ast::FileId;
use crate::source_analysis::{ParseError, ParseErrorKind, Span};

/// What produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    Lex,
    UnexpectedToken,
    TokenStreamEnd,
    Scope,
    NestingTooDeep,
    MethodCollision,
    DuplicateSymbol,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Fails the run.
    Error,
    Warning,
}

/// A message about one location in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: EcoString,
    pub file: FileId,
    pub span: Span,
}

impl Diagnostic {
    #[must_use]
    pub fn error(
        kind: DiagnosticKind,
        message: impl Into<EcoString>,
        file: FileId,
        span: Span,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            file,
            span,
        }
    }

    #[must_use]
    pub fn warning(
        kind: DiagnosticKind,
        message: impl Into<EcoString>,
        file: FileId,
        span: Span,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            file,
            span,
        }
    }

    /// Every parse error fails its file, recoverable or not.
    #[must_use]
    pub fn from_parse_error(error: &ParseError, file: FileId) -> Self {
        let kind = match &error.kind {
            ParseErrorKind::Lex(_) => DiagnosticKind::Lex,
            ParseErrorKind::UnexpectedToken { .. } => DiagnosticKind::UnexpectedToken,
            ParseErrorKind::TokenStreamEnd { .. } => DiagnosticKind::TokenStreamEnd,
            ParseErrorKind::Scope { .. } => DiagnosticKind::Scope,
            ParseErrorKind::NestingTooDeep { .. } => DiagnosticKind::NestingTooDeep,
        };
        Self::error(kind, error.to_string(), file, error.span)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::{parse, Expected, LineColumn};

    #[test]
    fn parse_errors_become_error_diagnostics() {
        let errors = parse("<?php static::foo();", FileId(4)).unwrap_err();
        let diagnostic = Diagnostic::from_parse_error(&errors[0], FileId(4));
        assert_eq!(diagnostic.kind, DiagnosticKind::Scope);
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.file, FileId(4));
        assert_eq!(diagnostic.span.start_line(), 1);
        assert_eq!(diagnostic.span.start_column(), 7);
    }

    #[test]
    fn message_is_the_error_display() {
        let error = ParseError::new(
            ParseErrorKind::TokenStreamEnd {
                expected: Expected::new(["')'"]),
            },
            Span::empty(9, LineColumn::new(1, 10)),
        );
        let diagnostic = Diagnostic::from_parse_error(&error, FileId(0));
        assert_eq!(diagnostic.kind, DiagnosticKind::TokenStreamEnd);
        assert_eq!(
            diagnostic.message,
            "Unexpected end of token stream, expected ')'"
        );
    }

    #[test]
    fn warnings_do_not_fail() {
        let diagnostic = Diagnostic::warning(
            DiagnosticKind::DuplicateSymbol,
            "duplicate",
            FileId(0),
            Span::default(),
        );
        assert!(!diagnostic.is_error());
    }
}
