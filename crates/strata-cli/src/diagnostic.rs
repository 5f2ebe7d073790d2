// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Rendering core diagnostics with miette.
//!
//! Each diagnostic becomes a report with the file's source attached, so it
//! prints with the offending span underlined.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use miette::{Diagnostic, SourceSpan};
use strata_core::diagnostics::{Diagnostic as CoreDiagnostic, Severity};

/// A core diagnostic together with its source text.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(strata::analysis))]
pub struct SourceDiagnostic {
    pub message: String,
    #[source_code]
    pub src: miette::NamedSource<String>,
    #[label("{label}")]
    pub span: SourceSpan,
    pub label: String,
}

impl SourceDiagnostic {
    pub fn from_core_diagnostic(
        diagnostic: &CoreDiagnostic,
        source_path: &str,
        source: &str,
    ) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "error here",
            Severity::Warning => "warning here",
        };

        Self {
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: diagnostic.span.into(),
            label: label.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ast::FileId;
    use strata_core::builder::Builder;
    use strata_core::diagnostics::DiagnosticKind;

    fn first_diagnostic(source: &str) -> CoreDiagnostic {
        let mut builder = Builder::new();
        builder.add_source("a.php", source);
        builder.finish().diagnostics.remove(0)
    }

    #[test]
    fn parse_error_keeps_message_and_span() {
        let source = "<?php static::foo();";
        let core = first_diagnostic(source);
        assert_eq!(core.kind, DiagnosticKind::Scope);
        let diagnostic = SourceDiagnostic::from_core_diagnostic(&core, "a.php", source);

        assert_eq!(diagnostic.message, core.message.as_str());
        assert_eq!(diagnostic.span.offset(), core.span.start() as usize);
        assert_eq!(diagnostic.span.len(), core.span.len() as usize);
        assert_eq!(diagnostic.label, "error here");
    }

    #[test]
    fn warnings_are_labelled_as_warnings() {
        let source = "<?php class A {} class A {}";
        let core = first_diagnostic(source);
        assert_eq!(core.file, FileId(0));
        let diagnostic = SourceDiagnostic::from_core_diagnostic(&core, "a.php", source);
        assert_eq!(diagnostic.label, "warning here");
    }

    #[test]
    fn renders_with_file_name() {
        let source = "<?php static::foo();";
        let core = first_diagnostic(source);
        let report = miette::Report::new(SourceDiagnostic::from_core_diagnostic(
            &core, "src/a.php", source,
        ));
        let rendered = format!("{report:?}");
        assert!(rendered.contains("src/a.php"));
    }
}
