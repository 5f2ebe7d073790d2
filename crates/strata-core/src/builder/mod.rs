// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Turns parsed files into a [`CodeModel`].
//!
//! **DDD Context:** Code Model
//!
//! Files are parsed and registered one at a time. Declarations go into the
//! run's symbol table as they are seen, so references between files resolve
//! no matter which file comes first. Trait composition needs every trait of
//! the run, so it happens once in [`Builder::finish`].
//!
//! ```
//! use strata_core::builder::Builder;
//!
//! let mut builder = Builder::new();
//! assert!(builder.add_source("a.php", "<?php class A {}"));
//! assert!(!builder.add_source("b.php", "<?php class {"));
//! let output = builder.finish();
//! assert!(!output.is_success());
//! assert_eq!(output.model.types().len(), 1);
//! ```

mod declarations;
mod traits;

use ecow::EcoString;
use tracing::{debug, instrument};

use crate::ast::FileId;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{CodeModel, SourceFile};
use crate::source_analysis::{decode_source, parse, Span};

pub use traits::MethodCollisionError;

/// Everything a run produced: the model plus all diagnostics.
#[derive(Debug)]
pub struct BuildOutput {
    pub model: CodeModel,
    pub diagnostics: Vec<Diagnostic>,
    file_names: Vec<EcoString>,
}

impl BuildOutput {
    /// No error diagnostics were produced. Warnings do not count.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The name a file was added under, including files that failed.
    #[must_use]
    pub fn file_name(&self, file: FileId) -> Option<&EcoString> {
        self.file_names.get(file.0 as usize)
    }
}

/// Collects files for one run.
#[derive(Debug, Default)]
pub struct Builder {
    model: CodeModel,
    diagnostics: Vec<Diagnostic>,
    file_names: Vec<EcoString>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_file(&mut self, name: &str) -> FileId {
        let id = FileId(next_index(self.file_names.len()));
        self.file_names.push(name.into());
        id
    }

    /// Parses and registers one file. Returns `false` if it failed to parse;
    /// its diagnostics are kept for [`BuildOutput`].
    #[instrument(skip_all, fields(file = %name))]
    pub fn add_source(&mut self, name: &str, source: &str) -> bool {
        let file = self.next_file(name);
        match parse(source, file) {
            Ok(tree) => {
                declarations::register_file(&mut self.model, &mut self.diagnostics, &tree);
                debug!(nodes = tree.len(), "registered file");
                self.model.files.push(SourceFile {
                    id: file,
                    name: name.into(),
                    tree,
                });
                true
            }
            Err(errors) => {
                debug!(errors = errors.len(), "file failed to parse");
                self.diagnostics.extend(
                    errors
                        .iter()
                        .map(|error| Diagnostic::from_parse_error(error, file)),
                );
                false
            }
        }
    }

    /// Like [`Builder::add_source`], rejecting input that is not UTF-8.
    pub fn add_bytes(&mut self, name: &str, bytes: &[u8]) -> bool {
        match decode_source(bytes) {
            Ok(source) => self.add_source(name, source),
            Err(error) => {
                let file = self.next_file(name);
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::Lex,
                    error.to_string(),
                    file,
                    error.span,
                ));
                false
            }
        }
    }

    /// Composes traits and hands over the finished model.
    #[must_use]
    #[instrument(skip_all, fields(files = self.file_names.len()))]
    pub fn finish(mut self) -> BuildOutput {
        traits::compose_all(&mut self.model, &mut self.diagnostics);
        debug!(
            types = self.model.types.len(),
            diagnostics = self.diagnostics.len(),
            "model finished"
        );
        BuildOutput {
            model: self.model,
            diagnostics: self.diagnostics,
            file_names: self.file_names,
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "entity counts are bounded by source size, which is under 4GB"
)]
pub(crate) fn next_index(len: usize) -> u32 {
    len as u32
}

/// A span for diagnostics that have no better location than a whole node.
pub(crate) fn node_span(model: &CodeModel, file: FileId, node: crate::ast::NodeId) -> Span {
    model
        .file(file)
        .map_or_else(Span::default, |source| source.tree().span(node))
}
