// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Strata analysis core.
//!
//! This crate contains the PHP analysis pipeline:
//! - Lexical analysis and parsing into per-file syntax trees
//! - The builder, which registers declarations into a code model and
//!   composes trait methods
//! - The metrics engine and its analyzers
//!
//! ```
//! use strata_core::builder::Builder;
//! use strata_core::metrics::{registry, Engine, TranslationTable};
//!
//! let mut builder = Builder::new();
//! builder.add_source("a.php", "<?php class A {} class B extends A {}");
//! let output = builder.finish();
//! assert!(output.is_success());
//!
//! let mut engine = Engine::new();
//! for analyzer in registry::create_all() {
//!     engine.register(analyzer).unwrap();
//! }
//! let report = engine.run(&output.model).unwrap();
//! let metrics = report.merged_project_metrics(&TranslationTable::phpunit());
//! assert_eq!(metrics.get("roots"), Some(&1.0));
//! ```

pub mod ast;
pub mod builder;
pub mod diagnostics;
pub mod metrics;
pub mod model;
pub mod source_analysis;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{FileId, NodeId, NodeKind, SyntaxTree};
    pub use crate::builder::{BuildOutput, Builder};
    pub use crate::diagnostics::{Diagnostic, Severity};
    pub use crate::metrics::{Analyzer, Engine, MetricsReport, TranslationTable};
    pub use crate::model::{CodeModel, TypeRef};
    pub use crate::source_analysis::Span;
}
