// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Progress listeners notified while analyzers run.

use std::fmt;

use serde::Serialize;
use tracing::trace;

/// The kind of entity an analyzer is visiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Package,
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Property,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Function => "function",
            Self::Method => "method",
            Self::Property => "property",
        };
        f.write_str(name)
    }
}

/// Callbacks around an analyzer run. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait AnalyzerListener {
    fn start_analyzer(&self, analyzer: &str) {}

    fn end_analyzer(&self, analyzer: &str) {}

    fn start_visit(&self, analyzer: &str, kind: EntityKind, name: &str) {}

    fn end_visit(&self, analyzer: &str, kind: EntityKind, name: &str) {}
}

/// Emits a `trace!` event for every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingListener;

impl AnalyzerListener for TracingListener {
    fn start_analyzer(&self, analyzer: &str) {
        trace!(analyzer, "start analyzer");
    }

    fn end_analyzer(&self, analyzer: &str) {
        trace!(analyzer, "end analyzer");
    }

    fn start_visit(&self, analyzer: &str, kind: EntityKind, name: &str) {
        trace!(analyzer, %kind, name, "start visit");
    }

    fn end_visit(&self, analyzer: &str, kind: EntityKind, name: &str) {
        trace!(analyzer, %kind, name, "end visit");
    }
}
