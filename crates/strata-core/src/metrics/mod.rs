// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Metrics engine and analyzers.
//!
//! **DDD Context:** Metrics
//!
//! An [`Analyzer`] walks the code model as a [`CodeVisitor`] and keeps its
//! own results. The [`Engine`] orders analyzers by their declared
//! dependencies, runs each one once and wraps the results in a
//! [`MetricsReport`].
//!
//! # Adding an Analyzer
//!
//! 1. Create `metrics/<your_analyzer>.rs` with a struct implementing
//!    [`CodeVisitor`] and [`Analyzer`].
//! 2. Add `mod your_analyzer;` below (keep alphabetical).
//! 3. Add a constructor line to `registry::constructors()`.

mod class_level;
mod cyclomatic;
mod engine;
mod filter;
mod hierarchy;
mod listener;
mod node_count;
pub mod registry;
mod translation;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use ecow::EcoString;
use serde::Serialize;

use crate::model::{CodeModel, CodeVisitor, EntityId};

pub use class_level::ClassLevelAnalyzer;
pub use cyclomatic::CyclomaticComplexityAnalyzer;
pub use engine::{ConfigError, Engine, MetricsReport};
pub use filter::{AcceptAll, ExcludeFilter, NodeFilter};
pub use hierarchy::HierarchyAnalyzer;
pub use listener::{AnalyzerListener, EntityKind, TracingListener};
pub use node_count::NodeCountAnalyzer;
pub use translation::TranslationTable;

/// Metric name to value, ordered by name.
pub type MetricMap = BTreeMap<EcoString, f64>;

/// Which result shapes an analyzer produces and whether it honours a
/// [`NodeFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Capabilities {
    pub node_aware: bool,
    pub project_aware: bool,
    pub filter_aware: bool,
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags: Vec<&str> = [
            (self.node_aware, "node"),
            (self.project_aware, "project"),
            (self.filter_aware, "filter"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        f.write_str(&flags.join(", "))
    }
}

/// A pluggable metric producer.
///
/// `analyze` runs at most once per instance; later calls return at once.
/// Results are read through `node_metrics` and `project_metrics` after the
/// run.
pub trait Analyzer: CodeVisitor {
    /// Stable identifier, used for dependencies and configuration.
    fn id(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Ids of analyzers whose results this one reads.
    fn dependencies(&self) -> &'static [&'static str] {
        &[]
    }

    fn analyze(&mut self, model: &CodeModel, dependencies: &Dependencies<'_>);

    /// Metrics for one entity; empty for entities that were not measured.
    fn node_metrics(&self, entity: EntityId) -> MetricMap {
        let _ = entity;
        MetricMap::new()
    }

    fn project_metrics(&self) -> MetricMap {
        MetricMap::new()
    }

    fn hooks(&self) -> &AnalyzerHooks;

    fn hooks_mut(&mut self) -> &mut AnalyzerHooks;
}

/// Already finished analyzers that the running one depends on.
pub struct Dependencies<'a> {
    analyzers: Vec<&'a dyn Analyzer>,
}

impl<'a> Dependencies<'a> {
    #[must_use]
    pub fn new(analyzers: Vec<&'a dyn Analyzer>) -> Self {
        Self { analyzers }
    }

    #[must_use]
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'a dyn Analyzer> {
        self.analyzers
            .iter()
            .copied()
            .find(|analyzer| analyzer.id() == id)
    }

    /// Metrics of `entity` from dependency `id`; empty if it is missing.
    #[must_use]
    pub fn node_metrics(&self, id: &str, entity: EntityId) -> MetricMap {
        self.get(id)
            .map(|analyzer| analyzer.node_metrics(entity))
            .unwrap_or_default()
    }
}

/// Filter and listeners attached to one analyzer.
pub struct AnalyzerHooks {
    analyzer: &'static str,
    filter: Rc<dyn NodeFilter>,
    listeners: Vec<Rc<dyn AnalyzerListener>>,
}

impl fmt::Debug for AnalyzerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerHooks")
            .field("analyzer", &self.analyzer)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl AnalyzerHooks {
    #[must_use]
    pub fn new(analyzer: &'static str) -> Self {
        Self {
            analyzer,
            filter: Rc::new(AcceptAll),
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn filter(&self) -> &dyn NodeFilter {
        self.filter.as_ref()
    }

    pub fn set_filter(&mut self, filter: Rc<dyn NodeFilter>) {
        self.filter = filter;
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnalyzerListener>) {
        self.listeners.push(listener);
    }

    /// Replaces all listeners.
    pub fn set_listeners(&mut self, listeners: Vec<Rc<dyn AnalyzerListener>>) {
        self.listeners = listeners;
    }

    pub fn start_analyzer(&self) {
        for listener in &self.listeners {
            listener.start_analyzer(self.analyzer);
        }
    }

    pub fn end_analyzer(&self) {
        for listener in &self.listeners {
            listener.end_analyzer(self.analyzer);
        }
    }

    pub fn start_visit(&self, kind: EntityKind, name: &str) {
        for listener in &self.listeners {
            listener.start_visit(self.analyzer, kind, name);
        }
    }

    pub fn end_visit(&self, kind: EntityKind, name: &str) {
        for listener in &self.listeners {
            listener.end_visit(self.analyzer, kind, name);
        }
    }
}

/// Adds `value` to the metric `name`, starting from zero.
pub(crate) fn add_metric(metrics: &mut MetricMap, name: &str, value: f64) {
    *metrics.entry(name.into()).or_insert(0.0) += value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_display_lists_set_flags() {
        let caps = Capabilities {
            node_aware: true,
            project_aware: false,
            filter_aware: true,
        };
        assert_eq!(caps.to_string(), "node, filter");
        assert_eq!(Capabilities::default().to_string(), "");
    }

    #[test]
    fn missing_dependency_yields_empty_metrics() {
        let deps = Dependencies::none();
        assert!(deps.get("cyclomatic-complexity").is_none());
        assert!(deps
            .node_metrics("cyclomatic-complexity", EntityId::Package(crate::model::PackageId(0)))
            .is_empty());
    }

    #[test]
    fn add_metric_accumulates() {
        let mut metrics = MetricMap::new();
        add_metric(&mut metrics, "ccn", 2.0);
        add_metric(&mut metrics, "ccn", 3.0);
        assert_eq!(metrics.get("ccn"), Some(&5.0));
    }
}
