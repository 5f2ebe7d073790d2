// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Analyzer registration, ordering and execution.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::rc::Rc;

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::{CodeModel, EntityId};

use super::{
    AcceptAll, Analyzer, AnalyzerListener, Dependencies, MetricMap, NodeFilter, TranslationTable,
};

/// Engine configuration problems. All of them are raised before any
/// analyzer runs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConfigError {
    #[error("analyzer '{0}' is registered twice")]
    #[diagnostic(code(strata::config::duplicate_analyzer))]
    DuplicateAnalyzer(EcoString),

    #[error("analyzer '{0}' produces neither node nor project metrics")]
    #[diagnostic(code(strata::config::no_result_shape))]
    NoResultShape(EcoString),

    #[error("analyzer '{analyzer}' depends on '{dependency}', which is not registered")]
    #[diagnostic(code(strata::config::missing_dependency))]
    MissingDependency {
        analyzer: EcoString,
        dependency: EcoString,
    },

    #[error("analyzer dependencies form a cycle between {}", .0.join(", "))]
    #[diagnostic(code(strata::config::dependency_cycle))]
    DependencyCycle(Vec<EcoString>),

    #[error("unknown analyzer '{0}'")]
    #[diagnostic(
        code(strata::config::unknown_analyzer),
        help("run `strata analyzers` to list the available analyzers")
    )]
    UnknownAnalyzer(EcoString),
}

/// Runs registered analyzers over a model.
pub struct Engine {
    analyzers: Vec<Box<dyn Analyzer>>,
    filter: Rc<dyn NodeFilter>,
    listeners: Vec<Rc<dyn AnalyzerListener>>,
    ordered: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<_> = self.analyzers.iter().map(|a| a.id()).collect();
        f.debug_struct("Engine")
            .field("analyzers", &ids)
            .field("ordered", &self.ordered)
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
            filter: Rc::new(AcceptAll),
            listeners: Vec::new(),
            ordered: false,
        }
    }

    /// Adds an analyzer. Ids must be unique and every analyzer must
    /// produce node or project metrics.
    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) -> Result<(), ConfigError> {
        let id = analyzer.id();
        if self.analyzers.iter().any(|existing| existing.id() == id) {
            return Err(ConfigError::DuplicateAnalyzer(id.into()));
        }
        let capabilities = analyzer.capabilities();
        if !capabilities.node_aware && !capabilities.project_aware {
            return Err(ConfigError::NoResultShape(id.into()));
        }
        self.analyzers.push(analyzer);
        self.ordered = false;
        Ok(())
    }

    /// The filter handed to filter-aware analyzers.
    pub fn set_filter(&mut self, filter: Rc<dyn NodeFilter>) {
        self.filter = filter;
    }

    pub fn add_listener(&mut self, listener: Rc<dyn AnalyzerListener>) {
        self.listeners.push(listener);
    }

    /// Registered analyzers; in run order once [`Engine::run`] has been
    /// called.
    pub fn analyzers(&self) -> impl Iterator<Item = &dyn Analyzer> {
        self.analyzers.iter().map(|analyzer| &**analyzer)
    }

    /// Runs every analyzer once, dependencies first.
    #[instrument(skip_all, fields(analyzers = self.analyzers.len()))]
    pub fn run(&mut self, model: &CodeModel) -> Result<MetricsReport<'_>, ConfigError> {
        self.order()?;

        for index in 0..self.analyzers.len() {
            let (done, rest) = self.analyzers.split_at_mut(index);
            let current = &mut rest[0];
            let wanted = current.dependencies();
            let dependencies = Dependencies::new(
                done.iter()
                    .map(|analyzer| &**analyzer)
                    .filter(|analyzer| wanted.contains(&analyzer.id()))
                    .collect(),
            );

            let filter_aware = current.capabilities().filter_aware;
            let hooks = current.hooks_mut();
            if filter_aware {
                hooks.set_filter(Rc::clone(&self.filter));
            }
            hooks.set_listeners(self.listeners.clone());
            debug!(analyzer = current.id(), "running analyzer");
            current.analyze(model, &dependencies);
        }

        let project = self
            .analyzers
            .iter()
            .filter(|analyzer| analyzer.capabilities().project_aware)
            .map(|analyzer| (analyzer.id(), analyzer.project_metrics()))
            .collect();
        Ok(MetricsReport {
            analyzers: &self.analyzers,
            project,
        })
    }

    /// Sorts analyzers so each comes after its dependencies, keeping
    /// registration order otherwise.
    fn order(&mut self) -> Result<(), ConfigError> {
        if self.ordered {
            return Ok(());
        }
        for analyzer in &self.analyzers {
            for &dependency in analyzer.dependencies() {
                if !self.analyzers.iter().any(|a| a.id() == dependency) {
                    return Err(ConfigError::MissingDependency {
                        analyzer: analyzer.id().into(),
                        dependency: dependency.into(),
                    });
                }
            }
        }

        let mut pending: Vec<Box<dyn Analyzer>> = std::mem::take(&mut self.analyzers);
        let mut placed: Vec<Box<dyn Analyzer>> = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let ready = pending.iter().position(|analyzer| {
                analyzer
                    .dependencies()
                    .iter()
                    .all(|dependency| placed.iter().any(|p| p.id() == *dependency))
            });
            let Some(ready) = ready else {
                let cycle = pending.iter().map(|a| EcoString::from(a.id())).collect();
                placed.append(&mut pending);
                self.analyzers = placed;
                return Err(ConfigError::DependencyCycle(cycle));
            };
            placed.push(pending.remove(ready));
        }
        self.analyzers = placed;
        self.ordered = true;
        Ok(())
    }
}

/// Results of one engine run.
///
/// Project metrics are collected when the run ends. Node metrics are read
/// from the analyzers on request.
pub struct MetricsReport<'a> {
    analyzers: &'a [Box<dyn Analyzer>],
    project: Vec<(&'static str, MetricMap)>,
}

impl MetricsReport<'_> {
    /// Project metrics of one analyzer.
    #[must_use]
    pub fn project_metrics(&self, analyzer: &str) -> Option<&MetricMap> {
        self.project
            .iter()
            .find(|(id, _)| *id == analyzer)
            .map(|(_, metrics)| metrics)
    }

    /// Project metrics of all analyzers, later analyzers overwriting
    /// earlier ones, then translated.
    #[must_use]
    pub fn merged_project_metrics(&self, table: &TranslationTable) -> MetricMap {
        let mut merged = MetricMap::new();
        for (_, metrics) in &self.project {
            merged.extend(metrics.iter().map(|(k, v)| (k.clone(), *v)));
        }
        table.apply(merged)
    }

    /// Node metrics of one analyzer; empty for unknown analyzers.
    #[must_use]
    pub fn analyzer_node_metrics(&self, analyzer: &str, entity: EntityId) -> MetricMap {
        self.analyzers
            .iter()
            .find(|a| a.id() == analyzer && a.capabilities().node_aware)
            .map(|a| a.node_metrics(entity))
            .unwrap_or_default()
    }

    /// Node metrics of every node-aware analyzer, merged in run order.
    #[must_use]
    pub fn node_metrics(&self, entity: EntityId) -> MetricMap {
        let mut merged = MetricMap::new();
        for analyzer in self
            .analyzers
            .iter()
            .filter(|a| a.capabilities().node_aware)
        {
            merged.extend(analyzer.node_metrics(entity));
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::metrics::{AnalyzerHooks, Capabilities, EntityKind};
    use crate::model::{walk_model, CodeVisitor, Package, PackageId};
    use crate::test_helpers::build_sources;

    /// Records the order it ran in and the dependencies it saw.
    struct Probe {
        id: &'static str,
        deps: &'static [&'static str],
        caps: Capabilities,
        log: Rc<RefCell<Vec<String>>>,
        runs: u32,
        hooks: AnalyzerHooks,
    }

    impl Probe {
        fn new(id: &'static str, deps: &'static [&'static str], log: &Rc<RefCell<Vec<String>>>) -> Box<Self> {
            Box::new(Self {
                id,
                deps,
                caps: Capabilities {
                    node_aware: true,
                    project_aware: true,
                    filter_aware: false,
                },
                log: Rc::clone(log),
                runs: 0,
                hooks: AnalyzerHooks::new(id),
            })
        }
    }

    impl CodeVisitor for Probe {
        fn visit_package(&mut self, _model: &CodeModel, package: &Package) {
            self.hooks.start_visit(EntityKind::Package, package.name());
            self.hooks.end_visit(EntityKind::Package, package.name());
        }
    }

    impl Analyzer for Probe {
        fn id(&self) -> &'static str {
            self.id
        }

        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn dependencies(&self) -> &'static [&'static str] {
            self.deps
        }

        fn analyze(&mut self, model: &CodeModel, dependencies: &Dependencies<'_>) {
            if self.runs > 0 {
                return;
            }
            self.runs += 1;
            let seen: Vec<_> = self
                .deps
                .iter()
                .filter(|id| dependencies.get(id).is_some())
                .collect();
            self.log
                .borrow_mut()
                .push(format!("{} saw {}", self.id, seen.len()));
            self.hooks.start_analyzer();
            walk_model(self, model);
            self.hooks.end_analyzer();
        }

        fn project_metrics(&self) -> MetricMap {
            [(EcoString::from("runs"), f64::from(self.runs))]
                .into_iter()
                .collect()
        }

        fn node_metrics(&self, entity: EntityId) -> MetricMap {
            match entity {
                EntityId::Package(PackageId(0)) => {
                    [(EcoString::from(self.id), 1.0)].into_iter().collect()
                }
                _ => MetricMap::new(),
            }
        }

        fn hooks(&self) -> &AnalyzerHooks {
            &self.hooks
        }

        fn hooks_mut(&mut self) -> &mut AnalyzerHooks {
            &mut self.hooks
        }
    }

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl AnalyzerListener for Recorder {
        fn start_analyzer(&self, analyzer: &str) {
            self.0.borrow_mut().push(format!("start {analyzer}"));
        }

        fn start_visit(&self, analyzer: &str, kind: EntityKind, name: &str) {
            self.0.borrow_mut().push(format!("{analyzer} {kind} {name}"));
        }
    }

    fn log() -> Rc<RefCell<Vec<String>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn dependencies_run_first_and_are_visible() {
        let output = build_sources(&[("a.php", "<?php class A {}")]);
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("c", &["b"], &log)).unwrap();
        engine.register(Probe::new("a", &[], &log)).unwrap();
        engine.register(Probe::new("b", &["a"], &log)).unwrap();
        engine.run(&output.model).unwrap();
        assert_eq!(*log.borrow(), vec!["a saw 0", "b saw 1", "c saw 1"]);
        let order: Vec<_> = engine.analyzers().map(|a| a.id()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn independent_analyzers_keep_registration_order() {
        let output = build_sources(&[("a.php", "<?php")]);
        let log = log();
        let mut engine = Engine::new();
        for id in ["z", "y", "x"] {
            engine.register(Probe::new(id, &[], &log)).unwrap();
        }
        engine.run(&output.model).unwrap();
        assert_eq!(*log.borrow(), vec!["z saw 0", "y saw 0", "x saw 0"]);
    }

    #[test]
    fn duplicate_and_shapeless_analyzers_are_rejected() {
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("a", &[], &log)).unwrap();
        assert_eq!(
            engine.register(Probe::new("a", &[], &log)),
            Err(ConfigError::DuplicateAnalyzer("a".into()))
        );
        let mut shapeless = Probe::new("s", &[], &log);
        shapeless.caps = Capabilities::default();
        assert_eq!(
            engine.register(shapeless),
            Err(ConfigError::NoResultShape("s".into()))
        );
    }

    #[test]
    fn missing_dependency_fails_before_analysis() {
        let output = build_sources(&[("a.php", "<?php")]);
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("a", &[], &log)).unwrap();
        engine.register(Probe::new("b", &["nope"], &log)).unwrap();
        let error = engine.run(&output.model).err().unwrap();
        assert_eq!(
            error,
            ConfigError::MissingDependency {
                analyzer: "b".into(),
                dependency: "nope".into()
            }
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cycle_fails_before_analysis() {
        let output = build_sources(&[("a.php", "<?php")]);
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("free", &[], &log)).unwrap();
        engine.register(Probe::new("a", &["b"], &log)).unwrap();
        engine.register(Probe::new("b", &["a"], &log)).unwrap();
        let error = engine.run(&output.model).err().unwrap();
        assert_eq!(
            error,
            ConfigError::DependencyCycle(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            error.to_string(),
            "analyzer dependencies form a cycle between a, b"
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn second_run_does_not_reanalyze() {
        let output = build_sources(&[("a.php", "<?php")]);
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("a", &[], &log)).unwrap();
        engine.run(&output.model).unwrap();
        let report = engine.run(&output.model).unwrap();
        assert_eq!(report.project_metrics("a").unwrap().get("runs"), Some(&1.0));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn report_merges_node_metrics_and_defaults_to_empty() {
        let output = build_sources(&[("a.php", "<?php namespace P; class A {}")]);
        let log = log();
        let mut engine = Engine::new();
        engine.register(Probe::new("a", &[], &log)).unwrap();
        engine.register(Probe::new("b", &[], &log)).unwrap();
        let report = engine.run(&output.model).unwrap();
        let merged = report.node_metrics(EntityId::Package(PackageId(0)));
        assert_eq!(merged.len(), 2);
        assert!(report.node_metrics(EntityId::Package(PackageId(7))).is_empty());
        assert!(report
            .analyzer_node_metrics("missing", EntityId::Package(PackageId(0)))
            .is_empty());
        assert_eq!(
            report.merged_project_metrics(&TranslationTable::identity()).get("runs"),
            Some(&1.0)
        );
    }

    #[test]
    fn listeners_see_every_analyzer() {
        let output = build_sources(&[("a.php", "<?php namespace P; class A {}")]);
        let log = log();
        let recorder = Rc::new(Recorder::default());
        let mut engine = Engine::new();
        engine.add_listener(recorder.clone());
        engine.register(Probe::new("a", &[], &log)).unwrap();
        engine.run(&output.model).unwrap();
        assert_eq!(*recorder.0.borrow(), vec!["start a", "a package P"]);
    }
}
