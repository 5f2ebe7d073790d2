// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Counts of packages, classes, interfaces, methods and functions.

use std::collections::HashMap;

use crate::ast::NodeId;
use crate::model::{
    walk_package, Callable, CodeModel, CodeVisitor, EntityId, Package, PackageId, TypeDecl,
};

use super::{Analyzer, AnalyzerHooks, Capabilities, Dependencies, EntityKind, MetricMap};

pub const ID: &str = "node-count";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    classes: u32,
    interfaces: u32,
    methods: u32,
    functions: u32,
}

impl Counts {
    fn metrics(self) -> MetricMap {
        [
            ("noc", self.classes),
            ("noi", self.interfaces),
            ("nom", self.methods),
            ("nof", self.functions),
        ]
        .into_iter()
        .map(|(name, value)| (name.into(), f64::from(value)))
        .collect()
    }

    fn add(&mut self, other: Self) {
        self.classes += other.classes;
        self.interfaces += other.interfaces;
        self.methods += other.methods;
        self.functions += other.functions;
    }
}

#[derive(Debug)]
pub struct NodeCountAnalyzer {
    hooks: AnalyzerHooks,
    packages: Option<HashMap<PackageId, Counts>>,
    types: HashMap<NodeId, u32>,
    current: Counts,
}

impl Default for NodeCountAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCountAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: AnalyzerHooks::new(ID),
            packages: None,
            types: HashMap::new(),
            current: Counts::default(),
        }
    }

    fn visit_type(&mut self, model: &CodeModel, kind: EntityKind, ty: &TypeDecl) {
        if !self.hooks.filter().accept_type(model, ty) {
            return;
        }
        self.hooks.start_visit(kind, ty.qualified_name());
        match kind {
            EntityKind::Class => self.current.classes += 1,
            EntityKind::Interface => self.current.interfaces += 1,
            _ => {}
        }
        let mut methods = 0;
        for &id in ty.methods() {
            let method = model.callable(id);
            self.hooks.start_visit(EntityKind::Method, method.qualified_name());
            methods += 1;
            self.hooks.end_visit(EntityKind::Method, method.qualified_name());
        }
        self.current.methods += methods;
        self.types.insert(ty.node(), methods);
        self.hooks.end_visit(kind, ty.qualified_name());
    }
}

impl CodeVisitor for NodeCountAnalyzer {
    fn visit_package(&mut self, model: &CodeModel, package: &Package) {
        if !self.hooks.filter().accept_package(package) {
            return;
        }
        self.hooks.start_visit(EntityKind::Package, package.name());
        self.current = Counts::default();
        walk_package(self, model, package);
        let counts = self.current;
        self.packages
            .get_or_insert_with(HashMap::new)
            .insert(package.id(), counts);
        self.hooks.end_visit(EntityKind::Package, package.name());
    }

    fn visit_class(&mut self, model: &CodeModel, class: &TypeDecl) {
        self.visit_type(model, EntityKind::Class, class);
    }

    fn visit_interface(&mut self, model: &CodeModel, interface: &TypeDecl) {
        self.visit_type(model, EntityKind::Interface, interface);
    }

    fn visit_trait(&mut self, model: &CodeModel, trait_decl: &TypeDecl) {
        self.visit_type(model, EntityKind::Trait, trait_decl);
    }

    fn visit_function(&mut self, model: &CodeModel, function: &Callable) {
        if !self.hooks.filter().accept_function(model, function) {
            return;
        }
        self.hooks
            .start_visit(EntityKind::Function, function.qualified_name());
        self.current.functions += 1;
        self.hooks
            .end_visit(EntityKind::Function, function.qualified_name());
    }
}

impl Analyzer for NodeCountAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            node_aware: true,
            project_aware: true,
            filter_aware: true,
        }
    }

    fn analyze(&mut self, model: &CodeModel, _dependencies: &Dependencies<'_>) {
        if self.packages.is_some() {
            return;
        }
        self.hooks.start_analyzer();
        self.packages = Some(HashMap::new());
        for package in model.packages() {
            package.accept(model, self);
        }
        self.hooks.end_analyzer();
    }

    fn node_metrics(&self, entity: EntityId) -> MetricMap {
        match entity {
            EntityId::Package(id) => self
                .packages
                .as_ref()
                .and_then(|packages| packages.get(&id))
                .map(|counts| counts.metrics())
                .unwrap_or_default(),
            EntityId::Node(node) => self
                .types
                .get(&node)
                .map(|&methods| MetricMap::from([("nom".into(), f64::from(methods))]))
                .unwrap_or_default(),
        }
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "package ids are u32, so the package count fits"
    )]
    fn project_metrics(&self) -> MetricMap {
        let Some(packages) = &self.packages else {
            return MetricMap::new();
        };
        let mut total = Counts::default();
        for counts in packages.values() {
            total.add(*counts);
        }
        let mut metrics = total.metrics();
        metrics.insert("nop".into(), f64::from(packages.len() as u32));
        metrics
    }

    fn hooks(&self) -> &AnalyzerHooks {
        &self.hooks
    }

    fn hooks_mut(&mut self) -> &mut AnalyzerHooks {
        &mut self.hooks
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::metrics::ExcludeFilter;
    use crate::test_helpers::build_sources;

    const SOURCES: [(&str, &str); 2] = [
        (
            "src/app.php",
            "<?php namespace App;
             class A { function a() {} function b() {} }
             interface I { function i(); }
             trait T { function t() {} }
             function helper() {}",
        ),
        (
            "src/lib.php",
            "<?php namespace Lib; class B {} function one() {} function two() {}",
        ),
    ];

    fn analyze(analyzer: &mut NodeCountAnalyzer) -> crate::builder::BuildOutput {
        let output = build_sources(&SOURCES);
        analyzer.analyze(&output.model, &Dependencies::none());
        output
    }

    fn map(pairs: &[(&str, f64)]) -> MetricMap {
        pairs.iter().map(|&(k, v)| (k.into(), v)).collect()
    }

    #[test]
    fn package_counts() {
        let mut analyzer = NodeCountAnalyzer::new();
        let output = analyze(&mut analyzer);
        let app = output.model.packages().iter().find(|p| p.name() == "App").unwrap();
        assert_eq!(
            analyzer.node_metrics(app.id().into()),
            map(&[("noc", 1.0), ("noi", 1.0), ("nom", 4.0), ("nof", 1.0)])
        );
    }

    #[test]
    fn type_method_counts() {
        let mut analyzer = NodeCountAnalyzer::new();
        let output = analyze(&mut analyzer);
        let nom: Vec<f64> = output
            .model
            .types()
            .iter()
            .map(|ty| analyzer.node_metrics(ty.node().into())["nom"])
            .collect();
        assert_eq!(nom, vec![2.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn project_totals() {
        let mut analyzer = NodeCountAnalyzer::new();
        analyze(&mut analyzer);
        assert_eq!(
            analyzer.project_metrics(),
            map(&[("nop", 2.0), ("noc", 2.0), ("noi", 1.0), ("nom", 4.0), ("nof", 3.0)])
        );
    }

    #[test]
    fn excluded_packages_are_skipped() {
        let mut analyzer = NodeCountAnalyzer::new();
        analyzer
            .hooks_mut()
            .set_filter(Rc::new(ExcludeFilter::new().exclude_package("lib")));
        analyze(&mut analyzer);
        let metrics = analyzer.project_metrics();
        assert_eq!(metrics["nop"], 1.0);
        assert_eq!(metrics["nof"], 1.0);
    }

    #[test]
    fn nothing_before_analysis() {
        assert!(NodeCountAnalyzer::new().project_metrics().is_empty());
    }
}
