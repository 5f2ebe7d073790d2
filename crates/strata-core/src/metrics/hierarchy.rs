// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Class hierarchy counts: abstract, concrete, root and leaf classes.
//!
//! Parents are identified by their declaration node, so two references to
//! the same class count once. A root is a parent class that declares no
//! parent of its own; a leaf is any counted class that no counted class
//! extends.

use std::collections::{BTreeSet, HashMap};

use ecow::EcoString;

use crate::ast::NodeId;
use crate::model::{
    walk_package, walk_type, Callable, CodeModel, CodeVisitor, EntityId, Package, PropertyDecl,
    TypeDecl,
};

use super::{Analyzer, AnalyzerHooks, Capabilities, Dependencies, EntityKind, MetricMap};

pub const ID: &str = "hierarchy";

#[derive(Debug)]
pub struct HierarchyAnalyzer {
    hooks: AnalyzerHooks,
    classes: u32,
    abstract_classes: u32,
    interfaces: u32,
    functions: u32,
    methods: u32,
    roots: BTreeSet<NodeId>,
    non_leafs: BTreeSet<NodeId>,
    node_metrics: Option<HashMap<NodeId, MetricMap>>,
}

impl Default for HierarchyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: AnalyzerHooks::new(ID),
            classes: 0,
            abstract_classes: 0,
            interfaces: 0,
            functions: 0,
            methods: 0,
            roots: BTreeSet::new(),
            non_leafs: BTreeSet::new(),
            node_metrics: None,
        }
    }

    fn metrics_mut(&mut self) -> &mut HashMap<NodeId, MetricMap> {
        self.node_metrics.get_or_insert_with(HashMap::new)
    }
}

impl CodeVisitor for HierarchyAnalyzer {
    fn visit_package(&mut self, model: &CodeModel, package: &Package) {
        if !self.hooks.filter().accept_package(package) {
            return;
        }
        self.hooks.start_visit(EntityKind::Package, package.name());
        walk_package(self, model, package);
        self.hooks.end_visit(EntityKind::Package, package.name());
    }

    fn visit_class(&mut self, model: &CodeModel, class: &TypeDecl) {
        if !self.hooks.filter().accept_type(model, class) {
            return;
        }
        self.hooks.start_visit(EntityKind::Class, class.qualified_name());

        self.classes += 1;
        if class.is_abstract() {
            self.abstract_classes += 1;
        }
        // Unresolved parents have no declaration and are not counted.
        if let Some(parent) = model.parent_of(class) {
            if parent.parent().is_none() {
                self.roots.insert(parent.node());
            }
            self.non_leafs.insert(parent.node());
        }
        self.metrics_mut().insert(class.node(), MetricMap::new());
        walk_type(self, model, class);

        self.hooks.end_visit(EntityKind::Class, class.qualified_name());
    }

    fn visit_interface(&mut self, model: &CodeModel, interface: &TypeDecl) {
        if !self.hooks.filter().accept_type(model, interface) {
            return;
        }
        self.hooks
            .start_visit(EntityKind::Interface, interface.qualified_name());
        self.interfaces += 1;
        for &id in interface.methods() {
            model.callable(id).accept(model, self);
        }
        self.hooks
            .end_visit(EntityKind::Interface, interface.qualified_name());
    }

    // Traits take no part in the class hierarchy.
    fn visit_trait(&mut self, _model: &CodeModel, _trait_decl: &TypeDecl) {}

    fn visit_function(&mut self, model: &CodeModel, function: &Callable) {
        if !self.hooks.filter().accept_function(model, function) {
            return;
        }
        self.hooks
            .start_visit(EntityKind::Function, function.qualified_name());
        self.functions += 1;
        self.hooks
            .end_visit(EntityKind::Function, function.qualified_name());
    }

    fn visit_method(&mut self, _model: &CodeModel, method: &Callable) {
        self.hooks.start_visit(EntityKind::Method, method.qualified_name());
        self.methods += 1;
        self.hooks.end_visit(EntityKind::Method, method.qualified_name());
    }

    fn visit_property(&mut self, _model: &CodeModel, property: &PropertyDecl) {
        self.hooks.start_visit(EntityKind::Property, property.name());
        self.hooks.end_visit(EntityKind::Property, property.name());
    }
}

impl Analyzer for HierarchyAnalyzer {
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
        if self.node_metrics.is_some() {
            return;
        }
        self.hooks.start_analyzer();
        self.node_metrics = Some(HashMap::new());
        for package in model.packages() {
            package.accept(model, self);
        }
        self.hooks.end_analyzer();
    }

    fn node_metrics(&self, entity: EntityId) -> MetricMap {
        let EntityId::Node(node) = entity else {
            return MetricMap::new();
        };
        self.node_metrics
            .as_ref()
            .and_then(|metrics| metrics.get(&node))
            .cloned()
            .unwrap_or_default()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "parent sets are bounded by the class count, a u32"
    )]
    fn project_metrics(&self) -> MetricMap {
        let non_leafs = self.non_leafs.len() as u32;
        [
            ("clsa", self.abstract_classes),
            ("clsc", self.classes - self.abstract_classes),
            ("roots", self.roots.len() as u32),
            ("leafs", self.classes.saturating_sub(non_leafs)),
        ]
        .into_iter()
        .map(|(name, value)| (EcoString::from(name), f64::from(value)))
        .collect()
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

    fn run(sources: &[(&str, &str)]) -> (crate::builder::BuildOutput, HierarchyAnalyzer) {
        let output = build_sources(sources);
        let mut analyzer = HierarchyAnalyzer::new();
        analyzer.analyze(&output.model, &Dependencies::none());
        (output, analyzer)
    }

    fn metric(analyzer: &HierarchyAnalyzer, name: &str) -> f64 {
        analyzer.project_metrics()[name]
    }

    #[test]
    fn chain_has_one_root_and_one_leaf_in_any_order() {
        let files = [
            ("a.php", "<?php class A {}"),
            ("b.php", "<?php class B extends A {}"),
            ("c.php", "<?php class C extends B {}"),
        ];
        for order in [[0, 1, 2], [2, 1, 0], [1, 0, 2], [2, 0, 1]] {
            let sources: Vec<_> = order.iter().map(|&i| files[i]).collect();
            let (_, analyzer) = run(&sources);
            assert_eq!(metric(&analyzer, "roots"), 1.0);
            assert_eq!(metric(&analyzer, "leafs"), 1.0);
            assert_eq!(analyzer.non_leafs.len(), 2);
            assert_eq!(metric(&analyzer, "clsc"), 3.0);
        }
    }

    #[test]
    fn abstract_and_concrete_counts() {
        let (_, analyzer) = run(&[(
            "a.php",
            "<?php abstract class Base {} class One extends Base {} class Two extends Base {}
             interface I {} trait T {}",
        )]);
        assert_eq!(metric(&analyzer, "clsa"), 1.0);
        assert_eq!(metric(&analyzer, "clsc"), 2.0);
        assert_eq!(metric(&analyzer, "roots"), 1.0);
        assert_eq!(metric(&analyzer, "leafs"), 2.0);
        assert_eq!(analyzer.interfaces, 1);
    }

    #[test]
    fn unresolved_parent_is_not_counted() {
        let (_, analyzer) = run(&[("a.php", "<?php class A extends \\Vendor\\Missing {}")]);
        assert_eq!(metric(&analyzer, "roots"), 0.0);
        assert_eq!(metric(&analyzer, "leafs"), 1.0);
    }

    #[test]
    fn parent_with_unresolved_parent_is_not_a_root() {
        let (_, analyzer) = run(&[(
            "a.php",
            "<?php class B extends \\Vendor\\Missing {} class C extends B {}",
        )]);
        assert_eq!(metric(&analyzer, "roots"), 0.0);
        assert_eq!(metric(&analyzer, "leafs"), 1.0);
    }

    #[test]
    fn node_metrics_are_empty_maps_for_visited_classes() {
        let (output, analyzer) = run(&[("a.php", "<?php class A {} function f() {}")]);
        let a = output.model.types()[0].node();
        assert!(analyzer.node_metrics.as_ref().unwrap().contains_key(&a));
        assert!(analyzer.node_metrics(EntityId::Node(a)).is_empty());
        let f = output.model.callables()[0].node();
        assert!(analyzer.node_metrics(EntityId::Node(f)).is_empty());
        assert_eq!(analyzer.functions, 1);
    }

    #[test]
    fn analyze_runs_once() {
        let (output, mut analyzer) = run(&[("a.php", "<?php class A { function m() {} }")]);
        analyzer.analyze(&output.model, &Dependencies::none());
        assert_eq!(analyzer.classes, 1);
        assert_eq!(analyzer.methods, 1);
    }

    #[test]
    fn filtered_classes_are_not_counted() {
        let output = build_sources(&[
            ("src/a.php", "<?php namespace App; class A extends \\Lib\\Base {}"),
            ("lib/base.php", "<?php namespace Lib; class Base {}"),
        ]);
        let mut analyzer = HierarchyAnalyzer::new();
        analyzer
            .hooks_mut()
            .set_filter(Rc::new(ExcludeFilter::new().exclude_package("Lib")));
        analyzer.analyze(&output.model, &Dependencies::none());
        assert_eq!(analyzer.classes, 1);
        assert_eq!(metric(&analyzer, "roots"), 1.0);
        assert_eq!(metric(&analyzer, "leafs"), 0.0);
    }
}
