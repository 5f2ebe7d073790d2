// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Cyclomatic complexity of functions and methods.
//!
//! `ccn` counts one path plus every branching statement and the ternary
//! operator. `ccn2` additionally counts short-circuit boolean and logical
//! operators. Closure bodies belong to the enclosing callable; nested
//! declarations do not.

use std::collections::HashMap;

use crate::ast::{walk_children, AstVisitor, NodeId, NodeKind, SyntaxTree};
use crate::model::{
    walk_package, walk_type, Callable, CodeModel, CodeVisitor, EntityId, Package, TypeDecl,
};

use super::{add_metric, Analyzer, AnalyzerHooks, Capabilities, Dependencies, EntityKind, MetricMap};

pub const ID: &str = "cyclomatic-complexity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Complexity {
    ccn: u32,
    ccn2: u32,
}

impl Complexity {
    const BASE: Self = Self { ccn: 1, ccn2: 1 };

    fn metrics(self) -> MetricMap {
        [("ccn", self.ccn), ("ccn2", self.ccn2)]
            .into_iter()
            .map(|(name, value)| (name.into(), f64::from(value)))
            .collect()
    }
}

/// Counts decision points below one callable body.
struct DecisionCounter {
    complexity: Complexity,
}

impl DecisionCounter {
    fn measure(tree: &SyntaxTree, body: Option<NodeId>) -> Complexity {
        let mut counter = Self {
            complexity: Complexity::BASE,
        };
        if let Some(body) = body {
            tree.accept(body, &mut counter);
        }
        counter.complexity
    }

    fn branch(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.complexity.ccn += 1;
        self.complexity.ccn2 += 1;
        walk_children(self, tree, id);
    }

    fn condition(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.complexity.ccn2 += 1;
        walk_children(self, tree, id);
    }
}

impl AstVisitor for DecisionCounter {
    fn visit_class(&mut self, _tree: &SyntaxTree, _id: NodeId) {}

    fn visit_interface(&mut self, _tree: &SyntaxTree, _id: NodeId) {}

    fn visit_trait(&mut self, _tree: &SyntaxTree, _id: NodeId) {}

    fn visit_function(&mut self, _tree: &SyntaxTree, _id: NodeId) {}

    fn visit_if(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_else_if(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_while(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_do_while(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_for(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_foreach(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_switch_label(&mut self, tree: &SyntaxTree, id: NodeId) {
        if matches!(tree.kind(id), NodeKind::SwitchLabel { is_default: true }) {
            walk_children(self, tree, id);
        } else {
            self.branch(tree, id);
        }
    }

    fn visit_catch(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_conditional(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.branch(tree, id);
    }

    fn visit_boolean_and(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.condition(tree, id);
    }

    fn visit_boolean_or(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.condition(tree, id);
    }

    fn visit_logical_and(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.condition(tree, id);
    }

    fn visit_logical_or(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.condition(tree, id);
    }

    fn visit_logical_xor(&mut self, tree: &SyntaxTree, id: NodeId) {
        self.condition(tree, id);
    }
}

#[derive(Debug)]
pub struct CyclomaticComplexityAnalyzer {
    hooks: AnalyzerHooks,
    callables: Option<HashMap<NodeId, Complexity>>,
    total: Complexity,
}

impl Default for CyclomaticComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl CyclomaticComplexityAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: AnalyzerHooks::new(ID),
            callables: None,
            total: Complexity { ccn: 0, ccn2: 0 },
        }
    }

    fn measure(&mut self, model: &CodeModel, callable: &Callable) {
        let Some(tree) = model.tree(callable.node()) else {
            return;
        };
        let complexity = DecisionCounter::measure(tree, callable.body());
        self.total.ccn += complexity.ccn;
        self.total.ccn2 += complexity.ccn2;
        self.callables
            .get_or_insert_with(HashMap::new)
            .insert(callable.node(), complexity);
    }

    fn visit_type(&mut self, model: &CodeModel, kind: EntityKind, ty: &TypeDecl) {
        if !self.hooks.filter().accept_type(model, ty) {
            return;
        }
        self.hooks.start_visit(kind, ty.qualified_name());
        walk_type(self, model, ty);
        self.hooks.end_visit(kind, ty.qualified_name());
    }
}

impl CodeVisitor for CyclomaticComplexityAnalyzer {
    fn visit_package(&mut self, model: &CodeModel, package: &Package) {
        if !self.hooks.filter().accept_package(package) {
            return;
        }
        self.hooks.start_visit(EntityKind::Package, package.name());
        walk_package(self, model, package);
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
        self.measure(model, function);
        self.hooks
            .end_visit(EntityKind::Function, function.qualified_name());
    }

    fn visit_method(&mut self, model: &CodeModel, method: &Callable) {
        self.hooks.start_visit(EntityKind::Method, method.qualified_name());
        self.measure(model, method);
        self.hooks.end_visit(EntityKind::Method, method.qualified_name());
    }
}

impl Analyzer for CyclomaticComplexityAnalyzer {
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
        if self.callables.is_some() {
            return;
        }
        self.hooks.start_analyzer();
        self.callables = Some(HashMap::new());
        for package in model.packages() {
            package.accept(model, self);
        }
        self.hooks.end_analyzer();
    }

    fn node_metrics(&self, entity: EntityId) -> MetricMap {
        let EntityId::Node(node) = entity else {
            return MetricMap::new();
        };
        self.callables
            .as_ref()
            .and_then(|callables| callables.get(&node))
            .map(|complexity| complexity.metrics())
            .unwrap_or_default()
    }

    fn project_metrics(&self) -> MetricMap {
        let mut metrics = MetricMap::new();
        add_metric(&mut metrics, "ccn", f64::from(self.total.ccn));
        add_metric(&mut metrics, "ccn2", f64::from(self.total.ccn2));
        metrics
    }

    fn hooks(&self) -> &AnalyzerHooks {
        &self.hooks
    }

    fn hooks_mut(&mut self) -> &mut AnalyzerHooks {
        &mut self.hooks
    }
}
