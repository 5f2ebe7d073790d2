// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Per-class size, inheritance and complexity measures.
//!
//! | Metric  | Meaning                                                   |
//! |---------|-----------------------------------------------------------|
//! | `impl`  | declared interfaces                                       |
//! | `dit`   | depth of inheritance; an unresolved parent counts once     |
//! | `wmc`   | sum of the `ccn` of the class's own methods               |
//! | `vars`  | declared properties                                       |
//! | `varsi` | declared plus inherited non-private properties, by name    |
//! | `cis`   | public methods plus public properties                     |
//! | `csz`   | methods plus properties                                   |

use std::collections::{HashMap, HashSet};

use ecow::EcoString;

use crate::ast::{NodeId, Visibility};
use crate::model::{walk_package, CodeModel, CodeVisitor, EntityId, Package, TypeDecl, TypeId};

use super::{cyclomatic, Analyzer, AnalyzerHooks, Capabilities, Dependencies, EntityKind, MetricMap};

pub const ID: &str = "class-level";

#[derive(Debug)]
pub struct ClassLevelAnalyzer {
    hooks: AnalyzerHooks,
    method_ccn: HashMap<NodeId, f64>,
    classes: Option<HashMap<NodeId, MetricMap>>,
}

impl Default for ClassLevelAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassLevelAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: AnalyzerHooks::new(ID),
            method_ccn: HashMap::new(),
            classes: None,
        }
    }

    fn measure(&self, model: &CodeModel, class: &TypeDecl) -> MetricMap {
        let methods = class.methods().iter().map(|&id| model.callable(id));
        let properties = class.properties().iter().map(|&id| model.property(id));

        let wmc: f64 = methods
            .clone()
            .filter_map(|method| self.method_ccn.get(&method.node()))
            .sum();
        let public_methods = methods
            .filter(|method| method.visibility() == Visibility::Public)
            .count();
        let public_properties = properties
            .filter(|property| property.visibility() == Visibility::Public)
            .count();
        let csz = class.methods().len() + class.properties().len();

        let mut metrics = MetricMap::new();
        metrics.insert("impl".into(), count(class.interfaces().len()));
        metrics.insert("dit".into(), f64::from(depth_of_inheritance(model, class)));
        metrics.insert("wmc".into(), wmc);
        metrics.insert("vars".into(), count(class.properties().len()));
        metrics.insert("varsi".into(), count(inherited_properties(model, class)));
        metrics.insert("cis".into(), count(public_methods + public_properties));
        metrics.insert("csz".into(), count(csz));
        metrics
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "member counts are far below f64's exact integer range"
)]
fn count(n: usize) -> f64 {
    n as f64
}

/// Resolved ancestors of `class`, nearest first, stopping at a cycle.
fn ancestors<'m>(model: &'m CodeModel, class: &'m TypeDecl) -> Vec<&'m TypeDecl> {
    let mut seen: HashSet<TypeId> = HashSet::from([class.id()]);
    let mut chain = Vec::new();
    let mut current = class;
    while let Some(parent) = model.parent_of(current) {
        if !seen.insert(parent.id()) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

fn depth_of_inheritance(model: &CodeModel, class: &TypeDecl) -> u32 {
    let chain = ancestors(model, class);
    let top = chain.last().copied().unwrap_or(class);
    let unresolved = u32::from(top.parent().is_some() && model.parent_of(top).is_none());
    let resolved = u32::try_from(chain.len()).unwrap_or(u32::MAX);
    resolved.saturating_add(unresolved)
}

fn inherited_properties(model: &CodeModel, class: &TypeDecl) -> usize {
    let mut names: HashSet<EcoString> = class
        .properties()
        .iter()
        .map(|&id| model.property(id).name().clone())
        .collect();
    for ancestor in ancestors(model, class) {
        for &id in ancestor.properties() {
            let property = model.property(id);
            if property.visibility() != Visibility::Private {
                names.insert(property.name().clone());
            }
        }
    }
    names.len()
}

impl CodeVisitor for ClassLevelAnalyzer {
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
        let metrics = self.measure(model, class);
        self.classes
            .get_or_insert_with(HashMap::new)
            .insert(class.node(), metrics);
        self.hooks.end_visit(EntityKind::Class, class.qualified_name());
    }

    fn visit_interface(&mut self, _model: &CodeModel, _interface: &TypeDecl) {}

    fn visit_trait(&mut self, _model: &CodeModel, _trait_decl: &TypeDecl) {}
}

impl Analyzer for ClassLevelAnalyzer {
    fn id(&self) -> &'static str {
        ID
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            node_aware: true,
            project_aware: false,
            filter_aware: true,
        }
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[cyclomatic::ID]
    }

    fn analyze(&mut self, model: &CodeModel, dependencies: &Dependencies<'_>) {
        if self.classes.is_some() {
            return;
        }
        self.hooks.start_analyzer();
        self.method_ccn = model
            .callables()
            .iter()
            .filter(|callable| callable.is_method())
            .filter_map(|method| {
                let metrics = dependencies.node_metrics(cyclomatic::ID, method.node().into());
                metrics.get("ccn").map(|&ccn| (method.node(), ccn))
            })
            .collect();
        self.classes = Some(HashMap::new());
        for package in model.packages() {
            package.accept(model, self);
        }
        self.hooks.end_analyzer();
    }

    fn node_metrics(&self, entity: EntityId) -> MetricMap {
        let EntityId::Node(node) = entity else {
            return MetricMap::new();
        };
        self.classes
            .as_ref()
            .and_then(|classes| classes.get(&node))
            .cloned()
            .unwrap_or_default()
    }

    fn hooks(&self) -> &AnalyzerHooks {
        &self.hooks
    }

    fn hooks_mut(&mut self) -> &mut AnalyzerHooks {
        &mut self.hooks
    }
}
