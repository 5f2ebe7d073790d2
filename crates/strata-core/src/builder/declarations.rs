// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Registration of a file's packages, types and functions.
//!
//! Declarations are found by walking statements, including conditional
//! blocks, but never the bodies of functions, methods or closures.

use ecow::EcoString;
use tracing::debug;

use crate::ast::{
    AdaptationAction, FileId, LateBoundKeyword, MetaValue, Modifiers, NodeId, NodeKind,
    SyntaxTree,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{
    AliasRule, Callable, CallableId, CallableKind, CodeModel, Composition, MemberId, Package,
    PackageId, Parameter, PrecedenceRule, PropertyDecl, PropertyId, TraitUseClause, TypeDecl,
    TypeId, TypeKind, TypeReference, GLOBAL_PACKAGE,
};

use super::next_index;

pub(super) fn register_file(
    model: &mut CodeModel,
    diagnostics: &mut Vec<Diagnostic>,
    tree: &SyntaxTree,
) {
    let mut registrar = Registrar {
        model,
        diagnostics,
        tree,
        namespace: EcoString::new(),
    };
    registrar.walk(tree.root());
}

struct Registrar<'a> {
    model: &'a mut CodeModel,
    diagnostics: &'a mut Vec<Diagnostic>,
    tree: &'a SyntaxTree,
    namespace: EcoString,
}

impl Registrar<'_> {
    fn file(&self) -> FileId {
        self.tree.file()
    }

    fn walk(&mut self, id: NodeId) {
        match self.tree.kind(id) {
            NodeKind::Namespace { name } => {
                let outer = std::mem::replace(&mut self.namespace, name.clone());
                self.walk_children(id);
                self.namespace = outer;
            }
            NodeKind::Class { .. } | NodeKind::Interface { .. } | NodeKind::Trait { .. } => {
                self.register_type(id);
            }
            NodeKind::Function { .. } => self.register_function(id),
            NodeKind::Method { .. } | NodeKind::Closure { .. } => {}
            _ => self.walk_children(id),
        }
    }

    fn walk_children(&mut self, id: NodeId) {
        for &child in self.tree.children(id) {
            self.walk(child);
        }
    }

    fn package(&mut self) -> PackageId {
        let name: &str = if self.namespace.is_empty() {
            GLOBAL_PACKAGE
        } else {
            &self.namespace
        };
        if let Some(id) = self.model.symbols.package(name) {
            return id;
        }
        let id = PackageId(next_index(self.model.packages.len()));
        self.model.symbols.insert_package(name, id);
        self.model.packages.push(Package {
            id,
            name: name.into(),
            types: Vec::new(),
            functions: Vec::new(),
        });
        debug!(package = name, "created package");
        id
    }

    fn duplicate(&mut self, what: &str, name: &str, node: NodeId) {
        self.diagnostics.push(Diagnostic::warning(
            DiagnosticKind::DuplicateSymbol,
            format!("{what} {name} is already declared; keeping the first declaration."),
            self.file(),
            self.tree.span(node),
        ));
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn register_type(&mut self, node: NodeId) {
        let tree = self.tree;
        let (kind, qualified_name, modifiers, parent, interfaces) = match tree.kind(node) {
            NodeKind::Class {
                name,
                modifiers,
                parent,
                interfaces,
            } => (
                TypeKind::Class,
                name,
                *modifiers,
                parent.clone().map(TypeReference::new),
                interfaces.iter().cloned().map(TypeReference::new).collect(),
            ),
            NodeKind::Interface { name, parents } => (
                TypeKind::Interface,
                name,
                Modifiers::default(),
                None,
                parents.iter().cloned().map(TypeReference::new).collect(),
            ),
            NodeKind::Trait { name } => (
                TypeKind::Trait,
                name,
                Modifiers::default(),
                None,
                Vec::new(),
            ),
            _ => return,
        };

        let id = TypeId(next_index(self.model.types.len()));
        if self
            .model
            .symbols
            .insert_type(qualified_name, id)
            .is_some()
        {
            self.duplicate("Type", qualified_name, node);
            return;
        }
        let package = self.package();

        let mut decl = TypeDecl {
            id,
            kind,
            name: unqualified(qualified_name),
            qualified_name: qualified_name.clone(),
            package,
            file: self.file(),
            node,
            modifiers,
            parent,
            interfaces,
            members: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            trait_uses: Vec::new(),
            doc_comment: tree.node(node).doc_comment().cloned(),
            composition: Composition::Pending,
        };
        for &member in tree.children(node) {
            self.register_member(&mut decl, member);
        }

        tree.node(node)
            .set_meta("type_id", MetaValue::Int(i64::from(id.0)));
        self.prime_late_bound(node, id, qualified_name);
        self.model.packages[package.index()].types.push(id);
        self.model.types.push(decl);
    }

    fn register_member(&mut self, decl: &mut TypeDecl, member: NodeId) {
        let tree = self.tree;
        match tree.kind(member) {
            NodeKind::Method { name, modifiers, .. } => {
                let id = CallableId(next_index(self.model.callables.len()));
                let qualified_name: EcoString =
                    format!("{}::{name}", decl.qualified_name).into();
                let callable = self.callable(
                    id,
                    CallableKind::Method { owner: decl.id },
                    name.clone(),
                    qualified_name,
                    member,
                    *modifiers,
                );
                self.model.callables.push(callable);
                decl.methods.push(id);
                decl.members.push(MemberId::Method(id));
            }
            NodeKind::PropertyDeclaration { modifiers } => {
                for &property in tree.children(member) {
                    let NodeKind::Property { name } = tree.kind(property) else {
                        continue;
                    };
                    let id = PropertyId(next_index(self.model.properties.len()));
                    self.model.properties.push(PropertyDecl {
                        id,
                        name: name.clone(),
                        owner: decl.id,
                        node: property,
                        modifiers: *modifiers,
                    });
                    decl.properties.push(id);
                    decl.members.push(MemberId::Property(id));
                }
            }
            NodeKind::ConstantDeclaration => {
                decl.constants
                    .extend(tree.children(member).iter().filter_map(|&c| {
                        match tree.kind(c) {
                            NodeKind::ConstantDeclarator { name } => Some(name.clone()),
                            _ => None,
                        }
                    }));
            }
            NodeKind::TraitUse { traits } => {
                decl.trait_uses.push(trait_use_clause(tree, member, traits));
            }
            _ => {}
        }
    }

    /// `self` and `static` inside a type body name that type. They are
    /// resolved here so later lookups skip the symbol table.
    fn prime_late_bound(&self, node: NodeId, id: TypeId, qualified_name: &str) {
        for descendant in self.tree.descendants(node) {
            let NodeKind::LateBound(reference) = self.tree.kind(descendant) else {
                continue;
            };
            let names_this_type = reference
                .target()
                .is_some_and(|target| target.eq_ignore_ascii_case(qualified_name));
            if reference.keyword() != LateBoundKeyword::Parent && names_this_type {
                reference.prime(id);
            }
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn register_function(&mut self, node: NodeId) {
        let NodeKind::Function { name, .. } = self.tree.kind(node) else {
            return;
        };
        let id = CallableId(next_index(self.model.callables.len()));
        if self.model.symbols.insert_function(name, id).is_some() {
            self.duplicate("Function", name, node);
            return;
        }
        let package = self.package();
        let callable = self.callable(
            id,
            CallableKind::Function { package },
            unqualified(name),
            name.clone(),
            node,
            Modifiers::default(),
        );
        self.model.callables.push(callable);
        self.model.packages[package.index()].functions.push(id);
    }

    /// Parameters and body come from the `[FormalParameters, Scope?]`
    /// children shared by functions and methods.
    fn callable(
        &self,
        id: CallableId,
        kind: CallableKind,
        name: EcoString,
        qualified_name: EcoString,
        node: NodeId,
        modifiers: Modifiers,
    ) -> Callable {
        let tree = self.tree;
        let mut parameters = Vec::new();
        let mut body = None;
        for &child in tree.children(node) {
            match tree.kind(child) {
                NodeKind::FormalParameters => {
                    parameters.extend(tree.children(child).iter().filter_map(|&p| {
                        match tree.kind(p) {
                            NodeKind::FormalParameter {
                                name,
                                type_hint,
                                by_ref,
                                variadic,
                            } => Some(Parameter {
                                name: name.clone(),
                                type_hint: type_hint.clone(),
                                by_ref: *by_ref,
                                variadic: *variadic,
                                has_default: !tree.children(p).is_empty(),
                            }),
                            _ => None,
                        }
                    }));
                }
                NodeKind::Scope => body = Some(child),
                _ => {}
            }
        }
        Callable {
            id,
            kind,
            name,
            qualified_name,
            file: self.file(),
            node,
            modifiers,
            parameters,
            body,
            doc_comment: tree.node(node).doc_comment().cloned(),
        }
    }
}

fn trait_use_clause(tree: &SyntaxTree, node: NodeId, traits: &[EcoString]) -> TraitUseClause {
    let mut clause = TraitUseClause {
        node,
        traits: traits.iter().cloned().map(TypeReference::new).collect(),
        precedences: Vec::new(),
        aliases: Vec::new(),
    };
    for &rule in tree.children(node) {
        let NodeKind::TraitAdaptation {
            trait_name,
            method,
            action,
        } = tree.kind(rule)
        else {
            continue;
        };
        match action {
            AdaptationAction::Precedence { excluded } => {
                let Some(trait_name) = trait_name else {
                    continue;
                };
                clause.precedences.push(PrecedenceRule {
                    trait_name: TypeReference::new(trait_name.clone()),
                    method: method.clone(),
                    excluded: excluded.iter().cloned().map(TypeReference::new).collect(),
                });
            }
            AdaptationAction::Alias { visibility, alias } => {
                clause.aliases.push(AliasRule {
                    trait_name: trait_name.clone().map(TypeReference::new),
                    method: method.clone(),
                    visibility: *visibility,
                    alias: alias.clone(),
                });
            }
        }
    }
    clause
}

/// The last segment of a qualified name.
fn unqualified(name: &str) -> EcoString {
    name.rsplit('\\').next().unwrap_or(name).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Visibility;
    use crate::test_helpers::build_sources;

    #[test]
    fn callables_carry_parameters_and_bodies() {
        let output = build_sources(&[(
            "a.php",
            "<?php namespace App;
             /** Greets. */
             function greet(string $name, &$out, int ...$rest) {}
             interface I { public function run($x = 1); }",
        )]);
        let model = &output.model;
        let greet = model.callable(model.symbols().function("app\\greet").unwrap());
        assert_eq!(greet.name(), "greet");
        assert_eq!(greet.qualified_name(), "App\\greet");
        assert_eq!(greet.doc_comment().map(EcoString::as_str), Some("/** Greets. */"));
        let params = greet.parameters();
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].type_hint.as_deref(), Some("string"));
        assert!(params[1].by_ref);
        assert!(params[2].variadic);
        assert!(greet.body().is_some());

        let run = model.callable(model.type_decl(TypeId(0)).methods()[0]);
        assert_eq!(run.qualified_name(), "App\\I::run");
        assert!(run.is_abstract());
        assert!(run.parameters()[0].has_default);
    }

    #[test]
    fn properties_and_constants_are_collected() {
        let output = build_sources(&[(
            "a.php",
            "<?php class A { const X = 1, Y = 2; private static $a, $b; var $c; }",
        )]);
        let model = &output.model;
        let a = model.type_decl(TypeId(0));
        let constants: Vec<_> = a.constants().iter().map(EcoString::as_str).collect();
        assert_eq!(constants, vec!["X", "Y"]);
        let props: Vec<_> = a
            .properties()
            .iter()
            .map(|&id| model.property(id))
            .collect();
        assert_eq!(props.len(), 3);
        assert!(props[1].is_static());
        assert_eq!(props[1].visibility(), Visibility::Private);
        assert_eq!(props[2].visibility(), Visibility::Public);
        assert_eq!(props[2].name(), "$c");
    }

    #[test]
    fn trait_use_rules_are_recorded() {
        let output = build_sources(&[(
            "a.php",
            "<?php namespace N; class C { use A, B { A::m insteadof B; B::m as protected bm; n as private; } }",
        )]);
        let c = output.model.type_decl(TypeId(0));
        let clause = &c.trait_uses()[0];
        assert_eq!(clause.traits.len(), 2);
        assert_eq!(clause.traits[1].name(), "N\\B");
        assert_eq!(clause.precedences.len(), 1);
        assert_eq!(clause.precedences[0].excluded[0].name(), "N\\B");
        assert_eq!(clause.aliases.len(), 2);
        assert_eq!(clause.aliases[0].alias.as_deref(), Some("bm"));
        assert_eq!(clause.aliases[1].trait_name, None);
        assert_eq!(clause.aliases[1].visibility, Some(Visibility::Private));
    }

    #[test]
    fn braced_namespaces_get_their_own_packages() {
        let output = build_sources(&[(
            "a.php",
            "<?php namespace A { class X {} } namespace B { class X {} } namespace { function f() {} }",
        )]);
        let model = &output.model;
        let names: Vec<_> = model.packages().iter().map(|p| p.name().as_str()).collect();
        assert_eq!(names, vec!["A", "B", GLOBAL_PACKAGE]);
        assert_eq!(model.types().len(), 2);
        assert_eq!(model.package(PackageId(2)).functions().len(), 1);
    }

    #[test]
    fn unqualified_takes_last_segment() {
        assert_eq!(unqualified("A\\B\\C"), "C");
        assert_eq!(unqualified("C"), "C");
    }
}
