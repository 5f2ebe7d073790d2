// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Trait composition.
//!
//! Each type's method table starts from its declared methods. Every used
//! trait then contributes its own composed table, so traits that use traits
//! are flattened recursively. A name contributed by more than one trait must
//! be settled by an `insteadof` directive; otherwise the type fails with a
//! [`MethodCollisionError`] and keeps only its declared methods.

// Spurious warnings from miette derive macro expansion
#![allow(unused_assignments)]

use std::collections::{HashMap, HashSet};

use ecow::EcoString;
use thiserror::Error;
use tracing::debug;

use crate::ast::{FileId, Visibility};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::model::{
    CodeModel, Composition, MethodBinding, MethodSource, MethodTable, TraitUseClause, TypeDecl,
    TypeId, TypeKind, TypeReference,
};
use crate::source_analysis::Span;

use super::node_span;

/// Two or more used traits provide a method and nothing picks one.
#[derive(Debug, Clone, PartialEq, Eq, Error, miette::Diagnostic)]
#[error(
    "Trait method {method} has not been applied, because there are collisions with other trait methods on {type_name}."
)]
#[diagnostic(code(strata::method_collision))]
pub struct MethodCollisionError {
    pub method: EcoString,
    pub type_name: EcoString,
    pub file: FileId,
    #[label("trait used here")]
    pub span: Span,
}

impl From<MethodCollisionError> for Diagnostic {
    fn from(error: MethodCollisionError) -> Self {
        Self::error(
            DiagnosticKind::MethodCollision,
            error.to_string(),
            error.file,
            error.span,
        )
    }
}

/// Composes every type of the model, in registration order.
pub(super) fn compose_all(model: &mut CodeModel, diagnostics: &mut Vec<Diagnostic>) {
    let results = {
        let mut composer = Composer::new(model);
        for index in 0..model.types.len() {
            composer.compose(TypeId(super::next_index(index)));
        }
        diagnostics.extend(composer.collisions.into_iter().map(Diagnostic::from));
        composer.state
    };
    for (decl, composition) in model.types.iter_mut().zip(results) {
        decl.composition = composition;
    }
}

/// A method offered by one used trait.
#[derive(Debug, Clone)]
struct Contribution {
    trait_id: TypeId,
    binding: MethodBinding,
    clause: usize,
}

enum Choice<'c> {
    Chosen(&'c Contribution),
    /// Every provider was excluded by a directive.
    Excluded,
    Collision,
}

struct Composer<'a> {
    model: &'a CodeModel,
    state: Vec<Composition>,
    in_progress: HashSet<TypeId>,
    collisions: Vec<MethodCollisionError>,
}

impl<'a> Composer<'a> {
    fn new(model: &'a CodeModel) -> Self {
        Self {
            model,
            state: vec![Composition::Pending; model.types.len()],
            in_progress: HashSet::new(),
            collisions: Vec::new(),
        }
    }

    /// The composed table of a type, or `None` once it failed.
    fn compose(&mut self, id: TypeId) -> Option<MethodTable> {
        match &self.state[id.index()] {
            Composition::Composed(table) => return Some(table.clone()),
            Composition::Failed => return None,
            Composition::Pending => {}
        }
        let model = self.model;
        let decl = model.type_decl(id);
        if !self.in_progress.insert(id) {
            debug!(name = %decl.qualified_name(), "trait use cycle, using declared methods");
            return Some(declared_table(model, decl));
        }

        let result = self.compose_uses(decl);
        self.in_progress.remove(&id);
        self.state[id.index()] = match &result {
            Some(table) => Composition::Composed(table.clone()),
            None => Composition::Failed,
        };
        result
    }

    fn compose_uses(&mut self, decl: &'a TypeDecl) -> Option<MethodTable> {
        let mut table = declared_table(self.model, decl);
        if decl.trait_uses().is_empty() {
            return Some(table);
        }

        let mut order: Vec<EcoString> = Vec::new();
        let mut contributions: HashMap<EcoString, Vec<Contribution>> = HashMap::new();
        for (clause_index, clause) in decl.trait_uses().iter().enumerate() {
            for reference in &clause.traits {
                let Some(trait_id) = self.used_trait(reference) else {
                    continue;
                };
                let trait_table = self
                    .compose(trait_id)
                    .unwrap_or_else(|| declared_table(self.model, self.model.type_decl(trait_id)));
                for binding in trait_table.iter() {
                    let key: EcoString = binding.name.to_lowercase().into();
                    let entry = contributions.entry(key.clone()).or_insert_with(|| {
                        order.push(key);
                        Vec::new()
                    });
                    if entry.iter().any(|c| c.trait_id == trait_id) {
                        continue;
                    }
                    entry.push(Contribution {
                        trait_id,
                        binding: binding.clone(),
                        clause: clause_index,
                    });
                }
            }
        }

        let mut failed = false;
        for key in &order {
            if table.contains(key) {
                continue;
            }
            let offered = &contributions[key];
            match self.choose(decl, key, offered) {
                Choice::Chosen(contribution) => {
                    table.insert(MethodBinding {
                        source: MethodSource::Trait(contribution.trait_id),
                        ..contribution.binding.clone()
                    });
                }
                Choice::Excluded => {}
                Choice::Collision => {
                    failed = true;
                    let last = offered.last().map_or(0, |c| c.clause);
                    let clause = &decl.trait_uses()[last];
                    self.collisions.push(MethodCollisionError {
                        method: offered[0].binding.name.clone(),
                        type_name: decl.qualified_name().clone(),
                        file: decl.file(),
                        span: node_span(self.model, decl.file(), clause.node),
                    });
                }
            }
        }
        if failed {
            return None;
        }

        for clause in decl.trait_uses() {
            self.apply_aliases(clause, &contributions, &mut table);
        }
        Some(table)
    }

    /// A used trait, or `None` for unknown names and non-traits.
    fn used_trait(&self, reference: &TypeReference) -> Option<TypeId> {
        let model = self.model;
        match model.resolve(reference) {
            Some(used) if used.kind() == TypeKind::Trait => Some(used.id()),
            Some(_) => {
                debug!(name = %reference.name(), "used type is not a trait, skipping");
                None
            }
            None => {
                debug!(name = %reference.name(), "unknown trait, skipping");
                None
            }
        }
    }

    /// Settles which contribution a method name binds to.
    ///
    /// `insteadof` removes the traits it lists. Of what remains, an abstract
    /// method yields to a concrete one, so exactly one concrete survivor (or
    /// only abstract survivors) is needed.
    fn choose<'c>(&self, decl: &TypeDecl, key: &str, offered: &'c [Contribution]) -> Choice<'c> {
        let excluded = self.excluded(decl, key);
        let survivors: Vec<&Contribution> = offered
            .iter()
            .filter(|c| !excluded.contains(&c.trait_id))
            .collect();
        let Some(&first) = survivors.first() else {
            return if offered.len() > 1 {
                Choice::Collision
            } else {
                Choice::Excluded
            };
        };
        let concrete: Vec<&Contribution> = survivors
            .iter()
            .copied()
            .filter(|c| !self.model.callable(c.binding.method).is_abstract())
            .collect();
        match concrete.as_slice() {
            [] => Choice::Chosen(first),
            [only] => Choice::Chosen(*only),
            _ => Choice::Collision,
        }
    }

    /// Traits that `insteadof` directives exclude for one method name.
    fn excluded(&self, decl: &TypeDecl, key: &str) -> HashSet<TypeId> {
        decl.trait_uses()
            .iter()
            .flat_map(|clause| &clause.precedences)
            .filter(|rule| rule.method.eq_ignore_ascii_case(key))
            .flat_map(|rule| &rule.excluded)
            .filter_map(|name| self.model.resolve(name).map(TypeDecl::id))
            .collect()
    }

    /// `m as alias` adds a binding, `m as visibility` changes one.
    fn apply_aliases(
        &self,
        clause: &TraitUseClause,
        contributions: &HashMap<EcoString, Vec<Contribution>>,
        table: &mut MethodTable,
    ) {
        for rule in &clause.aliases {
            let key: EcoString = rule.method.to_lowercase().into();
            let Some(offered) = contributions.get(&key) else {
                debug!(method = %rule.method, "alias for a method no trait provides");
                continue;
            };
            let source = match &rule.trait_name {
                Some(name) => {
                    let wanted = self.model.resolve(name).map(TypeDecl::id);
                    offered.iter().find(|c| Some(c.trait_id) == wanted)
                }
                None => offered.first(),
            };
            let Some(source) = source else {
                continue;
            };
            match &rule.alias {
                Some(alias) => {
                    table.insert(MethodBinding {
                        name: alias.clone(),
                        method: source.binding.method,
                        source: MethodSource::Alias {
                            trait_id: source.trait_id,
                        },
                        visibility: rule.visibility.unwrap_or(source.binding.visibility),
                    });
                }
                None => {
                    if let Some(visibility) = rule.visibility {
                        table.set_trait_visibility(&rule.method, visibility);
                    }
                }
            }
        }
    }
}

fn declared_table(model: &CodeModel, decl: &TypeDecl) -> MethodTable {
    let mut table = MethodTable::default();
    for &id in decl.methods() {
        let method = model.callable(id);
        table.insert(MethodBinding {
            name: method.name().clone(),
            method: id,
            source: MethodSource::Declared,
            visibility: method.visibility(),
        });
    }
    table
}

impl MethodTable {
    /// Changes the visibility of a binding that did not come from the type
    /// itself.
    fn set_trait_visibility(&mut self, name: &str, visibility: Visibility) {
        if let Some(binding) = self.get_mut(name) {
            if binding.source != MethodSource::Declared {
                binding.visibility = visibility;
            }
        }
    }
}
