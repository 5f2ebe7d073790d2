// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The code model: packages, types and callables of a run.
//!
//! **DDD Context:** Code Model
//!
//! Entities are stored in flat vectors inside [`CodeModel`] and refer to each
//! other by id. Cross-entity references by name ([`TypeReference`]) resolve
//! through the run's [`SymbolTable`] on first use. The model is produced by
//! [`Builder`](crate::builder::Builder) and read-only afterwards, apart from
//! the memo cells of references and node metadata.

mod symbols;
pub mod visitor;

use std::collections::BTreeMap;

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::ast::{FileId, Modifiers, NodeId, SyntaxTree, Visibility};

pub use symbols::{SymbolTable, TypeReference};
pub use visitor::{walk_model, walk_package, walk_type, CodeVisitor};

/// Name of the package holding declarations outside any namespace.
pub const GLOBAL_PACKAGE: &str = "+global";

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

entity_id!(
    /// Index of a [`TypeDecl`] in the model.
    TypeId
);
entity_id!(
    /// Index of a [`Callable`] in the model.
    CallableId
);
entity_id!(PropertyId);
entity_id!(PackageId);

/// The outcome of a type lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    Declared(TypeId),
    /// The name as looked up, or the late-bound keyword without a target.
    Unknown(EcoString),
}

impl TypeRef {
    #[must_use]
    pub fn declared(&self) -> Option<TypeId> {
        match self {
            Self::Declared(id) => Some(*id),
            Self::Unknown(_) => None,
        }
    }
}

/// Key of a metric map: a package, or any declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityId {
    Package(PackageId),
    Node(NodeId),
}

impl From<PackageId> for EntityId {
    fn from(id: PackageId) -> Self {
        Self::Package(id)
    }
}

impl From<NodeId> for EntityId {
    fn from(id: NodeId) -> Self {
        Self::Node(id)
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A parsed file and its tree.
#[derive(Debug)]
pub struct SourceFile {
    pub(crate) id: FileId,
    pub(crate) name: EcoString,
    pub(crate) tree: SyntaxTree,
}

impl SourceFile {
    #[must_use]
    pub fn id(&self) -> FileId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

/// A namespace and the declarations registered under it.
#[derive(Debug)]
pub struct Package {
    pub(crate) id: PackageId,
    pub(crate) name: EcoString,
    pub(crate) types: Vec<TypeId>,
    pub(crate) functions: Vec<CallableId>,
}

impl Package {
    #[must_use]
    pub fn id(&self) -> PackageId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    #[must_use]
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    #[must_use]
    pub fn functions(&self) -> &[CallableId] {
        &self.functions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
}

/// A method or property of a type, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberId {
    Method(CallableId),
    Property(PropertyId),
}

/// A class, interface or trait declaration.
#[derive(Debug)]
pub struct TypeDecl {
    pub(crate) id: TypeId,
    pub(crate) kind: TypeKind,
    pub(crate) name: EcoString,
    pub(crate) qualified_name: EcoString,
    pub(crate) package: PackageId,
    pub(crate) file: FileId,
    pub(crate) node: NodeId,
    pub(crate) modifiers: Modifiers,
    pub(crate) parent: Option<TypeReference>,
    pub(crate) interfaces: Vec<TypeReference>,
    pub(crate) members: Vec<MemberId>,
    pub(crate) methods: Vec<CallableId>,
    pub(crate) properties: Vec<PropertyId>,
    pub(crate) constants: Vec<EcoString>,
    pub(crate) trait_uses: Vec<TraitUseClause>,
    pub(crate) doc_comment: Option<EcoString>,
    pub(crate) composition: Composition,
}

impl TypeDecl {
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// The unqualified name.
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    #[must_use]
    pub fn qualified_name(&self) -> &EcoString {
        &self.qualified_name
    }

    #[must_use]
    pub fn package(&self) -> PackageId {
        self.package
    }

    #[must_use]
    pub fn file(&self) -> FileId {
        self.file
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Abstract classes, plus every interface and trait.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.kind != TypeKind::Class || self.modifiers.is_abstract
    }

    #[must_use]
    pub fn is_final(&self) -> bool {
        self.modifiers.is_final
    }

    /// The declared parent class. Interfaces list their parents in
    /// [`TypeDecl::interfaces`].
    #[must_use]
    pub fn parent(&self) -> Option<&TypeReference> {
        self.parent.as_ref()
    }

    /// Implemented interfaces of a class, extended interfaces of an
    /// interface.
    #[must_use]
    pub fn interfaces(&self) -> &[TypeReference] {
        &self.interfaces
    }

    #[must_use]
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Declared methods, in source order.
    #[must_use]
    pub fn methods(&self) -> &[CallableId] {
        &self.methods
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    #[must_use]
    pub fn constants(&self) -> &[EcoString] {
        &self.constants
    }

    #[must_use]
    pub fn trait_uses(&self) -> &[TraitUseClause] {
        &self.trait_uses
    }

    #[must_use]
    pub fn doc_comment(&self) -> Option<&EcoString> {
        self.doc_comment.as_ref()
    }

    #[must_use]
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The composed method table, absent when composition failed.
    #[must_use]
    pub fn method_table(&self) -> Option<&MethodTable> {
        match &self.composition {
            Composition::Composed(table) => Some(table),
            Composition::Pending | Composition::Failed => None,
        }
    }
}

/// A formal parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: EcoString,
    pub type_hint: Option<EcoString>,
    pub by_ref: bool,
    pub variadic: bool,
    pub has_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function { package: PackageId },
    Method { owner: TypeId },
}

/// A function or method.
#[derive(Debug)]
pub struct Callable {
    pub(crate) id: CallableId,
    pub(crate) kind: CallableKind,
    pub(crate) name: EcoString,
    pub(crate) qualified_name: EcoString,
    pub(crate) file: FileId,
    pub(crate) node: NodeId,
    pub(crate) modifiers: Modifiers,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) body: Option<NodeId>,
    pub(crate) doc_comment: Option<EcoString>,
}

impl Callable {
    #[must_use]
    pub fn id(&self) -> CallableId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> CallableKind {
        self.kind
    }

    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(self.kind, CallableKind::Method { .. })
    }

    #[must_use]
    pub fn owner(&self) -> Option<TypeId> {
        match self.kind {
            CallableKind::Method { owner } => Some(owner),
            CallableKind::Function { .. } => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    /// `Package\function` or `Package\Type::method`.
    #[must_use]
    pub fn qualified_name(&self) -> &EcoString {
        &self.qualified_name
    }

    #[must_use]
    pub fn file(&self) -> FileId {
        self.file
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract || self.body.is_none()
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The body block, absent for abstract and interface methods.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    #[must_use]
    pub fn doc_comment(&self) -> Option<&EcoString> {
        self.doc_comment.as_ref()
    }
}

/// A single declared property.
#[derive(Debug)]
pub struct PropertyDecl {
    pub(crate) id: PropertyId,
    pub(crate) name: EcoString,
    pub(crate) owner: TypeId,
    pub(crate) node: NodeId,
    pub(crate) modifiers: Modifiers,
}

impl PropertyDecl {
    #[must_use]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// The name including the `$` sigil.
    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    #[must_use]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.modifiers.visibility()
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

// ============================================================================
// Trait Composition
// ============================================================================

/// `T::m insteadof U, V`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecedenceRule {
    pub trait_name: TypeReference,
    pub method: EcoString,
    pub excluded: Vec<TypeReference>,
}

/// `[T::]m as [visibility] [alias]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    pub trait_name: Option<TypeReference>,
    pub method: EcoString,
    pub visibility: Option<Visibility>,
    pub alias: Option<EcoString>,
}

/// One `use` clause inside a type body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitUseClause {
    pub node: NodeId,
    pub traits: Vec<TypeReference>,
    pub precedences: Vec<PrecedenceRule>,
    pub aliases: Vec<AliasRule>,
}

/// Where a method of a composed table comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSource {
    Declared,
    Trait(TypeId),
    Alias { trait_id: TypeId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBinding {
    /// The name the method is callable under, as written.
    pub name: EcoString,
    pub method: CallableId,
    pub source: MethodSource,
    pub visibility: Visibility,
}

/// Methods of a type after trait composition, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodTable {
    bindings: BTreeMap<EcoString, MethodBinding>,
}

impl MethodTable {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodBinding> {
        self.bindings.get(name.to_lowercase().as_str())
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut MethodBinding> {
        self.bindings.get_mut(name.to_lowercase().as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Adds a binding unless the name is already bound. Returns whether it
    /// was added.
    pub fn insert(&mut self, binding: MethodBinding) -> bool {
        let key: EcoString = binding.name.to_lowercase().into();
        if self.bindings.contains_key(&key) {
            return false;
        }
        self.bindings.insert(key, binding);
        true
    }

    /// Bindings ordered by lowercase name.
    pub fn iter(&self) -> impl Iterator<Item = &MethodBinding> {
        self.bindings.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// State of a type's trait composition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Composition {
    #[default]
    Pending,
    Composed(MethodTable),
    /// A method collision was reported; the type keeps only its declared
    /// methods.
    Failed,
}

// ============================================================================
// Code Model
// ============================================================================

/// Everything the builder produced for one run.
#[derive(Debug, Default)]
pub struct CodeModel {
    pub(crate) files: Vec<SourceFile>,
    pub(crate) packages: Vec<Package>,
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) callables: Vec<Callable>,
    pub(crate) properties: Vec<PropertyDecl>,
    pub(crate) symbols: SymbolTable,
}

impl CodeModel {
    /// Packages in registration order.
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    #[must_use]
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    #[must_use]
    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    #[must_use]
    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    #[must_use]
    pub fn callables(&self) -> &[Callable] {
        &self.callables
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    #[must_use]
    pub fn callable(&self, id: CallableId) -> &Callable {
        &self.callables[id.index()]
    }

    /// # Panics
    ///
    /// Panics if `id` does not belong to this model.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> &PropertyDecl {
        &self.properties[id.index()]
    }

    /// Successfully parsed files, ordered by id.
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// A parsed file. Files that failed to parse have no entry.
    #[must_use]
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files
            .binary_search_by_key(&id, SourceFile::id)
            .ok()
            .map(|index| &self.files[index])
    }

    /// The tree a node belongs to.
    #[must_use]
    pub fn tree(&self, node: NodeId) -> Option<&SyntaxTree> {
        self.file(node.file()).map(SourceFile::tree)
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[must_use]
    pub fn lookup_type(&self, name: &str) -> TypeRef {
        self.symbols.lookup_type(name)
    }

    /// The declared type a reference points at.
    #[must_use]
    pub fn resolve(&self, reference: &TypeReference) -> Option<&TypeDecl> {
        reference
            .declared(&self.symbols)
            .map(|id| self.type_decl(id))
    }

    /// The declared parent class, if it resolves.
    #[must_use]
    pub fn parent_of(&self, ty: &TypeDecl) -> Option<&TypeDecl> {
        ty.parent().and_then(|parent| self.resolve(parent))
    }

    #[must_use]
    pub fn method_table(&self, id: TypeId) -> Option<&MethodTable> {
        self.type_decl(id).method_table()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::build_sources;

    #[test]
    fn packages_in_registration_order() {
        let output = build_sources(&[
            ("a.php", "<?php class Top {} namespace App; class A {}"),
            ("b.php", "<?php namespace Lib; function f() {}"),
        ]);
        let names: Vec<_> = output
            .model
            .packages()
            .iter()
            .map(|p| p.name().as_str())
            .collect();
        assert_eq!(names, vec![GLOBAL_PACKAGE, "App", "Lib"]);
    }

    #[test]
    fn parent_resolution_across_files() {
        let output = build_sources(&[
            ("child.php", "<?php namespace App; class Child extends Base {}"),
            ("base.php", "<?php namespace App; abstract class Base {}"),
        ]);
        let model = &output.model;
        let child = model.lookup_type("app\\child").declared().unwrap();
        let parent = model.parent_of(model.type_decl(child)).unwrap();
        assert_eq!(parent.qualified_name(), "App\\Base");
        assert!(parent.is_abstract());
    }

    #[test]
    fn unresolved_parent_is_unknown() {
        let output = build_sources(&[("a.php", "<?php class A extends \\Vendor\\Missing {}")]);
        let model = &output.model;
        let a = model.type_decl(TypeId(0));
        assert_eq!(
            a.parent().unwrap().resolve(model.symbols()),
            TypeRef::Unknown("Vendor\\Missing".into())
        );
        assert!(model.parent_of(a).is_none());
    }

    #[test]
    fn members_keep_source_order() {
        let output = build_sources(&[(
            "a.php",
            "<?php class A { public $x; function a() {} protected $y; function b() {} }",
        )]);
        let a = output.model.type_decl(TypeId(0));
        assert!(matches!(
            a.members(),
            [
                MemberId::Property(_),
                MemberId::Method(_),
                MemberId::Property(_),
                MemberId::Method(_)
            ]
        ));
        assert_eq!(a.methods().len(), 2);
        assert_eq!(a.properties().len(), 2);
    }

    #[test]
    fn method_table_insert_keeps_first() {
        let mut table = MethodTable::default();
        let binding = |name: &str, id| MethodBinding {
            name: name.into(),
            method: CallableId(id),
            source: MethodSource::Declared,
            visibility: Visibility::Public,
        };
        assert!(table.insert(binding("Run", 0)));
        assert!(!table.insert(binding("run", 1)));
        assert_eq!(table.get("RUN").map(|b| b.method), Some(CallableId(0)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn file_lookup_skips_failed_files() {
        let output = build_sources(&[
            ("ok.php", "<?php $a = 1;"),
            ("bad.php", "<?php $a = ;"),
            ("ok2.php", "<?php $b = 2;"),
        ]);
        let model = &output.model;
        assert_eq!(model.files().len(), 2);
        assert!(model.file(FileId(0)).is_some());
        assert!(model.file(FileId(1)).is_none());
        assert_eq!(model.file(FileId(2)).map(|f| f.name().as_str()), Some("ok2.php"));
    }
}
