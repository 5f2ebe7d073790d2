// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Double-dispatch traversal over code-model entities.
//!
//! Every entity has an `accept` method that calls the `visit_*` method for
//! its kind. The defaults walk on in declaration order: packages, then the
//! types and functions of each package, then the members of each type. An
//! override decides whether to descend by calling the matching `walk_*`
//! function.

use super::{Callable, CodeModel, MemberId, Package, PropertyDecl, TypeDecl, TypeKind};

#[allow(unused_variables)]
pub trait CodeVisitor {
    fn visit_package(&mut self, model: &CodeModel, package: &Package) {
        walk_package(self, model, package);
    }

    fn visit_class(&mut self, model: &CodeModel, class: &TypeDecl) {
        walk_type(self, model, class);
    }

    fn visit_interface(&mut self, model: &CodeModel, interface: &TypeDecl) {
        walk_type(self, model, interface);
    }

    fn visit_trait(&mut self, model: &CodeModel, trait_decl: &TypeDecl) {
        walk_type(self, model, trait_decl);
    }

    fn visit_function(&mut self, model: &CodeModel, function: &Callable) {}

    fn visit_method(&mut self, model: &CodeModel, method: &Callable) {}

    fn visit_property(&mut self, model: &CodeModel, property: &PropertyDecl) {}
}

/// Visits every package in registration order.
pub fn walk_model<V: CodeVisitor + ?Sized>(visitor: &mut V, model: &CodeModel) {
    for package in model.packages() {
        package.accept(model, visitor);
    }
}

/// Visits the types of a package, then its functions.
pub fn walk_package<V: CodeVisitor + ?Sized>(visitor: &mut V, model: &CodeModel, package: &Package) {
    for &id in package.types() {
        model.type_decl(id).accept(model, visitor);
    }
    for &id in package.functions() {
        model.callable(id).accept(model, visitor);
    }
}

/// Visits methods and properties in source order.
pub fn walk_type<V: CodeVisitor + ?Sized>(visitor: &mut V, model: &CodeModel, ty: &TypeDecl) {
    for member in ty.members() {
        match *member {
            MemberId::Method(id) => model.callable(id).accept(model, visitor),
            MemberId::Property(id) => model.property(id).accept(model, visitor),
        }
    }
}

impl Package {
    pub fn accept<V: CodeVisitor + ?Sized>(&self, model: &CodeModel, visitor: &mut V) {
        visitor.visit_package(model, self);
    }
}

impl TypeDecl {
    pub fn accept<V: CodeVisitor + ?Sized>(&self, model: &CodeModel, visitor: &mut V) {
        match self.kind {
            TypeKind::Class => visitor.visit_class(model, self),
            TypeKind::Interface => visitor.visit_interface(model, self),
            TypeKind::Trait => visitor.visit_trait(model, self),
        }
    }
}

impl Callable {
    pub fn accept<V: CodeVisitor + ?Sized>(&self, model: &CodeModel, visitor: &mut V) {
        if self.is_method() {
            visitor.visit_method(model, self);
        } else {
            visitor.visit_function(model, self);
        }
    }
}

impl PropertyDecl {
    pub fn accept<V: CodeVisitor + ?Sized>(&self, model: &CodeModel, visitor: &mut V) {
        visitor.visit_property(model, self);
    }
}
