// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Run-scoped symbol table and lazily resolved type references.
//!
//! Names are looked up case-insensitively and without a leading backslash.
//! A lookup never fails: an unknown name yields [`TypeRef::Unknown`].

use std::cell::OnceCell;
use std::collections::HashMap;

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use super::{CallableId, PackageId, TypeId, TypeRef};

fn key(name: &str) -> EcoString {
    name.trim_start_matches('\\').to_lowercase().into()
}

/// Qualified names of every declared type, function and package in a run.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    types: HashMap<EcoString, TypeId>,
    functions: HashMap<EcoString, CallableId>,
    packages: HashMap<EcoString, PackageId>,
}

impl SymbolTable {
    /// Registers a type. If the name is taken, the table is left unchanged
    /// and the existing id is returned.
    pub fn insert_type(&mut self, name: &str, id: TypeId) -> Option<TypeId> {
        insert_first(&mut self.types, name, id)
    }

    /// Registers a function, keeping the first declaration of a name.
    pub fn insert_function(&mut self, name: &str, id: CallableId) -> Option<CallableId> {
        insert_first(&mut self.functions, name, id)
    }

    pub fn insert_package(&mut self, name: &str, id: PackageId) -> Option<PackageId> {
        insert_first(&mut self.packages, name, id)
    }

    #[must_use]
    pub fn type_id(&self, name: &str) -> Option<TypeId> {
        self.types.get(&key(name)).copied()
    }

    /// Resolves a type name. Unknown names are a value, not an error.
    #[must_use]
    pub fn lookup_type(&self, name: &str) -> TypeRef {
        match self.type_id(name) {
            Some(id) => TypeRef::Declared(id),
            None => TypeRef::Unknown(name.trim_start_matches('\\').into()),
        }
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<CallableId> {
        self.functions.get(&key(name)).copied()
    }

    #[must_use]
    pub fn package(&self, name: &str) -> Option<PackageId> {
        self.packages.get(&key(name)).copied()
    }

    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

fn insert_first<T: Copy>(map: &mut HashMap<EcoString, T>, name: &str, id: T) -> Option<T> {
    let key = key(name);
    if let Some(existing) = map.get(&key) {
        return Some(*existing);
    }
    map.insert(key, id);
    None
}

/// A reference to a type by qualified name, resolved on first use.
///
/// The resolved value is cached and skipped by serde, so a restored model
/// resolves again against its own symbol table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeReference {
    name: EcoString,
    #[serde(skip)]
    resolved: OnceCell<TypeRef>,
}

impl TypeReference {
    #[must_use]
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self {
            name: name.into(),
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &EcoString {
        &self.name
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    pub fn resolve(&self, symbols: &SymbolTable) -> TypeRef {
        self.resolved
            .get_or_init(|| symbols.lookup_type(&self.name))
            .clone()
    }

    /// The declared type, if the name resolves to one.
    pub fn declared(&self, symbols: &SymbolTable) -> Option<TypeId> {
        self.resolve(symbols).declared()
    }
}

impl PartialEq for TypeReference {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeReference {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_ignores_leading_backslash() {
        let mut symbols = SymbolTable::default();
        symbols.insert_type("App\\Model\\User", TypeId(3));
        assert_eq!(symbols.lookup_type("app\\model\\USER"), TypeRef::Declared(TypeId(3)));
        assert_eq!(symbols.lookup_type("\\App\\Model\\User"), TypeRef::Declared(TypeId(3)));
    }

    #[test]
    fn unknown_name_is_a_value() {
        let symbols = SymbolTable::default();
        assert_eq!(symbols.lookup_type("\\Missing"), TypeRef::Unknown("Missing".into()));
    }

    #[test]
    fn first_registration_wins() {
        let mut symbols = SymbolTable::default();
        assert_eq!(symbols.insert_type("Foo", TypeId(0)), None);
        assert_eq!(symbols.insert_type("FOO", TypeId(1)), Some(TypeId(0)));
        assert_eq!(symbols.type_id("foo"), Some(TypeId(0)));
        assert_eq!(symbols.type_count(), 1);
    }

    #[test]
    fn type_reference_memoizes() {
        let mut symbols = SymbolTable::default();
        symbols.insert_type("Base", TypeId(1));
        let reference = TypeReference::new("Base");
        assert!(!reference.is_resolved());
        assert_eq!(reference.declared(&symbols), Some(TypeId(1)));
        assert!(reference.is_resolved());
        assert_eq!(
            reference.resolve(&SymbolTable::default()),
            TypeRef::Declared(TypeId(1))
        );
    }
}
