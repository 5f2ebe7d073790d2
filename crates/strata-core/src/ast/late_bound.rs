// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `self`, `parent` and `static` references.
//!
//! The parser records the lexical target name when it is known. Resolution
//! goes through the symbol table on first access and is cached in a cell
//! that is skipped by serde, so a restored tree resolves again on demand.

use std::cell::OnceCell;
use std::fmt;

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::model::{SymbolTable, TypeId, TypeRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LateBoundKeyword {
    SelfType,
    Parent,
    Static,
}

impl LateBoundKeyword {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SelfType => "self",
            Self::Parent => "parent",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for LateBoundKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateBoundReference {
    keyword: LateBoundKeyword,
    target: Option<EcoString>,
    #[serde(skip)]
    resolved: OnceCell<TypeRef>,
}

impl LateBoundReference {
    #[must_use]
    pub fn new(keyword: LateBoundKeyword, target: Option<EcoString>) -> Self {
        Self {
            keyword,
            target,
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn keyword(&self) -> LateBoundKeyword {
        self.keyword
    }

    /// Qualified name of the lexical target, if known at parse time.
    #[must_use]
    pub fn target(&self) -> Option<&EcoString> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Records a target that is already known. Has no effect once resolved.
    pub fn prime(&self, ty: TypeId) {
        let _ = self.resolved.set(TypeRef::Declared(ty));
    }

    /// Returns the cached type, or looks the target up and caches it.
    pub fn resolve(&self, symbols: &SymbolTable) -> TypeRef {
        self.resolved
            .get_or_init(|| match &self.target {
                Some(name) => symbols.lookup_type(name),
                None => TypeRef::Unknown(self.keyword.as_str().into()),
            })
            .clone()
    }
}

// The cache is derived state and does not take part in equality.
impl PartialEq for LateBoundReference {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword && self.target == other.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_memoizes_lookup() {
        let mut symbols = SymbolTable::default();
        symbols.insert_type("App\\Foo", TypeId(0));
        let reference = LateBoundReference::new(LateBoundKeyword::SelfType, Some("App\\Foo".into()));
        assert!(!reference.is_resolved());
        assert_eq!(reference.resolve(&symbols), TypeRef::Declared(TypeId(0)));
        assert!(reference.is_resolved());

        // A different table does not change a cached answer.
        let empty = SymbolTable::default();
        assert_eq!(reference.resolve(&empty), TypeRef::Declared(TypeId(0)));
    }

    #[test]
    fn cache_is_not_serialized() {
        let mut symbols = SymbolTable::default();
        symbols.insert_type("Foo", TypeId(7));
        let reference = LateBoundReference::new(LateBoundKeyword::Static, Some("Foo".into()));
        reference.prime(TypeId(7));

        let json = serde_json::to_string(&reference).unwrap();
        let restored: LateBoundReference = serde_json::from_str(&json).unwrap();
        assert!(!restored.is_resolved());
        assert_eq!(restored, reference);
        assert_eq!(restored.resolve(&symbols), TypeRef::Declared(TypeId(7)));
    }

    #[test]
    fn missing_target_is_unknown() {
        let reference = LateBoundReference::new(LateBoundKeyword::Parent, None);
        assert_eq!(
            reference.resolve(&SymbolTable::default()),
            TypeRef::Unknown("parent".into())
        );
    }
}
