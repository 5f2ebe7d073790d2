// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Filters deciding which entities filter-aware analyzers measure.

use ecow::EcoString;

use crate::model::{Callable, CallableKind, CodeModel, Package, TypeDecl};

pub trait NodeFilter {
    fn accept_package(&self, package: &Package) -> bool;

    fn accept_type(&self, model: &CodeModel, ty: &TypeDecl) -> bool;

    fn accept_function(&self, model: &CodeModel, function: &Callable) -> bool;
}

/// Accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl NodeFilter for AcceptAll {
    fn accept_package(&self, _package: &Package) -> bool {
        true
    }

    fn accept_type(&self, _model: &CodeModel, _ty: &TypeDecl) -> bool {
        true
    }

    fn accept_function(&self, _model: &CodeModel, _function: &Callable) -> bool {
        true
    }
}

/// Rejects packages by name and files by path prefix.
///
/// A package pattern ending in `*` matches every package that starts with
/// the text before it; any other pattern must match the whole name. Package
/// names compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    packages: Vec<EcoString>,
    paths: Vec<EcoString>,
}

impl ExcludeFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exclude_package(mut self, pattern: impl Into<EcoString>) -> Self {
        self.packages.push(pattern.into());
        self
    }

    #[must_use]
    pub fn exclude_path(mut self, prefix: impl Into<EcoString>) -> Self {
        self.paths.push(prefix.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty() && self.paths.is_empty()
    }

    fn package_excluded(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.packages.iter().any(|pattern| {
            let pattern = pattern.to_lowercase();
            match pattern.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => name == pattern,
            }
        })
    }

    fn path_excluded(&self, model: &CodeModel, file: crate::ast::FileId) -> bool {
        let Some(source) = model.file(file) else {
            return false;
        };
        self.paths
            .iter()
            .any(|prefix| source.name().starts_with(prefix.as_str()))
    }
}

impl NodeFilter for ExcludeFilter {
    fn accept_package(&self, package: &Package) -> bool {
        !self.package_excluded(package.name())
    }

    fn accept_type(&self, model: &CodeModel, ty: &TypeDecl) -> bool {
        self.accept_package(model.package(ty.package())) && !self.path_excluded(model, ty.file())
    }

    fn accept_function(&self, model: &CodeModel, function: &Callable) -> bool {
        let package_ok = match function.kind() {
            CallableKind::Function { package } => self.accept_package(model.package(package)),
            CallableKind::Method { owner } => {
                self.accept_package(model.package(model.type_decl(owner).package()))
            }
        };
        package_ok && !self.path_excluded(model, function.file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeId;
    use crate::test_helpers::build_sources;

    #[test]
    fn trailing_star_matches_prefix() {
        let filter = ExcludeFilter::new().exclude_package("Vendor\\*");
        assert!(filter.package_excluded("Vendor\\Lib"));
        assert!(filter.package_excluded("vendor\\lib\\deep"));
        assert!(!filter.package_excluded("App"));
    }

    #[test]
    fn plain_pattern_matches_whole_name() {
        let filter = ExcludeFilter::new().exclude_package("App");
        assert!(filter.package_excluded("app"));
        assert!(!filter.package_excluded("App\\Sub"));
    }

    #[test]
    fn path_prefix_rejects_types_and_functions() {
        let output = build_sources(&[
            ("src/a.php", "<?php class A {}"),
            ("vendor/b.php", "<?php class B {} function f() {}"),
        ]);
        let model = &output.model;
        let filter = ExcludeFilter::new().exclude_path("vendor/");
        assert!(filter.accept_type(model, model.type_decl(TypeId(0))));
        assert!(!filter.accept_type(model, model.type_decl(TypeId(1))));
        let f = model.callable(model.symbols().function("f").unwrap());
        assert!(!filter.accept_function(model, f));
        assert!(filter.accept_package(&model.packages()[0]));
    }

    #[test]
    fn accept_all_accepts() {
        let output = build_sources(&[("a.php", "<?php namespace X; class A {}")]);
        let model = &output.model;
        assert!(AcceptAll.accept_package(&model.packages()[0]));
        assert!(AcceptAll.accept_type(model, model.type_decl(TypeId(0))));
    }
}
