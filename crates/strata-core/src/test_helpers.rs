// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for unit tests.

use crate::ast::{FileId, NodeId, NodeKind, SyntaxTree};
use crate::builder::{BuildOutput, Builder};
use crate::source_analysis::{parse, ParseError};

/// Parses `source`, panicking with the errors if it does not parse.
pub fn parse_ok(source: &str) -> SyntaxTree {
    match parse(source, FileId(0)) {
        Ok(tree) => tree,
        Err(errors) => panic!("failed to parse {source:?}: {errors:?}"),
    }
}

/// Parses `source`, panicking if it parses cleanly.
pub fn parse_errors(source: &str) -> Vec<ParseError> {
    match parse(source, FileId(0)) {
        Ok(_) => panic!("expected errors for {source:?}"),
        Err(errors) => errors,
    }
}

/// The first node in pre-order whose kind matches.
pub fn find_first(tree: &SyntaxTree, predicate: impl Fn(&NodeKind) -> bool) -> Option<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .find(|&id| predicate(tree.kind(id)))
}

/// All nodes in pre-order whose kind matches.
pub fn find_all(tree: &SyntaxTree, predicate: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
    tree.descendants(tree.root())
        .into_iter()
        .filter(|&id| predicate(tree.kind(id)))
        .collect()
}

/// Builds a model from `(file name, source)` pairs.
pub fn build_sources(sources: &[(&str, &str)]) -> BuildOutput {
    let mut builder = Builder::new();
    for (name, source) in sources {
        builder.add_source(name, source);
    }
    builder.finish()
}
