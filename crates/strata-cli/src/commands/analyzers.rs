// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `strata analyzers`: list the built-in analyzers.

use std::fmt::Write as _;

use strata_core::metrics::registry;

/// One line per analyzer: id, capabilities and dependencies.
pub fn listing() -> String {
    let mut out = String::new();
    for analyzer in registry::create_all() {
        let _ = write!(out, "{:<24} [{}]", analyzer.id(), analyzer.capabilities());
        let dependencies = analyzer.dependencies();
        if !dependencies.is_empty() {
            let _ = write!(out, " depends on {}", dependencies.join(", "));
        }
        out.push('\n');
    }
    out
}
