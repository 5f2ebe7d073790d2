// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The built-in analyzers, created by id.

use ecow::EcoString;

use super::{
    Analyzer, ClassLevelAnalyzer, ConfigError, CyclomaticComplexityAnalyzer, HierarchyAnalyzer,
    NodeCountAnalyzer,
};

type Constructor = fn() -> Box<dyn Analyzer>;

/// One constructor per built-in analyzer.
fn constructors() -> [Constructor; 4] {
    [
        || Box::new(ClassLevelAnalyzer::new()),
        || Box::new(CyclomaticComplexityAnalyzer::new()),
        || Box::new(HierarchyAnalyzer::new()),
        || Box::new(NodeCountAnalyzer::new()),
        // ── add new analyzers here (alphabetical) ─────────────────────────
    ]
}

/// Ids of every built-in analyzer.
#[must_use]
pub fn ids() -> Vec<&'static str> {
    create_all().iter().map(|analyzer| analyzer.id()).collect()
}

/// A fresh instance of every built-in analyzer.
#[must_use]
pub fn create_all() -> Vec<Box<dyn Analyzer>> {
    constructors().into_iter().map(|create| create()).collect()
}

/// A fresh instance of the analyzer `id`.
///
/// # Errors
///
/// [`ConfigError::UnknownAnalyzer`] if no built-in analyzer has that id.
pub fn create(id: &str) -> Result<Box<dyn Analyzer>, ConfigError> {
    constructors()
        .into_iter()
        .map(|create| create())
        .find(|analyzer| analyzer.id() == id)
        .ok_or_else(|| ConfigError::UnknownAnalyzer(EcoString::from(id)))
}

/// The requested analyzers plus everything they depend on, each once.
/// Dependencies come before their dependents.
///
/// # Errors
///
/// [`ConfigError::UnknownAnalyzer`] for an unknown requested id.
pub fn create_with_dependencies<S: AsRef<str>>(
    ids: &[S],
) -> Result<Vec<Box<dyn Analyzer>>, ConfigError> {
    let mut created: Vec<Box<dyn Analyzer>> = Vec::new();
    for id in ids {
        include(id.as_ref(), &mut created)?;
    }
    Ok(created)
}

fn include(id: &str, created: &mut Vec<Box<dyn Analyzer>>) -> Result<(), ConfigError> {
    if created.iter().any(|analyzer| analyzer.id() == id) {
        return Ok(());
    }
    let analyzer = create(id)?;
    for dependency in analyzer.dependencies() {
        include(dependency, created)?;
    }
    created.push(analyzer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{Engine, TranslationTable};
    use crate::test_helpers::build_sources;

    #[test]
    fn ids_are_unique_and_sorted() {
        let ids = ids();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(
            ids,
            vec!["class-level", "cyclomatic-complexity", "hierarchy", "node-count"]
        );
    }

    #[test]
    fn create_by_id() {
        assert_eq!(create("hierarchy").unwrap().id(), "hierarchy");
        assert!(matches!(
            create("coupling"),
            Err(ConfigError::UnknownAnalyzer(id)) if id == "coupling"
        ));
    }

    #[test]
    fn dependencies_are_included_first() {
        let created = create_with_dependencies(&["class-level", "hierarchy"]).unwrap();
        let ids: Vec<_> = created.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["cyclomatic-complexity", "class-level", "hierarchy"]);
    }

    #[test]
    fn repeated_requests_create_once() {
        let created =
            create_with_dependencies(&["cyclomatic-complexity", "class-level", "class-level"])
                .unwrap();
        assert_eq!(created.len(), 2);
    }

    #[test]
    fn unknown_request_fails() {
        assert!(matches!(
            create_with_dependencies(&["hierarchy", "nope"]),
            Err(ConfigError::UnknownAnalyzer(id)) if id == "nope"
        ));
    }

    #[test]
    fn built_in_analyzers_run_together() {
        let output = build_sources(&[(
            "a.php",
            "<?php abstract class A { function m($x) { return $x && $x ? 1 : 2; } }
             class B extends A { public $p; }
             function f() {}",
        )]);
        let mut engine = Engine::new();
        for analyzer in create_all() {
            engine.register(analyzer).unwrap();
        }
        let report = engine.run(&output.model).unwrap();

        let project = report.merged_project_metrics(&TranslationTable::phpunit());
        assert_eq!(project["ccn"], 4.0);
        assert_eq!(project["classes"], 2.0);
        assert_eq!(project["functions"], 1.0);
        assert_eq!(project["clsa"], 1.0);
        assert_eq!(project["roots"], 1.0);
        assert!(!project.contains_key("ccn2"));

        let b = output.model.types()[1].node();
        let metrics = report.node_metrics(b.into());
        assert_eq!(metrics["dit"], 1.0);
        assert_eq!(metrics["varsi"], 1.0);
        assert_eq!(metrics["nom"], 0.0);

        let a = output.model.types()[0].node();
        assert_eq!(report.node_metrics(a.into())["wmc"], 2.0);
    }
}
