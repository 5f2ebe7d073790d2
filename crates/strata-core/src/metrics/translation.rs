// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Metric renaming applied when results from several analyzers are merged.

use ecow::EcoString;

use super::MetricMap;

/// Ordered `from -> to` renames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    entries: Vec<(EcoString, EcoString)>,
}

impl TranslationTable {
    /// No renames.
    #[must_use]
    pub fn identity() -> Self {
        Self::default()
    }

    /// The names PHPUnit's metrics log uses.
    #[must_use]
    pub fn phpunit() -> Self {
        [
            ("ccn2", "ccn"),
            ("noc", "classes"),
            ("noi", "interfs"),
            ("nof", "functions"),
            ("eloc", "locExecutable"),
            ("maxDIT", "maxdit"),
        ]
        .into_iter()
        .fold(Self::identity(), |table, (from, to)| table.with(from, to))
    }

    /// Appends a rename, applied after the existing ones.
    #[must_use]
    pub fn with(mut self, from: impl Into<EcoString>, to: impl Into<EcoString>) -> Self {
        self.entries.push((from.into(), to.into()));
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = (&EcoString, &EcoString)> {
        self.entries.iter().map(|(from, to)| (from, to))
    }

    /// Applies each rename in order: a present `from` overwrites `to` and is
    /// removed.
    #[must_use]
    pub fn apply(&self, mut metrics: MetricMap) -> MetricMap {
        for (from, to) in &self.entries {
            if let Some(value) = metrics.remove(from) {
                metrics.insert(to.clone(), value);
            }
        }
        metrics
    }
}
