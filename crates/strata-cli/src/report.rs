// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The metrics report printed after a run.
//!
//! **DDD Context:** Metrics
//!
//! Files are keyed by name, so a name seen twice yields one entry. Only
//! files declaring at least one measured type or function appear.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use ecow::EcoString;
use serde::Serialize;
use strata_core::ast::NodeId;
use strata_core::metrics::{MetricMap, MetricsReport, NodeFilter, TranslationTable};
use strata_core::model::{Callable, CodeModel, TypeDecl, TypeKind};

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Report {
    pub project: MetricMap,
    pub files: Vec<FileReport>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct FileReport {
    pub name: EcoString,
    /// Classes and interfaces declared in the file.
    pub classes: usize,
    pub functions: usize,
    pub types: Vec<TypeReport>,
    #[serde(rename = "functionMetrics")]
    pub function_metrics: Vec<EntityReport>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct TypeReport {
    pub name: EcoString,
    pub kind: &'static str,
    pub metrics: MetricMap,
    pub methods: Vec<EntityReport>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct EntityReport {
    pub name: EcoString,
    pub metrics: MetricMap,
}

impl Report {
    pub fn build(
        model: &CodeModel,
        metrics: &MetricsReport<'_>,
        table: &TranslationTable,
        filter: &dyn NodeFilter,
    ) -> Self {
        let mut files: BTreeMap<EcoString, FileReport> = BTreeMap::new();
        let file_name = |file| {
            model
                .file(file)
                .map_or_else(EcoString::new, |source| source.name().clone())
        };
        let node_metrics = |node: NodeId| table.apply(metrics.node_metrics(node.into()));

        for ty in model.types() {
            if !filter.accept_type(model, ty) {
                continue;
            }
            let entry = file_entry(&mut files, file_name(ty.file()));
            if ty.kind() != TypeKind::Trait {
                entry.classes += 1;
            }
            entry.types.push(TypeReport {
                name: ty.qualified_name().clone(),
                kind: kind_name(ty),
                metrics: node_metrics(ty.node()),
                methods: ty
                    .methods()
                    .iter()
                    .map(|&id| entity(model.callable(id), node_metrics(model.callable(id).node())))
                    .collect(),
            });
        }

        for function in model.callables().iter().filter(|c| !c.is_method()) {
            if !filter.accept_function(model, function) {
                continue;
            }
            let entry = file_entry(&mut files, file_name(function.file()));
            entry.functions += 1;
            entry
                .function_metrics
                .push(entity(function, node_metrics(function.node())));
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "file counts are far below f64's exact integer range"
        )]
        let file_count = files.len() as f64;
        let mut project = metrics.merged_project_metrics(table);
        project.insert("files".into(), file_count);

        Self {
            project,
            files: files.into_values().collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Project");
        write_metrics(&mut out, "  ", &self.project);
        for file in &self.files {
            let _ = writeln!(
                out,
                "\n{} (classes: {}, functions: {})",
                file.name, file.classes, file.functions
            );
            for ty in &file.types {
                let _ = writeln!(out, "  {} {}", ty.kind, ty.name);
                write_metrics(&mut out, "    ", &ty.metrics);
                for method in &ty.methods {
                    let _ = writeln!(out, "    method {}", method.name);
                    write_metrics(&mut out, "      ", &method.metrics);
                }
            }
            for function in &file.function_metrics {
                let _ = writeln!(out, "  function {}", function.name);
                write_metrics(&mut out, "    ", &function.metrics);
            }
        }
        out
    }
}

fn file_entry(files: &mut BTreeMap<EcoString, FileReport>, name: EcoString) -> &mut FileReport {
    files.entry(name.clone()).or_insert_with(|| FileReport {
        name,
        ..FileReport::default()
    })
}

fn entity(callable: &Callable, metrics: MetricMap) -> EntityReport {
    EntityReport {
        name: callable.qualified_name().clone(),
        metrics,
    }
}

fn kind_name(ty: &TypeDecl) -> &'static str {
    match ty.kind() {
        TypeKind::Class => "class",
        TypeKind::Interface => "interface",
        TypeKind::Trait => "trait",
    }
}

fn write_metrics(out: &mut String, indent: &str, metrics: &MetricMap) {
    for (name, value) in metrics {
        let _ = writeln!(out, "{indent}{name:<14} {value}");
    }
}
