// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `strata analyze`: build the code model for a set of paths, run the
//! analyzers and print the report.

use std::fs;
use std::rc::Rc;

use camino::Utf8PathBuf;
use miette::{Context, IntoDiagnostic, Result};
use strata_core::builder::{BuildOutput, Builder};
use strata_core::diagnostics::Severity;
use strata_core::metrics::{registry, Analyzer, Engine, TracingListener};
use tracing::{debug, info, instrument};

use crate::config::{self, Config, OutputFormat};
use crate::diagnostic::SourceDiagnostic;
use crate::discovery;
use crate::report::Report;

#[derive(Debug, Default)]
pub struct AnalyzeOptions {
    pub paths: Vec<Utf8PathBuf>,
    pub config: Option<Utf8PathBuf>,
    pub format: Option<OutputFormat>,
    pub exclude_packages: Vec<String>,
}

/// A finished analysis.
#[derive(Debug)]
pub struct Outcome {
    pub rendered: String,
    /// Error diagnostics produced while building the model.
    pub errors: usize,
    pub files: usize,
}

/// Prints the report; fails if any error diagnostic was produced.
pub fn execute(options: &AnalyzeOptions) -> Result<()> {
    let outcome = run(options)?;
    println!("{}", outcome.rendered);
    if outcome.errors > 0 {
        let plural = if outcome.errors == 1 { "" } else { "s" };
        miette::bail!(
            "{} error{plural} found in {} file(s)",
            outcome.errors,
            outcome.files
        );
    }
    Ok(())
}

/// Runs the analysis and renders the report. Diagnostics go to stderr.
#[instrument(skip_all, fields(paths = options.paths.len()))]
pub fn run(options: &AnalyzeOptions) -> Result<Outcome> {
    let Some(first) = options.paths.first() else {
        miette::bail!("No input paths given");
    };
    let config = config::load(options.config.as_deref(), first)?;

    // Unknown analyzer ids fail before any file is read.
    let analyzers = select_analyzers(&config)?;

    let files = discovery::discover(&options.paths, &config.analysis.suffixes)?;
    if files.is_empty() {
        miette::bail!("No source files found");
    }
    info!(files = files.len(), "analyzing");

    let (output, sources) = build(&files)?;
    let errors = print_diagnostics(&output, &sources);

    let filter = Rc::new(config.exclude_filter(&options.exclude_packages));
    let mut engine = Engine::new();
    for analyzer in analyzers {
        engine.register(analyzer)?;
    }
    engine.set_filter(filter.clone());
    engine.add_listener(Rc::new(TracingListener));
    let metrics = engine.run(&output.model)?;

    let report = Report::build(
        &output.model,
        &metrics,
        &config.translation_table(),
        filter.as_ref(),
    );
    let rendered = match options.format.unwrap_or(config.report.format) {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report
            .to_json()
            .into_diagnostic()
            .wrap_err("Failed to serialize report")?,
    };

    Ok(Outcome {
        rendered,
        errors,
        files: files.len(),
    })
}

fn select_analyzers(config: &Config) -> Result<Vec<Box<dyn Analyzer>>> {
    let analyzers = match &config.analysis.analyzers {
        Some(ids) => registry::create_with_dependencies(ids.as_slice())?,
        None => registry::create_all(),
    };
    debug!(
        analyzers = ?analyzers.iter().map(|a| a.id()).collect::<Vec<_>>(),
        "selected analyzers"
    );
    Ok(analyzers)
}

/// Parses every file. Sources are kept, indexed like the builder's file
/// ids, for rendering diagnostics.
fn build(files: &[Utf8PathBuf]) -> Result<(BuildOutput, Vec<String>)> {
    let mut builder = Builder::new();
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let bytes = fs::read(file)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read '{file}'"))?;
        if !builder.add_bytes(file.as_str(), &bytes) {
            debug!(file = %file, "file did not parse");
        }
        sources.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok((builder.finish(), sources))
}

/// Prints every diagnostic and returns the number of errors.
fn print_diagnostics(output: &BuildOutput, sources: &[String]) -> usize {
    let mut errors = 0;
    for diagnostic in &output.diagnostics {
        if diagnostic.severity == Severity::Error {
            errors += 1;
        }
        let name = output
            .file_name(diagnostic.file)
            .map_or("<unknown>", |name| name.as_str());
        let source = sources
            .get(diagnostic.file.0 as usize)
            .map_or("", String::as_str);
        let rendered = SourceDiagnostic::from_core_diagnostic(diagnostic, name, source);
        eprintln!("{:?}", miette::Report::new(rendered));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for (name, content) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        (temp, root)
    }

    fn options(root: &Utf8Path) -> AnalyzeOptions {
        AnalyzeOptions {
            paths: vec![root.to_path_buf()],
            ..AnalyzeOptions::default()
        }
    }

    #[test]
    fn analyzes_a_directory() {
        let (_temp, root) = project(&[
            ("src/a.php", "<?php class A {}"),
            ("src/b.php", "<?php class B extends A { function m($x) { if ($x) {} } }"),
        ]);
        let text = run(&options(&root)).unwrap().rendered;
        assert!(text.contains("roots"));
        assert!(text.contains("class B"));
        assert!(text.contains("(classes: 1, functions: 0)"));
    }

    #[test]
    fn json_format_from_config_file() {
        let (_temp, root) = project(&[
            ("strata.toml", "[report]\nformat = \"json\"\n"),
            ("src/a.php", "<?php function f() {}"),
        ]);
        let json = run(&options(&root)).unwrap().rendered;
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["project"]["functions"], 1.0);
        assert_eq!(value["project"]["files"], 1.0);
    }

    #[test]
    fn command_line_format_wins() {
        let (_temp, root) = project(&[
            ("strata.toml", "[report]\nformat = \"json\"\n"),
            ("a.php", "<?php class A {}"),
        ]);
        let mut opts = options(&root);
        opts.format = Some(OutputFormat::Text);
        assert!(run(&opts).unwrap().rendered.starts_with("Project"));
    }

    #[test]
    fn excluded_packages_are_not_reported() {
        let (_temp, root) = project(&[
            ("a.php", "<?php namespace App; class A {}"),
            ("b.php", "<?php namespace Tests; class ATest {}"),
        ]);
        let mut opts = options(&root);
        opts.exclude_packages = vec!["Tests".to_string()];
        let text = run(&opts).unwrap().rendered;
        assert!(text.contains("App\\A"));
        assert!(!text.contains("ATest"));
    }

    #[test]
    fn parse_errors_fail_the_run() {
        let (_temp, root) = project(&[("a.php", "<?php class {")]);
        let outcome = run(&options(&root)).unwrap();
        assert!(outcome.errors > 0);
        assert!(execute(&options(&root)).is_err());
    }

    #[test]
    fn duplicate_warnings_do_not_fail() {
        let (_temp, root) = project(&[("a.php", "<?php class A {} class A {}")]);
        assert_eq!(run(&options(&root)).unwrap().errors, 0);
    }

    #[test]
    fn unknown_analyzer_is_a_configuration_error() {
        let (_temp, root) = project(&[
            ("strata.toml", "[analysis]\nanalyzers = [\"coupling\"]\n"),
            ("a.php", "<?php class A {}"),
        ]);
        let error = run(&options(&root)).unwrap_err();
        assert!(error.to_string().contains("unknown analyzer 'coupling'"));
    }

    #[test]
    fn selected_analyzers_pull_in_dependencies() {
        let (_temp, root) = project(&[
            ("strata.toml", "[analysis]\nanalyzers = [\"class-level\"]\n"),
            ("a.php", "<?php class A { function m() {} }"),
        ]);
        let text = run(&options(&root)).unwrap().rendered;
        assert!(text.contains("wmc"));
        assert!(text.contains("ccn"));
        assert!(!text.contains("roots"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let (_temp, root) = project(&[]);
        assert!(run(&options(&root)).is_err());
    }
}
