// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `strata.toml` parsing.
//!
//! **DDD Context:** Configuration
//!
//! Every section and key is optional:
//!
//! ```toml
//! [analysis]
//! analyzers = ["hierarchy", "class-level"]   # default: all
//! suffixes = ["php", "inc"]                  # default: ["php"]
//!
//! [filter]
//! exclude-packages = ["Vendor\\*"]
//! exclude-paths = ["vendor/"]
//!
//! [report]
//! format = "json"                            # default: "text"
//! translation = "none"                       # default: "phpunit"
//! rename = { wmc = "weightedMethods" }
//! ```

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;
use strata_core::metrics::{ExcludeFilter, TranslationTable};
use tracing::debug;

/// Name of the configuration file looked up from the inputs upwards.
pub const CONFIG_FILE: &str = "strata.toml";

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub filter: FilterConfig,
    pub report: ReportConfig,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Analyzer ids to run; `None` runs every built-in analyzer.
    pub analyzers: Option<Vec<String>>,
    /// File name suffixes treated as source files, without the dot.
    pub suffixes: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analyzers: None,
            suffixes: vec!["php".to_string()],
        }
    }
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilterConfig {
    pub exclude_packages: Vec<String>,
    pub exclude_paths: Vec<String>,
}

#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub format: OutputFormat,
    pub translation: Translation,
    /// Extra renames applied after the base translation.
    pub rename: BTreeMap<String, String>,
}

/// How the report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Base metric naming for merged results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Translation {
    #[default]
    Phpunit,
    #[serde(rename = "none")]
    Identity,
}

impl Config {
    /// Exclusions from the file plus `extra_packages` from the command line.
    pub fn exclude_filter(&self, extra_packages: &[String]) -> ExcludeFilter {
        let packages = self.filter.exclude_packages.iter().chain(extra_packages);
        let filter = packages.fold(ExcludeFilter::new(), |filter, pattern| {
            filter.exclude_package(pattern.as_str())
        });
        self.filter
            .exclude_paths
            .iter()
            .fold(filter, |filter, prefix| filter.exclude_path(prefix.as_str()))
    }

    pub fn translation_table(&self) -> TranslationTable {
        let base = match self.report.translation {
            Translation::Phpunit => TranslationTable::phpunit(),
            Translation::Identity => TranslationTable::identity(),
        };
        self.report
            .rename
            .iter()
            .fold(base, |table, (from, to)| table.with(from.as_str(), to.as_str()))
    }
}

/// Parses one configuration file.
pub fn parse_config(path: &Utf8Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read config '{path}'"))?;

    toml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse config '{path}'"))
}

/// The nearest `strata.toml` in `start` or one of its ancestors.
///
/// A file path starts the search at its directory.
pub fn find_config(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let dir = if start.is_file() { start.parent()? } else { start };
    dir.ancestors()
        .map(|ancestor| ancestor.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

/// The explicit config if given, else the nearest one above `first_input`,
/// else defaults.
pub fn load(explicit: Option<&Utf8Path>, first_input: &Utf8Path) -> Result<Config> {
    if let Some(path) = explicit {
        return parse_config(path);
    }
    match find_config(first_input) {
        Some(path) => {
            debug!(config = %path, "using configuration file");
            parse_config(&path)
        }
        None => {
            debug!("no configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.analysis.suffixes, vec!["php"]);
        assert_eq!(config.report.format, OutputFormat::Text);
        assert_eq!(config.translation_table(), TranslationTable::phpunit());
    }

    #[test]
    fn full_file_parses() {
        let config: Config = toml::from_str(
            r#"
[analysis]
analyzers = ["hierarchy"]
suffixes = ["php", "inc"]

[filter]
exclude-packages = ["Vendor\\*"]
exclude-paths = ["vendor/"]

[report]
format = "json"
translation = "none"
rename = { wmc = "weighted" }
"#,
        )
        .unwrap();
        assert_eq!(config.analysis.analyzers, Some(vec!["hierarchy".to_string()]));
        assert_eq!(config.analysis.suffixes, vec!["php", "inc"]);
        assert_eq!(config.filter.exclude_packages, vec!["Vendor\\*"]);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(
            config.translation_table(),
            TranslationTable::identity().with("wmc", "weighted")
        );
        assert!(!config.exclude_filter(&[]).is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp_root(&temp).join(CONFIG_FILE);
        fs::write(&path, "[analysis]\nanalyser = []\n").unwrap();
        let error = parse_config(&path).unwrap_err();
        assert!(format!("{error:?}").contains("Failed to parse config"));
    }

    #[test]
    fn config_is_found_in_an_ancestor() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        fs::write(root.join(CONFIG_FILE), "[report]\nformat = \"json\"\n").unwrap();
        let nested = root.join("src/App");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("a.php"), "<?php").unwrap();

        assert_eq!(find_config(&nested.join("a.php")), Some(root.join(CONFIG_FILE)));
        let config = load(None, &nested).unwrap();
        assert_eq!(config.report.format, OutputFormat::Json);
    }

    #[test]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let root = temp_root(&temp);
        assert!(load(Some(&root.join("missing.toml")), &root).is_err());
    }

    #[test]
    fn command_line_packages_are_added() {
        let filter = Config::default().exclude_filter(&["Tests\\*".to_string()]);
        assert!(!filter.is_empty());
        assert!(Config::default().exclude_filter(&[]).is_empty());
    }
}
