// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Strata command-line interface.
//!
//! This is the main entry point for the `strata` command.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod diagnostic;
mod discovery;
mod report;

use commands::analyze::AnalyzeOptions;
use config::OutputFormat;

/// Strata: source metrics for PHP code
#[derive(Debug, Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v: info, -vv: debug, -vvv+: trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze source files and print their metrics
    Analyze {
        /// Source files or directories to analyze
        #[arg(required = true)]
        paths: Vec<Utf8PathBuf>,

        /// Configuration file (default: nearest strata.toml)
        #[arg(long)]
        config: Option<Utf8PathBuf>,

        /// Report format (default: from the configuration, else text)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Skip packages matching this pattern; a trailing `*` matches a prefix
        #[arg(long = "exclude-package", value_name = "PATTERN")]
        exclude_packages: Vec<String>,
    },

    /// List the built-in analyzers
    Analyzers,
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Analyze {
            paths,
            config,
            format,
            exclude_packages,
        } => commands::analyze::execute(&AnalyzeOptions {
            paths,
            config,
            format,
            exclude_packages,
        }),
        Command::Analyzers => {
            print!("{}", commands::analyzers::listing());
            Ok(())
        }
    };

    // Exit with appropriate code
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the verbosity flag.
fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "strata_cli=warn,strata_core=warn",
        1 => "strata_cli=info,strata_core=info",
        2 => "strata_cli=debug,strata_core=debug",
        _ => "strata_cli=trace,strata_core=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn directive_defaults() {
        assert_eq!(directive_for_verbosity(0), "strata_cli=warn,strata_core=warn");
        assert_eq!(directive_for_verbosity(2), "strata_cli=debug,strata_core=debug");
        assert_eq!(directive_for_verbosity(7), "strata_cli=trace,strata_core=trace");
    }

    #[test]
    fn analyze_arguments_parse() {
        let cli = Cli::try_parse_from([
            "strata",
            "analyze",
            "src",
            "lib",
            "--format",
            "json",
            "--exclude-package",
            "Tests\\*",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Analyze {
            paths,
            format,
            exclude_packages,
            config,
        } = cli.command
        else {
            panic!("expected analyze");
        };
        assert_eq!(paths, vec![Utf8PathBuf::from("src"), Utf8PathBuf::from("lib")]);
        assert_eq!(format, Some(OutputFormat::Json));
        assert_eq!(exclude_packages, vec!["Tests\\*"]);
        assert!(config.is_none());
    }

    #[test]
    fn analyze_requires_a_path() {
        assert!(Cli::try_parse_from(["strata", "analyze"]).is_err());
    }
}
