//! Common helpers shared across CLI commands

use std::path::Path;

use apidef_core::{Compilation, Config, Diagnostics, IrFormat, Severity, SourceSet, compile};
use clap::ValueEnum;
use console::style;
use tracing::debug;

/// IR output formats
#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum Format {
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl From<Format> for IrFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => IrFormat::Json,
            Format::Yaml => IrFormat::Yaml,
        }
    }
}

/// Read the source set and the optional config file, then run the pipeline.
///
/// Diagnostics are printed to stderr either way.
pub fn load_and_compile(input: &Path, config: Option<&Path>) -> Result<Compilation, String> {
    let config = Config::load_or_default(config).map_err(|e| e.to_string())?;
    let sources = SourceSet::load(input).map_err(|e| e.to_string())?;
    debug!(input = %input.display(), "Loaded source set.");

    match compile(&sources, &config) {
        Ok(compilation) => {
            print_diagnostics(&compilation.warnings);
            Ok(compilation)
        }
        Err(diagnostics) => {
            print_diagnostics(&diagnostics);
            Err(format!(
                "{} {} error(s), no IR emitted",
                style("failed:").red().bold(),
                diagnostics.errors().count()
            ))
        }
    }
}

pub fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => style(format!("error[{}]", diagnostic.error.kind())).red().bold(),
            Severity::Warning => style(format!("warning[{}]", diagnostic.error.kind()))
                .yellow()
                .bold(),
        };
        eprintln!(
            "{label} {}: {}",
            style(&diagnostic.location).dim(),
            diagnostic.message()
        );
    }
}

/// Map a command result to an exit code, printing the error.
pub fn exit_code(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}
