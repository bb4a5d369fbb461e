//! `apidef compile`: compile a declaration set and write the IR

use clap::Args;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::cli::common::{Format, exit_code, load_and_compile};

/// Arguments of `apidef compile`
#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Declaration set (JSON)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Config file (TOML)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Write the IR here instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// IR output format
    #[arg(long, short = 'f', value_enum, default_value_t = Format::Json)]
    pub format: Format,
}

/// Run `apidef compile`, returning the process exit code
pub fn run(args: CompileArgs) -> i32 {
    exit_code(run_inner(&args))
}

fn run_inner(args: &CompileArgs) -> Result<(), String> {
    let compilation = load_and_compile(&args.input, args.config.as_deref())?;
    let rendered = compilation
        .ir
        .render(args.format.into())
        .map_err(|e| e.to_string())?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            info!(output = %path.display(), format = ?args.format, "Wrote IR.");
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
