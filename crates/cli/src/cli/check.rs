//! `apidef check`: validate a declaration set and print a summary

use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::cli::common::{exit_code, load_and_compile};

/// Arguments of `apidef check`
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Declaration set (JSON)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Config file (TOML)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run `apidef check`, returning the process exit code
pub fn run(args: CheckArgs) -> i32 {
    exit_code(load_and_compile(&args.input, args.config.as_deref()).map(|compilation| {
        println!(
            "{} {} service(s), {} object(s), {} warning(s)",
            style("ok:").green().bold(),
            compilation.ir.services.len(),
            compilation.ir.objects.len(),
            compilation.warnings.len()
        );
    }))
}
