//! `apidef` command line: compile or check a declaration set.

#![forbid(unsafe_code)]
#![deny(warnings, unused_must_use, dead_code, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod cli;

#[derive(Parser)]
#[command(
    name = "apidef",
    version,
    about = "Compile API definitions into a language-agnostic IR"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a declaration set and write the IR
    Compile(cli::compile::CompileArgs),
    /// Validate a declaration set without writing anything
    Check(cli::check::CheckArgs),
}

fn main() {
    init_tracing();
    std::process::exit(run_cli(std::env::args()));
}

fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Compile(args)) => cli::compile::run(args),
            Some(Commands::Check(args)) => cli::check::run(args),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

fn init_tracing() {
    let crate_root = module_path!().to_string();

    // APIDEF_LOG is either a plain level ("debug") or a full filter directive
    // like "apidef_core=trace,apidef=info".
    let filter = match std::env::var("APIDEF_LOG") {
        Ok(level) if is_plain_level(&level) => format!("{crate_root}={level}"),
        Ok(directives) => directives,
        Err(_) => format!("{crate_root}=info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
