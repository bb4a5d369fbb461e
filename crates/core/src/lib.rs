//! Front end of the apidef API-definition compiler.
//!
//! Reads interface declarations, extracts comment metadata, resolves types
//! into a definition graph, validates it and emits a language-agnostic IR.

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

pub mod build;
pub mod compiler;
pub mod config;
pub mod declaration;
pub mod diagnostic;
pub mod emit;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod namespace;
pub mod naming;
pub mod resolve;
pub mod source;
pub mod types;
pub mod validate;

pub use compiler::{Compilation, compile};
pub use config::Config;
pub use diagnostic::{DefinitionError, Diagnostic, Diagnostics, Severity, SourceLocation};
pub use emit::{DefinitionIr, IrFormat};
pub use error::{LoadError, RenderError};
pub use source::SourceSet;
pub use validate::ValidGraph;
