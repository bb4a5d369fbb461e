//! Pipeline entry point.
//!
//! 1. Annotate: SourceSet -> annotated declarations (metadata, parsed types)
//! 2. Build: annotated declarations -> DefinitionGraph (two passes)
//! 3. Validate: DefinitionGraph -> ValidGraph
//! 4. Emit: ValidGraph -> DefinitionIr

use tracing::{debug, info};

use crate::build::build;
use crate::config::Config;
use crate::declaration::annotate;
use crate::diagnostic::Diagnostics;
use crate::emit::{DefinitionIr, emit};
use crate::source::SourceSet;
use crate::validate::validate;

/// Successful compilation.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The emitted IR.
    pub ir: DefinitionIr,
    /// Non-fatal diagnostics from every stage.
    pub warnings: Diagnostics,
}

/// Compile a source set into IR.
///
/// Returns every diagnostic, warnings included, when any of them is fatal.
/// No IR is produced in that case.
pub fn compile(sources: &SourceSet, config: &Config) -> Result<Compilation, Diagnostics> {
    debug!(
        namespaces = sources.namespaces.len(),
        declarations = sources.declaration_count(),
        "Compiling source set."
    );

    let annotated = annotate(sources);
    let built = build(&annotated, &config.build);
    let validated = validate(built.graph, built.diagnostics, &config.validate)?;
    let ir = emit(&validated.graph);

    info!(
        services = ir.services.len(),
        objects = ir.objects.len(),
        warnings = validated.warnings.len(),
        "Compiled definitions."
    );

    Ok(Compilation {
        ir,
        warnings: validated.warnings,
    })
}
