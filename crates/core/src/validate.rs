//! Structural validation of a built graph.
//!
//! Every check runs to completion and reports into one diagnostics list, so
//! a single run surfaces every problem in the input. A [`ValidGraph`] can
//! only be obtained from [`validate`]; the emitter accepts nothing else.

use std::collections::HashSet;

use tracing::debug;

use crate::config::ValidateConfig;
use crate::diagnostic::{DefinitionError, Diagnostics, SourceLocation};
use crate::graph::{DefinitionGraph, Method, Object, Service};
use crate::types::TypeDescriptor;

/// A graph that passed validation. Read it through `Deref`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidGraph(DefinitionGraph);

impl std::ops::Deref for ValidGraph {
    type Target = DefinitionGraph;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Successful validation: the graph plus the non-fatal diagnostics.
#[derive(Debug, Clone)]
pub struct Validated {
    /// The checked graph.
    pub graph: ValidGraph,
    /// Warnings from every stage so far.
    pub warnings: Diagnostics,
}

/// Validate `graph`, folding in diagnostics from earlier stages.
///
/// Returns every diagnostic when any of them is fatal.
pub fn validate(
    graph: DefinitionGraph,
    prior: Diagnostics,
    config: &ValidateConfig,
) -> Result<Validated, Diagnostics> {
    let mut diagnostics = prior;

    check_unique_names(&graph, &mut diagnostics);

    let objects: HashSet<&str> = graph
        .objects
        .iter()
        .map(|o| o.qualified_name.as_str())
        .collect();

    for service in &graph.services {
        check_service(service, &objects, &mut diagnostics);
    }
    for object in &graph.objects {
        check_object(object, &objects, config, &mut diagnostics);
    }

    if config.warnings_as_errors {
        diagnostics.promote_warnings();
    }

    debug!(
        errors = diagnostics.errors().count(),
        warnings = diagnostics.warnings().count(),
        "Validated definition graph."
    );

    if diagnostics.has_fatal() {
        return Err(diagnostics);
    }
    Ok(Validated {
        graph: ValidGraph(graph),
        warnings: diagnostics,
    })
}

// Services and objects share one qualified-name space.
fn check_unique_names(graph: &DefinitionGraph, diagnostics: &mut Diagnostics) {
    let mut seen = HashSet::new();
    let entries = graph
        .services
        .iter()
        .map(|s| ("service", s.qualified_name.as_str(), &s.location))
        .chain(
            graph
                .objects
                .iter()
                .map(|o| ("object", o.qualified_name.as_str(), &o.location)),
        );

    for (what, name, location) in entries {
        if !seen.insert(name) {
            diagnostics.push(
                DefinitionError::DuplicateName {
                    what: what.to_string(),
                    name: name.to_string(),
                },
                location.clone(),
            );
        }
    }
}

fn check_service(service: &Service, objects: &HashSet<&str>, diagnostics: &mut Diagnostics) {
    let mut names = HashSet::new();

    for method in &service.methods {
        let owner = format!("{}.{}", service.qualified_name, method.name);
        if !names.insert(method.name.as_str()) {
            diagnostics.push(
                DefinitionError::DuplicateName {
                    what: "method".to_string(),
                    name: owner.clone(),
                },
                method.location.clone(),
            );
        }
        check_signature(service, method, diagnostics);
        for ty in [&method.input, &method.output] {
            check_references(&owner, ty, objects, &method.location, diagnostics);
        }
    }
}

fn check_signature(service: &Service, method: &Method, diagnostics: &mut Diagnostics) {
    for (role, ty) in [("input", &method.input), ("output", &method.output)] {
        if ty.as_object().is_none() {
            diagnostics.push(
                DefinitionError::MalformedDeclaration {
                    declaration: service.qualified_name.clone(),
                    reason: format!(
                        "method '{}' {role} must be an object, found '{ty}'",
                        method.name
                    ),
                },
                method.location.clone(),
            );
        }
    }
}

fn check_object(
    object: &Object,
    objects: &HashSet<&str>,
    config: &ValidateConfig,
    diagnostics: &mut Diagnostics,
) {
    if object.fields.is_empty() && !object.metadata.is_flag_set(&config.allow_empty_key) {
        diagnostics.push(
            DefinitionError::EmptyObject {
                object: object.qualified_name.clone(),
            },
            object.location.clone(),
        );
    }

    let mut names = HashSet::new();
    for field in &object.fields {
        let owner = format!("{}.{}", object.qualified_name, field.name);
        if !names.insert(field.name.as_str()) {
            diagnostics.push(
                DefinitionError::DuplicateName {
                    what: "field".to_string(),
                    name: owner.clone(),
                },
                field.location.clone(),
            );
        }
        check_references(&owner, &field.ty, objects, &field.location, diagnostics);
    }
}

fn check_references(
    owner: &str,
    ty: &TypeDescriptor,
    objects: &HashSet<&str>,
    location: &SourceLocation,
    diagnostics: &mut Diagnostics,
) {
    for object in ty.named_refs() {
        if !objects.contains(object) {
            diagnostics.push(
                DefinitionError::DanglingReference {
                    owner: owner.to_string(),
                    object: object.to_string(),
                },
                location.clone(),
            );
        }
    }
}
