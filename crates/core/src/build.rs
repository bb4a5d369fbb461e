//! Graph building from annotated declarations.
//!
//! Building runs in two passes:
//! 1. Classify every declaration as a service or an object and register its
//!    qualified name in the namespace table.
//! 2. Resolve fields and method signatures against the complete table and
//!    populate the graph.
//!
//! Because every name is known before anything is resolved, a declaration
//! may reference another that appears later in the same or another
//! namespace. Problems are collected into diagnostics; a member whose type
//! cannot be resolved is left out of the graph.
//!
//! A declaration that mixes methods with fields is reported and then built
//! as an object from its fields, so references to it still resolve.

use indexmap::IndexSet;
use tracing::debug;

use crate::config::BuildConfig;
use crate::declaration::{
    AnnotatedDeclaration, AnnotatedMember, AnnotatedNamespace, AnnotatedShape, ParsedType,
};
use crate::diagnostic::{DefinitionError, Diagnostics, SourceLocation};
use crate::graph::{DefinitionGraph, Field, Method, Object, Service};
use crate::metadata::{AnnotationValue, EXAMPLE_KEY, ExtractedComment, Metadata};
use crate::namespace::NamespaceTable;
use crate::naming::is_identifier;
use crate::resolve::Resolver;
use crate::types::{PrimitiveKind, TypeDescriptor};

const ERROR_FIELD_NAME: &str = "Error";
const ERROR_FIELD_COMMENT: &str =
    "Error is string explaining what went wrong. Empty if everything was fine.";
const ERROR_FIELD_EXAMPLE: &str = "something went wrong";

/// What a declaration turned out to be, decided once in pass one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// Every member is a method.
    Service,
    /// Every member is a field, or there are no members.
    Object,
}

/// Result of building: the graph and every problem found along the way.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The graph, possibly missing members that failed to resolve.
    pub graph: DefinitionGraph,
    /// Annotation warnings and build errors, in discovery order.
    pub diagnostics: Diagnostics,
}

/// Classify a declaration by the shape of its members.
///
/// All members method-shaped makes a service; anything else is an object. A
/// declaration without members is an (empty) object.
pub fn classify(decl: &AnnotatedDeclaration) -> Result<DeclarationKind, DefinitionError> {
    let (methods, fields): (Vec<&AnnotatedMember>, Vec<&AnnotatedMember>) =
        decl.members.iter().partition(|m| m.shape.is_method());

    match (methods.is_empty(), fields.is_empty()) {
        (true, _) => Ok(DeclarationKind::Object),
        (false, true) => Ok(DeclarationKind::Service),
        (false, false) => Err(DefinitionError::MalformedDeclaration {
            declaration: decl.qualified_name.clone(),
            reason: format!(
                "mixes methods ({}) with fields ({})",
                member_names(&methods),
                member_names(&fields)
            ),
        }),
    }
}

fn member_names(members: &[&AnnotatedMember]) -> String {
    members
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the definition graph.
pub fn build(namespaces: &[AnnotatedNamespace], config: &BuildConfig) -> BuildOutput {
    let mut diagnostics = Diagnostics::new();
    let mut table = NamespaceTable::new();

    // -------------------------------------------------------------------------
    // Pass 1: classify and register every name.
    // -------------------------------------------------------------------------
    for ns in namespaces {
        table.add_namespace(&ns.name, &ns.imports);
    }

    let mut stubs: Vec<(&AnnotatedDeclaration, DeclarationKind)> = Vec::new();
    for decl in namespaces.iter().flat_map(|ns| ns.declarations.iter()) {
        if config.is_ignored(&decl.name, &decl.qualified_name) {
            debug!(declaration = %decl.qualified_name, "Skipping ignored declaration.");
            continue;
        }

        if !is_identifier(&decl.name) {
            diagnostics.push(
                DefinitionError::MalformedDeclaration {
                    declaration: decl.qualified_name.clone(),
                    reason: format!("name '{}' is not an identifier", decl.name),
                },
                decl.location.clone(),
            );
            continue;
        }

        push_annotation_warnings(&mut diagnostics, &decl.qualified_name, &decl.doc, &decl.location);
        for member in &decl.members {
            let owner = format!("{}.{}", decl.qualified_name, member.name);
            push_annotation_warnings(&mut diagnostics, &owner, &member.doc, &member.location);
        }

        let kind = classify(decl).unwrap_or_else(|err| {
            diagnostics.push(err, decl.location.clone());
            DeclarationKind::Object
        });
        match kind {
            DeclarationKind::Service => table.register_service(&decl.namespace, &decl.name),
            DeclarationKind::Object => table.register_object(&decl.namespace, &decl.name),
        }
        stubs.push((decl, kind));
    }
    table.link_imports();

    debug!(
        namespaces = namespaces.len(),
        services = table.service_count(),
        objects = table.object_count(),
        "Registered declarations."
    );

    // -------------------------------------------------------------------------
    // Pass 2: resolve members against the complete table.
    // -------------------------------------------------------------------------
    let mut graph = DefinitionGraph::new();
    {
        let mut pass = SecondPass {
            resolver: Resolver::new(&table),
            diagnostics: &mut diagnostics,
        };
        for (decl, kind) in &stubs {
            match kind {
                DeclarationKind::Service => graph.services.push(pass.build_service(decl)),
                DeclarationKind::Object => graph.objects.push(pass.build_object(decl)),
            }
        }
    }

    if config.output_error_field {
        add_output_error_fields(&mut graph);
    }

    debug!(
        services = graph.services.len(),
        methods = graph.method_count(),
        objects = graph.objects.len(),
        fields = graph.field_count(),
        diagnostics = diagnostics.len(),
        "Built definition graph."
    );

    BuildOutput { graph, diagnostics }
}

struct SecondPass<'a> {
    resolver: Resolver<'a>,
    diagnostics: &'a mut Diagnostics,
}

impl SecondPass<'_> {
    fn build_object(&mut self, decl: &AnnotatedDeclaration) -> Object {
        let mut fields = Vec::with_capacity(decl.members.len());

        for member in &decl.members {
            let AnnotatedShape::Field { ty, tag } = &member.shape else {
                continue;
            };
            if !self.check_member_name(decl, member) {
                continue;
            }
            if let Some(resolved) = self.resolve(decl, member, ty) {
                fields.push(Field {
                    name: member.name.clone(),
                    ty: resolved,
                    comment: member.doc.description.clone(),
                    metadata: member.doc.metadata.clone(),
                    tag: tag.clone(),
                    location: member.location.clone(),
                });
            }
        }

        Object {
            name: decl.name.clone(),
            namespace: decl.namespace.clone(),
            qualified_name: decl.qualified_name.clone(),
            comment: decl.doc.description.clone(),
            metadata: decl.doc.metadata.clone(),
            fields,
            location: decl.location.clone(),
        }
    }

    fn build_service(&mut self, decl: &AnnotatedDeclaration) -> Service {
        let mut methods = Vec::with_capacity(decl.members.len());

        for member in &decl.members {
            let AnnotatedShape::Method { inputs, outputs } = &member.shape else {
                continue;
            };
            if !self.check_member_name(decl, member) {
                continue;
            }
            let ([input], [output]) = (inputs.as_slice(), outputs.as_slice()) else {
                self.diagnostics.push(
                    DefinitionError::MalformedDeclaration {
                        declaration: decl.qualified_name.clone(),
                        reason: format!(
                            "method '{}' must take exactly one input and return exactly one output, found {} input(s) and {} output(s)",
                            member.name,
                            inputs.len(),
                            outputs.len()
                        ),
                    },
                    member.location.clone(),
                );
                continue;
            };

            let input = self.resolve(decl, member, input);
            let output = self.resolve(decl, member, output);
            if let (Some(input), Some(output)) = (input, output) {
                methods.push(Method {
                    name: member.name.clone(),
                    comment: member.doc.description.clone(),
                    metadata: member.doc.metadata.clone(),
                    input,
                    output,
                    location: member.location.clone(),
                });
            }
        }

        Service {
            name: decl.name.clone(),
            namespace: decl.namespace.clone(),
            qualified_name: decl.qualified_name.clone(),
            comment: decl.doc.description.clone(),
            metadata: decl.doc.metadata.clone(),
            methods,
            location: decl.location.clone(),
        }
    }

    fn check_member_name(&mut self, decl: &AnnotatedDeclaration, member: &AnnotatedMember) -> bool {
        if is_identifier(&member.name) {
            return true;
        }
        self.diagnostics.push(
            DefinitionError::MalformedDeclaration {
                declaration: decl.qualified_name.clone(),
                reason: format!("member name '{}' is not an identifier", member.name),
            },
            member.location.clone(),
        );
        false
    }

    fn resolve(
        &mut self,
        decl: &AnnotatedDeclaration,
        member: &AnnotatedMember,
        ty: &ParsedType,
    ) -> Option<TypeDescriptor> {
        let expr = match ty {
            Ok(expr) => expr,
            Err(err) => {
                self.diagnostics.push(
                    DefinitionError::MalformedDeclaration {
                        declaration: decl.qualified_name.clone(),
                        reason: format!("member '{}': {err}", member.name),
                    },
                    member.location.clone(),
                );
                return None;
            }
        };

        match self.resolver.resolve(&decl.namespace, expr) {
            Ok(resolved) => Some(resolved),
            Err(unresolved) => {
                self.diagnostics.push(
                    DefinitionError::UnresolvedType {
                        declaration: decl.qualified_name.clone(),
                        field: member.name.clone(),
                        identifier: unresolved.identifier,
                    },
                    member.location.clone(),
                );
                None
            }
        }
    }
}

fn push_annotation_warnings(
    diagnostics: &mut Diagnostics,
    owner: &str,
    doc: &ExtractedComment,
    location: &SourceLocation,
) {
    for warning in &doc.warnings {
        diagnostics.push(
            DefinitionError::AnnotationParse(format!(
                "{owner}: comment line {}: {}",
                warning.line, warning.message
            )),
            location.clone(),
        );
    }
}

// Every object used as a method output gets a trailing `Error string` field.
fn add_output_error_fields(graph: &mut DefinitionGraph) {
    let outputs: IndexSet<String> = graph
        .services
        .iter()
        .flat_map(|s| s.methods.iter())
        .filter_map(|m| m.output.as_object())
        .map(str::to_string)
        .collect();

    for name in outputs {
        let Some(object) = graph.object_mut(&name) else {
            continue;
        };
        if object.field(ERROR_FIELD_NAME).is_some() {
            continue;
        }
        let mut metadata = Metadata::new();
        metadata.insert(EXAMPLE_KEY, AnnotationValue::from(ERROR_FIELD_EXAMPLE));
        let location = object.location.clone();
        object.fields.push(Field {
            name: ERROR_FIELD_NAME.to_string(),
            ty: TypeDescriptor::primitive(PrimitiveKind::String),
            comment: ERROR_FIELD_COMMENT.to_string(),
            metadata,
            tag: None,
            location,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::declaration::annotate;
    use crate::source::{Declaration, Member, MemberShape, NamespaceSource, SourceSet};

    fn field(name: &str, ty: &str) -> Member {
        Member {
            name: name.into(),
            comment: String::new(),
            shape: MemberShape::Field {
                ty: ty.into(),
                tag: None,
            },
            location: SourceLocation::default(),
        }
    }

    fn method(name: &str, inputs: &[&str], outputs: &[&str]) -> Member {
        Member {
            name: name.into(),
            comment: String::new(),
            shape: MemberShape::Method {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                outputs: outputs.iter().map(|s| s.to_string()).collect(),
            },
            location: SourceLocation::default(),
        }
    }

    fn decl(name: &str, members: Vec<Member>) -> Declaration {
        Declaration {
            name: name.into(),
            comment: String::new(),
            members,
            location: SourceLocation::default(),
        }
    }

    fn build_one(declarations: Vec<Declaration>, config: &BuildConfig) -> BuildOutput {
        let sources = SourceSet {
            namespaces: vec![NamespaceSource {
                name: "app".into(),
                imports: vec![],
                declarations,
            }],
        };
        build(&annotate(&sources), config)
    }

    #[test]
    fn test_forward_references_resolve() {
        let out = build_one(
            vec![
                decl("Service", vec![method("Do", &["Req"], &["Res"])]),
                decl("Req", vec![field("Items", "[]Item")]),
                decl("Res", vec![field("Ok", "bool")]),
                decl("Item", vec![field("Name", "string")]),
            ],
            &BuildConfig::default(),
        );

        assert!(out.diagnostics.is_empty(), "{}", out.diagnostics);
        let service = out.graph.service("app.Service").unwrap();
        assert_eq!(service.methods[0].input, TypeDescriptor::named("app.Req"));
        assert_eq!(
            out.graph.object("app.Req").unwrap().fields[0].ty,
            TypeDescriptor::sequence(TypeDescriptor::named("app.Item"))
        );
        let names: Vec<_> = out.graph.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Req", "Res", "Item"]);
    }

    #[test]
    fn test_mixed_declaration_is_malformed() {
        let out = build_one(
            vec![decl(
                "Weird",
                vec![method("Do", &["A"], &["B"]), field("Name", "string")],
            )],
            &BuildConfig::default(),
        );
        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error.kind(), "MalformedDeclarationError");
        assert!(out.graph.services.is_empty());

        let stub = out.graph.object("app.Weird").unwrap();
        let names: Vec<_> = stub.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Name"]);
    }

    #[test]
    fn test_references_to_mixed_declaration_resolve() {
        let out = build_one(
            vec![
                decl("Holder", vec![field("One", "Weird"), field("Many", "[]Weird")]),
                decl(
                    "Weird",
                    vec![method("Do", &["Holder"], &["Holder"]), field("Name", "string")],
                ),
            ],
            &BuildConfig::default(),
        );
        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1, "{}", out.diagnostics);
        assert_eq!(errors[0].error.kind(), "MalformedDeclarationError");
        assert_eq!(
            out.graph.object("app.Holder").unwrap().fields[0].ty,
            TypeDescriptor::named("app.Weird")
        );
    }

    #[test]
    fn test_names_must_be_identifiers() {
        let out = build_one(
            vec![
                decl("2Fast", vec![field("X", "int")]),
                decl("Req", vec![field("ok", "int"), field("bad-name", "int")]),
                decl("Service", vec![method("do it", &["Req"], &["Req"])]),
            ],
            &BuildConfig::default(),
        );

        let reasons: Vec<_> = out
            .diagnostics
            .errors()
            .map(|d| match &d.error {
                DefinitionError::MalformedDeclaration {
                    declaration,
                    reason,
                } => format!("{declaration}: {reason}"),
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                "app.2Fast: name '2Fast' is not an identifier",
                "app.Req: member name 'bad-name' is not an identifier",
                "app.Service: member name 'do it' is not an identifier",
            ]
        );
        assert!(out.graph.object("app.2Fast").is_none());
        assert_eq!(out.graph.object("app.Req").unwrap().fields.len(), 1);
        assert!(out.graph.service("app.Service").unwrap().methods.is_empty());
    }

    #[test]
    fn test_method_arity_is_checked() {
        let out = build_one(
            vec![
                decl(
                    "Service",
                    vec![
                        method("Two", &["A", "A"], &["A"]),
                        method("None", &[], &["A"]),
                        method("Good", &["A"], &["A"]),
                    ],
                ),
                decl("A", vec![field("X", "int")]),
            ],
            &BuildConfig::default(),
        );
        assert_eq!(out.diagnostics.errors().count(), 2);
        let service = out.graph.service("app.Service").unwrap();
        assert_eq!(service.methods.len(), 1);
        assert_eq!(service.methods[0].name, "Good");
    }

    #[test]
    fn test_unresolved_type_names_field_and_declaration() {
        let out = build_one(
            vec![decl("Req", vec![field("Ok", "string"), field("Bad", "[]Missing")])],
            &BuildConfig::default(),
        );
        let errors: Vec<_> = out.diagnostics.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].error,
            DefinitionError::UnresolvedType {
                declaration: "app.Req".into(),
                field: "Bad".into(),
                identifier: "Missing".into(),
            }
        );
        assert_eq!(out.graph.object("app.Req").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_empty_declaration_is_object() {
        let out = build_one(vec![decl("Nothing", vec![])], &BuildConfig::default());
        assert_eq!(out.graph.objects.len(), 1);
        assert!(out.graph.services.is_empty());
    }

    #[test]
    fn test_ignored_declarations_are_skipped() {
        let config = BuildConfig {
            ignore: vec!["Internal".into()],
            output_error_field: false,
        };
        let out = build_one(
            vec![
                decl("Internal", vec![method("Do", &["Nope"], &["Nope"])]),
                decl("Kept", vec![field("X", "int")]),
            ],
            &config,
        );
        assert!(out.diagnostics.is_empty());
        assert!(out.graph.services.is_empty());
        assert_eq!(out.graph.objects.len(), 1);
    }

    #[test]
    fn test_output_error_field() {
        let config = BuildConfig {
            ignore: vec![],
            output_error_field: true,
        };
        let out = build_one(
            vec![
                decl(
                    "Service",
                    vec![method("A", &["Req"], &["Res"]), method("B", &["Req"], &["Res"])],
                ),
                decl("Req", vec![field("X", "int")]),
                decl("Res", vec![field("Y", "int")]),
            ],
            &config,
        );

        let res = out.graph.object("app.Res").unwrap();
        assert_eq!(res.fields.len(), 2);
        let error = &res.fields[1];
        assert_eq!(error.name, "Error");
        assert_eq!(error.ty, TypeDescriptor::primitive(PrimitiveKind::String));
        assert_eq!(
            error.metadata.get("example"),
            Some(&AnnotationValue::from("something went wrong"))
        );
        assert_eq!(out.graph.object("app.Req").unwrap().fields.len(), 1);
    }

    #[test]
    fn test_build_is_idempotent() {
        let declarations = vec![
            decl("Service", vec![method("Do", &["Req"], &["Req"])]),
            decl("Req", vec![field("Tags", "map[string][]string")]),
        ];
        let first = build_one(declarations.clone(), &BuildConfig::default());
        let second = build_one(declarations, &BuildConfig::default());
        assert_eq!(first.graph, second.graph);
    }

    #[test]
    fn test_annotation_warnings_are_collected() {
        let mut declaration = decl("Req", vec![field("X", "int")]);
        declaration.comment = "META(featured): true\nMETA(featured): false".into();
        let out = build_one(vec![declaration], &BuildConfig::default());
        assert_eq!(out.diagnostics.warnings().count(), 1);
        assert!(!out.diagnostics.has_fatal());
        assert_eq!(
            out.graph.object("app.Req").unwrap().metadata.get("featured"),
            Some(&AnnotationValue::Bool(false))
        );
    }
}
