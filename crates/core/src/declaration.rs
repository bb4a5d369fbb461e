//! Annotation stage: raw declarations -> metadata-annotated declarations.
//!
//! Each declaration's comments are run through the metadata extractor and
//! its member type expressions are parsed. Declarations are independent of
//! each other at this point, so the work runs in parallel.

use rayon::prelude::*;

use crate::diagnostic::SourceLocation;
use crate::metadata::{ExtractedComment, extract};
use crate::naming::qualify;
use crate::source::{Import, MemberShape, SourceSet};
use crate::types::{TypeExpr, TypeExprError};

/// A declaration with its comments parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedDeclaration {
    /// Namespace the declaration belongs to.
    pub namespace: String,
    /// Declared name.
    pub name: String,
    /// `namespace.name`.
    pub qualified_name: String,
    /// The declaration's doc comment, split into prose and metadata.
    pub doc: ExtractedComment,
    /// Members in source order.
    pub members: Vec<AnnotatedMember>,
    /// Where the declaration starts.
    pub location: SourceLocation,
}

/// A member with its comment parsed and its types parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedMember {
    /// Member name.
    pub name: String,
    /// The member's doc comment, split into prose and metadata.
    pub doc: ExtractedComment,
    /// Field or method signature.
    pub shape: AnnotatedShape,
    /// Where the member is declared.
    pub location: SourceLocation,
}

/// [`MemberShape`] with its type expressions parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotatedShape {
    /// A typed field.
    Field {
        /// Field type.
        ty: ParsedType,
        /// Raw tag, passed through.
        tag: Option<String>,
    },
    /// A method signature.
    Method {
        /// Parameter types.
        inputs: Vec<ParsedType>,
        /// Result types.
        outputs: Vec<ParsedType>,
    },
}

impl AnnotatedShape {
    /// True for method signatures.
    pub fn is_method(&self) -> bool {
        matches!(self, AnnotatedShape::Method { .. })
    }
}

/// Parse result of one type expression. Errors are reported by the builder.
pub type ParsedType = Result<TypeExpr, TypeExprError>;

/// One namespace after annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedNamespace {
    /// Namespace name.
    pub name: String,
    /// Imports shared by all its declarations.
    pub imports: Vec<Import>,
    /// Declarations in source order.
    pub declarations: Vec<AnnotatedDeclaration>,
}

/// Annotate every declaration of a source set, keeping source order.
pub fn annotate(sources: &SourceSet) -> Vec<AnnotatedNamespace> {
    sources
        .namespaces
        .iter()
        .map(|ns| AnnotatedNamespace {
            name: ns.name.clone(),
            imports: ns.imports.clone(),
            declarations: ns
                .declarations
                .par_iter()
                .map(|decl| AnnotatedDeclaration {
                    namespace: ns.name.clone(),
                    name: decl.name.clone(),
                    qualified_name: qualify(&ns.name, &decl.name),
                    doc: extract(&decl.comment),
                    members: decl
                        .members
                        .iter()
                        .map(|member| AnnotatedMember {
                            name: member.name.clone(),
                            doc: extract(&member.comment),
                            shape: annotate_shape(&member.shape),
                            location: member.location.clone(),
                        })
                        .collect(),
                    location: decl.location.clone(),
                })
                .collect(),
        })
        .collect()
}

fn annotate_shape(shape: &MemberShape) -> AnnotatedShape {
    match shape {
        MemberShape::Field { ty, tag } => AnnotatedShape::Field {
            ty: TypeExpr::parse(ty),
            tag: tag.clone(),
        },
        MemberShape::Method { inputs, outputs } => AnnotatedShape::Method {
            inputs: inputs.iter().map(|t| TypeExpr::parse(t)).collect(),
            outputs: outputs.iter().map(|t| TypeExpr::parse(t)).collect(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::metadata::AnnotationValue;
    use crate::source::{Declaration, Member, NamespaceSource};

    fn field(name: &str, ty: &str, comment: &str) -> Member {
        Member {
            name: name.into(),
            comment: comment.into(),
            shape: MemberShape::Field {
                ty: ty.into(),
                tag: None,
            },
            location: SourceLocation::default(),
        }
    }

    #[test]
    fn test_annotate_keeps_order_and_extracts_metadata() {
        let sources = SourceSet {
            namespaces: vec![NamespaceSource {
                name: "pleasantries".into(),
                imports: vec![],
                declarations: (0..32)
                    .map(|i| Declaration {
                        name: format!("Object{i}"),
                        comment: format!("Object number {i}.\nMETA(index): {i}"),
                        members: vec![field("Text", "string", "example: \"hi\"")],
                        location: SourceLocation::default(),
                    })
                    .collect(),
            }],
        };

        let annotated = annotate(&sources);
        let decls = &annotated[0].declarations;
        assert_eq!(decls.len(), 32);
        for (i, decl) in decls.iter().enumerate() {
            assert_eq!(decl.name, format!("Object{i}"));
            assert_eq!(decl.qualified_name, format!("pleasantries.Object{i}"));
            assert_eq!(decl.doc.description, format!("Object number {i}."));
            assert_eq!(
                decl.doc.metadata.get("index"),
                Some(&AnnotationValue::from(i as i64))
            );
        }
        assert_eq!(
            decls[0].members[0].doc.metadata.get("example"),
            Some(&AnnotationValue::from("hi"))
        );
    }

    #[test]
    fn test_annotate_records_type_parse_errors() {
        let shape = annotate_shape(&MemberShape::Field {
            ty: "map[string".into(),
            tag: None,
        });
        let AnnotatedShape::Field { ty, .. } = shape else {
            panic!("expected a field shape");
        };
        assert_eq!(ty.unwrap_err().expr, "map[string");
    }
}
