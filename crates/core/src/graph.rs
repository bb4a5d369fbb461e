//! The definition graph: services, methods, objects and fields.
//!
//! Objects are owned by the graph and referenced by qualified name from
//! fields and method signatures. Services and objects keep the order in
//! which their declarations were first seen; that order is what the emitter
//! writes out.

use crate::diagnostic::SourceLocation;
use crate::metadata::Metadata;
use crate::types::TypeDescriptor;

/// Every service and object of one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionGraph {
    /// Services in first-seen order.
    pub services: Vec<Service>,
    /// Objects in first-seen order.
    pub objects: Vec<Object>,
}

impl DefinitionGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// First object registered under `qualified_name`.
    pub fn object(&self, qualified_name: &str) -> Option<&Object> {
        self.objects
            .iter()
            .find(|o| o.qualified_name == qualified_name)
    }

    /// Mutable access to the first object named `qualified_name`.
    pub fn object_mut(&mut self, qualified_name: &str) -> Option<&mut Object> {
        self.objects
            .iter_mut()
            .find(|o| o.qualified_name == qualified_name)
    }

    /// First service registered under `qualified_name`.
    pub fn service(&self, qualified_name: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.qualified_name == qualified_name)
    }

    /// Methods across all services.
    pub fn method_count(&self) -> usize {
        self.services.iter().map(|s| s.methods.len()).sum()
    }

    /// Fields across all objects.
    pub fn field_count(&self) -> usize {
        self.objects.iter().map(|o| o.fields.len()).sum()
    }
}

/// A collection of methods.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Declared name.
    pub name: String,
    /// Namespace the service was declared in.
    pub namespace: String,
    /// `namespace.name`.
    pub qualified_name: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
    /// Where the service was declared.
    pub location: SourceLocation,
}

/// One call: a single input object in, a single output object out.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Declared name.
    pub name: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// The request type. Valid graphs only hold named objects here.
    pub input: TypeDescriptor,
    /// The response type. Valid graphs only hold named objects here.
    pub output: TypeDescriptor,
    /// Where the method was declared.
    pub location: SourceLocation,
}

/// A record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Declared name.
    pub name: String,
    /// Namespace the object was declared in.
    pub namespace: String,
    /// `namespace.name`.
    pub qualified_name: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Order is significant: it is the generated field order.
    pub fields: Vec<Field>,
    /// Where the object was declared.
    pub location: SourceLocation,
}

impl Object {
    /// First field named `name`.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One named, typed member of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared name.
    pub name: String,
    /// Resolved type.
    pub ty: TypeDescriptor,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Raw tag text, never interpreted.
    pub tag: Option<String>,
    /// Where the field was declared.
    pub location: SourceLocation,
}
