//! Type reference resolution.
//!
//! Resolution is a pure function of a type expression, the namespace it is
//! written in, and the namespace table. It never touches the graph, so the
//! builder can resolve members in any order once every name is registered.

use crate::namespace::{ImportTarget, NamespaceTable};
use crate::naming::qualify;
use crate::types::{PrimitiveKind, TypeDescriptor, TypeExpr};

/// Identifier that matched no primitive, object or import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    /// The identifier as written, qualifier included.
    pub identifier: String,
}

/// Resolves type expressions against a [`NamespaceTable`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    table: &'a NamespaceTable,
}

impl<'a> Resolver<'a> {
    /// Resolver over a fully registered table.
    pub fn new(table: &'a NamespaceTable) -> Self {
        Self { table }
    }

    /// Resolve `expr` as written inside `namespace`.
    pub fn resolve(&self, namespace: &str, expr: &TypeExpr) -> Result<TypeDescriptor, Unresolved> {
        match expr {
            TypeExpr::Sequence(element) => {
                let element = self.resolve(namespace, element)?;
                Ok(TypeDescriptor::sequence(element))
            }
            TypeExpr::Mapping { key, value } => {
                let key = self.resolve(namespace, key)?;
                let value = self.resolve(namespace, value)?;
                Ok(TypeDescriptor::mapping(key, value))
            }
            TypeExpr::Ident {
                qualifier: None,
                name,
            } => self.resolve_bare(namespace, name),
            TypeExpr::Ident {
                qualifier: Some(qualifier),
                name,
            } => self.resolve_qualified(namespace, qualifier, name),
        }
    }

    fn resolve_bare(&self, namespace: &str, name: &str) -> Result<TypeDescriptor, Unresolved> {
        if let Some(kind) = PrimitiveKind::from_keyword(name) {
            return Ok(TypeDescriptor::primitive(kind));
        }

        if let Some(object) = self.table.lookup_object(namespace, name) {
            return Ok(TypeDescriptor::named(object));
        }

        // Parsed `.` imports are searched before any external one is assumed.
        let targets = self.table.dot_imports(namespace);
        for target in &targets {
            if let ImportTarget::Parsed(imported) = target
                && let Some(object) = self.table.lookup_object(imported, name)
            {
                return Ok(TypeDescriptor::named(object));
            }
        }
        if let Some(path) = targets.iter().find_map(|target| match target {
            ImportTarget::External(path) => Some(*path),
            ImportTarget::Parsed(_) => None,
        }) {
            return Ok(TypeDescriptor::External {
                qualified_name: qualify(path, name),
            });
        }

        Err(Unresolved {
            identifier: name.to_string(),
        })
    }

    fn resolve_qualified(
        &self,
        namespace: &str,
        qualifier: &str,
        name: &str,
    ) -> Result<TypeDescriptor, Unresolved> {
        let unresolved = || Unresolved {
            identifier: format!("{qualifier}.{name}"),
        };

        // A namespace may spell out its own name.
        if qualifier == namespace {
            return self
                .table
                .lookup_object(namespace, name)
                .map(TypeDescriptor::named)
                .ok_or_else(unresolved);
        }

        match self.table.resolve_import(namespace, qualifier) {
            Some(ImportTarget::Parsed(imported)) => self
                .table
                .lookup_object(imported, name)
                .map(TypeDescriptor::named)
                .ok_or_else(unresolved),
            Some(ImportTarget::External(path)) => Ok(TypeDescriptor::External {
                qualified_name: qualify(path, name),
            }),
            // Any parsed namespace is reachable by name, import or not.
            None if self.table.has_namespace(qualifier) => self
                .table
                .lookup_object(qualifier, name)
                .map(TypeDescriptor::named)
                .ok_or_else(unresolved),
            None => Err(unresolved()),
        }
    }
}
