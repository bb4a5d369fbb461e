//! Input boundary: declarations as handed over by a scanner.
//!
//! A scanner walks real source files, groups declarations by namespace and
//! serializes them in this shape. Nothing here is interpreted yet: comments
//! are raw text and types are raw expressions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagnostic::SourceLocation;
use crate::error::LoadError;

/// Every namespace handed to one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet {
    /// Namespaces in the order they were scanned.
    #[serde(default)]
    pub namespaces: Vec<NamespaceSource>,
}

impl SourceSet {
    /// Parse a source set from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON source set file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Declarations across all namespaces.
    pub fn declaration_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.declarations.len()).sum()
    }
}

/// Declarations of one namespace, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSource {
    /// Namespace name; the first half of every qualified name in it.
    pub name: String,
    /// Imports shared by all declarations of the namespace.
    #[serde(default)]
    pub imports: Vec<Import>,
    /// Declarations in source order.
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// A namespace import visible to every declaration of the importing namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Full import path, e.g. `github.com/acme/api/services`.
    pub path: String,
    /// Local name given at the import site. `.` merges the imported names
    /// into the importing namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Import {
    /// Name type expressions use to refer to this import.
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// Raw interface-like or record-like declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    /// Declared name, unqualified.
    pub name: String,
    /// Raw doc comment, markers included.
    #[serde(default)]
    pub comment: String,
    /// Members in source order.
    #[serde(default)]
    pub members: Vec<Member>,
    /// Where the declaration starts.
    #[serde(default)]
    pub location: SourceLocation,
}

/// A method or a field, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member name.
    pub name: String,
    /// Raw doc comment, markers included.
    #[serde(default)]
    pub comment: String,
    /// Field or method signature.
    #[serde(flatten)]
    pub shape: MemberShape,
    /// Where the member is declared.
    #[serde(default)]
    pub location: SourceLocation,
}

/// Shape of a member. A member with a `type` key is a field, one with
/// `inputs`/`outputs` keys is a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemberShape {
    /// A typed field.
    Field {
        /// Raw type expression.
        #[serde(rename = "type")]
        ty: String,
        /// Raw struct-tag-like annotation, passed through untouched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag: Option<String>,
    },
    /// A method signature.
    Method {
        /// Raw parameter type expressions.
        inputs: Vec<String>,
        /// Raw result type expressions.
        outputs: Vec<String>,
    },
}
