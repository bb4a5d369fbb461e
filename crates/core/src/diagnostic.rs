//! Diagnostics produced while compiling a declaration set.
//!
//! Every stage reports problems by pushing [`Diagnostic`] records into a
//! shared [`Diagnostics`] list instead of returning early, so a single run
//! surfaces every problem in the input. Whether a run may emit IR is decided
//! once, at the end, by [`Diagnostics::has_fatal`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a declaration (or one of its members) came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path of the source file, empty when unknown.
    #[serde(default)]
    pub file: String,
    /// 1-based line, 0 when unknown.
    #[serde(default)]
    pub line: u32,
    /// 1-based column, 0 when unknown.
    #[serde(default)]
    pub column: u32,
}

impl SourceLocation {
    /// Location at `file:line:column`.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// True when neither a file nor a line was recorded.
    pub fn is_unknown(&self) -> bool {
        self.file.is_empty() && self.line == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("<unknown>");
        }
        if self.column == 0 {
            write!(f, "{}:{}", self.file, self.line)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}

/// Diagnostic severity. Errors block IR emission, warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but IR is still emitted.
    Warning,
    /// Blocks IR emission.
    Error,
}

impl Severity {
    /// Lowercase label used in rendered diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// The problem behind a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// A type reference matched no primitive, object or import.
    #[error("{declaration}.{field}: unresolved type '{identifier}'")]
    UnresolvedType {
        /// Qualified name of the declaring object or service.
        declaration: String,
        /// Member whose type failed to resolve.
        field: String,
        /// The identifier as written.
        identifier: String,
    },

    /// A declaration or member does not have a shape we can model.
    #[error("{declaration}: {reason}")]
    MalformedDeclaration {
        /// Qualified name of the offending declaration.
        declaration: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two entities share a qualified name within one scope.
    #[error("duplicate {what} '{name}'")]
    DuplicateName {
        /// Kind of entity: "declaration", "method" or "field".
        what: String,
        /// The repeated name.
        name: String,
    },

    /// A `Named` type points at an object that is not in the graph.
    #[error("{owner}: reference to unknown object '{object}'")]
    DanglingReference {
        /// Member holding the reference.
        owner: String,
        /// Qualified name that is missing.
        object: String,
    },

    /// An annotation line was malformed or overwrote an earlier key.
    #[error("{0}")]
    AnnotationParse(String),

    /// An object has no fields and is not marked as intentionally empty.
    #[error("object '{object}' has no fields")]
    EmptyObject {
        /// Qualified name of the empty object.
        object: String,
    },
}

impl DefinitionError {
    /// Stable identifier of the error kind, used in rendered diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DefinitionError::UnresolvedType { .. } => "UnresolvedTypeError",
            DefinitionError::MalformedDeclaration { .. } => "MalformedDeclarationError",
            DefinitionError::DuplicateName { .. } => "DuplicateNameError",
            DefinitionError::DanglingReference { .. } => "DanglingReferenceError",
            DefinitionError::AnnotationParse(_) => "AnnotationParseWarning",
            DefinitionError::EmptyObject { .. } => "EmptyObjectWarning",
        }
    }

    /// Severity this kind carries unless configuration promotes it.
    pub fn default_severity(&self) -> Severity {
        match self {
            DefinitionError::AnnotationParse(_) | DefinitionError::EmptyObject { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

/// A single `{severity, message, location}` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Current severity, possibly promoted from the kind's default.
    pub severity: Severity,
    /// What went wrong.
    pub error: DefinitionError,
    /// Where it went wrong.
    pub location: SourceLocation,
}

impl Diagnostic {
    /// Diagnostic at the error kind's default severity.
    pub fn new(error: DefinitionError, location: SourceLocation) -> Self {
        Self {
            severity: error.default_severity(),
            error,
            location,
        }
    }

    /// True for errors.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Human-readable message without severity or location.
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity.as_str(),
            self.error.kind(),
            self.location,
            self.error
        )
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Diagnostic", 4)?;
        state.serialize_field("severity", &self.severity)?;
        state.serialize_field("kind", self.error.kind())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("location", &self.location)?;
        state.end()
    }
}

/// Ordered list of diagnostics accumulated across all stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` at `location` with its default severity.
    pub fn push(&mut self, error: DefinitionError, location: SourceLocation) {
        self.0.push(Diagnostic::new(error, location));
    }

    /// True if any diagnostic is an error.
    pub fn has_fatal(&self) -> bool {
        self.0.iter().any(Diagnostic::is_fatal)
    }

    /// Diagnostics that block emission.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_fatal())
    }

    /// Diagnostics that do not block emission.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| !d.is_fatal())
    }

    /// Turn every warning into an error.
    pub fn promote_warnings(&mut self) {
        for diagnostic in &mut self.0 {
            diagnostic.severity = Severity::Error;
        }
    }

    /// Diagnostics in the order they were reported.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics of either severity.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.0 {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}
