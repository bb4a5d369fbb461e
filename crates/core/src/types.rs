//! Type expressions and canonical type descriptors.
//!
//! - `TypeExpr`: the syntax a declaration wrote (`[]string`, `map[string]Item`)
//! - `TypeDescriptor`: what that syntax resolved to
//! - `PrimitiveKind`: built-in scalar kinds

use std::fmt;

use serde::{Deserialize, Serialize};

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `string`
    String,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint`
    Uint,
    /// `uint8`
    Uint8,
    /// `uint16`
    Uint16,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `byte`, an alias of `uint8`
    Byte,
    /// `rune`, a Unicode code point
    Rune,
    /// `any`, an untyped value
    Any,
}

impl PrimitiveKind {
    /// Kind named by a type keyword, if it is one.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kind = match keyword {
            "string" => PrimitiveKind::String,
            "bool" => PrimitiveKind::Bool,
            "int" => PrimitiveKind::Int,
            "int8" => PrimitiveKind::Int8,
            "int16" => PrimitiveKind::Int16,
            "int32" => PrimitiveKind::Int32,
            "int64" => PrimitiveKind::Int64,
            "uint" => PrimitiveKind::Uint,
            "uint8" => PrimitiveKind::Uint8,
            "uint16" => PrimitiveKind::Uint16,
            "uint32" => PrimitiveKind::Uint32,
            "uint64" => PrimitiveKind::Uint64,
            "float32" => PrimitiveKind::Float32,
            "float64" => PrimitiveKind::Float64,
            "byte" => PrimitiveKind::Byte,
            "rune" => PrimitiveKind::Rune,
            "any" => PrimitiveKind::Any,
            _ => return None,
        };
        Some(kind)
    }

    /// The keyword naming this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint => "uint",
            PrimitiveKind::Uint8 => "uint8",
            PrimitiveKind::Uint16 => "uint16",
            PrimitiveKind::Uint32 => "uint32",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Rune => "rune",
            PrimitiveKind::Any => "any",
        }
    }
}

/// Parsed, unresolved type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `name` or `qualifier.name`
    Ident {
        /// Import alias or namespace before the dot.
        qualifier: Option<String>,
        /// The type name.
        name: String,
    },
    /// `[]T` or `sequence<T>`
    Sequence(Box<TypeExpr>),
    /// `map[K]V` or `mapping<K, V>`
    Mapping {
        /// Key type.
        key: Box<TypeExpr>,
        /// Value type.
        value: Box<TypeExpr>,
    },
}

/// Syntax error in a type expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type expression '{expr}': {reason} at offset {offset}")]
pub struct TypeExprError {
    /// The whole expression as written.
    pub expr: String,
    /// What the parser expected or rejected.
    pub reason: String,
    /// Byte offset where parsing stopped.
    pub offset: usize,
}

impl TypeExpr {
    /// Parse one type expression. Surrounding whitespace is ignored.
    pub fn parse(src: &str) -> Result<TypeExpr, TypeExprError> {
        let mut parser = ExprParser {
            src,
            pos: 0,
            depth: 0,
        };
        parser.skip_ws();
        let expr = parser.parse_expr()?;
        parser.skip_ws();
        if parser.pos < src.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    /// Unqualified identifier.
    pub fn ident(name: &str) -> TypeExpr {
        TypeExpr::Ident {
            qualifier: None,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Ident {
                qualifier: Some(q),
                name,
            } => write!(f, "{q}.{name}"),
            TypeExpr::Ident {
                qualifier: None,
                name,
            } => f.write_str(name),
            TypeExpr::Sequence(inner) => write!(f, "[]{inner}"),
            TypeExpr::Mapping { key, value } => write!(f, "map[{key}]{value}"),
        }
    }
}

/// Deepest nesting of `*`, `[]`, `map` and `sequence`/`mapping` accepted.
pub const MAX_NESTING: usize = 64;

struct ExprParser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn rest(&self) -> &'a str {
        let src = self.src;
        &src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), TypeExprError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{token}'")))
        }
    }

    fn error(&self, reason: &str) -> TypeExprError {
        TypeExprError {
            expr: self.src.to_string(),
            reason: reason.to_string(),
            offset: self.pos,
        }
    }

    fn parse_expr(&mut self) -> Result<TypeExpr, TypeExprError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("type expression nested too deeply"));
        }
        self.depth += 1;
        let expr = self.parse_term();
        self.depth -= 1;
        expr
    }

    fn parse_term(&mut self) -> Result<TypeExpr, TypeExprError> {
        // Pointers carry no meaning in the model.
        if self.eat("*") {
            return self.parse_expr();
        }

        if self.eat("[") {
            self.expect("]")?;
            let element = self.parse_expr()?;
            return Ok(TypeExpr::Sequence(Box::new(element)));
        }

        if self.eat("interface{}") {
            return Ok(TypeExpr::ident("any"));
        }

        let start = self.pos;
        let word = self.parse_word()?;

        match word {
            "map" if self.eat("[") => {
                let key = self.parse_expr()?;
                self.expect("]")?;
                let value = self.parse_expr()?;
                Ok(TypeExpr::Mapping {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            "sequence" if self.eat("<") => {
                let element = self.parse_expr()?;
                self.expect(">")?;
                Ok(TypeExpr::Sequence(Box::new(element)))
            }
            "mapping" if self.eat("<") => {
                let key = self.parse_expr()?;
                self.expect(",")?;
                let value = self.parse_expr()?;
                self.expect(">")?;
                Ok(TypeExpr::Mapping {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            _ => {
                let first = word.to_string();
                if self.rest().starts_with('.') {
                    self.pos += 1;
                    let name = self.parse_word()?.to_string();
                    if self.rest().starts_with('.') {
                        self.pos = start;
                        return Err(self.error("qualified names take a single qualifier"));
                    }
                    Ok(TypeExpr::Ident {
                        qualifier: Some(first),
                        name,
                    })
                } else {
                    Ok(TypeExpr::Ident {
                        qualifier: None,
                        name: first,
                    })
                }
            }
        }
    }

    fn parse_word(&mut self) -> Result<&'a str, TypeExprError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(i, c)| !(c.is_alphanumeric() || *c == '_') || (*i == 0 && c.is_ascii_digit()))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        let src = self.src;
        let start = self.pos;
        self.pos += len;
        Ok(&src[start..self.pos])
    }
}

/// Canonical resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// A built-in scalar.
    Primitive {
        /// Which scalar.
        primitive: PrimitiveKind,
    },
    /// Reference to an object in the graph, by qualified name.
    Named {
        /// Qualified name of the object.
        object: String,
    },
    /// Ordered list of `element`.
    Sequence {
        /// Element type.
        element: Box<TypeDescriptor>,
    },
    /// Map from `key` to `value`.
    Mapping {
        /// Key type.
        key: Box<TypeDescriptor>,
        /// Value type.
        value: Box<TypeDescriptor>,
    },
    /// Type living outside the parsed set.
    External {
        /// Import path and type name, joined by a dot.
        qualified_name: String,
    },
}

impl TypeDescriptor {
    /// Primitive descriptor.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        TypeDescriptor::Primitive { primitive: kind }
    }

    /// Reference to the object `object`.
    pub fn named(object: impl Into<String>) -> Self {
        TypeDescriptor::Named {
            object: object.into(),
        }
    }

    /// Sequence of `element`.
    pub fn sequence(element: TypeDescriptor) -> Self {
        TypeDescriptor::Sequence {
            element: Box::new(element),
        }
    }

    /// Mapping from `key` to `value`.
    pub fn mapping(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Qualified name of the object when this is a direct object reference.
    pub fn as_object(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Named { object } => Some(object),
            _ => None,
        }
    }

    /// Every object this descriptor references, including nested ones.
    pub fn named_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_named(&mut refs);
        refs
    }

    fn collect_named<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            TypeDescriptor::Named { object } => refs.push(object),
            TypeDescriptor::Sequence { element } => element.collect_named(refs),
            TypeDescriptor::Mapping { key, value } => {
                key.collect_named(refs);
                value.collect_named(refs);
            }
            TypeDescriptor::Primitive { .. } | TypeDescriptor::External { .. } => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive { primitive } => f.write_str(primitive.as_str()),
            TypeDescriptor::Named { object } => f.write_str(object),
            TypeDescriptor::Sequence { element } => write!(f, "[]{element}"),
            TypeDescriptor::Mapping { key, value } => write!(f, "map[{key}]{value}"),
            TypeDescriptor::External { qualified_name } => f.write_str(qualified_name),
        }
    }
}
