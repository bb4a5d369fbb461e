//! IR emission.
//!
//! The emitter is a pure projection of a [`ValidGraph`] into the serde
//! model consumed by code generators. It performs no checks of its own and
//! keeps the graph's ordering, so the same graph always renders to the same
//! bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::graph::{Field, Method, Object, Service};
use crate::metadata::Metadata;
use crate::naming::{to_lower_camel, to_snake_case};
use crate::types::TypeDescriptor;
use crate::validate::ValidGraph;

/// The emitted definition model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionIr {
    /// Services in first-seen order.
    pub services: Vec<ServiceIr>,
    /// Objects in first-seen order.
    pub objects: Vec<ObjectIr>,
}

/// An emitted service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceIr {
    /// Declared name.
    pub name: String,
    /// Namespace the service was declared in.
    pub namespace: String,
    /// `namespace.name`.
    pub qualified_name: String,
    /// `name` in lowerCamelCase.
    pub name_lower_camel: String,
    /// `name` in lower_snake_case.
    pub name_lower_snake: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Methods in declaration order.
    pub methods: Vec<MethodIr>,
}

/// An emitted method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodIr {
    /// Declared name.
    pub name: String,
    /// `name` in lowerCamelCase.
    pub name_lower_camel: String,
    /// `name` in lower_snake_case.
    pub name_lower_snake: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Request object.
    pub input: TypeDescriptor,
    /// Response object.
    pub output: TypeDescriptor,
}

/// An emitted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectIr {
    /// Declared name.
    pub name: String,
    /// Namespace the object was declared in.
    pub namespace: String,
    /// `namespace.name`.
    pub qualified_name: String,
    /// `name` in lowerCamelCase.
    pub name_lower_camel: String,
    /// `name` in lower_snake_case.
    pub name_lower_snake: String,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Fields in declaration order.
    pub fields: Vec<FieldIr>,
}

/// An emitted field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIr {
    /// Declared name.
    pub name: String,
    /// `name` in lowerCamelCase.
    pub name_lower_camel: String,
    /// `name` in lower_snake_case.
    pub name_lower_snake: String,
    /// Resolved type, serialized as `type`.
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    /// Doc comment with annotations removed.
    pub comment: String,
    /// Annotations from the doc comment.
    pub metadata: Metadata,
    /// Raw tag text, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Project a validated graph into IR.
pub fn emit(graph: &ValidGraph) -> DefinitionIr {
    DefinitionIr {
        services: graph.services.iter().map(emit_service).collect(),
        objects: graph.objects.iter().map(emit_object).collect(),
    }
}

fn emit_service(service: &Service) -> ServiceIr {
    ServiceIr {
        name: service.name.clone(),
        namespace: service.namespace.clone(),
        qualified_name: service.qualified_name.clone(),
        name_lower_camel: to_lower_camel(&service.name),
        name_lower_snake: to_snake_case(&service.name),
        comment: service.comment.clone(),
        metadata: service.metadata.clone(),
        methods: service.methods.iter().map(emit_method).collect(),
    }
}

fn emit_method(method: &Method) -> MethodIr {
    MethodIr {
        name: method.name.clone(),
        name_lower_camel: to_lower_camel(&method.name),
        name_lower_snake: to_snake_case(&method.name),
        comment: method.comment.clone(),
        metadata: method.metadata.clone(),
        input: method.input.clone(),
        output: method.output.clone(),
    }
}

fn emit_object(object: &Object) -> ObjectIr {
    ObjectIr {
        name: object.name.clone(),
        namespace: object.namespace.clone(),
        qualified_name: object.qualified_name.clone(),
        name_lower_camel: to_lower_camel(&object.name),
        name_lower_snake: to_snake_case(&object.name),
        comment: object.comment.clone(),
        metadata: object.metadata.clone(),
        fields: object.fields.iter().map(emit_field).collect(),
    }
}

fn emit_field(field: &Field) -> FieldIr {
    FieldIr {
        name: field.name.clone(),
        name_lower_camel: to_lower_camel(&field.name),
        name_lower_snake: to_snake_case(&field.name),
        ty: field.ty.clone(),
        comment: field.comment.clone(),
        metadata: field.metadata.clone(),
        tag: field.tag.clone(),
    }
}

impl DefinitionIr {
    /// Service with the given qualified name.
    pub fn service(&self, qualified_name: &str) -> Option<&ServiceIr> {
        self.services
            .iter()
            .find(|s| s.qualified_name == qualified_name)
    }

    /// Object with the given qualified name.
    pub fn object(&self, qualified_name: &str) -> Option<&ObjectIr> {
        self.objects
            .iter()
            .find(|o| o.qualified_name == qualified_name)
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String, RenderError> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// YAML document.
    pub fn to_yaml(&self) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render in the requested format.
    pub fn render(&self, format: IrFormat) -> Result<String, RenderError> {
        match format {
            IrFormat::Json => self.to_json(),
            IrFormat::Yaml => self.to_yaml(),
        }
    }
}

impl ObjectIr {
    /// Field named `name`.
    pub fn field(&self, name: &str) -> Option<&FieldIr> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl ServiceIr {
    /// Method named `name`.
    pub fn method(&self, name: &str) -> Option<&MethodIr> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Output format for rendered IR.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IrFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl FromStr for IrFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(IrFormat::Json),
            "yaml" | "yml" => Ok(IrFormat::Yaml),
            other => Err(format!("unknown IR format '{other}' (expected json or yaml)")),
        }
    }
}

impl fmt::Display for IrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrFormat::Json => f.write_str("json"),
            IrFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ValidateConfig;
    use crate::diagnostic::{Diagnostics, SourceLocation};
    use crate::graph::DefinitionGraph;
    use crate::metadata::AnnotationValue;
    use crate::types::PrimitiveKind;
    use crate::validate::validate;

    fn graph() -> ValidGraph {
        let mut metadata = Metadata::new();
        metadata.insert("featured", AnnotationValue::Bool(true));
        metadata.insert("example", AnnotationValue::from("Hello there"));

        let graph = DefinitionGraph {
            services: vec![Service {
                name: "GreeterService".into(),
                namespace: "pleasantries".into(),
                qualified_name: "pleasantries.GreeterService".into(),
                comment: "Greets people.".into(),
                metadata: Metadata::new(),
                methods: vec![Method {
                    name: "GetGreetings".into(),
                    comment: String::new(),
                    metadata: Metadata::new(),
                    input: TypeDescriptor::named("pleasantries.Greeting"),
                    output: TypeDescriptor::named("pleasantries.Greeting"),
                    location: SourceLocation::default(),
                }],
                location: SourceLocation::default(),
            }],
            objects: vec![Object {
                name: "Greeting".into(),
                namespace: "pleasantries".into(),
                qualified_name: "pleasantries.Greeting".into(),
                comment: String::new(),
                metadata: Metadata::new(),
                fields: vec![Field {
                    name: "HTMLText".into(),
                    ty: TypeDescriptor::primitive(PrimitiveKind::String),
                    comment: "Text of the greeting.".into(),
                    metadata,
                    tag: Some(r#"json:"text""#.into()),
                    location: SourceLocation::default(),
                }],
                location: SourceLocation::default(),
            }],
        };
        validate(graph, Diagnostics::new(), &ValidateConfig::default())
            .unwrap()
            .graph
    }

    #[test]
    fn test_emit_derives_names() {
        let ir = emit(&graph());
        let service = ir.service("pleasantries.GreeterService").unwrap();
        assert_eq!(service.name_lower_camel, "greeterService");
        assert_eq!(service.name_lower_snake, "greeter_service");
        let method = service.method("GetGreetings").unwrap();
        assert_eq!(method.name_lower_camel, "getGreetings");
        assert_eq!(method.name_lower_snake, "get_greetings");
        let field = ir.object("pleasantries.Greeting").unwrap().field("HTMLText").unwrap();
        assert_eq!(field.name_lower_camel, "htmlText");
        assert_eq!(field.name_lower_snake, "html_text");
    }

    #[test]
    fn test_json_shape() {
        let ir = emit(&graph());
        let value: serde_json::Value = serde_json::from_str(&ir.to_json().unwrap()).unwrap();
        let field = &value["objects"][0]["fields"][0];
        assert_eq!(field["type"]["kind"], "primitive");
        assert_eq!(field["type"]["primitive"], "string");
        assert_eq!(field["tag"], r#"json:"text""#);
        assert_eq!(field["metadata"]["featured"], true);
        assert_eq!(field["metadata"]["example"], "Hello there");
        let method = &value["services"][0]["methods"][0];
        assert_eq!(method["input"]["kind"], "named");
        assert_eq!(method["input"]["object"], "pleasantries.Greeting");
    }

    #[test]
    fn test_metadata_keeps_insertion_order() {
        let json = emit(&graph()).to_json().unwrap();
        let featured = json.find("\"featured\"").unwrap();
        let example = json.find("\"example\"").unwrap();
        assert!(featured < example);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let graph = graph();
        assert_eq!(
            emit(&graph).to_json().unwrap(),
            emit(&graph).to_json().unwrap()
        );
        assert_eq!(
            emit(&graph).render(IrFormat::Yaml).unwrap(),
            emit(&graph).render(IrFormat::Yaml).unwrap()
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let ir = emit(&graph());
        let back: DefinitionIr = serde_yaml::from_str(&ir.to_yaml().unwrap()).unwrap();
        assert_eq!(back, ir);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<IrFormat>().unwrap(), IrFormat::Json);
        assert_eq!("yml".parse::<IrFormat>().unwrap(), IrFormat::Yaml);
        assert!("toml".parse::<IrFormat>().is_err());
    }
}
