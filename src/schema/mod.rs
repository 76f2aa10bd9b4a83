//! Model I/O Contract Inference
//!
//! Derives a [`TrussSchema`] - the request/response contract of a model's
//! predict function - from an explicit description of its signature, and
//! serializes it for OpenAPI generation on the served endpoint.
//!
//! The host signature is described with a closed set of [`Annotation`]
//! variants that the packaging layer constructs directly from its own type
//! declarations. Classification covers four response shapes:
//!
//! 1. **Sync**: the annotation is a record type
//! 2. **Streaming**: a generator / async generator, payload type absent
//! 3. **Async sync**: an awaitable wrapping exactly one record type
//! 4. **Union**: two arms, one record (or awaitable of one), one generator -
//!    a function that can either return a full response or stream it
//!
//! Inference never fails: any signature outside these shapes yields `None`,
//! which callers must treat as "schema unavailable", not an error.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// =============================================================================
// Record Types
// =============================================================================

/// A structured record type with named, typed fields - the shape of a model's
/// request or response payload.
///
/// Carries the type name and its JSON-schema representation. Use
/// [`RecordType::builder`] to declare fields instead of hand-writing schema
/// JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    name: String,
    schema: Value,
}

impl RecordType {
    /// Create a record type from a name and a ready-made JSON schema.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Start declaring a record type field by field.
    pub fn builder(name: impl Into<String>) -> RecordTypeBuilder {
        RecordTypeBuilder {
            name: name.into(),
            properties: serde_json::Map::new(),
            required: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// JSON-schema representation of this record.
    pub fn schema(&self) -> &Value {
        &self.schema
    }
}

/// Field types understood by the schema builder.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    /// Homogeneous array of the given element type
    Array(Box<FieldType>),
    /// Free-form JSON object
    Object,
}

impl FieldType {
    fn json_schema(&self, title: &str) -> Value {
        match self {
            Self::String => json!({ "title": title, "type": "string" }),
            Self::Integer => json!({ "title": title, "type": "integer" }),
            Self::Number => json!({ "title": title, "type": "number" }),
            Self::Boolean => json!({ "title": title, "type": "boolean" }),
            Self::Array(items) => json!({
                "title": title,
                "type": "array",
                "items": items.json_schema(title),
            }),
            Self::Object => json!({ "title": title, "type": "object" }),
        }
    }
}

/// Builder assembling a record's JSON schema from field declarations.
pub struct RecordTypeBuilder {
    name: String,
    properties: serde_json::Map<String, Value>,
    required: Vec<Value>,
}

impl RecordTypeBuilder {
    /// Add a required field.
    pub fn field(mut self, name: &str, ty: FieldType) -> Self {
        self.properties
            .insert(name.to_string(), ty.json_schema(&title_case(name)));
        self.required.push(Value::String(name.to_string()));
        self
    }

    /// Add an optional field (not listed in `required`).
    pub fn optional_field(mut self, name: &str, ty: FieldType) -> Self {
        self.properties
            .insert(name.to_string(), ty.json_schema(&title_case(name)));
        self
    }

    pub fn build(self) -> RecordType {
        let mut schema = serde_json::Map::new();
        schema.insert("title".into(), Value::String(self.name.clone()));
        schema.insert("type".into(), Value::String("object".into()));
        schema.insert("properties".into(), Value::Object(self.properties));
        if !self.required.is_empty() {
            schema.insert("required".into(), Value::Array(self.required));
        }
        RecordType {
            name: self.name,
            schema: Value::Object(schema),
        }
    }
}

/// Capitalize the first character, leaving the rest untouched.
fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

// =============================================================================
// Signature Annotations
// =============================================================================

/// Return/parameter annotation shapes the contract deriver understands.
///
/// The packaging layer builds these from the model's declared types; anything
/// it cannot express maps to [`Annotation::Opaque`] and yields no contract.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// A structured record type
    Record(RecordType),
    /// A synchronous generator (streaming output)
    Generator,
    /// An asynchronous generator (streaming output)
    AsyncGenerator,
    /// An awaitable wrapping another annotation
    Awaitable(Box<Annotation>),
    /// A union of annotation arms
    Union(Vec<Annotation>),
    /// Any annotation outside the supported set (plain dicts, missing, ...)
    Opaque,
}

impl Annotation {
    /// Convenience constructor for `Awaitable(inner)`.
    pub fn awaitable(inner: Annotation) -> Self {
        Self::Awaitable(Box::new(inner))
    }

    fn is_generator(&self) -> bool {
        matches!(self, Self::Generator | Self::AsyncGenerator)
    }
}

/// A named predict-function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Annotation,
}

impl Parameter {
    pub fn new(name: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            name: name.into(),
            annotation,
        }
    }
}

// =============================================================================
// Contract Inference
// =============================================================================

/// Intermediate result of output classification: a possibly-absent payload
/// record plus the streaming flag. Exists only during inference.
struct OutputType {
    record: Option<RecordType>,
    supports_streaming: bool,
}

/// Derived, immutable description of a model's I/O contract.
///
/// Created once per model introspection and regenerated on each schema
/// request; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrussSchema {
    input_type: RecordType,
    output_type: Option<RecordType>,
    supports_streaming: bool,
}

impl TrussSchema {
    /// Derive a contract from a predict signature, if one exists.
    ///
    /// Returns `None` whenever the signature falls outside the supported
    /// shapes - callers treat that as "schema unavailable", not an error.
    pub fn from_signature(parameters: &[Parameter], output: &Annotation) -> Option<Self> {
        let input_type = parse_input_type(parameters)?;
        let output_type = parse_output_type(output)?;

        Some(Self {
            input_type: input_type.clone(),
            output_type: output_type.record,
            supports_streaming: output_type.supports_streaming,
        })
    }

    pub fn input_type(&self) -> &RecordType {
        &self.input_type
    }

    pub fn output_type(&self) -> Option<&RecordType> {
        self.output_type.as_ref()
    }

    pub fn supports_streaming(&self) -> bool {
        self.supports_streaming
    }

    /// Serialize the contract to a JSON mapping, used for generating the
    /// OpenAPI spec of the served endpoint.
    pub fn serialize(&self) -> Value {
        json!({
            "input_schema": self.input_type.schema(),
            "output_schema": self.output_type.as_ref().map(RecordType::schema),
            "supports_streaming": self.supports_streaming,
        })
    }
}

/// A contract exists only if exactly one parameter is present and it is
/// annotated with a record type.
fn parse_input_type(parameters: &[Parameter]) -> Option<&RecordType> {
    match parameters {
        [only] => match &only.annotation {
            Annotation::Record(record) => Some(record),
            _ => None,
        },
        _ => None,
    }
}

/// Classify the output annotation into one of the four supported response
/// shapes, in priority order. Anything else yields `None`.
fn parse_output_type(annotation: &Annotation) -> Option<OutputType> {
    match annotation {
        Annotation::Record(record) => Some(OutputType {
            record: Some(record.clone()),
            supports_streaming: false,
        }),
        Annotation::Generator | Annotation::AsyncGenerator => Some(OutputType {
            record: None,
            supports_streaming: true,
        }),
        Annotation::Awaitable(inner) => {
            let record = record_from_awaitable(inner)?;
            Some(OutputType {
                record: Some(record.clone()),
                supports_streaming: false,
            })
        }
        Annotation::Union(arms) => {
            let record = record_from_union(arms)?;
            Some(OutputType {
                record: Some(record.clone()),
                supports_streaming: true,
            })
        }
        _ => None,
    }
}

/// An awaitable carries a contract only when it wraps a record type directly.
fn record_from_awaitable(inner: &Annotation) -> Option<&RecordType> {
    match inner {
        Annotation::Record(record) => Some(record),
        _ => None,
    }
}

/// A union carries a contract only in the two-armed forms
/// `record | generator` and `awaitable(record) | async generator`: exactly
/// one arm must resolve to a record and exactly one must be a generator.
fn record_from_union(arms: &[Annotation]) -> Option<&RecordType> {
    if arms.len() != 2 {
        return None;
    }

    let records: Vec<&RecordType> = arms
        .iter()
        .filter_map(|arm| match arm {
            Annotation::Record(record) => Some(record),
            Annotation::Awaitable(inner) => record_from_awaitable(inner),
            _ => None,
        })
        .collect();
    let generators = arms.iter().filter(|arm| arm.is_generator()).count();

    if records.len() != 1 || generators != 1 {
        return None;
    }

    Some(records[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_record() -> RecordType {
        RecordType::builder("ModelInput")
            .field("prompt", FieldType::String)
            .optional_field("max_tokens", FieldType::Integer)
            .build()
    }

    fn output_record() -> RecordType {
        RecordType::builder("ModelOutput")
            .field("completion", FieldType::String)
            .build()
    }

    fn single_param() -> Vec<Parameter> {
        vec![Parameter::new(
            "input",
            Annotation::Record(input_record()),
        )]
    }

    #[test]
    fn test_sync_record_output() {
        let schema = TrussSchema::from_signature(
            &single_param(),
            &Annotation::Record(output_record()),
        )
        .unwrap();

        assert!(!schema.supports_streaming());
        assert_eq!(schema.output_type(), Some(&output_record()));
        assert_eq!(schema.input_type().name(), "ModelInput");
    }

    #[test]
    fn test_two_parameters_no_contract() {
        let params = vec![
            Parameter::new("input", Annotation::Record(input_record())),
            Parameter::new("extra", Annotation::Record(output_record())),
        ];
        let result =
            TrussSchema::from_signature(&params, &Annotation::Record(output_record()));
        assert!(result.is_none());
    }

    #[test]
    fn test_unannotated_parameter_no_contract() {
        let params = vec![Parameter::new("input", Annotation::Opaque)];
        let result =
            TrussSchema::from_signature(&params, &Annotation::Record(output_record()));
        assert!(result.is_none());
    }

    #[test]
    fn test_generator_output_streams_without_payload_type() {
        let schema =
            TrussSchema::from_signature(&single_param(), &Annotation::Generator).unwrap();
        assert!(schema.supports_streaming());
        assert!(schema.output_type().is_none());

        let schema =
            TrussSchema::from_signature(&single_param(), &Annotation::AsyncGenerator).unwrap();
        assert!(schema.supports_streaming());
        assert!(schema.output_type().is_none());
    }

    #[test]
    fn test_awaitable_record_is_sync() {
        let output = Annotation::awaitable(Annotation::Record(output_record()));
        let schema = TrussSchema::from_signature(&single_param(), &output).unwrap();
        assert!(!schema.supports_streaming());
        assert_eq!(schema.output_type(), Some(&output_record()));
    }

    #[test]
    fn test_awaitable_non_record_no_contract() {
        let output = Annotation::awaitable(Annotation::Opaque);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());

        let output = Annotation::awaitable(Annotation::Generator);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());
    }

    #[test]
    fn test_union_record_and_generator_streams_with_payload() {
        let output = Annotation::Union(vec![
            Annotation::Record(output_record()),
            Annotation::Generator,
        ]);
        let schema = TrussSchema::from_signature(&single_param(), &output).unwrap();
        assert!(schema.supports_streaming());
        assert_eq!(schema.output_type(), Some(&output_record()));
    }

    #[test]
    fn test_union_awaitable_record_and_async_generator() {
        let output = Annotation::Union(vec![
            Annotation::awaitable(Annotation::Record(output_record())),
            Annotation::AsyncGenerator,
        ]);
        let schema = TrussSchema::from_signature(&single_param(), &output).unwrap();
        assert!(schema.supports_streaming());
        assert_eq!(schema.output_type(), Some(&output_record()));
    }

    #[test]
    fn test_unsupported_union_shapes_no_contract() {
        // Three arms
        let output = Annotation::Union(vec![
            Annotation::Record(output_record()),
            Annotation::Generator,
            Annotation::AsyncGenerator,
        ]);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());

        // Two records, no generator
        let output = Annotation::Union(vec![
            Annotation::Record(output_record()),
            Annotation::Record(input_record()),
        ]);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());

        // Two generators, no record
        let output = Annotation::Union(vec![Annotation::Generator, Annotation::AsyncGenerator]);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());

        // Awaitable of non-record in a union arm
        let output = Annotation::Union(vec![
            Annotation::awaitable(Annotation::Opaque),
            Annotation::AsyncGenerator,
        ]);
        assert!(TrussSchema::from_signature(&single_param(), &output).is_none());
    }

    #[test]
    fn test_opaque_output_no_contract() {
        assert!(TrussSchema::from_signature(&single_param(), &Annotation::Opaque).is_none());
    }

    #[test]
    fn test_serialize_sync_contract() {
        let schema = TrussSchema::from_signature(
            &single_param(),
            &Annotation::Record(output_record()),
        )
        .unwrap();
        let value = schema.serialize();

        assert_eq!(value["supports_streaming"], serde_json::json!(false));
        assert_eq!(value["input_schema"]["title"], "ModelInput");
        assert_eq!(value["output_schema"]["title"], "ModelOutput");
    }

    #[test]
    fn test_serialize_streaming_contract_has_null_output() {
        let schema =
            TrussSchema::from_signature(&single_param(), &Annotation::Generator).unwrap();
        let value = schema.serialize();

        assert_eq!(value["supports_streaming"], serde_json::json!(true));
        assert!(value["output_schema"].is_null());
    }

    #[test]
    fn test_record_builder_schema_shape() {
        let record = input_record();
        let schema = record.schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["prompt"]["type"], "string");
        assert_eq!(schema["properties"]["prompt"]["title"], "Prompt");
        assert_eq!(schema["properties"]["max_tokens"]["type"], "integer");
        // Only the required field is listed
        assert_eq!(schema["required"], serde_json::json!(["prompt"]));
    }

    #[test]
    fn test_nested_array_field() {
        let record = RecordType::builder("StopList")
            .field("stop", FieldType::Array(Box::new(FieldType::String)))
            .build();
        let schema = record.schema();
        assert_eq!(schema["properties"]["stop"]["type"], "array");
        assert_eq!(schema["properties"]["stop"]["items"]["type"], "string");
    }
}
