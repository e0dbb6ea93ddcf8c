//! Operation descriptor and model type definitions.
//!
//! Descriptors are the declarative input (what a user annotated on an API
//! operation); the [`OperationModel`] is the mutable output that lives in the
//! API document being assembled. All types serialize with [`serde`] so they
//! can be read from JSON or YAML fixtures and written back out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code reserved by OpenAPI for the catch-all response.
///
/// Declared responses must name a concrete status code instead.
pub const DEFAULT_STATUS_CODE: &str = "default";

/// Built-in scalar payload shapes.
///
/// Each primitive resolves to an inline JSON schema rather than a named
/// component.
///
/// # Examples
///
/// ```
/// use operation_merge_core::PrimitiveType;
///
/// assert_eq!(PrimitiveType::Long.schema_type(), "integer");
/// assert_eq!(PrimitiveType::Long.format(), Some("int64"));
/// assert_eq!(PrimitiveType::String.format(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
    DateTime,
    Binary,
}

impl PrimitiveType {
    /// Returns the serialized name, e.g. `date_time`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::DateTime => "date_time",
            Self::Binary => "binary",
        }
    }

    /// Returns the JSON schema `type` keyword for this primitive.
    pub fn schema_type(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer | Self::Long => "integer",
            Self::Float | Self::Double => "number",
            Self::String | Self::DateTime | Self::Binary => "string",
        }
    }

    /// Returns the JSON schema `format` keyword, if the primitive has one.
    pub fn format(self) -> Option<&'static str> {
        match self {
            Self::Integer => Some("int32"),
            Self::Long => Some("int64"),
            Self::Float => Some("float"),
            Self::Double => Some("double"),
            Self::DateTime => Some("date-time"),
            Self::Binary => Some("binary"),
            Self::Boolean | Self::String => None,
        }
    }
}

/// A field of a [`NamedType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedField {
    /// Property name in the generated schema
    pub name: String,
    /// Shape of the property value
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Whether the property is listed under `required`
    #[serde(default)]
    pub required: bool,
}

impl NamedField {
    /// Creates an optional field.
    pub fn optional(name: &str, type_ref: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            required: false,
        }
    }

    /// Creates a required field.
    pub fn required(name: &str, type_ref: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            type_ref,
            required: true,
        }
    }
}

/// A structured payload type that is registered once as a reusable schema.
///
/// # Examples
///
/// ```
/// use operation_merge_core::{NamedField, NamedType, PrimitiveType, TypeRef};
///
/// let widget = NamedType::new("Widget")
///     .with_field(NamedField::required("id", TypeRef::Primitive(PrimitiveType::Long)))
///     .with_field(NamedField::optional("label", TypeRef::Primitive(PrimitiveType::String)));
///
/// assert_eq!(widget.name, "Widget");
/// assert_eq!(widget.fields.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedType {
    /// Component name; empty names resolve inline
    pub name: String,
    /// Optional schema description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties in declaration order
    #[serde(default)]
    pub fields: Vec<NamedField>,
}

impl NamedType {
    /// Creates a named type without fields.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: NamedField) -> Self {
        self.fields.push(field);
        self
    }
}

/// Handle identifying the shape of a payload or header value.
///
/// "No payload" is not a variant: places that accept an absent type hold an
/// `Option<TypeRef>` and use `None`.
///
/// # Examples
///
/// ```
/// use operation_merge_core::{NamedType, PrimitiveType, TypeRef};
///
/// let list = TypeRef::array(TypeRef::Named(NamedType::new("Widget")));
/// assert_eq!(list.display_name(), "array<Widget>");
///
/// let id = TypeRef::Primitive(PrimitiveType::Long);
/// assert_eq!(id.display_name(), "long");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// Scalar value
    Primitive(PrimitiveType),
    /// Homogeneous list
    Array(Box<TypeRef>),
    /// String-keyed map
    Map(Box<TypeRef>),
    /// Structured type registered as a component
    Named(NamedType),
}

impl TypeRef {
    /// Wraps `items` in an array type.
    pub fn array(items: TypeRef) -> Self {
        Self::Array(Box::new(items))
    }

    /// Wraps `values` in a map type.
    pub fn map(values: TypeRef) -> Self {
        Self::Map(Box::new(values))
    }

    /// Human-readable name used in diagnostics and logs.
    pub fn display_name(&self) -> String {
        match self {
            Self::Primitive(primitive) => primitive.name().to_string(),
            Self::Array(items) => format!("array<{}>", items.display_name()),
            Self::Map(values) => format!("map<{}>", values.display_name()),
            Self::Named(named) if named.name.is_empty() => "<anonymous>".to_string(),
            Self::Named(named) => named.name.clone(),
        }
    }
}

/// A resolved schema as it appears inside the document.
///
/// Serializes either as `{"$ref": "..."}` or as the inline schema object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaRef {
    /// Reference to a registered component schema
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// Schema embedded in place
    Inline(Value),
}

impl SchemaRef {
    /// Creates a reference schema.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self::Reference {
            reference: reference.into(),
        }
    }

    /// Returns the `$ref` target, if this is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference { reference } => Some(reference),
            Self::Inline(_) => None,
        }
    }

    /// Renders the schema as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Reference { reference } => serde_json::json!({ "$ref": reference }),
            Self::Inline(value) => value.clone(),
        }
    }
}

/// One media type (and optional payload type) a response can be served as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    /// Media type, e.g. `application/json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Payload type; `None` means no payload
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

impl ContentDescriptor {
    /// Creates a content entry with both a media type and a payload type.
    pub fn new(media_type: &str, type_ref: TypeRef) -> Self {
        Self {
            media_type: Some(media_type.to_string()),
            type_ref: Some(type_ref),
        }
    }

    /// Creates a content entry that only declares a media type.
    pub fn media_type(media_type: &str) -> Self {
        Self {
            media_type: Some(media_type.to_string()),
            type_ref: None,
        }
    }
}

/// A declared response header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDescriptor {
    /// Header name; must be non-empty
    #[serde(default)]
    pub name: String,
    /// Header value type; must be present
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_ref: Option<TypeRef>,
}

impl HeaderDescriptor {
    /// Creates a header descriptor.
    pub fn new(name: &str, type_ref: TypeRef) -> Self {
        Self {
            name: name.to_string(),
            type_ref: Some(type_ref),
        }
    }
}

/// A declared response for one status code.
///
/// # Examples
///
/// ```
/// use operation_merge_core::*;
///
/// let response = ResponseDescriptor::new("200")
///     .with_content(ContentDescriptor::new(
///         "application/json",
///         TypeRef::Named(NamedType::new("Widget")),
///     ))
///     .with_description("ok");
///
/// assert_eq!(response.status_code, "200");
/// assert_eq!(response.content.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDescriptor {
    /// HTTP status code; must be non-empty and not `"default"`
    #[serde(default)]
    pub status_code: String,
    /// Media types and payload types, in declaration order
    #[serde(default)]
    pub content: Vec<ContentDescriptor>,
    /// Response description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared headers
    #[serde(default)]
    pub headers: Vec<HeaderDescriptor>,
}

impl ResponseDescriptor {
    /// Creates a response descriptor for `status_code`.
    pub fn new(status_code: &str) -> Self {
        Self {
            status_code: status_code.to_string(),
            ..Default::default()
        }
    }

    /// Appends a content entry.
    pub fn with_content(mut self, content: ContentDescriptor) -> Self {
        self.content.push(content);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, header: HeaderDescriptor) -> Self {
        self.headers.push(header);
        self
    }
}

/// Declarative metadata for one API operation.
///
/// Produced by an introspection layer and consumed once by
/// [`merge_operation`](crate::merge_operation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// HTTP method override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Declared responses, in order
    #[serde(default)]
    pub responses: Vec<ResponseDescriptor>,
    /// Short summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unique operation id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Vendor extensions
    #[serde(default)]
    pub extensions: BTreeMap<String, Value>,
    /// Grouping tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OperationDescriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = Some(method.to_string());
        self
    }

    /// Appends a response.
    pub fn with_response(mut self, response: ResponseDescriptor) -> Self {
        self.responses.push(response);
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    /// Sets the operation id.
    pub fn with_operation_id(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_string());
        self
    }

    /// Appends a tag.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }
}

/// Merged state of a single response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseModel {
    /// Payload schema, if any content entry declared a type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Header schemas keyed by header name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, SchemaRef>,
}

/// The in-document model of one operation.
///
/// Owned by the caller and possibly pre-populated by earlier pipeline stages.
/// The merge engine only mutates it through `&mut` access.
///
/// # Examples
///
/// ```
/// use operation_merge_core::{OperationModel, SchemaRef};
///
/// let mut model = OperationModel::new("GET");
/// model.update_response("200", Some(SchemaRef::reference("#/components/schemas/Widget")));
/// model.update_response_description("200", "ok");
/// model.update_produces(["application/json"]);
///
/// assert_eq!(model.response("200").unwrap().description.as_deref(), Some("ok"));
/// assert_eq!(model.produces, vec!["application/json"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationModel {
    /// HTTP method
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Vendor extensions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extensions: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Responses keyed by status code
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseModel>,
    /// Media types in declaration order; append-only, not deduplicated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
}

impl OperationModel {
    /// Creates an empty model for `method`.
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            ..Default::default()
        }
    }

    /// Looks up a response by status code.
    pub fn response(&self, status_code: &str) -> Option<&ResponseModel> {
        self.responses.get(status_code)
    }

    fn response_entry(&mut self, status_code: &str) -> &mut ResponseModel {
        self.responses.entry(status_code.to_string()).or_default()
    }

    /// Creates the response entry if absent and records `schema` on it.
    ///
    /// A `None` schema only ensures the entry exists; it never clears a schema
    /// recorded earlier.
    pub fn update_response(&mut self, status_code: &str, schema: Option<SchemaRef>) {
        let response = self.response_entry(status_code);
        if let Some(schema) = schema {
            response.schema = Some(schema);
        }
    }

    /// Sets the description of the response, creating the entry if absent.
    pub fn update_response_description(&mut self, status_code: &str, description: &str) {
        self.response_entry(status_code).description = Some(description.to_string());
    }

    /// Sets a header schema on the response, creating the entry if absent.
    pub fn update_response_header(&mut self, status_code: &str, name: &str, schema: SchemaRef) {
        self.response_entry(status_code)
            .headers
            .insert(name.to_string(), schema);
    }

    /// Appends media types to `produces` in iteration order.
    pub fn update_produces<I, S>(&mut self, media_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces
            .extend(media_types.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_response_keeps_schema_when_none() {
        let mut model = OperationModel::new("GET");
        model.update_response("200", Some(SchemaRef::reference("#/components/schemas/A")));
        model.update_response("200", None);

        assert_eq!(
            model.response("200").and_then(|r| r.schema.as_ref()),
            Some(&SchemaRef::reference("#/components/schemas/A"))
        );
        assert_eq!(model.responses.len(), 1);
    }

    #[test]
    fn test_update_response_header_creates_entry() {
        let mut model = OperationModel::default();
        model.update_response_header(
            "201",
            "Location",
            SchemaRef::Inline(serde_json::json!({ "type": "string" })),
        );

        let response = model.response("201").unwrap();
        assert!(response.schema.is_none());
        assert!(response.headers.contains_key("Location"));
    }

    #[test]
    fn test_schema_ref_serializes_as_dollar_ref() {
        let schema = SchemaRef::reference("#/components/schemas/Widget");
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value, serde_json::json!({ "$ref": "#/components/schemas/Widget" }));
        assert_eq!(schema.to_value(), value);

        let back: SchemaRef = serde_json::from_value(value).unwrap();
        assert_eq!(back.as_reference(), Some("#/components/schemas/Widget"));
    }

    #[test]
    fn test_descriptor_deserializes_from_yaml() {
        let yaml = r#"
method: POST
responses:
  - statusCode: "200"
    description: ok
    content:
      - mediaType: application/json
        type:
          named:
            name: Widget
            fields:
              - name: id
                type:
                  primitive: long
                required: true
      - mediaType: text/plain
    headers:
      - name: X-Rate-Limit
        type:
          primitive: integer
tags: [widgets]
"#;
        let descriptor: OperationDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.method.as_deref(), Some("POST"));

        let response = &descriptor.responses[0];
        assert_eq!(response.content.len(), 2);
        assert!(response.content[1].type_ref.is_none());
        assert_eq!(
            response.headers[0].type_ref,
            Some(TypeRef::Primitive(PrimitiveType::Integer))
        );
        assert_eq!(descriptor.tags, vec!["widgets"]);
    }

    #[test]
    fn test_display_name_of_nested_types() {
        let t = TypeRef::map(TypeRef::array(TypeRef::Primitive(PrimitiveType::DateTime)));
        assert_eq!(t.display_name(), "map<array<date_time>>");
        assert_eq!(TypeRef::Named(NamedType::default()).display_name(), "<anonymous>");
    }
}
