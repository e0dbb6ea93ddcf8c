//! Document-wide schema registry.
//!
//! The merge engine never builds component schemas itself. It hands each
//! concrete [`TypeRef`] to a [`SchemaRegistry`] and records whatever
//! [`SchemaRef`] comes back. [`InMemorySchemaRegistry`] is the reference
//! implementation used by the CLI and the tests.

use std::collections::BTreeMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::{Map, Value, json};

use crate::{NamedType, PrimitiveType, SchemaRef, TypeRef};

/// Prefix for component schema references in an OpenAPI 3 document.
pub const DEFAULT_REF_PREFIX: &str = "#/components/schemas/";

/// Resolves type references into schemas usable inside the document.
///
/// Implementations must be idempotent: resolving the same type twice yields
/// the same reference and registers at most one definition. Registries shared
/// between threads must make resolve-or-create atomic.
pub trait SchemaRegistry: Send + Sync {
    /// Returns the schema for `type_ref`, registering a component on first use.
    fn resolve(&self, type_ref: &TypeRef) -> SchemaRef;
}

/// Thread-safe registry keeping component schemas in memory.
///
/// Uses a `DashMap` so concurrent merges into independent operation models can
/// share one registry.
///
/// # Examples
///
/// ```
/// use operation_merge_core::*;
///
/// let registry = InMemorySchemaRegistry::new();
/// let widget = TypeRef::Named(
///     NamedType::new("Widget")
///         .with_field(NamedField::required("id", TypeRef::Primitive(PrimitiveType::Long))),
/// );
///
/// let first = registry.resolve(&widget);
/// let second = registry.resolve(&widget);
/// assert_eq!(first, second);
/// assert_eq!(first.as_reference(), Some("#/components/schemas/Widget"));
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug)]
pub struct InMemorySchemaRegistry {
    ref_prefix: String,
    schemas: DashMap<String, Value>,
}

impl Default for InMemorySchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySchemaRegistry {
    /// Creates an empty registry using [`DEFAULT_REF_PREFIX`].
    pub fn new() -> Self {
        Self::with_ref_prefix(DEFAULT_REF_PREFIX)
    }

    /// Creates an empty registry emitting references under `prefix`.
    pub fn with_ref_prefix(prefix: impl Into<String>) -> Self {
        Self {
            ref_prefix: prefix.into(),
            schemas: DashMap::new(),
        }
    }

    /// Returns the reference prefix.
    pub fn ref_prefix(&self) -> &str {
        &self.ref_prefix
    }

    /// Returns a copy of the registered definition for `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.schemas.get(name).map(|entry| entry.value().clone())
    }

    /// Returns `true` if a definition is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns the number of registered definitions.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Snapshot of all definitions, sorted by name.
    pub fn schemas(&self) -> BTreeMap<String, Value> {
        self.schemas
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn primitive_schema(primitive: PrimitiveType) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(primitive.schema_type()));
        if let Some(format) = primitive.format() {
            schema.insert("format".into(), json!(format));
        }
        Value::Object(schema)
    }

    fn object_schema(&self, named: &NamedType) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &named.fields {
            properties.insert(field.name.clone(), self.resolve(&field.type_ref).to_value());
            if field.required {
                required.push(json!(field.name));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        if let Some(desc) = named.description.as_deref().filter(|d| !d.is_empty()) {
            schema.insert("description".into(), json!(desc));
        }
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        Value::Object(schema)
    }

    fn register(&self, named: &NamedType) -> SchemaRef {
        let reference = SchemaRef::reference(format!("{}{}", self.ref_prefix, named.name));

        // A fieldless type naming a known component is only a reference.
        if named.fields.is_empty() && self.schemas.contains_key(&named.name) {
            return reference;
        }

        // Nested types register first so the entry lock below is never held
        // while resolving into the same map.
        let definition = self.object_schema(named);

        match self.schemas.entry(named.name.clone()) {
            Entry::Vacant(vacant) => {
                vacant.insert(definition);
                tracing::debug!(name = %named.name, "Registered component schema");
            }
            Entry::Occupied(mut existing)
                if has_properties(&definition) && existing.get() != &definition =>
            {
                if has_properties(existing.get()) {
                    tracing::warn!(
                        name = %named.name,
                        "Schema definition conflict; keeping the first registration"
                    );
                } else {
                    // A self-referencing field registered the name as a
                    // placeholder while this definition was being built.
                    existing.insert(definition);
                    tracing::debug!(name = %named.name, "Completed placeholder component schema");
                }
            }
            Entry::Occupied(_) => {}
        }

        reference
    }
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty())
}

impl SchemaRegistry for InMemorySchemaRegistry {
    fn resolve(&self, type_ref: &TypeRef) -> SchemaRef {
        match type_ref {
            TypeRef::Primitive(primitive) => SchemaRef::Inline(Self::primitive_schema(*primitive)),
            TypeRef::Array(items) => SchemaRef::Inline(json!({
                "type": "array",
                "items": self.resolve(items).to_value(),
            })),
            TypeRef::Map(values) => SchemaRef::Inline(json!({
                "type": "object",
                "additionalProperties": self.resolve(values).to_value(),
            })),
            TypeRef::Named(named) if named.name.trim().is_empty() => {
                SchemaRef::Inline(self.object_schema(named))
            }
            TypeRef::Named(named) => self.register(named),
        }
    }
}
