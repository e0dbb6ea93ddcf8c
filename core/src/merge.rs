//! Merging declared operation metadata into an operation model.
//!
//! Declared metadata augments what earlier pipeline stages already put in the
//! [`OperationModel`]: a declared value replaces the model's value only when
//! it is present (non-empty). Absence is never a reset. That policy lives in
//! [`apply_if_present`] and every scalar and collection field goes through it.
//!
//! # Example
//!
//! ```
//! use operation_merge_core::*;
//!
//! let registry = InMemorySchemaRegistry::new();
//! let descriptor = OperationDescriptor::new()
//!     .with_method("POST")
//!     .with_response(
//!         ResponseDescriptor::new("200")
//!             .with_content(ContentDescriptor::new(
//!                 "application/json",
//!                 TypeRef::Named(NamedType::new("Widget")),
//!             ))
//!             .with_description("ok"),
//!     );
//!
//! let mut model = OperationModel::default();
//! merge_operation(&registry, &descriptor, &mut model).unwrap();
//!
//! assert_eq!(model.method, "POST");
//! assert_eq!(model.produces, vec!["application/json"]);
//! let ok = model.response("200").unwrap();
//! assert_eq!(ok.description.as_deref(), Some("ok"));
//! assert_eq!(
//!     ok.schema.as_ref().and_then(SchemaRef::as_reference),
//!     Some("#/components/schemas/Widget")
//! );
//! ```

use std::collections::BTreeMap;

use indexmap::IndexSet;
use tracing::debug;

use crate::{
    OperationDescriptor, OperationModel, ResponseDescriptor, SchemaRegistry, TypeRef,
    ValidationError, resolve_specific_operation, validate_descriptor, validate_header, validate_status_code,
};

/// Whether a value counts as declared for merge precedence.
///
/// Empty strings and empty collections are absent.
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Presence for BTreeMap<K, V> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Presence> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.as_ref().is_some_and(Presence::is_present)
    }
}

/// Replaces `slot` with `value` when `value` is present.
///
/// Returns `true` if the slot was overwritten.
///
/// # Examples
///
/// ```
/// use operation_merge_core::apply_if_present;
///
/// let mut summary = Some("inferred".to_string());
/// assert!(!apply_if_present(&mut summary, Some(String::new())));
/// assert!(!apply_if_present(&mut summary, None));
/// assert_eq!(summary.as_deref(), Some("inferred"));
///
/// assert!(apply_if_present(&mut summary, Some("declared".to_string())));
/// assert_eq!(summary.as_deref(), Some("declared"));
/// ```
pub fn apply_if_present<T: Presence>(slot: &mut T, value: T) -> bool {
    if !value.is_present() {
        return false;
    }
    *slot = value;
    true
}

/// Merges one declared response into `model`.
///
/// Returns the non-empty media types declared by the response's content, in
/// declaration order. The recorded schema is the last content entry with a
/// concrete type; media types and schema are independent of each other.
///
/// # Errors
///
/// Returns [`ValidationError::UndefinedStatusCode`] before touching the model
/// when the status code is empty or `"default"`. Header errors surface after
/// the schema, description and earlier headers were already written.
pub fn merge_response(
    registry: &dyn SchemaRegistry,
    response: &ResponseDescriptor,
    model: &mut OperationModel,
) -> Result<IndexSet<String>, ValidationError> {
    validate_status_code(&response.status_code)?;
    let status_code = response.status_code.as_str();

    let mut media_types = IndexSet::new();
    let mut payload_type = None;
    for content in &response.content {
        if let Some(media_type) = content.media_type.as_deref().filter(|m| !m.is_empty()) {
            media_types.insert(media_type.to_string());
        }
        if let Some(type_ref) = content.type_ref.as_ref() {
            payload_type = Some(type_ref);
        }
    }

    let schema = payload_type.map(|type_ref| registry.resolve(type_ref));
    let payload = payload_type.map(TypeRef::display_name);
    debug!(
        status_code,
        payload = payload.as_deref().unwrap_or("none"),
        media_types = media_types.len(),
        "Merging response"
    );
    model.update_response(status_code, schema);

    if let Some(description) = response.description.as_deref().filter(|d| !d.is_empty()) {
        model.update_response_description(status_code, description);
    }

    for header in &response.headers {
        let type_ref = validate_header(status_code, header)?;
        let schema = registry.resolve(type_ref);
        model.update_response_header(status_code, &header.name, schema);
        debug!(status_code, header = %header.name, "Merged response header");
    }

    Ok(media_types)
}

/// Merges a declared operation into `model`.
///
/// 1. A non-empty declared method replaces the model's method.
/// 2. Responses merge in order; their media types are appended to
///    `produces` once all responses succeeded, first-seen order, without
///    deduplicating against what `produces` already holds.
/// 3. Summary, description, operation id, extensions and tags replace the
///    model's values only when the declared value is present.
///
/// # Errors
///
/// Fails on the first invalid response or header. Entries merged before the
/// failure stay in `model`; use [`merge_operation_atomic`] to avoid that.
pub fn merge_operation(
    registry: &dyn SchemaRegistry,
    descriptor: &OperationDescriptor,
    model: &mut OperationModel,
) -> Result<(), ValidationError> {
    if let Some(method) = descriptor.method.as_ref() {
        apply_if_present(&mut model.method, method.clone());
    }

    let mut produces = IndexSet::new();
    for response in &descriptor.responses {
        produces.extend(merge_response(registry, response, model)?);
    }
    if !produces.is_empty() {
        model.update_produces(produces);
    }

    let specific = resolve_specific_operation(descriptor);
    apply_if_present(&mut model.summary, specific.summary);
    apply_if_present(&mut model.description, specific.description);
    apply_if_present(&mut model.operation_id, specific.operation_id);
    apply_if_present(&mut model.extensions, specific.extensions);
    apply_if_present(&mut model.tags, specific.tags);

    debug!(
        method = %model.method,
        operation_id = model.operation_id.as_deref().unwrap_or(""),
        responses = model.responses.len(),
        "Merged operation"
    );
    Ok(())
}

/// Validates the whole descriptor, then merges it.
///
/// A failing call leaves both `model` and `registry` untouched.
///
/// # Examples
///
/// ```
/// use operation_merge_core::*;
///
/// let registry = InMemorySchemaRegistry::new();
/// let descriptor = OperationDescriptor::new()
///     .with_response(
///         ResponseDescriptor::new("200")
///             .with_content(ContentDescriptor::new("application/json", TypeRef::Named(NamedType::new("Widget")))),
///     )
///     .with_response(ResponseDescriptor::new("default"));
///
/// let mut model = OperationModel::new("GET");
/// assert!(merge_operation_atomic(&registry, &descriptor, &mut model).is_err());
/// assert!(model.responses.is_empty());
/// assert!(registry.is_empty());
/// ```
pub fn merge_operation_atomic(
    registry: &dyn SchemaRegistry,
    descriptor: &OperationDescriptor,
    model: &mut OperationModel,
) -> Result<(), ValidationError> {
    validate_descriptor(descriptor)?;
    merge_operation(registry, descriptor, model)
}
