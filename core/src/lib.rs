//! Operation metadata merging for OpenAPI document assembly.
//!
//! This crate merges a declarative description of one API operation into the
//! mutable model of that operation inside a larger document:
//!
//! - [`OperationDescriptor`] — declared metadata: method, responses, summary,
//!   description, operation id, extensions, tags.
//! - [`OperationModel`] — the in-document operation being assembled, with its
//!   response map and `produces` list.
//! - [`SchemaRegistry`] — resolves [`TypeRef`]s into [`SchemaRef`]s, registering
//!   reusable component schemas; [`InMemorySchemaRegistry`] is the bundled
//!   implementation.
//!
//! Merging ([`merge_operation`], [`merge_response`]) applies declared values
//! only when present, so earlier pipeline stages are augmented rather than
//! erased. Validation ([`validate_descriptor`]) rejects undefined status codes
//! and incomplete headers with a [`ValidationError`].
//!
//! # Example
//!
//! ```
//! use operation_merge_core::*;
//!
//! let registry = InMemorySchemaRegistry::new();
//! let descriptor = OperationDescriptor::new()
//!     .with_method("GET")
//!     .with_summary("Fetch a widget")
//!     .with_response(
//!         ResponseDescriptor::new("200")
//!             .with_content(ContentDescriptor::new(
//!                 "application/json",
//!                 TypeRef::Named(NamedType::new("Widget")),
//!             ))
//!             .with_header(HeaderDescriptor::new(
//!                 "ETag",
//!                 TypeRef::Primitive(PrimitiveType::String),
//!             )),
//!     );
//!
//! let mut model = OperationModel::default();
//! merge_operation(&registry, &descriptor, &mut model).unwrap();
//!
//! assert_eq!(model.summary.as_deref(), Some("Fetch a widget"));
//! assert!(model.response("200").unwrap().headers.contains_key("ETag"));
//! assert!(registry.contains("Widget"));
//! ```

mod merge;
mod registry;
mod specific;
mod types;
mod validate;

pub use merge::{Presence, apply_if_present, merge_operation, merge_operation_atomic, merge_response};
pub use registry::{DEFAULT_REF_PREFIX, InMemorySchemaRegistry, SchemaRegistry};
pub use specific::{SpecificOperation, resolve_specific_operation};
pub use types::*;
pub use validate::{
    ValidationError, validate_descriptor, validate_header, validate_response,
    validate_status_code,
};
