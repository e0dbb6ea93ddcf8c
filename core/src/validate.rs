//! Descriptor validation.
//!
//! The merge engine checks each response and header right before writing it,
//! failing on the first problem. [`validate_descriptor`] runs the same checks
//! up front for callers that must not leave a model partially merged.
//!
//! # Examples
//!
//! ```
//! use operation_merge_core::*;
//!
//! let ok = OperationDescriptor::new().with_response(ResponseDescriptor::new("200"));
//! assert!(validate_descriptor(&ok).is_ok());
//!
//! // The catch-all status code cannot be declared
//! let bad = OperationDescriptor::new().with_response(ResponseDescriptor::new("default"));
//! assert!(matches!(
//!     validate_descriptor(&bad),
//!     Err(ValidationError::UndefinedStatusCode(_))
//! ));
//! ```

use thiserror::Error;

use crate::{DEFAULT_STATUS_CODE, HeaderDescriptor, OperationDescriptor, ResponseDescriptor, TypeRef};

/// Rejection of a malformed operation descriptor.
///
/// The `Display` impl provides a human-readable reason naming the violated
/// constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Response status code is empty or the reserved `"default"`.
    #[error("response status code must be defined, got {0:?}")]
    UndefinedStatusCode(String),
    /// Header declares no concrete schema type.
    #[error("header schema type must be defined for header {header:?} of response {status_code}")]
    MissingHeaderType { status_code: String, header: String },
    /// Header has an empty name.
    #[error("header name must be defined for response {status_code}")]
    MissingHeaderName { status_code: String },
}

/// Checks that a response names a concrete status code.
pub fn validate_status_code(status_code: &str) -> Result<(), ValidationError> {
    if status_code.is_empty() || status_code == DEFAULT_STATUS_CODE {
        return Err(ValidationError::UndefinedStatusCode(status_code.to_string()));
    }
    Ok(())
}

/// Checks a header and returns its concrete type.
///
/// The type is checked before the name.
pub fn validate_header<'a>(
    status_code: &str,
    header: &'a HeaderDescriptor,
) -> Result<&'a TypeRef, ValidationError> {
    let Some(type_ref) = header.type_ref.as_ref() else {
        return Err(ValidationError::MissingHeaderType {
            status_code: status_code.to_string(),
            header: header.name.clone(),
        });
    };
    if header.name.is_empty() {
        return Err(ValidationError::MissingHeaderName {
            status_code: status_code.to_string(),
        });
    }
    Ok(type_ref)
}

/// Validates one response and all of its headers.
pub fn validate_response(response: &ResponseDescriptor) -> Result<(), ValidationError> {
    validate_status_code(&response.status_code)?;
    for header in &response.headers {
        validate_header(&response.status_code, header)?;
    }
    Ok(())
}

/// Validates a whole descriptor without touching any model or registry.
///
/// Reports the same first error that [`merge_operation`](crate::merge_operation)
/// would stop at.
///
/// # Examples
///
/// ```
/// use operation_merge_core::*;
///
/// let descriptor = OperationDescriptor::new().with_response(
///     ResponseDescriptor::new("200")
///         .with_header(HeaderDescriptor::new("", TypeRef::Primitive(PrimitiveType::String))),
/// );
/// let err = validate_descriptor(&descriptor).unwrap_err();
/// assert_eq!(err.to_string(), "header name must be defined for response 200");
/// ```
pub fn validate_descriptor(descriptor: &OperationDescriptor) -> Result<(), ValidationError> {
    descriptor.responses.iter().try_for_each(validate_response)
}
