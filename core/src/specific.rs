//! Resolution of the descriptor's identifying and textual fields.
//!
//! Produces the "specific operation" view that the merger applies on top of
//! the model. This is a pure function of the descriptor.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::OperationDescriptor;

const EXTENSION_PREFIX: &str = "x-";

/// Summary, description, id, extensions and tags as declared on an operation.
///
/// Empty strings are normalized to `None`, so every field is either present
/// or absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecificOperation {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    /// Extensions keyed with the `x-` prefix
    pub extensions: BTreeMap<String, Value>,
    /// Non-blank tags, first occurrence wins
    pub tags: Vec<String>,
}

/// Resolves the specific operation view of `descriptor`.
///
/// # Examples
///
/// ```
/// use operation_merge_core::*;
///
/// let mut descriptor = OperationDescriptor::new()
///     .with_summary("List widgets")
///     .with_tag("widgets")
///     .with_tag("")
///     .with_tag("widgets");
/// descriptor.extensions.insert("owner".into(), serde_json::json!("team-a"));
///
/// let specific = resolve_specific_operation(&descriptor);
/// assert_eq!(specific.summary.as_deref(), Some("List widgets"));
/// assert_eq!(specific.tags, vec!["widgets"]);
/// assert!(specific.extensions.contains_key("x-owner"));
/// ```
pub fn resolve_specific_operation(descriptor: &OperationDescriptor) -> SpecificOperation {
    SpecificOperation {
        summary: non_empty(descriptor.summary.as_deref()),
        description: non_empty(descriptor.description.as_deref()),
        operation_id: non_empty(descriptor.operation_id.as_deref()),
        extensions: resolve_extensions(&descriptor.extensions),
        tags: resolve_tags(&descriptor.tags),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}

fn resolve_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .filter(|tag| !tag.trim().is_empty())
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

fn extension_key(name: &str) -> String {
    if name.starts_with(EXTENSION_PREFIX) {
        name.to_string()
    } else {
        format!("{EXTENSION_PREFIX}{name}")
    }
}

fn resolve_extensions(declared: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut resolved = BTreeMap::new();
    for (name, value) in declared {
        if !name.is_empty() {
            resolved.insert(extension_key(name), value.clone());
            continue;
        }
        // An unnamed extension contributes its members directly.
        if let Value::Object(members) = value {
            for (member, member_value) in members.iter().filter(|(k, _)| !k.is_empty()) {
                resolved.insert(extension_key(member), member_value.clone());
            }
        }
    }
    resolved
}
