// src/shape.rs
//! Canonical shape tree.
//!
//! The solved, immutable description of what the merged samples looked like:
//! one `ShapeNode` per JSON value position, classified and flagged for
//! requiredness. Inference produces it; lowering consumes it read-only.

use indexmap::IndexMap;
use serde::Serialize;

/// Closed classification set for one value position.
///
/// `Any` doubles as the forward-compatibility fallback: lowering maps it (and
/// anything it cannot recognize) to `interface{}` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Bool,
    Int,
    Float,
    Str,
    Object,
    ArrayUnknown,
    ArrayBool,
    ArrayInt,
    ArrayFloat,
    ArrayStr,
    ArrayObject,
    ArrayMixed,
    /// Reference a pre-existing named type instead of synthesizing one.
    External,
    Any,
}

/// One solved value position.
///
/// `children` is populated only for `Object` and `ArrayObject` (for the
/// latter it describes the element object's fields). Insertion order is
/// whatever the samples happened to provide; lowering never depends on it.
#[derive(Debug, Clone, Serialize)]
pub struct ShapeNode {
    pub key: String,
    pub kind: Kind,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, ShapeNode>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_type_id: Option<String>,
}

impl ShapeNode {
    pub fn new(key: impl Into<String>, kind: Kind, required: bool) -> Self {
        Self {
            key: key.into(),
            kind,
            children: IndexMap::new(),
            required,
            external_type_id: None,
        }
    }

    pub fn with_children(
        key: impl Into<String>,
        kind: Kind,
        required: bool,
        children: IndexMap<String, ShapeNode>,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            children,
            required,
            external_type_id: None,
        }
    }
}
