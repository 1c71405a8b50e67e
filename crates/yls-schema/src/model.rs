//! Resolved Schema Model.
//!
//! A schema document, after reference resolution, becomes a tree of
//! [`SchemaNode`]s. Each node is one tagged variant; there is no
//! "bag of optional fields" and no unresolved reference left anywhere
//! in a resolved tree. Reference cycles are represented by
//! [`SchemaKind::Any`], the permissive placeholder.

use indexmap::IndexMap;
use serde_json::Value;

/// Title/description metadata carried by any schema node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A resolved schema fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub meta: SchemaMeta,
    pub kind: SchemaKind,
}

impl SchemaNode {
    /// The permissive "anything allowed" node. Used for `true` schemas,
    /// empty schemas, and as the cycle-breaking placeholder.
    pub fn any() -> Self {
        SchemaNode {
            meta: SchemaMeta::default(),
            kind: SchemaKind::Any,
        }
    }
}

/// The shape constraint a schema node expresses.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Object(ObjectSchema),
    Array(Box<SchemaNode>),
    Scalar(ScalarSchema),
    Combinator {
        kind: CombinatorKind,
        /// Branch order is preserved from the schema document; it
        /// drives candidate order during completion.
        branches: Vec<SchemaNode>,
    },
    /// No constraint. Anything is allowed; nothing can be suggested.
    Any,
}

/// An object schema: named properties plus an additional-properties
/// policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Properties in declaration order.
    pub properties: IndexMap<String, SchemaNode>,
    /// Names listed as required, whether or not they are declared in
    /// `properties`.
    pub required: Vec<String>,
    /// Whether keys outside `properties` are allowed.
    pub additional_allowed: bool,
}

/// A scalar schema, possibly constrained to an enumeration or a single
/// constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarSchema {
    pub kind: ScalarKind,
    /// Allowed literal values, in declared order. Empty means the value
    /// is free-form.
    pub enum_values: Vec<Value>,
    pub const_value: Option<Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Enum/const schemas without an explicit `type`.
    #[default]
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorKind {
    AllOf,
    AnyOf,
    OneOf,
}

impl CombinatorKind {
    /// The schema keyword this combinator was parsed from.
    pub fn keyword(&self) -> &'static str {
        match self {
            CombinatorKind::AllOf => "allOf",
            CombinatorKind::AnyOf => "anyOf",
            CombinatorKind::OneOf => "oneOf",
        }
    }
}
