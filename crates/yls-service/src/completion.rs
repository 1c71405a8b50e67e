//! Candidate synthesis.
//!
//! Takes a resolved schema tree and a cursor context and produces LSP
//! completion items. The schema is walked along the document path the
//! cursor context carries; combinators fan out into every branch, and
//! candidates are collected across all of them, first occurrence of a
//! label winning. No prefix filtering happens here: the full candidate
//! set is returned and the client narrows it as the user types.

use std::collections::HashSet;

use lsp_types::{CompletionItem, CompletionItemKind, Documentation, MarkupContent, MarkupKind};
use serde_json::Value;
use yls_schema::{ObjectSchema, ScalarKind, ScalarSchema, SchemaKind, SchemaNode};
use yls_tree::{CursorContext, PathSegment};

/// Completion candidates for `context` under `schema`.
///
/// Candidate order is schema declaration order: object properties as
/// written, enum values as listed, combinator branches left to right.
pub fn completion_items(schema: &SchemaNode, context: &CursorContext) -> Vec<CompletionItem> {
    let mut builder = ItemBuilder::default();
    match context {
        CursorContext::ObjectKey {
            path,
            existing_keys,
            // A partially typed key is still a candidate itself, so it
            // does not reduce the suggestion set.
            current_key: _,
        } => {
            for target in targets_at(schema, path) {
                if let SchemaKind::Object(obj) = &target.kind {
                    builder.object_keys(obj, existing_keys);
                }
            }
        }
        CursorContext::PropertyValue { path, key } => {
            for target in targets_at(schema, path) {
                if let SchemaKind::Object(obj) = &target.kind
                    && let Some(prop) = obj.properties.get(key)
                {
                    builder.property_values(prop);
                }
            }
        }
        CursorContext::ArrayItem { path } => {
            for target in targets_at(schema, path) {
                if let SchemaKind::Array(item) = &target.kind {
                    builder.array_item(item);
                }
            }
        }
        CursorContext::Nothing => {}
    }
    builder.items
}

/// The concrete schema nodes governing the position `path` points at.
///
/// Combinators are flattened into their branches at every step, so one
/// document position can be governed by several nodes at once. A path
/// segment the schema has no answer for kills that branch.
fn targets_at<'s>(schema: &'s SchemaNode, path: &[PathSegment]) -> Vec<&'s SchemaNode> {
    let mut out = Vec::new();
    collect_targets(schema, path, &mut out);
    out
}

fn collect_targets<'s>(node: &'s SchemaNode, path: &[PathSegment], out: &mut Vec<&'s SchemaNode>) {
    match &node.kind {
        SchemaKind::Combinator { branches, .. } => {
            for branch in branches {
                collect_targets(branch, path, out);
            }
        }
        _ if path.is_empty() => out.push(node),
        SchemaKind::Object(obj) => {
            if let PathSegment::Key(key) = &path[0]
                && let Some(child) = obj.properties.get(key)
            {
                collect_targets(child, &path[1..], out);
            }
        }
        SchemaKind::Array(item) => {
            if matches!(path[0], PathSegment::Index(_)) {
                collect_targets(item, &path[1..], out);
            }
        }
        // Scalar or Any with path left over: nothing to descend into.
        _ => {}
    }
}

/// Accumulates items, deduplicating by label (first occurrence wins).
#[derive(Default)]
struct ItemBuilder {
    items: Vec<CompletionItem>,
    seen: HashSet<String>,
}

impl ItemBuilder {
    fn push(&mut self, item: CompletionItem) {
        if self.seen.insert(item.label.clone()) {
            self.items.push(item);
        }
    }

    /// Property-name candidates for an object, in declaration order,
    /// skipping keys already present in the document. Names that are
    /// required but not declared under `properties` follow afterwards,
    /// alphabetically.
    fn object_keys(&mut self, obj: &ObjectSchema, existing: &[String]) {
        for (name, prop) in &obj.properties {
            if existing.iter().any(|key| key == name) {
                continue;
            }
            self.push(key_item(name, prop));
        }

        let mut undeclared: Vec<&String> = obj
            .required
            .iter()
            .filter(|name| !obj.properties.contains_key(name.as_str()))
            .filter(|name| !existing.iter().any(|key| key == *name))
            .collect();
        undeclared.sort();
        for name in undeclared {
            self.push(CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::PROPERTY),
                insert_text: Some(format!("{name}: ")),
                ..CompletionItem::default()
            });
        }
    }

    /// Value candidates for the property `prop`: enum members in listed
    /// order, then a `const`, then boolean literals for a plain boolean.
    fn property_values(&mut self, prop: &SchemaNode) {
        for leaf in targets_at(prop, &[]) {
            if let SchemaKind::Scalar(scalar) = &leaf.kind {
                self.scalar_values(scalar);
            }
        }
    }

    /// Candidates for a fresh sequence item: literal values when the
    /// item schema is scalar, property names when it is an object.
    fn array_item(&mut self, item: &SchemaNode) {
        for leaf in targets_at(item, &[]) {
            match &leaf.kind {
                SchemaKind::Scalar(scalar) => self.scalar_values(scalar),
                SchemaKind::Object(obj) => self.object_keys(obj, &[]),
                _ => {}
            }
        }
    }

    fn scalar_values(&mut self, scalar: &ScalarSchema) {
        for value in &scalar.enum_values {
            self.push(value_item(value, CompletionItemKind::ENUM_MEMBER));
        }
        if let Some(value) = &scalar.const_value {
            self.push(value_item(value, CompletionItemKind::VALUE));
        }
        if scalar.kind == ScalarKind::Boolean
            && scalar.enum_values.is_empty()
            && scalar.const_value.is_none()
        {
            self.push(value_item(&Value::Bool(true), CompletionItemKind::VALUE));
            self.push(value_item(&Value::Bool(false), CompletionItemKind::VALUE));
        }
    }
}

fn key_item(name: &str, prop: &SchemaNode) -> CompletionItem {
    CompletionItem {
        label: name.to_owned(),
        kind: Some(CompletionItemKind::PROPERTY),
        detail: prop.meta.title.clone(),
        documentation: prop.meta.description.as_ref().map(|description| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: description.clone(),
            })
        }),
        insert_text: Some(insertion_for(name, prop)),
        ..CompletionItem::default()
    }
}

/// Insertion text for a property key, with a skeleton matching the
/// shape its schema expects after the colon.
fn insertion_for(name: &str, prop: &SchemaNode) -> String {
    match value_shape(prop) {
        ValueShape::Object => format!("{name}:\n  "),
        ValueShape::Array => format!("{name}:\n  - "),
        ValueShape::Scalar => format!("{name}: "),
    }
}

enum ValueShape {
    Object,
    Array,
    Scalar,
}

fn value_shape(node: &SchemaNode) -> ValueShape {
    match &node.kind {
        SchemaKind::Object(_) => ValueShape::Object,
        SchemaKind::Array(_) => ValueShape::Array,
        SchemaKind::Combinator { branches, .. } => branches
            .first()
            .map(value_shape)
            .unwrap_or(ValueShape::Scalar),
        SchemaKind::Scalar(_) | SchemaKind::Any => ValueShape::Scalar,
    }
}

fn value_item(value: &Value, kind: CompletionItemKind) -> CompletionItem {
    let label = value_label(value);
    CompletionItem {
        label: label.clone(),
        kind: Some(kind),
        insert_text: Some(label),
        ..CompletionItem::default()
    }
}

/// Display label for a literal value. Strings appear bare, everything
/// else in its JSON rendering.
fn value_label(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
