//! Reference resolution.
//!
//! Walks raw schema content (as parsed by [`crate::raw`]) into the
//! resolved [`SchemaNode`] model. `$ref`s are expanded inline: local
//! fragments are JSON Pointers into the same document, external
//! references fetch the target document through the store's raw cache.
//!
//! A per-call stack of (document URI, fragment) pairs guards against
//! cycles: revisiting an entry that is still being expanded terminates
//! that branch with the permissive [`SchemaKind::Any`] instead of
//! recursing forever.

use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::model::{
    CombinatorKind, ObjectSchema, ScalarKind, ScalarSchema, SchemaKind, SchemaMeta, SchemaNode,
};
use crate::store::SchemaStore;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub(crate) struct Resolver<'s> {
    store: &'s SchemaStore,
    /// (document URI, fragment) pairs currently being expanded on this
    /// call chain. Local refs use the owning document's URI.
    in_progress: Vec<(String, String)>,
}

impl<'s> Resolver<'s> {
    pub(crate) fn new(store: &'s SchemaStore) -> Self {
        Resolver {
            store,
            in_progress: Vec::new(),
        }
    }

    /// Resolve a whole raw schema document into the model.
    ///
    /// Never fails: malformed fragments and unavailable references
    /// degrade to [`SchemaKind::Any`] branches.
    pub(crate) async fn resolve_root(&mut self, doc_uri: &str, raw: &Value) -> SchemaNode {
        self.resolve_value(doc_uri, raw, raw).await
    }

    fn resolve_value<'a>(
        &'a mut self,
        doc_uri: &'a str,
        doc_root: &'a Value,
        value: &'a Value,
    ) -> BoxFuture<'a, SchemaNode> {
        Box::pin(async move {
            let obj = match value {
                // `true`/`false` schemas: nothing to suggest either way.
                Value::Bool(_) => return SchemaNode::any(),
                Value::Object(obj) => obj,
                _ => return SchemaNode::any(),
            };
            let meta = meta_of(obj);

            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                let mut node = self.resolve_ref(doc_uri, doc_root, reference).await;
                // Sibling title/description next to a $ref wins over the
                // referenced schema's own metadata.
                if meta.title.is_some() || meta.description.is_some() {
                    node.meta = meta;
                }
                return node;
            }

            for kind in [
                CombinatorKind::AllOf,
                CombinatorKind::AnyOf,
                CombinatorKind::OneOf,
            ] {
                if let Some(branches) = obj.get(kind.keyword()).and_then(Value::as_array) {
                    let mut resolved = Vec::with_capacity(branches.len());
                    for branch in branches {
                        resolved.push(self.resolve_value(doc_uri, doc_root, branch).await);
                    }
                    return SchemaNode {
                        meta,
                        kind: SchemaKind::Combinator {
                            kind,
                            branches: resolved,
                        },
                    };
                }
            }

            if let Some(values) = obj.get("enum").and_then(Value::as_array) {
                return SchemaNode {
                    meta,
                    kind: SchemaKind::Scalar(ScalarSchema {
                        kind: scalar_kind(obj),
                        enum_values: values.clone(),
                        const_value: None,
                    }),
                };
            }
            if let Some(constant) = obj.get("const") {
                return SchemaNode {
                    meta,
                    kind: SchemaKind::Scalar(ScalarSchema {
                        kind: scalar_kind(obj),
                        enum_values: Vec::new(),
                        const_value: Some(constant.clone()),
                    }),
                };
            }

            match obj.get("type").and_then(Value::as_str) {
                Some("object") => self.resolve_object(doc_uri, doc_root, obj, meta).await,
                Some("array") => self.resolve_array(doc_uri, doc_root, obj, meta).await,
                Some(name) => SchemaNode {
                    meta,
                    kind: SchemaKind::Scalar(ScalarSchema {
                        kind: named_scalar_kind(name),
                        ..ScalarSchema::default()
                    }),
                },
                // No explicit type: infer object/array shape from the
                // keywords that are present, otherwise unconstrained.
                None => {
                    if obj.contains_key("properties") || obj.contains_key("required") {
                        self.resolve_object(doc_uri, doc_root, obj, meta).await
                    } else if obj.contains_key("items") {
                        self.resolve_array(doc_uri, doc_root, obj, meta).await
                    } else {
                        SchemaNode {
                            meta,
                            kind: SchemaKind::Any,
                        }
                    }
                }
            }
        })
    }

    async fn resolve_object(
        &mut self,
        doc_uri: &str,
        doc_root: &Value,
        obj: &Map<String, Value>,
        meta: SchemaMeta,
    ) -> SchemaNode {
        let mut properties = indexmap::IndexMap::new();
        if let Some(props) = obj.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                let node = self.resolve_value(doc_uri, doc_root, prop).await;
                properties.insert(name.clone(), node);
            }
        }
        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        let additional_allowed = !matches!(obj.get("additionalProperties"), Some(Value::Bool(false)));
        SchemaNode {
            meta,
            kind: SchemaKind::Object(ObjectSchema {
                properties,
                required,
                additional_allowed,
            }),
        }
    }

    async fn resolve_array(
        &mut self,
        doc_uri: &str,
        doc_root: &Value,
        obj: &Map<String, Value>,
        meta: SchemaMeta,
    ) -> SchemaNode {
        let item = match obj.get("items") {
            Some(items) => self.resolve_value(doc_uri, doc_root, items).await,
            None => SchemaNode::any(),
        };
        SchemaNode {
            meta,
            kind: SchemaKind::Array(Box::new(item)),
        }
    }

    async fn resolve_ref(
        &mut self,
        doc_uri: &str,
        doc_root: &Value,
        reference: &str,
    ) -> SchemaNode {
        let (target, fragment) = match reference.split_once('#') {
            Some((target, fragment)) => (target, fragment.to_owned()),
            None => (reference, String::new()),
        };

        if target.is_empty() {
            // Local fragment within the same document.
            let key = (doc_uri.to_owned(), fragment.clone());
            if self.in_progress.contains(&key) {
                warn!(reference, uri = doc_uri, "schema reference cycle, branch left unconstrained");
                return SchemaNode::any();
            }
            let Some(fragment_value) = lookup_pointer(doc_root, &fragment) else {
                warn!(reference, uri = doc_uri, "unresolvable local schema reference");
                return SchemaNode::any();
            };
            self.in_progress.push(key);
            let node = self.resolve_value(doc_uri, doc_root, fragment_value).await;
            self.in_progress.pop();
            return node;
        }

        let target_uri = self.target_document_uri(target, doc_uri);
        let key = (target_uri.clone(), fragment.clone());
        if self.in_progress.contains(&key) {
            warn!(reference, uri = doc_uri, "cross-document schema reference cycle, branch left unconstrained");
            return SchemaNode::any();
        }
        let raw = match self.store.raw_document(&target_uri).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(reference, uri = doc_uri, error = %err, "external schema reference unavailable");
                return SchemaNode::any();
            }
        };
        let Some(fragment_value) = lookup_pointer(&raw, &fragment) else {
            warn!(reference, uri = %target_uri, "unresolvable external schema reference");
            return SchemaNode::any();
        };
        self.in_progress.push(key);
        let node = self.resolve_value(&target_uri, &raw, fragment_value).await;
        self.in_progress.pop();
        node
    }

    /// Absolute URI of a referenced document. Absolute references pass
    /// through; relative ones go to the workspace collaborator first,
    /// then to an RFC 3986 join against the referencing document.
    fn target_document_uri(&self, target: &str, doc_uri: &str) -> String {
        if Url::parse(target).is_ok() {
            return target.to_owned();
        }
        let resolved = self
            .store
            .workspace()
            .resolve_relative_path(target, doc_uri);
        if !resolved.is_empty() {
            return resolved;
        }
        match Url::parse(doc_uri).and_then(|base| base.join(target)) {
            Ok(joined) => joined.to_string(),
            Err(_) => target.to_owned(),
        }
    }
}

/// JSON Pointer lookup (`/definitions/User`, `~0`/`~1` unescaping).
fn lookup_pointer<'v>(root: &'v Value, fragment: &str) -> Option<&'v Value> {
    let fragment = fragment.trim_start_matches('/');
    if fragment.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for segment in fragment.split('/') {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn meta_of(obj: &Map<String, Value>) -> SchemaMeta {
    SchemaMeta {
        title: obj.get("title").and_then(Value::as_str).map(str::to_owned),
        description: obj
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned),
    }
}

fn scalar_kind(obj: &Map<String, Value>) -> ScalarKind {
    obj.get("type")
        .and_then(Value::as_str)
        .map(named_scalar_kind)
        .unwrap_or_default()
}

fn named_scalar_kind(name: &str) -> ScalarKind {
    match name {
        "string" => ScalarKind::String,
        "number" => ScalarKind::Number,
        "integer" => ScalarKind::Integer,
        "boolean" => ScalarKind::Boolean,
        "null" => ScalarKind::Null,
        _ => ScalarKind::Unspecified,
    }
}
