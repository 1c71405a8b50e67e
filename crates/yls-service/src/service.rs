//! The language service facade.

use std::sync::Arc;

use lsp_types::{CompletionList, Position};
use tracing::debug;
use yls_schema::{SchemaRequest, SchemaStore, WorkspaceContext};
use yls_tree::{SyntaxNode, context_at};

use crate::completion::completion_items;
use crate::document::Document;

/// Ties the schema registry and the completion engine together behind
/// one host-facing surface.
///
/// The host injects both collaborators at construction: how schema
/// content is fetched and how workspace-relative paths resolve. The
/// service itself performs no I/O.
pub struct LanguageService {
    store: SchemaStore,
}

impl LanguageService {
    pub fn new(request: Arc<dyn SchemaRequest>, workspace: Arc<dyn WorkspaceContext>) -> Self {
        LanguageService {
            store: SchemaStore::new(request, workspace),
        }
    }

    /// Associate file patterns (globs or exact URIs) with a schema URI.
    ///
    /// Registration is cheap and idempotent; the schema is only fetched
    /// once a matching document asks for completion.
    pub fn register_external_schema(&self, schema_uri: &str, patterns: &[&str]) {
        self.store.register_association(schema_uri, patterns);
    }

    /// Drop all cached state for a schema URI, forcing a re-fetch and
    /// re-resolution on next use. Cached failures are dropped too.
    pub fn invalidate_schema(&self, schema_uri: &str) {
        self.store.invalidate(schema_uri);
    }

    /// Direct access to the schema registry, for hosts that want to ask
    /// association or resolution questions outside of completion.
    pub fn schema_store(&self) -> &SchemaStore {
        &self.store
    }

    /// Completion candidates at `position` in `document`, whose parsed
    /// tree is `root`.
    ///
    /// Never fails: no associated schema, an unreachable or malformed
    /// schema, and a cursor that maps to no usable tree position all
    /// produce an empty list. The list is always marked complete.
    pub async fn do_complete(
        &self,
        document: &Document,
        position: Position,
        root: &SyntaxNode,
    ) -> CompletionList {
        let Some(offset) = document.position_to_offset(position) else {
            return empty_list();
        };
        let Some(schema_uri) = self.store.schema_uri_for_resource(document.uri()) else {
            debug!(uri = document.uri(), "no schema association, nothing to suggest");
            return empty_list();
        };
        let schema = match self.store.resolved_schema(&schema_uri).await {
            Ok(schema) => schema,
            Err(err) => {
                debug!(uri = document.uri(), schema = schema_uri, %err, "schema unavailable");
                return empty_list();
            }
        };
        let context = context_at(root, offset);
        CompletionList {
            is_incomplete: false,
            items: completion_items(&schema, &context),
        }
    }
}

fn empty_list() -> CompletionList {
    CompletionList {
        is_incomplete: false,
        items: Vec::new(),
    }
}
