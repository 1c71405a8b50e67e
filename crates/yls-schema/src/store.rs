//! Schema registry: associations, fetch coalescing, and caches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::error::SchemaError;
use crate::model::SchemaNode;
use crate::raw::parse_schema_source;
use crate::request::{SchemaRequest, WorkspaceContext};
use crate::resolve::Resolver;

/// One (pattern, schema URI) association.
struct Association {
    pattern: String,
    schema_uri: String,
    /// Compiled glob, or `None` for an exact-URI pattern.
    matcher: Option<glob::Pattern>,
}

type RawCell = Arc<OnceCell<Result<Arc<Value>, SchemaError>>>;
type ResolvedCell = Arc<OnceCell<Result<Arc<SchemaNode>, SchemaError>>>;

/// Owns document-to-schema associations and the fetch/resolve caches.
///
/// The caches hold one `OnceCell` per URI, so any number of concurrent
/// callers for the same unresolved URI coalesce onto a single fetch and
/// observe the same result — including the same failure, which stays
/// cached until [`SchemaStore::invalidate`]. Entries become visible
/// atomically once fully resolved; the guarding mutexes are never held
/// across an await.
pub struct SchemaStore {
    request: Arc<dyn SchemaRequest>,
    workspace: Arc<dyn WorkspaceContext>,
    associations: Mutex<Vec<Association>>,
    /// Fetched + parsed schema documents, before reference resolution.
    raw: Mutex<HashMap<String, RawCell>>,
    /// Fully resolved schema roots.
    resolved: Mutex<HashMap<String, ResolvedCell>>,
}

impl SchemaStore {
    pub fn new(request: Arc<dyn SchemaRequest>, workspace: Arc<dyn WorkspaceContext>) -> Self {
        SchemaStore {
            request,
            workspace,
            associations: Mutex::new(Vec::new()),
            raw: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn workspace(&self) -> &dyn WorkspaceContext {
        &*self.workspace
    }

    /// Register associations from file patterns to a schema URI.
    ///
    /// Idempotent per (pattern, schema URI) pair. Registering never
    /// fetches the schema; the first completion request that needs it
    /// does.
    pub fn register_association(&self, schema_uri: &str, patterns: &[&str]) {
        let mut associations = self.associations.lock().unwrap();
        for pattern in patterns {
            if associations
                .iter()
                .any(|a| a.pattern == *pattern && a.schema_uri == schema_uri)
            {
                continue;
            }
            let matcher = if pattern.contains(['*', '?', '[']) {
                match glob::Pattern::new(pattern) {
                    Ok(matcher) => Some(matcher),
                    Err(err) => {
                        warn!(pattern, %err, "ignoring invalid glob pattern");
                        continue;
                    }
                }
            } else {
                None
            };
            debug!(pattern, schema_uri, "registered schema association");
            associations.push(Association {
                pattern: (*pattern).to_owned(),
                schema_uri: schema_uri.to_owned(),
                matcher,
            });
        }
    }

    /// The schema URI governing `resource_uri`, if any association
    /// matches.
    ///
    /// Exact-URI associations win over globs. Among matching globs the
    /// longest pattern wins; equal lengths fall back to registration
    /// order. Deterministic and idempotent for a fixed registration
    /// state.
    pub fn schema_uri_for_resource(&self, resource_uri: &str) -> Option<String> {
        let associations = self.associations.lock().unwrap();

        if let Some(exact) = associations
            .iter()
            .find(|a| a.matcher.is_none() && a.pattern == resource_uri)
        {
            return Some(exact.schema_uri.clone());
        }

        let path = resource_path(resource_uri);
        let filename = path.rsplit('/').next().unwrap_or(&path);

        let mut best: Option<&Association> = None;
        for association in associations.iter() {
            let Some(matcher) = &association.matcher else {
                continue;
            };
            if !(matcher.matches(filename) || matcher.matches(&path)) {
                continue;
            }
            let longer = best.is_none_or(|b| association.pattern.len() > b.pattern.len());
            if longer {
                best = Some(association);
            }
        }
        let found = best.map(|a| a.schema_uri.clone());
        debug!(resource_uri, schema = found.as_deref(), "schema association lookup");
        found
    }

    /// The resolved Schema Model for `schema_uri`, fetching and
    /// resolving it on first use.
    pub async fn resolved_schema(&self, schema_uri: &str) -> Result<Arc<SchemaNode>, SchemaError> {
        let cell = {
            let mut resolved = self.resolved.lock().unwrap();
            resolved
                .entry(schema_uri.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(|| async {
            let raw = self.raw_document(schema_uri).await?;
            debug!(uri = schema_uri, "resolving schema references");
            let mut resolver = Resolver::new(self);
            let node = resolver.resolve_root(schema_uri, &raw).await;
            Ok(Arc::new(node))
        })
        .await
        .clone()
    }

    /// Fetch and parse a schema document, without resolving references.
    ///
    /// This is the only point where the resolver touches the network,
    /// and its initialization never awaits another cache entry — which
    /// is what keeps cross-document reference cycles deadlock-free.
    pub(crate) async fn raw_document(&self, uri: &str) -> Result<Arc<Value>, SchemaError> {
        let cell = {
            let mut raw = self.raw.lock().unwrap();
            raw.entry(uri.to_owned())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(|| async {
            debug!(uri, "fetching schema document");
            let text = match self.request.fetch(uri).await {
                Ok(text) => text,
                Err(message) => {
                    warn!(uri, message, "schema fetch failed");
                    return Err(SchemaError::Fetch {
                        uri: uri.to_owned(),
                        message,
                    });
                }
            };
            match parse_schema_source(&text) {
                Ok(value) => Ok(Arc::new(value)),
                Err(message) => {
                    warn!(uri, message, "schema parse failed");
                    Err(SchemaError::Parse {
                        uri: uri.to_owned(),
                        message,
                    })
                }
            }
        })
        .await
        .clone()
    }

    /// Drop all cached state for a URI (resolved model, raw content,
    /// and any cached failure), forcing a re-fetch on next use.
    pub fn invalidate(&self, schema_uri: &str) {
        self.resolved.lock().unwrap().remove(schema_uri);
        self.raw.lock().unwrap().remove(schema_uri);
        debug!(uri = schema_uri, "invalidated cached schema");
    }
}

/// Path portion of a resource URI, for glob matching. Non-URI input is
/// matched as given.
fn resource_path(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => url.path().to_owned(),
        Err(_) => uri.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::model::SchemaKind;
    use crate::request::FetchFuture;

    struct StaticRequest {
        fetches: AtomicUsize,
        documents: HashMap<String, String>,
    }

    impl StaticRequest {
        fn single(uri: &str, content: &str) -> Self {
            let mut documents = HashMap::new();
            documents.insert(uri.to_owned(), content.to_owned());
            StaticRequest {
                fetches: AtomicUsize::new(0),
                documents,
            }
        }
    }

    impl SchemaRequest for StaticRequest {
        fn fetch(&self, uri: &str) -> FetchFuture<'_> {
            let uri = uri.to_owned();
            Box::pin(async move {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                // Yield so concurrent callers actually overlap.
                tokio::time::sleep(Duration::from_millis(5)).await;
                self.documents
                    .get(&uri)
                    .cloned()
                    .ok_or_else(|| format!("404: {uri}"))
            })
        }
    }

    struct DirWorkspace;

    impl WorkspaceContext for DirWorkspace {
        fn resolve_relative_path(&self, relative: &str, resource: &str) -> String {
            match resource.rsplit_once('/') {
                Some((dir, _)) => format!("{dir}/{relative}"),
                None => relative.to_owned(),
            }
        }
    }

    const PERSON: &str = r#"{"type":"object","properties":{"name":{"type":"string"}}}"#;

    #[tokio::test]
    async fn concurrent_resolution_coalesces_to_one_fetch() {
        let request = Arc::new(StaticRequest::single("test://person.json", PERSON));
        let store = Arc::new(SchemaStore::new(request.clone(), Arc::new(DirWorkspace)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.resolved_schema("test://person.json").await
            }));
        }
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(request.fetches.load(Ordering::SeqCst), 1);
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
    }

    #[tokio::test]
    async fn failures_are_cached_until_invalidated() {
        let request = Arc::new(StaticRequest {
            fetches: AtomicUsize::new(0),
            documents: HashMap::new(),
        });
        let store = SchemaStore::new(request.clone(), Arc::new(DirWorkspace));

        let first = store.resolved_schema("test://missing.json").await;
        let second = store.resolved_schema("test://missing.json").await;
        assert!(matches!(first, Err(SchemaError::Fetch { .. })));
        assert_eq!(first, second);
        assert_eq!(request.fetches.load(Ordering::SeqCst), 1);

        store.invalidate("test://missing.json");
        let _ = store.resolved_schema("test://missing.json").await;
        assert_eq!(request.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn parse_failure_is_a_negative_result() {
        let request = Arc::new(StaticRequest::single("test://bad.json", "{ not a schema"));
        let store = SchemaStore::new(request.clone(), Arc::new(DirWorkspace));

        let result = store.resolved_schema("test://bad.json").await;
        assert!(matches!(result, Err(SchemaError::Parse { .. })));
        let _ = store.resolved_schema("test://bad.json").await;
        assert_eq!(request.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cross_document_reference_is_resolved() {
        let mut documents = HashMap::new();
        documents.insert(
            "test://root.json".to_owned(),
            r#"{"type":"object","properties":{"person":{"$ref":"person.json#/"}}}"#.to_owned(),
        );
        documents.insert("test://person.json".to_owned(), PERSON.to_owned());
        let request = Arc::new(StaticRequest {
            fetches: AtomicUsize::new(0),
            documents,
        });
        let store = SchemaStore::new(request, Arc::new(DirWorkspace));

        let root = store.resolved_schema("test://root.json").await.unwrap();
        let SchemaKind::Object(obj) = &root.kind else {
            panic!("expected object root");
        };
        let SchemaKind::Object(person) = &obj.properties["person"].kind else {
            panic!("expected inlined person object");
        };
        assert!(person.properties.contains_key("name"));
    }

    #[tokio::test]
    async fn mutual_cross_document_cycle_terminates() {
        let mut documents = HashMap::new();
        documents.insert(
            "test://a.json".to_owned(),
            r#"{"type":"object","properties":{"b":{"$ref":"b.json#/"}}}"#.to_owned(),
        );
        documents.insert(
            "test://b.json".to_owned(),
            r#"{"type":"object","properties":{"a":{"$ref":"a.json#/"}}}"#.to_owned(),
        );
        let request = Arc::new(StaticRequest {
            fetches: AtomicUsize::new(0),
            documents,
        });
        let store = SchemaStore::new(request, Arc::new(DirWorkspace));

        let root = store.resolved_schema("test://a.json").await.unwrap();
        let SchemaKind::Object(a) = &root.kind else {
            panic!("expected object root");
        };
        let SchemaKind::Object(b) = &a.properties["b"].kind else {
            panic!("expected expanded b");
        };
        // a.json -> b.json -> a.json stops with a permissive placeholder.
        let SchemaKind::Object(a_again) = &b.properties["a"].kind else {
            panic!("expected second expansion of a");
        };
        assert_eq!(a_again.properties["b"].kind, SchemaKind::Any);
    }

    #[test]
    fn exact_association_beats_globs() {
        let store = SchemaStore::new(
            Arc::new(StaticRequest::single("x", "")),
            Arc::new(DirWorkspace),
        );
        store.register_association("schema://glob", &["*.yml"]);
        store.register_association("schema://exact", &["file:///etc/config.yml"]);

        assert_eq!(
            store.schema_uri_for_resource("file:///etc/config.yml"),
            Some("schema://exact".to_owned())
        );
        assert_eq!(
            store.schema_uri_for_resource("file:///etc/other.yml"),
            Some("schema://glob".to_owned())
        );
    }

    #[test]
    fn longest_glob_pattern_wins() {
        let store = SchemaStore::new(
            Arc::new(StaticRequest::single("x", "")),
            Arc::new(DirWorkspace),
        );
        store.register_association("schema://generic", &["*.yml"]);
        store.register_association("schema://specific", &["*.deploy.yml"]);

        assert_eq!(
            store.schema_uri_for_resource("file:///srv/app.deploy.yml"),
            Some("schema://specific".to_owned())
        );
        // Repeated lookups are deterministic.
        assert_eq!(
            store.schema_uri_for_resource("file:///srv/app.deploy.yml"),
            Some("schema://specific".to_owned())
        );
    }

    #[test]
    fn unmatched_resource_has_no_schema() {
        let store = SchemaStore::new(
            Arc::new(StaticRequest::single("x", "")),
            Arc::new(DirWorkspace),
        );
        store.register_association("schema://yaml", &["*.yml"]);
        assert_eq!(store.schema_uri_for_resource("file:///etc/config.json"), None);
    }

    #[test]
    fn registration_is_idempotent_per_pair() {
        let store = SchemaStore::new(
            Arc::new(StaticRequest::single("x", "")),
            Arc::new(DirWorkspace),
        );
        store.register_association("schema://yaml", &["*.yml", "*.yaml"]);
        store.register_association("schema://yaml", &["*.yml"]);
        assert_eq!(store.associations.lock().unwrap().len(), 2);

        // Same pattern, different schema: a second association.
        store.register_association("schema://other", &["*.yml"]);
        assert_eq!(store.associations.lock().unwrap().len(), 3);
    }
}
