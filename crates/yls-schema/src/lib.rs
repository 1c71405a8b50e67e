//! Schema side of the YAML language service.
//!
//! Three pieces live here:
//! - the resolved Schema Model ([`SchemaNode`]), a tagged-variant
//!   representation with all `$ref`s expanded,
//! - the reference resolver that builds it from raw JSON/YAML schema
//!   content, with cycle safety,
//! - the [`SchemaStore`] registry owning document-to-schema
//!   associations and the fetch/resolve caches.
//!
//! Fetching is injected through the [`SchemaRequest`] collaborator; the
//! store guarantees one in-flight fetch per URI no matter how many
//! callers are waiting.

mod error;
mod model;
mod raw;
mod request;
mod resolve;
mod store;

pub use error::SchemaError;
pub use model::{
    CombinatorKind, ObjectSchema, ScalarKind, ScalarSchema, SchemaKind, SchemaMeta, SchemaNode,
};
pub use raw::parse_schema_source;
pub use request::{FetchFuture, SchemaRequest, WorkspaceContext};
pub use store::SchemaStore;
