//! Injected collaborators.
//!
//! The service never performs I/O itself. Content fetching and
//! workspace-relative path resolution are both supplied by the host at
//! construction time, as explicit trait objects.

use std::future::Future;
use std::pin::Pin;

/// Future returned by [`SchemaRequest::fetch`]. The error is a
/// displayable string, suitable for surfacing to a user as-is.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<String, String>> + Send + 'a>>;

/// Asynchronous content fetch by URI.
pub trait SchemaRequest: Send + Sync {
    fn fetch(&self, uri: &str) -> FetchFuture<'_>;
}

/// Workspace-relative path resolution. Synchronous and pure: the same
/// inputs always produce the same output.
pub trait WorkspaceContext: Send + Sync {
    /// Resolve `relative` against the location of `resource`, returning
    /// the absolute URI/path of the target.
    fn resolve_relative_path(&self, relative: &str, resource: &str) -> String;
}
