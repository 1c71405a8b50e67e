//! Document tree representation for YAML documents.
//!
//! The language service does not parse YAML itself; the host hands it an
//! already-parsed tree. This crate owns that boundary: a small node tree
//! with byte spans, plus the cursor-context derivation the completion
//! engine runs on it.
//!
//! Nodes own their children. The path from the root to the node under
//! the cursor is accumulated while descending, so there are no parent
//! back-references to keep in sync.

mod context;
mod node;

pub use context::{CursorContext, PathSegment, context_at};
pub use node::{NodeContent, Span, SyntaxNode};
