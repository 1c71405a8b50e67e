//! Schema-driven completion for YAML documents.
//!
//! The entry point is [`LanguageService`]: the host hands it a fetcher
//! and a workspace resolver, registers schema associations, and then
//! asks for completion with a [`Document`], a cursor position, and the
//! document's parsed tree. Everything downstream (association lookup,
//! coalesced fetching, reference resolution, candidate synthesis) lives
//! behind that call and never surfaces an error: when anything along
//! the way is missing or broken, completion answers with an empty list.

mod completion;
mod document;
mod service;

pub use completion::completion_items;
pub use document::Document;
pub use service::LanguageService;
