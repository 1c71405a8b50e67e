use thiserror::Error;

/// Failure to produce a resolved schema for a URI.
///
/// Errors are `Clone` because one failure is cached and handed to every
/// caller coalesced onto the same fetch. None of these escape the
/// completion operation; they degrade to empty candidate lists there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The fetch collaborator could not produce content for the URI.
    /// The message is the collaborator's displayable error string.
    #[error("failed to fetch schema '{uri}': {message}")]
    Fetch { uri: String, message: String },

    /// Fetched content was neither valid JSON nor valid YAML.
    #[error("failed to parse schema '{uri}': {message}")]
    Parse { uri: String, message: String },
}
