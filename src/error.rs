// THEORY:
// Errors in this crate are rare by construction. A single malformed draw call is
// never an error: it is dropped or classified as `Unknown` further down the stack.
// What remains are the two things the engine genuinely cannot work around:
// being built without one of its collaborators, and being handed a paint string
// it cannot parse while loading a captured trace.

use thiserror::Error;

/// Raised while assembling a `DetectionPipeline`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A required collaborator was never supplied to the builder.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}

/// Raised when a textual paint value (e.g. `#ffe869`) cannot be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaintParseError {
    #[error("paint `{0}` does not start with '#'")]
    MissingHash(String),
    #[error("paint `{0}` must have 6 or 8 hex digits")]
    BadLength(String),
    #[error("paint `{0}` contains a non-hex digit")]
    BadDigit(String),
}
