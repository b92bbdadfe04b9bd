use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors surfaced by the editing core.
///
/// Nothing here is fatal to the session: the controller converts every
/// variant into its `Error` state with a human-readable message, keeps the
/// checkpoint timeline intact, and lets the user retry or undo.
#[derive(Debug, Error)]
pub enum EditorError {
    /// An operation needed a base image but neither a source upload nor a
    /// checkpoint was available.
    #[error("no source image loaded")]
    NoSource,

    /// Pixel payload could not be decoded (malformed or truncated bytes).
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding composited pixels failed.
    #[error("image encode failed: {0}")]
    Encode(#[source] image::ImageError),

    /// The remote edit service rejected the request.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
