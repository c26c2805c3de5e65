//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum PixelqError {
    /// Fewer closed transitions are stored than a batch requires.
    ///
    /// Recoverable: the agent skips the training step and keeps going.
    #[error("requested a batch of {requested}, but only {available} closed transitions are stored")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,
        /// Number of closed transitions available for sampling.
        available: usize,
    },

    /// No open transition exists to close.
    ///
    /// The recording protocol keeps exactly one open transition between
    /// decisions; hitting this means the protocol was violated and the agent
    /// state can no longer be trusted.
    #[error("no open transition to close")]
    EmptyMemoryClose,

    /// Restore was requested from a path holding no checkpoint.
    #[error("checkpoint not found in {0:?}")]
    CheckpointNotFound(PathBuf),

    /// A frame buffer does not match its stated dimensions.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// Rejected configuration, reported at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
