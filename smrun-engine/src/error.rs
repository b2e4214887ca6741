//! Engine error types.

use thiserror::Error;

/// Errors from the state machine runtime.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot find init state")]
    InitStateMissing,

    #[error("cannot find state '{name}'")]
    StateNotFound { name: String },

    #[error("event queue closed")]
    QueueClosed,
}
