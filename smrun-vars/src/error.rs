//! Registry error types.

use crate::registry::VarHandle;
use crate::value::VarType;
use thiserror::Error;

/// Errors from the variable registry.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("no variable with handle {0}")]
    HandleNotFound(VarHandle),

    #[error("value '{value}' cannot be stored as {ty}")]
    TypeMismatch { value: String, ty: VarType },

    #[error("variable registry is closed")]
    Closed,
}
