//! Action evaluation errors.

use smrun_vars::{VarError, VarType};
use thiserror::Error;

/// Errors raised while evaluating an expression tree. These are non-fatal
/// to the state machine: the runtime logs them and keeps processing events.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("type mismatch applying '{op}' at line {line}")]
    TypeMismatch { op: &'static str, line: u32 },

    #[error("division by zero at line {line}")]
    DivisionByZero { line: u32 },

    #[error("cannot cast '{value}' to {to} at line {line}")]
    BadCast {
        value: String,
        to: VarType,
        line: u32,
    },

    #[error("unresolved variable '{name}' at line {line}")]
    UnresolvedVariable { name: String, line: u32 },

    #[error("unknown local '{name}' at line {line}")]
    UnknownLocal { name: String, line: u32 },

    #[error("expression at line {line} is not assignable")]
    NotAssignable { line: u32 },

    #[error(transparent)]
    Var(#[from] VarError),
}
