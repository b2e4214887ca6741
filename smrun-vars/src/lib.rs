//! # smrun-vars
//!
//! Typed values and the variable registry for smrun.
//!
//! This crate provides:
//! - Typed variable values (`short`/`int`/`float`/`string`) with C-style
//!   conversions
//! - The [`VarRegistry`] contract: find a variable by name, read and write
//!   it by handle, and subscribe to modification notifications
//! - [`MemoryVars`], an in-process registry implementing the contract

pub mod error;
pub mod registry;
pub mod value;

pub use error::VarError;
pub use registry::{MemoryVars, VarHandle, VarRegistry};
pub use value::{Value, VarType};
