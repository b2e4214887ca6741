//! # smrun-action
//!
//! Expression trees and the action evaluator for smrun.
//!
//! This crate provides:
//! - The [`Expr`] tagged-variant AST built by the parser
//! - Local declaration tables and use-before-assign analysis
//! - [`evaluate`]: the typed expression interpreter with C numeric
//!   promotion, assignments, casts, timer primitives, and shell escape
//! - The [`TimerControl`] contract the evaluator drives timers through

pub mod error;
pub mod eval;
pub mod expr;
pub mod locals;
pub mod timer;

pub use error::ActionError;
pub use eval::{evaluate, run_block, EvalContext};
pub use expr::{AssignOp, BinaryOp, Expr, ExprKind, IncDec};
pub use locals::{check_use_before_assign, Block, Decl, Frame, UnassignedUse};
pub use timer::{TimerControl, TimerError, ACTIVE_TIMER_NONE, MAX_TIMER_ID, MIN_TIMER_ID};
