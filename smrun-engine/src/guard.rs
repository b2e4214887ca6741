//! Guard matching.
//!
//! Before a guard is evaluated, the runtime asks whether the event is
//! referenced anywhere in the guard tree. A guard on unrelated variables
//! must not fire a transition just because some other notification made
//! its condition momentarily true.

use crate::event::Event;
use smrun_action::{Expr, ExprKind};

/// Whether the event appears in the guard tree: a timer event matches a
/// `TIMER` node with the same id, a variable event matches a `SYSVAR`
/// node bound to the same handle.
pub fn references(expr: &Expr, event: Event) -> bool {
    match (&expr.kind, event) {
        (ExprKind::Timer(id), Event::Timer(fired)) if *id == fired => true,
        (ExprKind::SysVar { handle, .. }, Event::Variable(modified))
            if handle.is_valid() && *handle == modified =>
        {
            true
        }
        _ => expr.children().into_iter().any(|c| references(c, event)),
    }
}
