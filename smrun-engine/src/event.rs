//! Runtime events.

use smrun_vars::VarHandle;

/// An external event: a timer slot expired, or a subscribed registry
/// variable was modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Timer expiry carrying the slot id.
    Timer(u32),
    /// Modification notification carrying the variable handle.
    Variable(VarHandle),
}
