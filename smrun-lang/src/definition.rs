//! State machine definition types.
//!
//! The parser produces a [`MachineDef`]: a flat, name-keyed graph of
//! states. Transitions carry their target by name and are resolved when
//! they fire, so forward references parse naturally.

use smrun_action::{Block, Expr};

/// The id every machine must start in.
pub const INIT_STATE: &str = "init";

/// A parsed state machine definition.
#[derive(Debug, Clone, Default)]
pub struct MachineDef {
    /// Name from the definition header.
    pub name: String,

    /// Description from the definition header.
    pub description: String,

    /// States in definition order.
    pub states: Vec<StateDef>,
}

impl MachineDef {
    /// Looks up a state by id.
    pub fn find_state(&self, id: &str) -> Option<&StateDef> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Whether the definition contains the mandatory `init` state.
    pub fn has_init(&self) -> bool {
        self.find_state(INIT_STATE).is_some()
    }
}

/// A state: entry actions, ordered transitions, exit actions.
#[derive(Debug, Clone)]
pub struct StateDef {
    /// Unique id within the machine.
    pub id: String,

    /// Line of the `state` keyword, for diagnostics.
    pub line: u32,

    /// Entry block. `None` when the definition omitted it.
    pub entry: Option<Block>,

    /// Transitions in definition order; this is the evaluation order.
    pub transitions: Vec<TransitionDef>,

    /// Exit block. `None` when the definition omitted it.
    pub exit: Option<Block>,
}

/// A guarded transition to a named target state.
#[derive(Debug, Clone)]
pub struct TransitionDef {
    /// Target state name, resolved when the transition fires.
    pub target: String,

    /// Guard expression; a truthy result fires the transition.
    pub guard: Expr,

    /// Source line of the transition.
    pub line: u32,
}
