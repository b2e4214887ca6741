//! The state machine runtime.
//!
//! Single-threaded and cooperative: one event is fully processed, exit and
//! entry actions included, before the next is received. Transitions are
//! scanned in definition order and at most one fires per event.

use crate::error::EngineError;
use crate::event::Event;
use crate::guard;
use crate::timer::TimerManager;
use smrun_action::{evaluate, run_block, EvalContext, Frame, ACTIVE_TIMER_NONE};
use smrun_lang::definition::{MachineDef, INIT_STATE};
use smrun_vars::VarRegistry;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Outcome of dispatching one event, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A transition fired.
    Fired,
    /// At least one guard referenced the event but none evaluated true.
    GuardFalse,
    /// No guard in the current state references the event.
    NotReferenced,
    /// A guard fired but its target state does not exist; the current
    /// state is unchanged.
    TargetMissing,
    /// The machine has no current state.
    Invalid,
}

enum Actions {
    Entry,
    Exit,
}

/// A loaded state machine plus its runtime context.
pub struct Machine {
    def: MachineDef,
    vars: Arc<dyn VarRegistry>,
    timers: Arc<TimerManager>,
    current: Option<usize>,
    active_timer: u32,
}

impl Machine {
    pub fn new(def: MachineDef, vars: Arc<dyn VarRegistry>, timers: Arc<TimerManager>) -> Self {
        Self {
            def,
            vars,
            timers,
            current: None,
            active_timer: ACTIVE_TIMER_NONE,
        }
    }

    /// Id of the current state.
    pub fn current_state(&self) -> Option<&str> {
        self.current.map(|i| self.def.states[i].id.as_str())
    }

    /// Enters the `init` state. Fatal when the definition has none.
    pub fn start(&mut self) -> Result<(), EngineError> {
        self.enter(INIT_STATE).map_err(|_| {
            tracing::error!("cannot find init state");
            EngineError::InitStateMissing
        })
    }

    /// Runs the event loop until the event channel closes.
    pub async fn run(&mut self, rx: &mut UnboundedReceiver<Event>) -> Result<(), EngineError> {
        self.start()?;
        while let Some(event) = rx.recv().await {
            tracing::debug!(?event, "received event");
            let outcome = self.dispatch(event);
            tracing::debug!(?event, ?outcome, "dispatch complete");
        }
        Err(EngineError::QueueClosed)
    }

    /// Dispatches a single event against the current state's transitions.
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        if let Event::Timer(id) = event {
            self.active_timer = id;
        }
        let outcome = self.scan_transitions(event);
        self.active_timer = ACTIVE_TIMER_NONE;
        outcome
    }

    fn scan_transitions(&mut self, event: Event) -> Dispatch {
        let Some(state_idx) = self.current else {
            tracing::error!("no current state");
            return Dispatch::Invalid;
        };

        let mut outcome = Dispatch::NotReferenced;
        for i in 0..self.def.states[state_idx].transitions.len() {
            let transition = &self.def.states[state_idx].transitions[i];

            if !guard::references(&transition.guard, event) {
                continue;
            }

            let cx = EvalContext {
                vars: &*self.vars,
                timers: &*self.timers,
                active_timer: self.active_timer,
            };
            let mut frame = Frame::empty();
            let value = match evaluate(&cx, &mut frame, &transition.guard) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(line = transition.guard.line, "guard evaluation failed: {e}");
                    outcome = Dispatch::GuardFalse;
                    continue;
                }
            };
            if !value.is_truthy() {
                outcome = Dispatch::GuardFalse;
                continue;
            }

            let target = transition.target.clone();

            // Exit actions run first; target resolution failure leaves the
            // current state in place.
            self.run_actions(state_idx, Actions::Exit);
            return match self.enter(&target) {
                Ok(()) => Dispatch::Fired,
                Err(_) => Dispatch::TargetMissing,
            };
        }
        outcome
    }

    fn enter(&mut self, target: &str) -> Result<(), EngineError> {
        let Some(idx) = self.def.states.iter().position(|s| s.id == target) else {
            tracing::error!(state = target, "cannot find state");
            return Err(EngineError::StateNotFound {
                name: target.to_string(),
            });
        };

        tracing::info!(state = %self.def.states[idx].id, "enter state");
        self.current = Some(idx);
        self.run_actions(idx, Actions::Entry);
        Ok(())
    }

    fn run_actions(&self, idx: usize, which: Actions) {
        let state = &self.def.states[idx];
        let (block, label) = match which {
            Actions::Entry => (&state.entry, "entry"),
            Actions::Exit => {
                tracing::info!(state = %state.id, "exit state");
                (&state.exit, "exit")
            }
        };

        match block {
            None => tracing::warn!(state = %state.id, "state has no {label} actions"),
            Some(block) => {
                let cx = EvalContext {
                    vars: &*self.vars,
                    timers: &*self.timers,
                    active_timer: self.active_timer,
                };
                if let Err(e) = run_block(&cx, block) {
                    tracing::error!(state = %state.id, "{label} actions failed: {e}");
                }
            }
        }
    }
}
