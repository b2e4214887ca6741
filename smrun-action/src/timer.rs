//! The timer service contract the evaluator drives.

use thiserror::Error;

/// Lowest usable timer slot id.
pub const MIN_TIMER_ID: u32 = 1;
/// Highest usable timer slot id.
pub const MAX_TIMER_ID: u32 = 254;
/// Active-timer register value meaning "no timer is being processed".
pub const ACTIVE_TIMER_NONE: u32 = 0;

/// Keyed timer service. Implemented by the engine's timer manager;
/// consumed by `create timer` / `create tick` / `delete timer` actions.
pub trait TimerControl: Send + Sync {
    /// Arms a one-shot timer. An already-armed slot is deleted first.
    /// An interval of zero fires immediately.
    fn create_oneshot(&self, id: u32, interval_ms: u64) -> Result<(), TimerError>;

    /// Arms a periodic timer that re-arms at the interval until deleted.
    fn create_tick(&self, id: u32, interval_ms: u64) -> Result<(), TimerError>;

    /// Cancels a timer and frees its slot.
    fn delete(&self, id: u32) -> Result<(), TimerError>;
}

/// Timer service errors.
#[derive(Debug, Error)]
pub enum TimerError {
    #[error("no timer slot with id {id}")]
    NotFound { id: u32 },
}
