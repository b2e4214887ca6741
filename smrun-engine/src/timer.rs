//! Keyed timer service.
//!
//! A fixed table of slots 1..=254, each holding at most one armed timer.
//! Expiries are delivered as [`Event::Timer`] values on the engine's event
//! channel. The service knows nothing about states.

use crate::event::Event;
use parking_lot::Mutex;
use smrun_action::{TimerControl, TimerError, MAX_TIMER_ID, MIN_TIMER_ID};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;

/// Timer manager backed by tokio timer tasks.
pub struct TimerManager {
    tx: UnboundedSender<Event>,
    slots: Mutex<Vec<Option<AbortHandle>>>,
}

impl TimerManager {
    /// Creates a manager delivering expiries on the given channel.
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self {
            tx,
            slots: Mutex::new((0..=MAX_TIMER_ID).map(|_| None).collect()),
        }
    }

    fn check_id(id: u32) -> Result<(), TimerError> {
        if (MIN_TIMER_ID..=MAX_TIMER_ID).contains(&id) {
            Ok(())
        } else {
            Err(TimerError::NotFound { id })
        }
    }

    /// Cancels whatever is armed in the slot.
    fn clear_slot(&self, id: u32) {
        if let Some(old) = self.slots.lock()[id as usize].take() {
            old.abort();
        }
    }

    fn install(&self, id: u32, handle: AbortHandle) {
        self.slots.lock()[id as usize] = Some(handle);
    }
}

impl TimerControl for TimerManager {
    fn create_oneshot(&self, id: u32, interval_ms: u64) -> Result<(), TimerError> {
        Self::check_id(id)?;
        self.clear_slot(id);

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            let _ = tx.send(Event::Timer(id));
        })
        .abort_handle();
        self.install(id, handle);

        tracing::debug!(id, interval_ms, "one-shot timer armed");
        Ok(())
    }

    fn create_tick(&self, id: u32, interval_ms: u64) -> Result<(), TimerError> {
        Self::check_id(id)?;
        self.clear_slot(id);

        let tx = self.tx.clone();
        let period = Duration::from_millis(interval_ms.max(1));
        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticks = tokio::time::interval_at(start, period);
            loop {
                ticks.tick().await;
                if tx.send(Event::Timer(id)).is_err() {
                    break;
                }
            }
        })
        .abort_handle();
        self.install(id, handle);

        tracing::debug!(id, interval_ms, "tick timer armed");
        Ok(())
    }

    fn delete(&self, id: u32) -> Result<(), TimerError> {
        Self::check_id(id)?;
        self.clear_slot(id);
        tracing::debug!(id, "timer deleted");
        Ok(())
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        for slot in self.slots.lock().iter_mut() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}
