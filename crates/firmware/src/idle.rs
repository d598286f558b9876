//! One iteration of the idle loop.
//!
//! The firmware's main loop is
//!
//! ```text
//! loop {
//!     idle_step()      // sleep only if no event is pending
//!     dispatch events  // handle whatever woke us
//! }
//! ```
//!
//! The pending-event check and the sleep entry happen under one critical
//! section. An interrupt that schedules an event after the check still wakes
//! the core from WFI (a pending IRQ ends WFI even with interrupts masked) and
//! runs as soon as the critical section ends, so no event is ever left
//! waiting for the next wakeup.

use energy::{EnergyArbiter, EventScheduler, SleepBackend, SleepDecision};

use crate::config::AppEvent;

/// What one idle iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleStep {
    /// `None` when events were already pending and sleep was skipped.
    pub decision: Option<SleepDecision>,
    /// Events pending after the step, to be dispatched by the caller.
    pub pending: AppEvent,
}

/// Sleep as deep as the arbiter allows unless work is already waiting.
pub fn idle_step<B: SleepBackend>(
    arbiter: &EnergyArbiter,
    scheduler: &EventScheduler<AppEvent>,
    backend: &mut B,
) -> IdleStep {
    let decision = critical_section::with(|_| {
        if scheduler.is_idle() {
            Some(arbiter.enter_sleep(backend))
        } else {
            None
        }
    });

    IdleStep {
        decision,
        pending: scheduler.pending(),
    }
}
