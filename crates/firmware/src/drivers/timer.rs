//! Periodic low-energy timer.
//!
//! While running, the timer holds its energy mode so the processor never
//! sleeps deep enough to stop its clock. Start and stop are idempotent: a
//! second `start` does not take a second block, and `stop` on a stopped timer
//! does not release someone else's.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use energy::{EnergyArbiter, EnergyMode, EventScheduler, Fatal};

use crate::config::AppEvent;

bitflags::bitflags! {
    /// Interrupt flags raised by the timer peripheral.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerIrq: u8 {
        /// Counter matched compare register 0.
        const COMP0     = 1 << 0;
        /// Counter matched compare register 1.
        const COMP1     = 1 << 1;
        /// Counter wrapped.
        const UNDERFLOW = 1 << 2;
    }
}

/// A free-running timer that raises [`AppEvent`]s from its interrupt.
pub struct PeriodicTimer<'a> {
    arbiter: &'a EnergyArbiter,
    scheduler: &'a EventScheduler<AppEvent>,
    block_mode: EnergyMode,
    running: Mutex<CriticalSectionRawMutex, Cell<bool>>,
}

impl<'a> PeriodicTimer<'a> {
    /// Create a stopped timer that will hold `block_mode` while running.
    pub const fn new(
        arbiter: &'a EnergyArbiter,
        scheduler: &'a EventScheduler<AppEvent>,
        block_mode: EnergyMode,
    ) -> Self {
        Self {
            arbiter,
            scheduler,
            block_mode,
            running: Mutex::new(Cell::new(false)),
        }
    }

    /// Start counting, blocking `block_mode` if the timer was stopped.
    pub fn start(&self) -> Result<(), Fatal> {
        self.running.lock(|running| {
            if !running.get() {
                self.arbiter.block(self.block_mode)?;
                running.set(true);
            }
            Ok(())
        })
    }

    /// Stop counting, releasing the block if the timer was running.
    pub fn stop(&self) {
        self.running.lock(|running| {
            if running.get() {
                self.arbiter.unblock(self.block_mode);
                running.set(false);
            }
        });
    }

    /// `true` between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.running.lock(Cell::get)
    }

    /// The energy mode held while running.
    pub fn block_mode(&self) -> EnergyMode {
        self.block_mode
    }

    /// Interrupt handler body: translate hardware flags into events.
    ///
    /// Flags arriving after `stop` are dropped.
    pub fn on_interrupt(&self, flags: TimerIrq) {
        if !self.is_running() {
            return;
        }
        let mut events = AppEvent::empty();
        if flags.contains(TimerIrq::COMP0) {
            events |= AppEvent::TIMER_COMP0;
        }
        if flags.contains(TimerIrq::COMP1) {
            events |= AppEvent::TIMER_COMP1;
        }
        if flags.contains(TimerIrq::UNDERFLOW) {
            events |= AppEvent::TIMER_UF;
        }
        if !events.is_empty() {
            self.scheduler.add(events);
        }
    }
}
