//! Pending-event set shared between interrupt handlers and the idle loop.
//!
//! Interrupt handlers [`add`](EventScheduler::add) event bits when a driver
//! finishes something; the main loop sleeps only while
//! [`is_idle`](EventScheduler::is_idle) holds and otherwise dispatches on
//! [`pending`](EventScheduler::pending), removing each bit once handled.
//! The event bits themselves belong to the application and are declared with
//! `bitflags`.

use core::cell::Cell;
use core::marker::PhantomData;

use bitflags::Flags;
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::blocking_mutex::Mutex;

/// ISR-safe set of pending application events of type `F`.
pub struct EventScheduler<F, M: RawMutex = CriticalSectionRawMutex> {
    pending: Mutex<M, Cell<u32>>,
    _events: PhantomData<fn() -> F>,
}

impl<F: Flags<Bits = u32>, M: RawMutex> EventScheduler<F, M> {
    /// Create a scheduler with nothing pending.
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
            _events: PhantomData,
        }
    }

    /// Clear every pending event. Called once at boot.
    pub fn open(&self) {
        self.pending.lock(|pending| pending.set(0));
    }

    /// Mark `events` pending.
    pub fn add(&self, events: F) {
        self.pending
            .lock(|pending| pending.set(pending.get() | events.bits()));
    }

    /// Clear `events`, leaving other bits untouched.
    pub fn remove(&self, events: F) {
        self.pending
            .lock(|pending| pending.set(pending.get() & !events.bits()));
    }

    /// Clear `events` and report whether any of them were pending.
    pub fn take(&self, events: F) -> bool {
        self.pending.lock(|pending| {
            let current = pending.get();
            pending.set(current & !events.bits());
            current & events.bits() != 0
        })
    }

    /// Every pending event, including bits `F` does not name.
    pub fn pending(&self) -> F {
        F::from_bits_retain(self.pending.lock(Cell::get))
    }

    /// `true` when nothing is pending and the idle loop may sleep.
    pub fn is_idle(&self) -> bool {
        self.pending.lock(Cell::get) == 0
    }
}

impl<F: Flags<Bits = u32>, M: RawMutex> Default for EventScheduler<F, M> {
    fn default() -> Self {
        Self::new()
    }
}
