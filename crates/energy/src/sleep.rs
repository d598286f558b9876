//! Hardware sleep backend.

use crate::mode::SleepDepth;

/// Puts the processor to sleep at a given depth.
///
/// Implemented by the Cortex-M backend in the firmware crate and by
/// [`MockSleep`](crate::mocks::MockSleep) on host.
///
/// [`EnergyArbiter::enter_sleep`](crate::EnergyArbiter::enter_sleep) calls
/// [`enter`](Self::enter) while holding the arbiter's critical section, so
/// an implementation must not call back into the arbiter. On Cortex-M a
/// pending interrupt still ends WFI with PRIMASK set; its handler runs once
/// the critical section is released.
pub trait SleepBackend {
    /// Execute the sleep-entry sequence for `depth` and return after wake-up.
    fn enter(&mut self, depth: SleepDepth);
}

impl<T: SleepBackend + ?Sized> SleepBackend for &mut T {
    fn enter(&mut self, depth: SleepDepth) {
        (**self).enter(depth);
    }
}
