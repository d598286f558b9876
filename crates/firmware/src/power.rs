//! Cortex-M sleep backend.
//!
//! | Depth | Core state                            |
//! |-------|---------------------------------------|
//! | EM1   | Sleep: WFI with SLEEPDEEP clear       |
//! | EM2   | Stop: WFI with SLEEPDEEP set          |
//! | EM3   | Stop: WFI with SLEEPDEEP set          |
//!
//! The STM32H743 has a single Stop mode reachable from the core, so EM2 and
//! EM3 share an entry sequence here. The arbiter still tells them apart: a
//! part with a deeper retention mode only needs a new arm in
//! [`CortexMSleep::enter`].
//!
//! SLEEPDEEP is cleared again after every wakeup so a later EM1 request
//! cannot fall into Stop by accident.

use cortex_m::asm;
use cortex_m::peripheral::SCB;
use energy::{SleepBackend, SleepDepth};

/// Sleep backend owning the System Control Block.
pub struct CortexMSleep {
    scb: SCB,
}

impl CortexMSleep {
    /// Take ownership of the SCB. SLEEPONEXIT is cleared: the idle loop
    /// relies on returning to thread mode after every interrupt.
    pub fn new(mut scb: SCB) -> Self {
        scb.clear_sleeponexit();
        scb.clear_sleepdeep();
        Self { scb }
    }

    /// Give the SCB back.
    pub fn free(self) -> SCB {
        self.scb
    }
}

impl SleepBackend for CortexMSleep {
    fn enter(&mut self, depth: SleepDepth) {
        match depth {
            SleepDepth::Em1 => {
                self.scb.clear_sleepdeep();
                asm::wfi();
            }
            SleepDepth::Em2 | SleepDepth::Em3 => {
                self.scb.set_sleepdeep();
                // SCR write must land before WFI
                asm::dsb();
                asm::wfi();
                self.scb.clear_sleepdeep();
            }
        }
    }
}
