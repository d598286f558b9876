//! Cortex-M exception handlers and the fatal-error halt.
//!
//! - **HardFault**: memory access violations, illegal instructions, and stack
//!   overflow caught by flip-link. Logs the stacked frame address and halts.
//! - **Arbiter fatals**: [`halt`] is where the main loop sends any
//!   [`Fatal`](energy::Fatal) it receives. Both are programmer errors with no
//!   recovery path, so the firmware stops with the reason on RTT.

/// Log a fatal arbiter error and halt. Never returns.
pub fn halt(fatal: energy::Fatal) -> ! {
    defmt::panic!("energy arbiter fatal: {}", fatal);
}

/// HardFault exception handler (hardware target only).
///
/// Outputs the exception frame address via defmt/RTT so the stacked PC, LR,
/// and PSR can be inspected in a debugger, then halts.
///
/// # Safety
///
/// Returning from a HardFault handler is undefined behavior on Cortex-M; the
/// `-> !` return type enforces that this one never does.
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::panic!(
        "HardFault! Stacked exception frame at 0x{:08X}. \
         Check stacked PC for fault address.",
        ef as *const _ as u32
    );
}
