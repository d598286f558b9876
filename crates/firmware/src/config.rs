//! Firmware configuration and constants
//!
//! Which energy mode each peripheral holds while active, the application
//! event bits, and the heartbeat timing. Drivers and `main.rs` reference
//! these rather than hardcoding values.

use energy::{ArbiterConfig, EnergyMode};

/// The firmware name shown in the boot banner.
pub const APP_NAME: &str = "Energy Arbiter Node";

/// Firmware version (synchronized with Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Arbiter ──────────────────────────────────────────────────────────────────

/// Saturation ceiling for every per-mode block count.
///
/// The deepest legitimate nesting in this firmware is three (timer, serial
/// and sensor all holding at once); ten leaves ample headroom.
pub const SATURATION_LIMIT: u8 = 10;

/// Configuration for the system arbiter.
pub const ARBITER_CONFIG: ArbiterConfig = match ArbiterConfig::new(SATURATION_LIMIT) {
    Ok(config) => config,
    Err(_) => ArbiterConfig::DEFAULT,
};

// ── Per-peripheral energy mode holds ────────────────────────────────────────

/// Held by the heartbeat timer while it runs.
///
/// The heartbeat is clocked from SysTick, which Stop mode gates, so the
/// timer must keep the core out of EM2 and deeper.
pub const TIMER_EM: EnergyMode = EnergyMode::Em2;

/// Held by the low-energy serial transmitter for the whole frame.
pub const SERIAL_EM: EnergyMode = EnergyMode::Em3;

/// Held by the Si7021 temperature read for the I2C transaction.
pub const SENSOR_EM: EnergyMode = EnergyMode::Em2;

// ── Heartbeat timing ────────────────────────────────────────────────────────

/// Core clock after `embassy_stm32::init` with the default configuration
/// (HSI, 64 MHz).
pub const CORE_CLOCK_HZ: u32 = 64_000_000;

/// SysTick reload value for a 250 ms heartbeat (`CORE_CLOCK_HZ / 4 - 1`).
///
/// Must fit in SysTick's 24-bit reload register.
pub const HEARTBEAT_RELOAD: u32 = 15_999_999;

/// Heartbeat ticks between temperature reads (1 s).
pub const TICKS_PER_READ: u32 = 4;

// ── Application events ──────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Events raised from interrupt context and dispatched by the main loop.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AppEvent: u32 {
        /// Timer compare channel 0 matched.
        const TIMER_COMP0      = 1 << 0;
        /// Timer compare channel 1 matched.
        const TIMER_COMP1      = 1 << 1;
        /// Timer underflow (one heartbeat period elapsed).
        const TIMER_UF         = 1 << 2;
        /// Si7021 temperature read finished.
        const SENSOR_READ_DONE = 1 << 3;
        /// Raised once at boot, before the first idle iteration.
        const BOOT_UP          = 1 << 4;
        /// Serial transmitter sent its last byte.
        const SERIAL_TX_DONE   = 1 << 5;
        /// Serial receiver completed a frame.
        const SERIAL_RX        = 1 << 6;
    }
}
