//! Energy mode arbitration for the low-power sensor node.
//!
//! Peripheral drivers place holds ("blocks") on the shallowest energy mode
//! whose clocks they still need; the idle loop asks the arbiter how deep the
//! processor may sleep and issues the matching sleep instruction.
//!
//! # Architecture
//!
//! ```text
//! Peripheral drivers (timer, serial, sensor)     Idle loop (firmware crate)
//!         │ block / unblock                              │ enter_sleep
//!         ↓                                              ↓
//!   EnergyArbiter (this crate) ──── SleepDecision ──→ SleepBackend
//!         │                                              │
//!   block table behind a critical-section mutex     WFI / SLEEPDEEP
//! ```
//!
//! # Modules
//!
//! - [`mode`] - energy mode identifiers and sleep depths
//! - [`table`] - per-mode block counts
//! - [`arbiter`] - the arbiter itself plus the scoped [`SleepBlock`] guard
//! - [`config`] - saturation ceiling configuration
//! - [`error`] - fatal outcomes
//! - [`sleep`] - hardware sleep backend trait
//! - [`scheduler`] - ISR-safe pending-event set consulted by the idle loop
//!
//! # Features
//!
//! - `std`: host mocks ([`mocks::MockSleep`]) and `std::error::Error` impls
//! - `defmt`: `defmt::Format` derives and log statements
//!
//! # Example
//!
//! ```
//! use energy::{ArbiterConfig, EnergyArbiter, EnergyMode};
//!
//! let arbiter: EnergyArbiter = EnergyArbiter::new(ArbiterConfig::DEFAULT);
//! arbiter.initialize();
//! arbiter.block(EnergyMode::Em2).unwrap();
//! assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em2);
//! arbiter.unblock(EnergyMode::Em2);
//! assert_eq!(arbiter.select_sleep_depth(), EnergyMode::Em3);
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)] // a dropped Fatal is a lost programmer error
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![allow(clippy::doc_markdown)] // EM0..EM3, SLEEPDEEP and friends in doc comments
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod arbiter;
pub mod config;
pub mod error;
pub mod mode;
pub mod scheduler;
pub mod sleep;
pub mod table;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

pub use arbiter::{EnergyArbiter, SleepBlock};
pub use config::ArbiterConfig;
pub use error::{ConfigError, Fatal};
pub use mode::{EnergyMode, SleepDecision, SleepDepth};
pub use scheduler::EventScheduler;
pub use sleep::SleepBackend;
pub use table::BlockCounts;
