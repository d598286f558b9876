//! Low-power sensor node firmware
//!
//! Reads an Si7021 temperature sensor once a second and reports over a
//! serial link, sleeping between events as deep as the active peripherals
//! allow.
//!
//! # Architecture
//!
//! ```text
//! main.rs (entry, dispatch)
//!         ↓
//! idle_step ──→ EnergyArbiter::enter_sleep ──→ power::CortexMSleep
//!         ↑                 ↑
//! EventScheduler      block / unblock
//!         ↑                 │
//!     drivers (timer, serial, si7021) ← interrupts
//!
//! report: `#F?` / `#C?` unit commands and the report line
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for the STM32H743 target (cortex-m, embassy-stm32, defmt)
//! - `defmt` - `defmt::Format` derives on driver error types
//!
//! # Examples
//!
//! ```bash
//! cargo build --release --target thumbv7em-none-eabihf --features hardware
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::print_stdout)] // prefer defmt over println! in lib code
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod drivers;
pub mod idle;
pub mod report;

#[cfg(feature = "hardware")]
pub mod exception_handlers;
#[cfg(feature = "hardware")]
pub mod power;

pub use config::AppEvent;
pub use idle::{idle_step, IdleStep};
