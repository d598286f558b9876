//! Peripheral drivers that hold energy modes
//!
//! Each driver blocks the shallowest energy mode whose clocks it needs before
//! a transaction starts and releases it when the transaction completes,
//! usually from the completion interrupt:
//!
//! | Driver                         | Holds      | Released by                   |
//! |--------------------------------|------------|-------------------------------|
//! | [`timer::PeriodicTimer`]       | `TIMER_EM` | [`timer::PeriodicTimer::stop`] |
//! | [`serial::SerialTx`]           | `SERIAL_EM`| TX-complete interrupt         |
//! | [`serial::SerialRx`]           | `SERIAL_EM`| [`serial::SerialRx::stop`]    |
//! | [`si7021::Si7021`]             | `SENSOR_EM`| end of the I2C transaction    |
//!
//! Register-level peripheral setup (clock routing, pin muxing, baud rate) is
//! done by the HAL and is not part of these types.

pub mod serial;
pub mod si7021;
pub mod timer;
