//! Si7021 humidity/temperature sensor driver
//!
//! Uses the blocking `embedded_hal::i2c::I2c` trait. A temperature read is a
//! single write-read transaction with the "hold master" command: the sensor
//! stretches the clock until the conversion finishes, so the bus peripheral
//! must stay clocked for the whole exchange. The driver holds
//! [`SENSOR_EM`](crate::config::SENSOR_EM) for exactly that long and raises
//! [`AppEvent::SENSOR_READ_DONE`] afterwards.
//!
//! # I²C Address
//!
//! Fixed at `0x40`.

use core::fmt;

use embedded_hal::i2c::I2c;
use energy::{EnergyArbiter, EnergyMode, EventScheduler, Fatal};

use crate::config::AppEvent;

/// Fixed I²C address.
pub const I2C_ADDR: u8 = 0x40;

/// Measure temperature, hold master mode.
pub const CMD_MEASURE_TEMP_HOLD: u8 = 0xE3;

/// Low two bits of every measurement are status bits.
const STATUS_MASK: u16 = 0xFFFC;

/// Errors from a sensor read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError<E> {
    /// The bus transaction failed.
    I2c(E),
    /// The arbiter refused the block; no transaction was attempted.
    Fatal(Fatal),
}

impl<E: fmt::Debug> fmt::Display for SensorError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[allow(clippy::use_debug)]
            Self::I2c(e) => write!(f, "I2C error: {:?}", e),
            Self::Fatal(fatal) => write!(f, "{}", fatal),
        }
    }
}

/// A temperature measurement code with the status bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(u16);

impl Temperature {
    /// Wrap a raw code from the sensor, discarding the status bits.
    pub const fn from_code(code: u16) -> Self {
        Self(code & STATUS_MASK)
    }

    /// The masked measurement code.
    pub const fn code(self) -> u16 {
        self.0
    }

    /// Degrees Celsius × 1000.
    ///
    /// Datasheet conversion: `175.72 * code / 65536 - 46.85`.
    #[allow(clippy::arithmetic_side_effects)]
    #[allow(clippy::cast_possible_truncation)]
    pub fn milli_celsius(self) -> i32 {
        // 175_720 * 0xFFFC fits comfortably in i64; the result fits i32.
        ((175_720_i64 * i64::from(self.0)) / 65_536 - 46_850) as i32
    }

    /// Degrees Fahrenheit × 1000.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn milli_fahrenheit(self) -> i32 {
        self.milli_celsius() * 9 / 5 + 32_000
    }
}

/// Si7021 driver bound to the system arbiter and scheduler.
pub struct Si7021<'a, I> {
    i2c: I,
    arbiter: &'a EnergyArbiter,
    scheduler: &'a EventScheduler<AppEvent>,
    block_mode: EnergyMode,
}

impl<'a, I: I2c> Si7021<'a, I> {
    /// Create a driver. `i2c` must be a configured bus with the sensor on it.
    pub fn new(
        i2c: I,
        arbiter: &'a EnergyArbiter,
        scheduler: &'a EventScheduler<AppEvent>,
        block_mode: EnergyMode,
    ) -> Self {
        Self {
            i2c,
            arbiter,
            scheduler,
            block_mode,
        }
    }

    /// Run one temperature conversion.
    ///
    /// The energy-mode block is released whether or not the bus transaction
    /// succeeds. [`AppEvent::SENSOR_READ_DONE`] is raised only on success.
    pub fn read_temperature(&mut self) -> Result<Temperature, SensorError<I::Error>> {
        let hold = self.arbiter.hold(self.block_mode).map_err(SensorError::Fatal)?;
        let mut buf = [0u8; 2];
        let result = self
            .i2c
            .write_read(I2C_ADDR, &[CMD_MEASURE_TEMP_HOLD], &mut buf);
        hold.release();
        result.map_err(SensorError::I2c)?;

        let temperature = Temperature::from_code(u16::from_be_bytes(buf));
        self.scheduler.add(AppEvent::SENSOR_READ_DONE);
        Ok(temperature)
    }

    /// Consume the driver and return the bus.
    pub fn release(self) -> I {
        self.i2c
    }
}
