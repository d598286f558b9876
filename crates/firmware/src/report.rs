//! Temperature report line and the unit commands that select it.
//!
//! The host picks the unit by sending a `#F?` or `#C?` frame (see
//! [`SerialRx`](crate::drivers::serial::SerialRx)); the frame body is the
//! unit letter. Reports read `\nTemp = 23.3 C`, one decimal, the value
//! right-aligned in four columns.

use core::fmt::{self, Write as _};

use heapless::String;

use crate::drivers::si7021::Temperature;

/// Unit the temperature report is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TempUnit {
    /// Degrees Celsius, selected by `#C?`.
    Celsius,
    /// Degrees Fahrenheit, selected by `#F?`. Used until a command arrives.
    #[default]
    Fahrenheit,
}

impl TempUnit {
    /// Map a received frame body to a unit. Anything but `F` or `C` is `None`.
    pub fn from_command(body: &[u8]) -> Option<Self> {
        match body {
            b"F" => Some(Self::Fahrenheit),
            b"C" => Some(Self::Celsius),
            _ => None,
        }
    }

    /// Unit letter printed after the value.
    pub const fn symbol(self) -> char {
        match self {
            Self::Celsius => 'C',
            Self::Fahrenheit => 'F',
        }
    }

    /// `temperature` in thousandths of this unit.
    pub fn milli(self, temperature: Temperature) -> i32 {
        match self {
            Self::Celsius => temperature.milli_celsius(),
            Self::Fahrenheit => temperature.milli_fahrenheit(),
        }
    }
}

/// Write one report line for `temperature` in `unit`.
///
/// Thousandths are rounded half away from zero to one decimal.
#[allow(clippy::arithmetic_side_effects)]
pub fn write_report<W: fmt::Write>(
    out: &mut W,
    temperature: Temperature,
    unit: TempUnit,
) -> fmt::Result {
    let milli = unit.milli(temperature);
    let tenths = if milli < 0 {
        (milli - 50) / 100
    } else {
        (milli + 50) / 100
    };
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();

    // Sign, integer and fraction go through one buffer so the width applies
    // to the whole value.
    let mut value: String<12> = String::new();
    write!(value, "{}{}.{}", sign, abs / 10, abs % 10)?;
    write!(out, "\nTemp = {:>4} {}", value.as_str(), unit.symbol())
}
