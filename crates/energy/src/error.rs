//! Error outcomes.
//!
//! Nothing in the arbiter is recoverable. A [`Fatal`] means a driver broke
//! the block/unblock contract; firmware halts on it, tests inspect it.

use crate::mode::EnergyMode;

/// Programmer error detected by the arbiter.
///
/// Callers must treat this as program-terminating. It is a value rather than
/// a panic so host tests can observe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fatal {
    /// A raw mode identifier outside EM0..EM3.
    InvalidMode {
        /// The identifier that was passed in.
        raw: u32,
    },
    /// A block would have pushed a count to the saturation ceiling.
    ///
    /// Almost always a driver that blocks without a matching unblock.
    Saturated {
        /// The mode whose count saturated.
        mode: EnergyMode,
        /// The configured ceiling.
        limit: u8,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for Fatal {}

impl core::fmt::Display for Fatal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidMode { raw } => write!(f, "invalid energy mode identifier {raw}"),
            Self::Saturated { mode, limit } => write!(
                f,
                "block count for {mode} reached saturation limit {limit} (leaked block?)"
            ),
        }
    }
}

/// Rejected arbiter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The saturation ceiling would not allow even a single block.
    SaturationLimitTooLow {
        /// The requested ceiling.
        limit: u8,
    },
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SaturationLimitTooLow { limit } => {
                write!(f, "saturation limit {limit} is below the minimum of 2")
            }
        }
    }
}
