//! Arbiter configuration.

use crate::error::ConfigError;

/// Tunables for [`EnergyArbiter`](crate::EnergyArbiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArbiterConfig {
    saturation_limit: u8,
}

impl ArbiterConfig {
    /// Ceiling used when nothing else is configured.
    ///
    /// Only has to be well above the deepest legitimate nesting of blocks on
    /// one mode; in this firmware that is three.
    pub const DEFAULT_SATURATION_LIMIT: u8 = 10;

    /// Smallest ceiling that still admits one block.
    pub const MIN_SATURATION_LIMIT: u8 = 2;

    /// Configuration with [`Self::DEFAULT_SATURATION_LIMIT`].
    pub const DEFAULT: Self = Self {
        saturation_limit: Self::DEFAULT_SATURATION_LIMIT,
    };

    /// Build a configuration with a custom saturation ceiling.
    ///
    /// A block that would make any count equal to `saturation_limit` is
    /// reported as [`Fatal::Saturated`](crate::Fatal::Saturated), so at most
    /// `saturation_limit - 1` blocks can be outstanding per mode.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SaturationLimitTooLow`] below [`Self::MIN_SATURATION_LIMIT`].
    pub const fn new(saturation_limit: u8) -> Result<Self, ConfigError> {
        if saturation_limit < Self::MIN_SATURATION_LIMIT {
            Err(ConfigError::SaturationLimitTooLow {
                limit: saturation_limit,
            })
        } else {
            Ok(Self { saturation_limit })
        }
    }

    /// The configured ceiling.
    pub const fn saturation_limit(self) -> u8 {
        self.saturation_limit
    }
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
