//! Energy mode identifiers.
//!
//! Modes are ordered from EM0 (all clocks running, fastest wake) to EM3
//! (high-frequency oscillators gated, slowest wake). A block on mode `m`
//! forbids entering `m` or anything deeper.
//!
//! | Mode | CPU      | HF clocks | LF clocks | Typical holder          |
//! |------|----------|-----------|-----------|-------------------------|
//! | EM0  | running  | on        | on        | busy-wait transactions  |
//! | EM1  | WFI      | on        | on        | -                       |
//! | EM2  | deep     | off       | on        | I2C sensor read         |
//! | EM3  | deep     | off       | ULF only  | LE timer, LE serial     |

use crate::error::Fatal;

/// An energy mode identifier, EM0 (shallowest) to EM3 (deepest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EnergyMode {
    /// Fully active, no power savings.
    Em0 = 0,
    /// CPU halted, every clock domain running.
    Em1 = 1,
    /// High-frequency clocks gated, low-frequency domain running.
    Em2 = 2,
    /// Deepest sleep that still wakes on low-energy peripheral interrupts.
    Em3 = 3,
}

impl EnergyMode {
    /// Number of energy modes (size of the block table).
    pub const COUNT: usize = 4;

    /// Every mode, shallowest first.
    pub const ALL: [Self; Self::COUNT] = [Self::Em0, Self::Em1, Self::Em2, Self::Em3];

    /// EM0.
    pub const SHALLOWEST: Self = Self::Em0;

    /// EM3, reported when nothing is blocked.
    pub const DEEPEST: Self = Self::Em3;

    /// Position of this mode in the block table.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Convert a raw identifier as handed over by a driver.
    ///
    /// # Errors
    ///
    /// [`Fatal::InvalidMode`] if `raw` is not below [`EnergyMode::COUNT`].
    pub const fn from_raw(raw: u32) -> Result<Self, Fatal> {
        match raw {
            0 => Ok(Self::Em0),
            1 => Ok(Self::Em1),
            2 => Ok(Self::Em2),
            3 => Ok(Self::Em3),
            _ => Err(Fatal::InvalidMode { raw }),
        }
    }

    /// Short display name ("EM0".."EM3").
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Em0 => "EM0",
            Self::Em1 => "EM1",
            Self::Em2 => "EM2",
            Self::Em3 => "EM3",
        }
    }
}

impl TryFrom<u32> for EnergyMode {
    type Error = Fatal;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Self::from_raw(raw)
    }
}

impl From<EnergyMode> for u32 {
    fn from(mode: EnergyMode) -> Self {
        mode as u32
    }
}

impl core::fmt::Display for EnergyMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Sleep depth ──────────────────────────────────────────────────────────────

/// A mode the processor can actually be put into by the sleep backend.
///
/// EM0 is "don't sleep" and never reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepDepth {
    /// Plain WFI; all clocks stay up.
    Em1,
    /// Deep sleep, low-frequency domain kept alive, RAM and registers retained.
    Em2,
    /// Deepest supported sleep.
    Em3,
}

impl SleepDepth {
    /// The energy mode this depth corresponds to.
    #[must_use]
    pub const fn mode(self) -> EnergyMode {
        match self {
            Self::Em1 => EnergyMode::Em1,
            Self::Em2 => EnergyMode::Em2,
            Self::Em3 => EnergyMode::Em3,
        }
    }

    /// Whether the core's deep-sleep bit must be set for this depth.
    #[must_use]
    pub const fn is_deep(self) -> bool {
        !matches!(self, Self::Em1)
    }
}

/// What the idle loop should do, given the current blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepDecision {
    /// EM0 or EM1 is blocked: return to the main loop without sleeping.
    StayAwake {
        /// The blocked mode that prevented sleep.
        blocked: EnergyMode,
    },
    /// Sleep at this depth until the next interrupt.
    Enter(SleepDepth),
}

impl SleepDecision {
    /// Map the shallowest blocked mode (if any) to a sleep action.
    ///
    /// A block on mode `m` allows at most `m - 1`; a block on EM1 would only
    /// allow EM0, which is not a sleep state.
    #[must_use]
    pub const fn from_blocked(blocked: Option<EnergyMode>) -> Self {
        match blocked {
            Some(mode @ (EnergyMode::Em0 | EnergyMode::Em1)) => Self::StayAwake { blocked: mode },
            Some(EnergyMode::Em2) => Self::Enter(SleepDepth::Em1),
            Some(EnergyMode::Em3) => Self::Enter(SleepDepth::Em2),
            None => Self::Enter(SleepDepth::Em3),
        }
    }

    /// The depth entered, or `None` when staying awake.
    #[must_use]
    pub const fn depth(self) -> Option<SleepDepth> {
        match self {
            Self::StayAwake { .. } => None,
            Self::Enter(depth) => Some(depth),
        }
    }
}
