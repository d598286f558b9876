//! Per-mode block counts.

use crate::mode::EnergyMode;

/// One block count per energy mode.
///
/// Every mode always has an entry. The arbiter keeps this behind its lock
/// and hands out copies as snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlockCounts([u8; EnergyMode::COUNT]);

impl BlockCounts {
    /// Every count zero.
    pub const CLEAR: Self = Self([0; EnergyMode::COUNT]);

    /// Outstanding blocks on `mode`.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // index() < COUNT for every EnergyMode
    pub const fn count(&self, mode: EnergyMode) -> u8 {
        self.0[mode.index()]
    }

    #[allow(clippy::indexing_slicing)] // index() < COUNT for every EnergyMode
    pub(crate) fn set(&mut self, mode: EnergyMode, count: u8) {
        self.0[mode.index()] = count;
    }

    /// Shallowest mode with at least one block.
    #[must_use]
    pub fn first_blocked(&self) -> Option<EnergyMode> {
        EnergyMode::ALL
            .into_iter()
            .find(|&mode| self.count(mode) != 0)
    }

    /// `true` when no mode is blocked.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }

    /// `(mode, count)` pairs, shallowest first.
    pub fn iter(&self) -> impl Iterator<Item = (EnergyMode, u8)> + '_ {
        EnergyMode::ALL
            .into_iter()
            .map(move |mode| (mode, self.count(mode)))
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.0.iter().map(|&count| u32::from(count)).sum()
    }
}
