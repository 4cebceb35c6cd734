//! Counter-based legacy clock generator.
//!
//! Kept for backward compatibility with the module's original timing scheme:
//! instead of a phase accumulator, a counter fed by a high-frequency
//! secondary tick is compared against a table-driven threshold. Every time
//! the counter reaches the threshold it resets and the output level flips,
//! producing a square wave whose period is governed entirely by the
//! comparator value.
//!
//! The comparator is refreshed from the scan loop, not per tick: the
//! combined pot + CV reading indexes either the linear or the logarithmic
//! taper (the tap-tempo flag doubles as the curve selector while legacy
//! mode is active).

use crate::resources::{LEGACY_TIMER_LIN, LEGACY_TIMER_LOG, LEGACY_TIMER_SIZE};

/// Taper of the pot-to-period mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LegacyCurve {
    Linear,
    Logarithmic,
}

/// The legacy clock generator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LegacyClock {
    elapsed: u32,
    comparator: u32,
    output: bool,
}

impl Default for LegacyClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyClock {
    pub fn new() -> Self {
        LegacyClock {
            elapsed: 0,
            // Slowest period until the first scan pass refreshes it.
            comparator: LEGACY_TIMER_LIN[0],
            output: false,
        }
    }

    /// Accumulate one secondary tick worth of counts. Called from the
    /// high-frequency legacy tick source, active only in legacy mode.
    pub fn advance(&mut self, step: u32) {
        self.elapsed = self.elapsed.wrapping_add(step);
    }

    /// Compare the counter against the threshold and flip the output on
    /// expiry. Called from the primary tick while legacy mode is active.
    pub fn poll(&mut self) {
        if self.elapsed >= self.comparator {
            self.elapsed = 0;
            self.output = !self.output;
        }
    }

    /// Refresh the half-period from the combined 0..510 analog index,
    /// clamped to the table bound.
    pub fn set_period(&mut self, combined_index: u16, curve: LegacyCurve) {
        let index = (combined_index as usize).min(LEGACY_TIMER_SIZE - 1);
        self.comparator = match curve {
            LegacyCurve::Linear => LEGACY_TIMER_LIN[index],
            LegacyCurve::Logarithmic => LEGACY_TIMER_LOG[index],
        };
    }

    /// Current square-wave output level.
    pub fn output(&self) -> bool {
        self.output
    }

    #[cfg(test)]
    fn comparator(&self) -> u32 {
        self.comparator
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
