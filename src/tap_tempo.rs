//! Tap-tempo measurement.
//!
//! A 32-bit counter of primary ticks since the last qualifying button press.
//! On the next press the elapsed count converts to bpm with fixed integer
//! arithmetic; measurements outside the supported range are rejected rather
//! than propagated, and the counter restarts either way.

use crate::TICKS_PER_MINUTE;

/// Lowest bpm a tap measurement may produce.
pub const MIN_TAP_BPM: u32 = 30;
/// Highest bpm a tap measurement may produce.
pub const MAX_TAP_BPM: u32 = 480;

/// Inter-press interval counter.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapTempo {
    duration: u32,
}

impl TapTempo {
    pub fn new() -> Self {
        TapTempo::default()
    }

    /// Count one primary tick.
    pub fn tick(&mut self) {
        self.duration = self.duration.saturating_add(1);
    }

    /// Convert the measured interval into a bpm and restart the counter.
    ///
    /// Returns `Some(bpm)` only for measurements within
    /// [`MIN_TAP_BPM`]..=[`MAX_TAP_BPM`]; anything else — including a
    /// zero-length interval — is rejected. The counter resets regardless of
    /// the outcome.
    pub fn measure(&mut self) -> Option<u16> {
        let bpm = TICKS_PER_MINUTE.checked_div(self.duration).unwrap_or(u32::MAX);
        self.duration = 0;
        if (MIN_TAP_BPM..=MAX_TAP_BPM).contains(&bpm) {
            Some(bpm as u16)
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!("tap rejected: {} bpm out of range", bpm);
            None
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
