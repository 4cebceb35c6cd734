//! Device settings packed into a single persisted byte.
//!
//! The settings byte lives in one flash location and survives power cycles.
//! Layout:
//!
//! ```text
//! bit 0-2  clock resolution index (0 = 4 PPQN, 1 = 8 PPQN, 2 = 24 PPQN)
//! bit 3    tap-tempo enabled (button taps tempo instead of pausing)
//! bit 4    tempo locked (pot updates suppressed after a tap lock)
//! bit 5    legacy mode (counter/threshold clock instead of phase clock)
//! ```
//!
//! Decoding is defensive: an out-of-range resolution index — including the
//! all-ones pattern of erased flash — clamps to 24 PPQN rather than failing,
//! so corrupted or uninitialized storage degrades to safe defaults.

/// Output resolution of the primary clock, in pulses per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockResolution {
    /// 4 PPQN (sixteenth-note pulses).
    Four,
    /// 8 PPQN.
    Eight,
    /// 24 PPQN (MIDI clock rate).
    #[default]
    TwentyFour,
}

impl ClockResolution {
    /// Decode a stored resolution index, clamping anything out of range to
    /// the highest resolution.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => ClockResolution::Four,
            1 => ClockResolution::Eight,
            _ => ClockResolution::TwentyFour,
        }
    }

    /// The stored index of this resolution.
    pub fn index(self) -> u8 {
        match self {
            ClockResolution::Four => 0,
            ClockResolution::Eight => 1,
            ClockResolution::TwentyFour => 2,
        }
    }

    /// How many steps the 0..23 pulse counter advances per wrap of the phase
    /// accumulator. The accumulator always wraps at the 24 PPQN rate, so
    /// coarser resolutions consume proportionally more counter steps.
    pub fn granularity(self) -> u8 {
        match self {
            ClockResolution::Four => 6,
            ClockResolution::Eight => 3,
            ClockResolution::TwentyFour => 1,
        }
    }
}

/// The packed configuration record persisted as one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Options {
    /// Primary clock output resolution.
    pub resolution: ClockResolution,
    /// Button taps tempo when set; acts as a plain pause button when clear.
    pub tap_tempo: bool,
    /// Tempo locked by a successful tap measurement.
    pub locked: bool,
    /// Legacy counter/threshold clock active instead of the phase clock.
    pub legacy_mode: bool,
}

impl Options {
    /// Pack the settings into their single-byte storage layout.
    pub fn pack(&self) -> u8 {
        let mut byte = self.resolution.index();
        if self.tap_tempo {
            byte |= 0x08;
        }
        if self.locked {
            byte |= 0x10;
        }
        if self.legacy_mode {
            byte |= 0x20;
        }
        byte
    }

    /// Unpack a stored byte. Never fails: an invalid resolution index clamps
    /// to 24 PPQN and unknown high bits are ignored.
    pub fn unpack(byte: u8) -> Self {
        Options {
            resolution: ClockResolution::from_index(byte & 0x07),
            tap_tempo: byte & 0x08 != 0,
            locked: byte & 0x10 != 0,
            legacy_mode: byte & 0x20 != 0,
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RESOLUTIONS: [ClockResolution; 3] = [
        ClockResolution::Four,
        ClockResolution::Eight,
        ClockResolution::TwentyFour,
    ];

    #[test]
    fn pack_unpack_round_trips_all_valid_combinations() {
        for resolution in ALL_RESOLUTIONS {
            for bits in 0..8u8 {
                let options = Options {
                    resolution,
                    tap_tempo: bits & 1 != 0,
                    locked: bits & 2 != 0,
                    legacy_mode: bits & 4 != 0,
                };
                assert_eq!(Options::unpack(options.pack()), options);
            }
        }
    }

    #[test]
    fn invalid_resolution_bits_clamp_to_highest() {
        for index in 3..8u8 {
            let options = Options::unpack(index);
            assert_eq!(options.resolution, ClockResolution::TwentyFour);
        }
    }

    #[test]
    fn erased_flash_byte_decodes_to_valid_options() {
        let options = Options::unpack(0xFF);
        assert_eq!(options.resolution, ClockResolution::TwentyFour);
        assert!(options.tap_tempo);
        assert!(options.locked);
        assert!(options.legacy_mode);
        // And it still round-trips once clamped.
        assert_eq!(Options::unpack(options.pack()), options);
    }

    #[test]
    fn high_bits_are_ignored() {
        assert_eq!(Options::unpack(0xC0), Options::unpack(0x00));
    }

    #[test]
    fn granularity_matches_resolution() {
        assert_eq!(ClockResolution::Four.granularity(), 6);
        assert_eq!(ClockResolution::Eight.granularity(), 3);
        assert_eq!(ClockResolution::TwentyFour.granularity(), 1);
    }

    #[test]
    fn index_round_trips() {
        for resolution in ALL_RESOLUTIONS {
            assert_eq!(ClockResolution::from_index(resolution.index()), resolution);
        }
    }
}
