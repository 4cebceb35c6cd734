//! Primary phase-accumulator clock.
//!
//! A 32-bit counter advanced by a fixed per-tick increment; its wraparound
//! marks periodic events. The increment comes from the bpm-indexed
//! [`TEMPO_PHASE_INCREMENT`] table, so the whole pulse period is governed by
//! unsigned overflow — no other counter is involved.
//!
//! On top of the accumulator sits a 0..23 pulse counter at the 24 PPQN
//! master grid. Each accumulator wrap advances it by the active resolution's
//! granularity, and the beat/first-half flags it latches drive the LED and
//! the 50 %-duty output sub-mode.

use crate::options::ClockResolution;
use crate::resources::TEMPO_PHASE_INCREMENT;
use crate::PULSES_PER_BEAT;

/// Falling-edge threshold (high byte of phase) when no swing is applied.
const HALF_SWING_THRESHOLD: u8 = 0x40;

/// The primary clock: phase accumulator, pulse counter, and tempo state.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseClock {
    phase: u32,
    increment: u32,
    bpm: u16,
    granularity: u8,
    falling_edge: u8,
    pulse: u8,
    last_pulse: u8,
    beat: bool,
    first_half: bool,
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseClock {
    pub fn new() -> Self {
        PhaseClock {
            phase: 0,
            increment: 0,
            bpm: 0,
            granularity: ClockResolution::TwentyFour.granularity(),
            falling_edge: HALF_SWING_THRESHOLD,
            pulse: 0,
            last_pulse: 0,
            beat: false,
            first_half: false,
        }
    }

    /// Set the tempo and resolution.
    ///
    /// Pure and deterministic: the increment is read from the monotone
    /// bpm table (index clamped to the table bound) and the resolution's
    /// pulse granularity is recorded for [`tick_clock`](Self::tick_clock)
    /// callers. Callers are expected to reject bpm outside the supported
    /// range before getting here; the clamp only defends the table access.
    pub fn update(&mut self, bpm: u16, resolution: ClockResolution) {
        let index = (bpm as usize).min(TEMPO_PHASE_INCREMENT.len() - 1);
        self.increment = TEMPO_PHASE_INCREMENT[index];
        self.bpm = bpm;
        self.granularity = resolution.granularity();
    }

    /// Restart the cycle; called on pause toggles and tap locks.
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Advance one primary tick. Wrapping is the clock's sole timing
    /// primitive.
    pub fn tick(&mut self) {
        self.phase = self.phase.wrapping_add(self.increment);
    }

    /// Configure the falling-edge threshold for the output duty cycle.
    ///
    /// `swing == 0` keeps the fixed half-swing threshold. Nonzero swing
    /// shifts the threshold asymmetrically and shortens the cycle by zeroing
    /// the top byte of phase once it would pass `128 + swing`. The swing
    /// hook is fully implemented but all current call sites pass 0.
    pub fn wrap(&mut self, swing: i8) {
        if swing == 0 {
            self.falling_edge = HALF_SWING_THRESHOLD;
        } else {
            let limit = (128i16 + swing as i16) as u8;
            if self.phase_high_byte() >= limit {
                self.phase &= 0x00FF_FFFF;
            }
            self.falling_edge = limit >> 1;
        }
    }

    /// True exactly on the tick following a wraparound: after a wrap the
    /// accumulator holds only the overflow remainder, which is necessarily
    /// smaller than the increment.
    pub fn raising_edge(&self) -> bool {
        self.phase < self.increment
    }

    /// True once the high byte of phase has passed the falling-edge
    /// threshold; bounds the HIGH half of the output pulse.
    pub fn past_falling_edge(&self) -> bool {
        self.phase_high_byte() >= self.falling_edge
    }

    /// Advance the pulse counter by `num_pulses` steps, wrapping at
    /// [`PULSES_PER_BEAT`]. Latches the beat and first-half flags from the
    /// counter value at entry.
    pub fn tick_clock(&mut self, num_pulses: u8) {
        self.beat = self.pulse == 0;
        self.first_half = self.pulse < PULSES_PER_BEAT / 2;
        self.pulse += num_pulses;

        // Wrap into PPQN steps.
        while self.pulse >= PULSES_PER_BEAT {
            self.pulse -= PULSES_PER_BEAT;
        }
    }

    /// Edge-triggered pulse observation: true only the first time a given
    /// counter value is seen, false on repeated observation. Gates
    /// single-shot output transitions.
    pub fn new_pulse(&mut self) -> bool {
        if self.pulse != self.last_pulse {
            self.last_pulse = self.pulse;
            true
        } else {
            false
        }
    }

    /// Counter was 0 at the start of the last [`tick_clock`](Self::tick_clock).
    pub fn on_beat(&self) -> bool {
        self.beat
    }

    /// Counter was in the first half of the beat at the last
    /// [`tick_clock`](Self::tick_clock).
    pub fn on_first_half(&self) -> bool {
        self.first_half
    }

    /// Current tempo as last passed to [`update`](Self::update).
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// Pulse granularity recorded by the last [`update`](Self::update).
    pub fn granularity(&self) -> u8 {
        self.granularity
    }

    /// Current pulse counter value, 0..23.
    pub fn pulse(&self) -> u8 {
        self.pulse
    }

    fn phase_high_byte(&self) -> u8 {
        (self.phase >> 24) as u8
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_at(bpm: u16, resolution: ClockResolution) -> PhaseClock {
        let mut clock = PhaseClock::new();
        clock.update(bpm, resolution);
        clock
    }

    // ── update ───────────────────────────────────────────────────────

    #[test]
    fn update_is_pure_and_deterministic() {
        for bpm in [30u16, 120, 333, 480] {
            for resolution in [
                ClockResolution::Four,
                ClockResolution::Eight,
                ClockResolution::TwentyFour,
            ] {
                let a = clock_at(bpm, resolution);
                let b = clock_at(bpm, resolution);
                assert_eq!(a.increment, b.increment);
                assert_eq!(a.increment, TEMPO_PHASE_INCREMENT[bpm as usize]);
                assert_eq!(a.granularity(), resolution.granularity());
            }
        }
    }

    #[test]
    fn update_clamps_table_index() {
        let clock = clock_at(u16::MAX, ClockResolution::TwentyFour);
        assert_eq!(clock.increment, TEMPO_PHASE_INCREMENT[511]);
    }

    // ── accumulation ─────────────────────────────────────────────────

    #[test]
    fn accumulation_law_holds_modulo_2_pow_32() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        let increment = clock.increment;
        let start = clock.phase;
        let n = 2500u32;
        for _ in 0..n {
            clock.tick();
        }
        assert_eq!(clock.phase, start.wrapping_add(n.wrapping_mul(increment)));
    }

    #[test]
    fn raising_edge_fires_once_per_cycle() {
        // 480 bpm wraps every 120_000 / 480 = 250 ticks exactly.
        let mut clock = clock_at(480, ClockResolution::TwentyFour);
        let cycle = (120_000 / 480) as usize;
        let mut edges = 0;
        // A couple of slack ticks: the increment rounds down, so each wrap
        // lands one tick past the nominal cycle boundary.
        for _ in 0..cycle * 4 + 4 {
            clock.tick();
            if clock.raising_edge() {
                edges += 1;
            }
        }
        assert_eq!(edges, 4);
    }

    #[test]
    fn raising_edge_period_matches_ceil_division() {
        let mut clock = clock_at(437, ClockResolution::TwentyFour);
        let increment = clock.increment as u64;
        let expected = ((1u64 << 32) + increment - 1) / increment;

        // Distance between the first two edges.
        let mut first = None;
        for tick in 1u64.. {
            clock.tick();
            if clock.raising_edge() {
                match first {
                    None => first = Some(tick),
                    Some(f) => {
                        let period = tick - f;
                        assert!(period == expected || period == expected - 1);
                        break;
                    }
                }
            }
        }
    }

    // ── pulse counter ────────────────────────────────────────────────

    #[test]
    fn pulse_counter_cycles_in_order() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        for expected in 0..48u8 {
            assert_eq!(clock.pulse(), expected % PULSES_PER_BEAT);
            clock.tick_clock(1);
        }
    }

    #[test]
    fn on_beat_true_exactly_when_counter_was_zero() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        for step in 0..72u8 {
            let was_zero = clock.pulse() == 0;
            clock.tick_clock(1);
            assert_eq!(clock.on_beat(), was_zero, "step {step}");
        }
    }

    #[test]
    fn first_half_covers_first_twelve_pulses() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        for _ in 0..PULSES_PER_BEAT {
            let in_first_half = clock.pulse() < 12;
            clock.tick_clock(1);
            assert_eq!(clock.on_first_half(), in_first_half);
        }
    }

    #[test]
    fn coarse_granularity_wraps_at_pulses_per_beat() {
        let mut clock = clock_at(120, ClockResolution::Four);
        let granularity = ClockResolution::Four.granularity();
        for _ in 0..4 {
            for expected in (0..PULSES_PER_BEAT).step_by(granularity as usize) {
                assert_eq!(clock.pulse(), expected);
                clock.tick_clock(granularity);
            }
        }
    }

    #[test]
    fn new_pulse_is_edge_triggered() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        assert!(!clock.new_pulse(), "no pulse seen yet");
        clock.tick_clock(1);
        assert!(clock.new_pulse());
        assert!(!clock.new_pulse(), "repeated observation");
        clock.tick_clock(1);
        assert!(clock.new_pulse());
    }

    // ── edges and swing ──────────────────────────────────────────────

    #[test]
    fn past_falling_edge_uses_half_swing_threshold() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        clock.wrap(0);
        clock.phase = 0x3FFF_FFFF;
        assert!(!clock.past_falling_edge());
        clock.phase = 0x4000_0000;
        assert!(clock.past_falling_edge());
    }

    #[test]
    fn nonzero_swing_shifts_threshold_and_truncates_phase() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        clock.phase = 0xA0FF_FFFF; // high byte 0xA0 = 160
        clock.wrap(16); // limit 144, threshold 72
        assert_eq!(clock.phase, 0x00FF_FFFF);
        assert_eq!(clock.falling_edge, (128 + 16) >> 1);

        // Below the limit the phase is left alone.
        clock.phase = 0x8FFF_FFFF; // high byte 143 < 144
        clock.wrap(16);
        assert_eq!(clock.phase, 0x8FFF_FFFF);
    }

    #[test]
    fn reset_zeroes_phase_only() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        clock.tick();
        clock.tick_clock(1);
        clock.reset();
        assert_eq!(clock.phase, 0);
        assert_eq!(clock.pulse(), 1, "pulse counter survives a reset");
    }

    // ── end to end ───────────────────────────────────────────────────

    #[test]
    fn one_wraparound_lands_on_the_beat() {
        let mut clock = clock_at(120, ClockResolution::TwentyFour);
        assert_eq!(clock.increment, TEMPO_PHASE_INCREMENT[120]);

        let mut wrapped = false;
        while !wrapped {
            clock.tick();
            clock.wrap(0);
            if clock.raising_edge() {
                clock.tick_clock(ClockResolution::TwentyFour.granularity());
                wrapped = true;
            }
        }
        assert!(clock.on_beat());
        assert_eq!(clock.pulse(), 1);
    }
}
