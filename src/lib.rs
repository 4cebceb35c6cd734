//! Timing engine for a Eurorack tempo clock generator module.
//!
//! This crate holds every state machine of the module's firmware core: the
//! phase-accumulator clock, the counter-based legacy clock, tap-tempo
//! measurement, button debouncing with long-press detection, the settings
//! menu state machine, and the [`Engine`] aggregate that sequences them.
//!
//! # Architecture
//!
//! The hardware-interface crate drives the engine from three contexts:
//!
//! 1. **Primary tick** (8 kHz) — [`Engine::tick`]: debounces the tap/pause
//!    button, counts tap duration, advances whichever clock generator is
//!    active, and derives the clock-output level and LED pattern.
//! 2. **Secondary tick** (legacy mode only) — [`Engine::advance_legacy`]:
//!    accumulates the legacy counter that the primary tick compares against
//!    its table-driven threshold.
//! 3. **Cooperative scan loop** — [`Engine::scan`]: samples the analog
//!    channels, smooths the tempo pot, refreshes the derived tempo or legacy
//!    threshold, and runs the settings editor when the menu is open.
//!
//! The engine is pure state-in/commands-out: it never touches hardware. The
//! caller supplies raw samples ([`AnalogSnapshot`], the button level, the
//! shared [`RunState`] word) and applies the returned output levels, LED
//! brightnesses, and persistence requests. This keeps the whole core
//! host-testable with `cargo test`.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation; all storage is fixed-size. The optional `defmt`
//! feature enables structured logging on embedded targets.

#![no_std]

pub mod debounce;
pub mod engine;
pub mod legacy_clock;
pub mod options;
pub mod phase_clock;
pub mod resources;
pub mod settings_editor;
pub mod smoothing;
pub mod tap_tempo;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use engine::{
    AnalogSnapshot, Engine, LedPattern, MenuTransition, RunState, ScanOutput, SpeedMode,
    TickOutput,
};
pub use options::{ClockResolution, Options};

// ── Timebase constants ───────────────────────────────────────────────────

/// Primary tick rate driving [`Engine::tick`], in Hz.
pub const CONTROL_RATE_HZ: u32 = 8_000;

/// Primary ticks per minute; numerator of the tap-tempo bpm division.
pub const TICKS_PER_MINUTE: u32 = CONTROL_RATE_HZ * 60;

/// Internal pulses per quarter note (MIDI-style 24 PPQN master grid).
pub const PULSES_PER_BEAT: u8 = 24;

/// The tap/pause button is debounced every Nth primary tick.
pub const BUTTON_SCAN_PRESCALER: u8 = 10;
