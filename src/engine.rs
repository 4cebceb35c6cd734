//! The shared-state aggregate sequencing all timing state machines.
//!
//! [`Engine`] owns every piece of mutable core state and exposes one entry
//! point per scheduling context:
//!
//! - [`tick`](Engine::tick) — the 8 kHz primary tick: tap-duration count,
//!   prescaled button debouncing, mode-exclusive clock advancement, and the
//!   clock-output / LED composition.
//! - [`advance_legacy`](Engine::advance_legacy) — the high-frequency
//!   secondary tick, effective only while legacy mode is active.
//! - [`scan`](Engine::scan) — one cooperative loop pass: analog smoothing,
//!   derived tempo / legacy threshold, and the settings menu.
//!
//! The engine never touches hardware. Multi-writer state — the run/pause
//! word, the legacy tick enable — stays outside, in the caller's atomic
//! flags; the engine reads the current value per tick and reports changes
//! through its outputs. Persistence likewise: the engine marks settings
//! dirty and hands the packed byte to the scan loop, so flash writes only
//! ever happen in loop context.

use crate::debounce::DebouncedButton;
use crate::legacy_clock::{LegacyClock, LegacyCurve};
use crate::options::Options;
use crate::phase_clock::PhaseClock;
use crate::resources::GAUSS_CURVE;
use crate::settings_editor::{EditState, ModeSelection, SettingsEditor};
use crate::smoothing::RunningAverage;
use crate::tap_tempo::TapTempo;
use crate::BUTTON_SCAN_PRESCALER;

/// Full LED brightness.
pub const BRIGHTNESS_FULL: u8 = 0xFF;
/// LED off.
pub const BRIGHTNESS_NONE: u8 = 0x00;

/// Ticks between steps through the gauss fade curve in the waiting state.
const FADE_STEP_TICKS: u32 = 45;

/// Tempo-pot smoothing window.
const TEMPO_SMOOTHING: usize = 10;

/// Legacy counter step per secondary tick in fast mode (2.5 M counts/s at a
/// 1 kHz secondary tick).
pub const LEGACY_STEP_FAST: u32 = 2500;
/// Legacy counter step per secondary tick in slow mode (a quarter of fast).
pub const LEGACY_STEP_SLOW: u32 = 625;

/// Whether the clock outputs are enabled.
///
/// Shared between the tick context, the scan loop, and the external
/// pause-CV notification; the hardware layer keeps it in a single atomic
/// word and passes the current value into each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        }
    }

    pub fn is_paused(self) -> bool {
        self == RunState::Paused
    }
}

/// Output shaping of the primary clock, selected by the front-panel switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedMode {
    /// Finite pulse per wrap, bounded by the rising and falling edges.
    #[default]
    Fast,
    /// 50 % duty square wave following the first half of each beat.
    Slow,
}

impl SpeedMode {
    /// Counts the legacy clock accumulates per secondary tick in this mode.
    pub fn legacy_step(self) -> u32 {
        match self {
            SpeedMode::Fast => LEGACY_STEP_FAST,
            SpeedMode::Slow => LEGACY_STEP_SLOW,
        }
    }
}

/// One pass worth of raw 8-bit analog readings.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogSnapshot {
    /// Tempo pot.
    pub tempo_pot: u8,
    /// Tempo CV input (inverted by the input stage; un-inverted here).
    pub tempo_cv: u8,
    /// Mode/resolution selector.
    pub selector: u8,
}

/// Brightness pair for the two front-panel LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedPattern {
    pub clock: u8,
    pub pause: u8,
}

impl LedPattern {
    pub const fn off() -> Self {
        LedPattern {
            clock: BRIGHTNESS_NONE,
            pause: BRIGHTNESS_NONE,
        }
    }
}

/// Result of one primary tick.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutput {
    /// The run state after any button toggle this tick. Callers store it
    /// back only when it changed, preserving the pause CV's writes.
    pub run_state: RunState,
    /// Level for the clock output pin.
    pub clock_out: bool,
    /// LED brightnesses, or `None` while the menu-transition animation owns
    /// the LEDs from loop context.
    pub leds: Option<LedPattern>,
}

/// Menu transition reported by a scan pass. The caller plays the blocking
/// acknowledgment animation (loop context only), applies any exit effects,
/// and then calls [`Engine::finish_menu_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuTransition {
    Enter,
    Exit {
        /// Packed settings byte to persist.
        settings: u8,
        /// Force the run state back to running (tap tempo on, legacy off:
        /// the pause function is unreachable, so don't stay silently
        /// paused).
        force_running: bool,
    },
}

/// Result of one scan pass.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanOutput {
    /// A menu transition to act on, if a long press was consumed.
    pub transition: Option<MenuTransition>,
    /// Packed settings byte to persist (tap lock/unlock), deferred from
    /// tick context to the scan loop.
    pub save_settings: Option<u8>,
    /// Whether the secondary legacy tick source should run.
    pub legacy_tick_enabled: bool,
    /// Counter step for the secondary tick in the current speed mode.
    pub legacy_step: u32,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct LedFade {
    index: u16,
    timer: u32,
}

impl LedFade {
    /// One gauss-curve breathing step; both LEDs fade together.
    fn step(&mut self) -> LedPattern {
        let level = GAUSS_CURVE[self.index as usize];
        if self.timer == 0 {
            self.index += 1;
            if self.index as usize >= GAUSS_CURVE.len() {
                self.index = 0;
            }
            self.timer = FADE_STEP_TICKS;
        } else {
            self.timer -= 1;
        }
        LedPattern {
            clock: level,
            pause: level,
        }
    }
}

/// The timing engine. See the module docs for the scheduling contract.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Engine {
    clock: PhaseClock,
    legacy: LegacyClock,
    tap: TapTempo,
    button: DebouncedButton,
    editor: SettingsEditor,
    options: Options,
    speed_mode: SpeedMode,
    smooth_rate: RunningAverage<TEMPO_SMOOTHING>,
    button_prescaler: u8,
    long_press_pending: bool,
    settings_dirty: bool,
    clock_out: bool,
    fade: LedFade,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine at the power-on defaults: 120 bpm, 24 PPQN, everything else
    /// off. Call [`load_settings`](Self::load_settings) afterwards to apply
    /// the persisted byte.
    pub fn new() -> Self {
        let options = Options::default();
        let mut clock = PhaseClock::new();
        clock.update(120, options.resolution);
        Engine {
            clock,
            legacy: LegacyClock::new(),
            tap: TapTempo::new(),
            button: DebouncedButton::new(),
            editor: SettingsEditor::new(),
            options,
            speed_mode: SpeedMode::default(),
            smooth_rate: RunningAverage::new(),
            button_prescaler: 0,
            long_press_pending: false,
            settings_dirty: false,
            clock_out: false,
            fade: LedFade::default(),
        }
    }

    /// Apply the persisted settings byte.
    ///
    /// The stored lock flag is deliberately discarded: a locked tempo does
    /// not survive a power cycle, since the tempo it locked is gone.
    pub fn load_settings(&mut self, byte: u8) {
        self.options = Options::unpack(byte);
        self.options.locked = false;
        self.clock.update(self.clock.bpm(), self.options.resolution);
        #[cfg(feature = "defmt")]
        defmt::info!("settings loaded: {=u8:#x}", byte);
    }

    // ── Primary tick ─────────────────────────────────────────────────

    /// One primary tick. `raw_button` is this tick's button sample;
    /// `run_state` is the current value of the shared run/pause word.
    pub fn tick(&mut self, raw_button: bool, run_state: RunState) -> TickOutput {
        let mut run_state = run_state;

        self.tap.tick();

        self.button_prescaler += 1;
        if self.button_prescaler >= BUTTON_SCAN_PRESCALER {
            self.button_prescaler = 0;
            run_state = self.handle_button(raw_button, run_state);
        }

        // The two generators are mode-exclusive: only one of them produces
        // output, though both hold valid internal state.
        if self.options.legacy_mode {
            self.legacy.poll();
        } else {
            self.advance_phase();
        }

        self.clock_out = self.clock_output_level(run_state);
        let leds = self.led_pattern(run_state);

        TickOutput {
            run_state,
            clock_out: self.clock_out,
            leds,
        }
    }

    /// One secondary-tick step of the legacy counter. A no-op outside
    /// legacy mode, so a racing disable cannot advance a stale counter.
    pub fn advance_legacy(&mut self, step: u32) {
        if self.options.legacy_mode {
            self.legacy.advance(step);
        }
    }

    fn handle_button(&mut self, raw_button: bool, run_state: RunState) -> RunState {
        let mut run_state = run_state;
        let events = self.button.update(raw_button);

        if events.long_press {
            self.long_press_pending = true;
        }

        if events.just_pressed && self.editor.is_idle() {
            if !self.options.tap_tempo || self.options.legacy_mode {
                // Plain pause button.
                run_state = run_state.toggled();
                self.clock.reset();
            } else {
                match self.tap.measure() {
                    Some(bpm) => {
                        self.clock.update(bpm, self.options.resolution);
                        self.clock.reset();
                        self.options.locked = true;
                    }
                    None => {
                        self.options.locked = false;
                    }
                }
                self.settings_dirty = true;
            }
        }
        run_state
    }

    fn advance_phase(&mut self) {
        self.clock.tick();
        self.clock.wrap(0); // the swing hook stays unused
        if self.clock.raising_edge() {
            self.clock.tick_clock(self.clock.granularity());
        }
    }

    // ── Output composition ───────────────────────────────────────────

    fn clock_output_level(&mut self, run_state: RunState) -> bool {
        if run_state.is_paused() {
            return false;
        }
        if self.options.legacy_mode {
            return self.legacy.output();
        }
        match self.speed_mode {
            SpeedMode::Fast => {
                // The falling edge bounds the pulse; a fresh pulse raises it.
                if self.clock.past_falling_edge() {
                    false
                } else if self.clock.new_pulse() {
                    true
                } else {
                    self.clock_out
                }
            }
            SpeedMode::Slow => self.clock.on_first_half(),
        }
    }

    fn led_pattern(&mut self, run_state: RunState) -> Option<LedPattern> {
        match self.editor.state() {
            EditState::Idle => {
                let mut pattern = LedPattern::off();
                if self.options.legacy_mode {
                    if self.legacy.output() {
                        pattern.clock = BRIGHTNESS_FULL;
                    }
                } else if self.clock.on_first_half() {
                    pattern.clock = BRIGHTNESS_FULL;
                    // A locked tempo flashes the pause LED in sync for a
                    // "synchronized" appearance.
                    if self.options.locked {
                        pattern.pause = BRIGHTNESS_FULL;
                    }
                }
                if run_state.is_paused() {
                    pattern.pause = BRIGHTNESS_FULL;
                }
                Some(pattern)
            }
            // The acknowledgment animation owns the LEDs.
            EditState::Transition => None,
            EditState::Waiting => Some(self.fade.step()),
            EditState::EditingResolution => {
                let mut pattern = LedPattern::off();
                if !self.options.legacy_mode {
                    match self.options.resolution {
                        crate::ClockResolution::Four => pattern.clock = BRIGHTNESS_FULL,
                        crate::ClockResolution::Eight => pattern.pause = BRIGHTNESS_FULL,
                        crate::ClockResolution::TwentyFour => {
                            pattern.clock = BRIGHTNESS_FULL;
                            pattern.pause = BRIGHTNESS_FULL;
                        }
                    }
                }
                Some(pattern)
            }
            EditState::EditingTapTempo => {
                let mut pattern = LedPattern::off();
                if self.options.tap_tempo {
                    pattern.pause = BRIGHTNESS_FULL;
                } else {
                    pattern.clock = BRIGHTNESS_FULL;
                }
                Some(pattern)
            }
        }
    }

    // ── Scan loop ────────────────────────────────────────────────────

    /// One cooperative scan pass over the analog inputs.
    pub fn scan(&mut self, input: AnalogSnapshot) -> ScanOutput {
        let mut output = ScanOutput::default();

        if self.long_press_pending {
            self.long_press_pending = false;
            if self.editor.is_idle() {
                self.editor.enter(input.tempo_pot, input.selector);
                output.transition = Some(MenuTransition::Enter);
                #[cfg(feature = "defmt")]
                defmt::info!("settings menu opened");
            } else {
                self.editor.exit();
                output.transition = Some(MenuTransition::Exit {
                    settings: self.options.pack(),
                    force_running: self.options.tap_tempo && !self.options.legacy_mode,
                });
                #[cfg(feature = "defmt")]
                defmt::info!("settings menu closed");
            }
        } else if self.editor.is_idle() {
            self.scan_normal(input);
        } else if !self.editor.in_transition() {
            self.scan_menu(input);
        }

        if self.settings_dirty {
            self.settings_dirty = false;
            output.save_settings = Some(self.options.pack());
        }
        output.legacy_tick_enabled = self.options.legacy_mode;
        output.legacy_step = self.speed_mode.legacy_step();
        output
    }

    /// Complete a previously reported [`MenuTransition`]; called after the
    /// acknowledgment animation has finished.
    pub fn finish_menu_transition(&mut self) {
        self.editor.finish_transition();
    }

    fn scan_normal(&mut self, input: AnalogSnapshot) {
        let pot = self.smooth_rate.push_and_get(input.tempo_pot);
        // The CV input stage inverts; undo that here.
        let cv = !input.tempo_cv;

        // Legacy threshold, refreshed every pass whether or not legacy mode
        // is active. The tap-tempo setting doubles as the lin/log curve
        // selector.
        let combined = pot as u16 + cv as u16;
        let curve = if self.options.tap_tempo {
            LegacyCurve::Logarithmic
        } else {
            LegacyCurve::Linear
        };
        self.legacy.set_period(combined, curve);

        // Pot + CV derived tempo, suppressed while tap-locked.
        let pot_bpm = mul_shift8(pot, 220) as u16 + 20;
        let bpm = pot_bpm + mul_shift8(cv, 240) as u16;
        if bpm != self.clock.bpm() && !self.options.locked {
            self.clock.update(bpm, self.options.resolution);
        }

        self.speed_mode = if input.selector & 0x80 != 0 {
            SpeedMode::Slow
        } else {
            SpeedMode::Fast
        };
    }

    fn scan_menu(&mut self, input: AnalogSnapshot) {
        let edits = self.editor.scan(input.tempo_pot, input.selector);

        if let Some(mode) = edits.mode {
            match mode {
                ModeSelection::Legacy => {
                    self.options.legacy_mode = true;
                }
                ModeSelection::Resolution(resolution) => {
                    self.options.legacy_mode = false;
                    self.options.resolution = resolution;
                    self.clock.update(self.clock.bpm(), resolution);
                }
            }
        }

        if let Some(tap_tempo) = edits.tap_tempo {
            self.options.tap_tempo = tap_tempo;
            if !tap_tempo {
                self.options.locked = false;
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn bpm(&self) -> u16 {
        self.clock.bpm()
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn locked(&self) -> bool {
        self.options.locked
    }

    pub fn edit_state(&self) -> EditState {
        self.editor.state()
    }
}

/// `(a * b) >> 8`, the 8x8 fixed-point scale used by the tempo mapping.
fn mul_shift8(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16) >> 8) as u8
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClockResolution;

    /// Run `ticks` primary ticks with a constant button level, threading
    /// the run state like the hardware layer would.
    fn run(engine: &mut Engine, ticks: u32, button: bool, mut run_state: RunState) -> TickOutput {
        let mut last = engine.tick(button, run_state);
        run_state = last.run_state;
        for _ in 1..ticks {
            last = engine.tick(button, run_state);
            run_state = last.run_state;
        }
        last
    }

    fn idle_snapshot() -> AnalogSnapshot {
        AnalogSnapshot {
            tempo_pot: 0,
            tempo_cv: 0xFF, // inverted input: 0xFF reads as zero CV
            selector: 0,
        }
    }

    fn tap_enabled_engine() -> Engine {
        let mut engine = Engine::new();
        engine.load_settings(
            Options {
                resolution: ClockResolution::TwentyFour,
                tap_tempo: true,
                locked: false,
                legacy_mode: false,
            }
            .pack(),
        );
        engine
    }

    // ── Pause button ─────────────────────────────────────────────────

    #[test]
    fn press_toggles_pause_when_tap_tempo_disabled() {
        let mut engine = Engine::new();
        let out = run(&mut engine, 70, false, RunState::Running);
        assert_eq!(out.run_state, RunState::Running);

        let out = run(&mut engine, 10, true, RunState::Running);
        assert_eq!(out.run_state, RunState::Paused);
        assert!(!out.clock_out, "paused output is forced low");
        assert_eq!(out.leds.unwrap().pause, BRIGHTNESS_FULL);

        // Release, then press again: back to running.
        run(&mut engine, 80, false, RunState::Paused);
        let out = run(&mut engine, 10, true, RunState::Paused);
        assert_eq!(out.run_state, RunState::Running);
    }

    #[test]
    fn run_state_passes_through_unchanged_without_a_press() {
        let mut engine = Engine::new();
        let out = run(&mut engine, 500, false, RunState::Paused);
        assert_eq!(out.run_state, RunState::Paused);
    }

    // ── Tap tempo ────────────────────────────────────────────────────

    #[test]
    fn tap_interval_locks_tempo_and_marks_settings_dirty() {
        let mut engine = tap_enabled_engine();

        // First press: the interval since power-on is far too short, so
        // this only resets the tap counter (and unlocks).
        run(&mut engine, 70, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        assert!(!engine.locked());
        assert_eq!(engine.bpm(), 120);

        // Second press exactly 4000 ticks after the first: 120 bpm.
        run(&mut engine, 3990, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        assert!(engine.locked());
        assert_eq!(engine.bpm(), 120);

        let output = engine.scan(idle_snapshot());
        let saved = output.save_settings.expect("tap lock persists settings");
        assert!(Options::unpack(saved).locked);
    }

    #[test]
    fn out_of_range_tap_unlocks_and_leaves_bpm_unchanged() {
        let mut engine = tap_enabled_engine();

        run(&mut engine, 70, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);

        // 960 ticks computes to 500 bpm: rejected.
        run(&mut engine, 950, false, RunState::Running);
        let out = run(&mut engine, 10, true, RunState::Running);
        assert_eq!(out.run_state, RunState::Running, "tap press never pauses");
        assert!(!engine.locked());
        assert_eq!(engine.bpm(), 120);

        let output = engine.scan(idle_snapshot());
        let saved = output.save_settings.expect("failed tap persists the unlock");
        assert!(!Options::unpack(saved).locked);
    }

    #[test]
    fn locked_tempo_suppresses_pot_updates() {
        let mut engine = tap_enabled_engine();

        // Lock at 120 bpm via two presses 4000 ticks apart.
        run(&mut engine, 70, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        run(&mut engine, 3990, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        assert!(engine.locked());

        let pot_high = AnalogSnapshot {
            tempo_pot: 255,
            tempo_cv: 0xFF,
            selector: 0,
        };
        for _ in 0..20 {
            engine.scan(pot_high);
        }
        assert_eq!(engine.bpm(), 120, "locked tempo ignores the pot");
    }

    #[test]
    fn pot_drives_tempo_while_unlocked() {
        let mut engine = Engine::new();
        let pot_high = AnalogSnapshot {
            tempo_pot: 255,
            tempo_cv: 0xFF,
            selector: 0,
        };
        for _ in 0..20 {
            engine.scan(pot_high);
        }
        // 255 * 220 >> 8 + 20 = 239 bpm at full pot, zero CV.
        assert_eq!(engine.bpm(), 239);
    }

    // ── Menu flow ────────────────────────────────────────────────────

    /// Ticks of continuous hold producing exactly one long press.
    const LONG_PRESS_HOLD: u32 = 10 * 1007;

    fn open_menu(engine: &mut Engine) {
        run(engine, 80, false, RunState::Running);
        run(engine, LONG_PRESS_HOLD, true, RunState::Running);
        let output = engine.scan(idle_snapshot());
        assert_eq!(output.transition, Some(MenuTransition::Enter));
        assert_eq!(engine.edit_state(), EditState::Transition);
        engine.finish_menu_transition();
        assert_eq!(engine.edit_state(), EditState::Waiting);
        // Settle the button back to released.
        run(engine, 80, false, RunState::Running);
    }

    #[test]
    fn long_press_opens_menu_and_freezes_leds_to_fade() {
        let mut engine = Engine::new();
        run(&mut engine, 80, false, RunState::Running);
        run(&mut engine, LONG_PRESS_HOLD, true, RunState::Running);
        let output = engine.scan(idle_snapshot());
        assert_eq!(output.transition, Some(MenuTransition::Enter));
        engine.finish_menu_transition();

        // The gauss fade starts at full brightness on both LEDs.
        let out = run(&mut engine, 1, true, RunState::Running);
        let leds = out.leds.unwrap();
        assert_eq!(leds.clock, leds.pause);
        assert_eq!(leds.clock, BRIGHTNESS_FULL);
    }

    #[test]
    fn leds_are_released_during_transition() {
        let mut engine = Engine::new();
        run(&mut engine, 80, false, RunState::Running);
        run(&mut engine, LONG_PRESS_HOLD, true, RunState::Running);
        engine.scan(idle_snapshot());
        let out = run(&mut engine, 1, true, RunState::Running);
        assert!(out.leds.is_none());
    }

    #[test]
    fn menu_edits_apply_resolution_and_tap_tempo() {
        let mut engine = Engine::new();
        open_menu(&mut engine);

        // Tempo channel to the second quadrant: 4 PPQN, legacy off.
        engine.scan(AnalogSnapshot {
            tempo_pot: 0x40,
            tempo_cv: 0xFF,
            selector: 0,
        });
        assert_eq!(engine.edit_state(), EditState::EditingResolution);
        assert_eq!(engine.options().resolution, ClockResolution::Four);
        assert!(!engine.options().legacy_mode);

        // Selector channel low: tap tempo on.
        engine.scan(AnalogSnapshot {
            tempo_pot: 0x40,
            tempo_cv: 0xFF,
            selector: 0x40,
        });
        // Selector moved only 0x40 from its 0x00 snapshot: qualifying.
        assert_eq!(engine.edit_state(), EditState::EditingTapTempo);
        assert!(engine.options().tap_tempo);
    }

    #[test]
    fn menu_edit_can_enable_legacy_mode() {
        let mut engine = Engine::new();
        // Open with the pot high so moving to zero is a qualifying delta.
        run(&mut engine, 80, false, RunState::Running);
        run(&mut engine, LONG_PRESS_HOLD, true, RunState::Running);
        engine.scan(AnalogSnapshot {
            tempo_pot: 0xC0,
            tempo_cv: 0xFF,
            selector: 0,
        });
        engine.finish_menu_transition();
        run(&mut engine, 80, false, RunState::Running);

        let output = engine.scan(AnalogSnapshot {
            tempo_pot: 0x00,
            tempo_cv: 0xFF,
            selector: 0,
        });
        assert!(engine.options().legacy_mode);
        assert!(output.legacy_tick_enabled);
    }

    #[test]
    fn second_long_press_exits_and_persists() {
        let mut engine = Engine::new();
        open_menu(&mut engine);

        // Enable tap tempo while in the menu.
        engine.scan(AnalogSnapshot {
            tempo_pot: 0,
            tempo_cv: 0xFF,
            selector: 0x40,
        });
        assert!(engine.options().tap_tempo);

        run(&mut engine, LONG_PRESS_HOLD, true, RunState::Running);
        let output = engine.scan(idle_snapshot());
        match output.transition {
            Some(MenuTransition::Exit {
                settings,
                force_running,
            }) => {
                assert!(Options::unpack(settings).tap_tempo);
                assert!(force_running, "tap tempo on, legacy off: resume running");
            }
            other => panic!("expected exit transition, got {other:?}"),
        }
        engine.finish_menu_transition();
        assert_eq!(engine.edit_state(), EditState::Idle);
    }

    // ── Legacy mode ──────────────────────────────────────────────────

    fn legacy_engine() -> Engine {
        let mut engine = Engine::new();
        engine.load_settings(
            Options {
                resolution: ClockResolution::TwentyFour,
                tap_tempo: false,
                locked: false,
                legacy_mode: true,
            }
            .pack(),
        );
        engine
    }

    #[test]
    fn legacy_output_follows_counter_threshold() {
        let mut engine = legacy_engine();
        // One scan pass sets the comparator from the (zero) pot: the
        // slowest linear period.
        let output = engine.scan(idle_snapshot());
        assert!(output.legacy_tick_enabled);
        assert_eq!(output.legacy_step, LEGACY_STEP_FAST);

        let out = run(&mut engine, 1, false, RunState::Running);
        assert!(!out.clock_out);

        engine.advance_legacy(crate::resources::LEGACY_TIMER_LIN[0]);
        let out = run(&mut engine, 1, false, RunState::Running);
        assert!(out.clock_out, "threshold reached: output toggles high");
        assert_eq!(out.leds.unwrap().clock, BRIGHTNESS_FULL);

        engine.advance_legacy(crate::resources::LEGACY_TIMER_LIN[0]);
        let out = run(&mut engine, 1, false, RunState::Running);
        assert!(!out.clock_out, "next threshold: output toggles low");
    }

    #[test]
    fn legacy_counter_ignored_outside_legacy_mode() {
        let mut engine = Engine::new();
        engine.scan(idle_snapshot());
        engine.advance_legacy(u32::MAX / 2);
        let out = run(&mut engine, 1, false, RunState::Running);
        assert!(!out.clock_out);
    }

    #[test]
    fn slow_speed_mode_selects_smaller_legacy_step() {
        let mut engine = legacy_engine();
        let output = engine.scan(AnalogSnapshot {
            tempo_pot: 0,
            tempo_cv: 0xFF,
            selector: 0x80,
        });
        assert_eq!(output.legacy_step, LEGACY_STEP_SLOW);
    }

    // ── Primary output composition ───────────────────────────────────

    #[test]
    fn fast_mode_emits_finite_pulse_per_wrap() {
        let mut engine = Engine::new();
        // 120 bpm wraps every ~1000 ticks; run until the output goes high.
        let mut high_ticks = 0u32;
        let mut seen_high = false;
        let mut run_state = RunState::Running;
        for _ in 0..2000 {
            let out = engine.tick(false, run_state);
            run_state = out.run_state;
            if out.clock_out {
                seen_high = true;
                high_ticks += 1;
            } else if seen_high {
                break;
            }
        }
        assert!(seen_high, "a pulse must appear within two cycles");
        // The falling edge bounds the pulse well before the next wrap.
        assert!(high_ticks < 1000, "pulse must be finite, got {high_ticks}");
    }

    #[test]
    fn slow_mode_follows_first_half_of_beat() {
        let mut engine = Engine::new();
        // Select slow mode via the selector switch; pot 117 maps to 120 bpm
        // once the smoothing window converges.
        for _ in 0..10 {
            engine.scan(AnalogSnapshot {
                tempo_pot: 117,
                tempo_cv: 0xFF,
                selector: 0x80,
            });
        }
        assert_eq!(engine.bpm(), 120);
        // After the first wrap the pulse counter enters its first half.
        let mut out = engine.tick(false, RunState::Running);
        for _ in 0..1100 {
            out = engine.tick(false, out.run_state);
        }
        assert!(out.clock_out);
        assert_eq!(out.leds.unwrap().clock, BRIGHTNESS_FULL);
    }

    #[test]
    fn locked_tempo_flashes_pause_led_in_sync() {
        let mut engine = tap_enabled_engine();
        run(&mut engine, 70, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        run(&mut engine, 3990, false, RunState::Running);
        run(&mut engine, 10, true, RunState::Running);
        assert!(engine.locked());

        // Run past the first wrap so on_first_half is latched.
        let out = run(&mut engine, 1100, false, RunState::Running);
        let leds = out.leds.unwrap();
        assert_eq!(leds.clock, BRIGHTNESS_FULL);
        assert_eq!(leds.pause, BRIGHTNESS_FULL);
    }
}
