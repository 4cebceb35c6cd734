//! Tap/pause button debouncing and long-press detection.
//!
//! An 8-bit shift register collects the raw sample each scan; the four
//! literal patterns below distinguish stable levels from clean transitions.
//! An edge is reported on the first sample that breaks a register full of
//! the opposite level; chatter that never settles matches no pattern and
//! produces no further events. A separate hold counter raises a one-shot
//! long-press flag after [`LONG_PRESS_TICKS`] consecutive held scans.

/// Held scans required before a long press is reported.
pub const LONG_PRESS_TICKS: u16 = 1000;

const JUST_PRESSED: u8 = 0x01;
const PRESSED: u8 = 0xFF;
const JUST_RELEASED: u8 = 0xFE;
const RELEASED: u8 = 0x00;

/// Events produced by one debounce scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonUpdate {
    /// A clean press edge was recognized this scan.
    pub just_pressed: bool,
    /// A clean release edge was recognized this scan.
    pub just_released: bool,
    /// The hold counter reached the long-press threshold this scan.
    pub long_press: bool,
}

/// Shift-register debouncer for the single tap/pause button.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebouncedButton {
    history: u8,
    hold_ticks: u16,
}

impl DebouncedButton {
    pub fn new() -> Self {
        DebouncedButton::default()
    }

    /// Shift in one raw sample and report any recognized events.
    ///
    /// The hold counter saturates, so a single long press raises the flag
    /// exactly once; it re-arms only through a release and re-press.
    pub fn update(&mut self, pressed: bool) -> ButtonUpdate {
        self.history = (self.history << 1) | pressed as u8;

        let mut events = ButtonUpdate::default();
        match self.history {
            JUST_PRESSED => {
                self.hold_ticks = 0;
                events.just_pressed = true;
            }
            PRESSED => {
                self.hold_ticks = self.hold_ticks.saturating_add(1);
                if self.hold_ticks == LONG_PRESS_TICKS {
                    events.long_press = true;
                }
            }
            JUST_RELEASED => {
                events.just_released = true;
            }
            _ => {}
        }
        events
    }

    /// The button is currently recognized as held.
    pub fn is_held(&self) -> bool {
        self.history == PRESSED
    }

    /// The button is currently recognized as released.
    pub fn is_released(&self) -> bool {
        self.history == RELEASED
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
