//! Settings menu state machine.
//!
//! A long press opens the menu. On entry the two relevant analog channels
//! are frozen; afterwards, any scan pass in which a channel has moved past
//! the noise threshold selects that channel's editing sub-state and reports
//! the decoded edit to the caller. Edits reload a cooperative countdown;
//! when it expires without further movement the editor falls back to the
//! waiting state. A second long press leaves the menu.
//!
//! The editor only decodes pot positions into edit values — applying them
//! to the live options and clocks is the engine's job, which keeps every
//! transition here directly testable.

use crate::options::ClockResolution;

/// Scan passes an editing sub-state survives without a qualifying delta.
pub const EDIT_TIMEOUT_PASSES: u32 = 400_000;

/// Minimum movement (out of 255) for a channel to register as an edit.
pub const EDIT_DELTA_THRESHOLD: i16 = 32;

/// Menu position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EditState {
    /// Normal operation; the menu is closed.
    #[default]
    Idle,
    /// Entering or leaving the menu while the acknowledgment animation owns
    /// the LEDs.
    Transition,
    /// Menu open, waiting for a channel to move.
    Waiting,
    /// The tempo channel selected the clock mode/resolution parameter.
    EditingResolution,
    /// The selector channel selected the tap-tempo parameter.
    EditingTapTempo,
}

/// Clock mode decoded from the resolution channel's top two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeSelection {
    /// Bottom quarter of the pot travel: the legacy clock generator.
    Legacy,
    /// Anything above: the phase clock at the chosen resolution.
    Resolution(ClockResolution),
}

/// Edits decoded by one scan pass. Both channels can move in the same pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EditScan {
    pub mode: Option<ModeSelection>,
    pub tap_tempo: Option<bool>,
}

/// Indices into the frozen-snapshot array.
const CHANNEL_TEMPO: usize = 0;
const CHANNEL_SELECTOR: usize = 1;

/// The menu state machine.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsEditor {
    state: EditState,
    frozen: [u8; 2],
    timeout: u32,
    entering: bool,
}

impl SettingsEditor {
    pub fn new() -> Self {
        SettingsEditor::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == EditState::Idle
    }

    pub fn in_transition(&self) -> bool {
        self.state == EditState::Transition
    }

    /// Open the menu: freeze the channel snapshots and start the entry
    /// transition. The caller plays the acknowledgment animation and then
    /// calls [`finish_transition`](Self::finish_transition).
    pub fn enter(&mut self, tempo: u8, selector: u8) {
        self.frozen = [tempo, selector];
        self.timeout = 0;
        self.entering = true;
        self.state = EditState::Transition;
    }

    /// Close the menu: start the exit transition.
    pub fn exit(&mut self) {
        self.entering = false;
        self.state = EditState::Transition;
    }

    /// Complete whichever transition is in flight.
    pub fn finish_transition(&mut self) {
        self.state = if self.entering {
            EditState::Waiting
        } else {
            EditState::Idle
        };
    }

    /// Process one scan pass of the two menu channels.
    ///
    /// Only meaningful in `Waiting` and the editing states; a qualifying
    /// delta commits the new snapshot value, decodes the edit, and reloads
    /// the timeout. With no edits, an editing state counts its timeout down
    /// and reverts to `Waiting` at zero.
    pub fn scan(&mut self, tempo: u8, selector: u8) -> EditScan {
        let mut edits = EditScan::default();

        if self.consume_delta(CHANNEL_TEMPO, tempo) {
            self.state = EditState::EditingResolution;
            self.timeout = EDIT_TIMEOUT_PASSES;
            // Only the two most significant bits select among the four
            // positions: legacy mode, then the three resolutions.
            let position = tempo >> 6;
            edits.mode = Some(if position == 0 {
                ModeSelection::Legacy
            } else {
                ModeSelection::Resolution(ClockResolution::from_index(position - 1))
            });
        }

        if self.consume_delta(CHANNEL_SELECTOR, selector) {
            self.state = EditState::EditingTapTempo;
            self.timeout = EDIT_TIMEOUT_PASSES;
            edits.tap_tempo = Some(selector & 0x80 == 0);
        }

        if self.state != EditState::Waiting {
            self.timeout = self.timeout.saturating_sub(1);
            if self.timeout == 0 {
                self.state = EditState::Waiting;
            }
        }

        edits
    }

    fn consume_delta(&mut self, channel: usize, value: u8) -> bool {
        let delta = (value as i16 - self.frozen[channel] as i16).abs();
        if delta > EDIT_DELTA_THRESHOLD {
            self.frozen[channel] = value;
            true
        } else {
            false
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
