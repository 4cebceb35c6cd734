//! Running-average smoothing for noisy analog readings.

/// Fixed-window running average over `N` 8-bit samples.
///
/// Keeps a circular history and a running total, so each push is O(1). The
/// average can never exceed the input width since the total of `N` samples
/// divided by `N` stays within `u8`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RunningAverage<const N: usize> {
    history: [u8; N],
    index: usize,
    total: u16,
}

impl<const N: usize> Default for RunningAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RunningAverage<N> {
    pub const fn new() -> Self {
        RunningAverage {
            history: [0; N],
            index: 0,
            total: 0,
        }
    }

    /// Replace the oldest sample with `value`.
    pub fn push(&mut self, value: u8) {
        self.total -= self.history[self.index] as u16;
        self.history[self.index] = value;
        self.total += value as u16;

        self.index += 1;
        if self.index >= N {
            self.index = 0;
        }
    }

    /// Current window average.
    pub fn get(&self) -> u8 {
        (self.total / N as u16) as u8
    }

    pub fn push_and_get(&mut self, value: u8) -> u8 {
        self.push(value);
        self.get()
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
