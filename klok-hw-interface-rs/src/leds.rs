//! PWM brightness control for the two front-panel LEDs.
//!
//! Both LEDs sit on one PWM slice (clock on channel A, pause on channel B)
//! with an 8-bit duty range, so a [`LedPattern`] maps straight onto the two
//! compare registers.

use embassy_rp::pwm::{Config, Pwm};
use klok::LedPattern;

pub struct Leds {
    pwm: Pwm<'static>,
    config: Config,
}

impl Leds {
    /// Wrap an already-constructed A/B output slice. The counter top is set
    /// to 255 so compare values are plain 8-bit brightnesses.
    pub fn new(pwm: Pwm<'static>) -> Self {
        let mut config = Config::default();
        config.top = 255;
        config.compare_a = 0;
        config.compare_b = 0;
        let mut leds = Leds { pwm, config };
        leds.apply();
        leds
    }

    /// Set both brightnesses at once.
    pub fn set(&mut self, pattern: LedPattern) {
        self.config.compare_a = pattern.clock as u16;
        self.config.compare_b = pattern.pause as u16;
        self.apply();
    }

    fn apply(&mut self) {
        self.pwm.set_config(&self.config);
    }
}
