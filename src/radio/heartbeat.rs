//! Status LED heartbeat
//!
//! Blinks the green LED while the GPS has a lock. Without a lock the LED
//! is switched off on the "off" phase and left alone on the "on" phase.

use crate::config::EngineConfig;

/// Heartbeat divider
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    countdown: u16,
    period: u16,
    lit: bool,
}

impl Heartbeat {
    /// Create a heartbeat that first toggles after `heartbeat_first` ticks
    #[must_use]
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            countdown: config.heartbeat_first,
            period: config.heartbeat_period,
            lit: false,
        }
    }

    /// Advance one tick
    ///
    /// Returns the level to drive the status LED to, when it must change.
    pub fn tick(&mut self, gps_lock: bool) -> Option<bool> {
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            return None;
        }
        self.countdown = self.period.max(1);

        let was_lit = self.lit;
        self.lit = !was_lit;
        if was_lit {
            Some(false)
        } else if gps_lock {
            Some(true)
        } else {
            None
        }
    }
}
