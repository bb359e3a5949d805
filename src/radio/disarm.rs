//! Disable-arm latch
//!
//! The button on ADC channel 1 is sensed against an adaptive baseline of
//! 110 % of the last quiet sample. Holding it longer than a third of a
//! second arms the latch; releasing it afterwards fires the cutoff.

use crate::config::{EngineConfig, DISARM_BASELINE_DEN, DISARM_BASELINE_NUM};

/// Result of feeding one button sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisarmAction {
    /// Sample at or below baseline, latch not armed
    Idle,
    /// Sample above baseline
    Pressed,
    /// The latch armed on this sample
    Armed,
    /// Released while armed; the cutoff must be (re)asserted
    Cutoff {
        /// First time the cutoff fired
        first: bool,
    },
}

/// Button debounce and latch state
#[derive(Clone, Copy, Debug)]
pub struct DisarmMonitor {
    baseline: u16,
    pressed_ticks: u32,
    threshold: u32,
    armed: bool,
    cutoff_fired: bool,
}

impl DisarmMonitor {
    /// Create an unarmed monitor
    #[must_use]
    pub const fn new(config: &EngineConfig) -> Self {
        Self {
            baseline: config.disarm_initial_baseline,
            pressed_ticks: 0,
            threshold: config.press_threshold_ticks(),
            armed: false,
            cutoff_fired: false,
        }
    }

    /// Check if the latch is armed (output suppressed)
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Current baseline
    #[must_use]
    pub const fn baseline(&self) -> u16 {
        self.baseline
    }

    /// Consecutive ticks above baseline
    #[must_use]
    pub const fn pressed_ticks(&self) -> u32 {
        self.pressed_ticks
    }

    /// Feed the sample taken on this tick
    pub fn update(&mut self, sample: u16) -> DisarmAction {
        let action = if sample > self.baseline {
            self.pressed_ticks = self.pressed_ticks.saturating_add(1);
            if !self.armed && self.pressed_ticks > self.threshold {
                self.armed = true;
                DisarmAction::Armed
            } else {
                DisarmAction::Pressed
            }
        } else {
            self.pressed_ticks = 0;
            if self.armed {
                let first = !self.cutoff_fired;
                self.cutoff_fired = true;
                DisarmAction::Cutoff { first }
            } else {
                DisarmAction::Idle
            }
        };

        if self.pressed_ticks == 0 {
            let scaled = u32::from(sample) * DISARM_BASELINE_NUM / DISARM_BASELINE_DEN;
            self.baseline = u16::try_from(scaled).unwrap_or(u16::MAX);
        }
        action
    }
}
