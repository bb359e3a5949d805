//! GPIO Abstractions
//!
//! Indicator LEDs and the failsafe cutoff output.
//! The green status LED on the RS41 board is wired active low.

use embedded_hal::digital::OutputPin;

use crate::drivers::traits::Indicators;

/// LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

impl LedState {
    /// Toggle the LED state
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    /// State for a boolean request
    #[must_use]
    pub const fn from_on(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}

/// Red TX LED, green status LED and the cutoff line
pub struct StatusLeds<TX, ST, CUT> {
    tx: TX,
    status: ST,
    cutoff: CUT,
    tx_state: LedState,
    status_state: LedState,
    cutoff_asserted: bool,
}

impl<TX: OutputPin, ST: OutputPin, CUT: OutputPin> StatusLeds<TX, ST, CUT> {
    /// Take the pins; both LEDs start off and the cutoff line low
    pub fn new(tx: TX, status: ST, cutoff: CUT) -> Self {
        let mut leds = Self {
            tx,
            status,
            cutoff,
            tx_state: LedState::Off,
            status_state: LedState::Off,
            cutoff_asserted: false,
        };
        leds.set_tx_led(false);
        leds.set_status_led(false);
        let _ = leds.cutoff.set_low();
        leds
    }

    /// Current TX LED state
    #[must_use]
    pub const fn tx_state(&self) -> LedState {
        self.tx_state
    }

    /// Current status LED state
    #[must_use]
    pub const fn status_state(&self) -> LedState {
        self.status_state
    }

    /// Check if the cutoff has been fired
    #[must_use]
    pub const fn cutoff_asserted(&self) -> bool {
        self.cutoff_asserted
    }

    /// Toggle the status LED
    pub fn toggle_status(&mut self) {
        let next = self.status_state.toggle();
        self.set_status_led(next == LedState::On);
    }

    /// Release the pins
    pub fn release(self) -> (TX, ST, CUT) {
        (self.tx, self.status, self.cutoff)
    }
}

impl<TX: OutputPin, ST: OutputPin, CUT: OutputPin> Indicators for StatusLeds<TX, ST, CUT> {
    fn set_tx_led(&mut self, on: bool) {
        // Pin errors are infallible on the STM32 GPIO
        let _ = if on { self.tx.set_high() } else { self.tx.set_low() };
        self.tx_state = LedState::from_on(on);
    }

    fn set_status_led(&mut self, on: bool) {
        let _ = if on {
            self.status.set_low()
        } else {
            self.status.set_high()
        };
        self.status_state = LedState::from_on(on);
    }

    fn trigger_cutoff(&mut self) {
        let _ = self.cutoff.set_high();
        self.cutoff_asserted = true;
    }
}
