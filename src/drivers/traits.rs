//! Collaborator traits for abstraction and testability
//!
//! The transmission engine only talks to hardware through these traits,
//! so the SI4032, GPIO and ADC implementations can be swapped for
//! recording mocks on the host.

use crate::types::{AdcChannel, Frequency, GpsFix};

/// Radio transmitter register interface
///
/// Every call is synchronous and fire-and-forget: the engine has no way to
/// recover from a failed register write mid-symbol, so implementations
/// absorb (and may count) bus errors.
pub trait RadioPort {
    /// Program the carrier frequency
    fn set_tx_frequency(&mut self, freq: Frequency);

    /// Write one register
    fn write_register(&mut self, addr: u8, value: u8);

    /// Read the die temperature in whole degrees Celsius
    fn read_temperature(&mut self) -> i8;

    /// Key the transmitter
    fn enable_tx(&mut self);
}

/// Indicator and failsafe outputs
pub trait Indicators {
    /// Drive the TX (red) LED
    fn set_tx_led(&mut self, on: bool);

    /// Drive the status (green) LED
    fn set_status_led(&mut self, on: bool);

    /// Assert the failsafe cutoff output
    fn trigger_cutoff(&mut self);
}

/// Latest converted ADC samples
pub trait AdcSamples {
    /// Most recent raw 12-bit sample on `channel`
    fn sample(&self, channel: AdcChannel) -> u16;
}

/// Source of consistent GPS fix copies
pub trait GpsSource {
    /// Copy of the most recent complete fix
    fn last_fix(&self) -> GpsFix;
}
