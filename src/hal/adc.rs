//! ADC Sample Bank
//!
//! The ADC task converts the battery divider and the disable button line
//! continuously and publishes the latest raw values here. The symbol clock
//! and the mode sequencer read them without blocking.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::drivers::traits::AdcSamples;
use crate::types::AdcChannel;

/// ADC reading result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdcReading {
    /// Raw 12-bit ADC value (0-4095)
    raw: u16,
}

impl AdcReading {
    /// Create a new ADC reading from raw value (masked to 12 bits)
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw: raw & 0x0FFF }
    }

    /// Get the raw 12-bit value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Convert to millivolts against a 3.3 V reference
    #[must_use]
    pub const fn as_millivolts(self) -> u32 {
        self.raw as u32 * 3300 / 4095
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for AdcReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ADC({})", self.raw);
    }
}

/// Latest sample per channel, shared between tasks
pub struct AdcBank {
    samples: [AtomicU16; 2],
}

impl Default for AdcBank {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcBank {
    /// Create a bank with all channels reading zero
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: [AtomicU16::new(0), AtomicU16::new(0)],
        }
    }

    /// Publish a conversion result
    pub fn store(&self, channel: AdcChannel, reading: AdcReading) {
        self.samples[channel.index()].store(reading.raw(), Ordering::Relaxed);
    }

    /// Latest conversion result
    #[must_use]
    pub fn reading(&self, channel: AdcChannel) -> AdcReading {
        AdcReading::from_raw(self.samples[channel.index()].load(Ordering::Relaxed))
    }
}

impl AdcSamples for AdcBank {
    fn sample(&self, channel: AdcChannel) -> u16 {
        self.reading(channel).raw()
    }
}
