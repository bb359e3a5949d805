//! Shared types used across the transmitter firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

/// Carrier frequency in Hertz with validation
///
/// Represents a frequency the SI4032 synthesizer can reach.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Lowest synthesizer frequency (240 MHz)
    pub const MIN_HZ: u32 = 240_000_000;

    /// Highest synthesizer frequency (960 MHz)
    pub const MAX_HZ: u32 = 960_000_000;

    /// Create a new Frequency from Hz, returns None if out of range
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        if hz >= Self::MIN_HZ && hz <= Self::MAX_HZ {
            Some(Self(hz))
        } else {
            None
        }
    }

    /// Create a new Frequency from kHz
    #[must_use]
    pub const fn from_khz(khz: u32) -> Option<Self> {
        match khz.checked_mul(1000) {
            Some(hz) => Self::from_hz(hz),
            None => None,
        }
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Get the frequency in kHz (truncated)
    #[must_use]
    pub const fn as_khz(self) -> u32 {
        self.0 / 1000
    }

    /// Check if the frequency needs the synthesizer high band
    #[must_use]
    pub const fn is_high_band(self) -> bool {
        self.0 >= 480_000_000
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} kHz", self.as_khz());
    }
}

/// Phase of the transmit cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TxMode {
    /// Capturing fresh telemetry
    #[default]
    Startup,
    /// Sending the RTTY sentence
    Rtty,
    /// Sending the 4FSK packet
    Fsk4,
    /// Sending the 2FSK packet (alternate physical layer)
    Fsk2,
}

impl TxMode {
    /// Modulation used on air during this phase
    #[must_use]
    pub const fn modulation(self) -> Option<Modulation> {
        match self {
            Self::Startup => None,
            Self::Rtty => Some(Modulation::Rtty),
            Self::Fsk4 => Some(Modulation::Fsk4),
            Self::Fsk2 => Some(Modulation::Fsk2),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TxMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Startup => defmt::write!(f, "STARTUP"),
            Self::Rtty => defmt::write!(f, "RTTY"),
            Self::Fsk4 => defmt::write!(f, "4FSK"),
            Self::Fsk2 => defmt::write!(f, "2FSK"),
        }
    }
}

/// On-air modulation of a transmit buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modulation {
    /// Two-tone asynchronous text, NUL terminated
    Rtty,
    /// 2 bits per symbol, length delimited
    Fsk4,
    /// 1 bit per symbol, length delimited
    Fsk2,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Modulation {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Rtty => defmt::write!(f, "RTTY"),
            Self::Fsk4 => defmt::write!(f, "4FSK"),
            Self::Fsk2 => defmt::write!(f, "2FSK"),
        }
    }
}

/// GPS fix type as reported by the receiver
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct FixQuality(pub u8);

impl FixQuality {
    /// No fix
    pub const NONE: Self = Self(0);

    /// Dead reckoning only
    pub const DEAD_RECKONING: Self = Self(1);

    /// 2D fix
    pub const FIX_2D: Self = Self(2);

    /// 3D fix
    pub const FIX_3D: Self = Self(3);

    /// Check if the position is usable for telemetry (3D or better)
    #[must_use]
    pub const fn is_locked(self) -> bool {
        self.0 >= 3
    }
}

/// Latest known GPS state
///
/// Positions are kept in the receiver's integer units so the sentence
/// formatter never touches floating point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GpsFix {
    /// Fix type
    pub fix: FixQuality,
    /// Latitude in 1e-7 degrees
    pub lat_raw: i32,
    /// Longitude in 1e-7 degrees
    pub lon_raw: i32,
    /// Altitude above mean sea level in mm
    pub alt_raw: i32,
    /// Ground speed in cm/s
    pub speed_raw: u32,
    /// Satellites used in the solution
    pub sats_raw: u8,
    /// UTC hours
    pub hours: u8,
    /// UTC minutes
    pub minutes: u8,
    /// UTC seconds
    pub seconds: u8,
}

impl GpsFix {
    /// Check if the fix is good enough to report a position
    #[must_use]
    pub const fn has_lock(&self) -> bool {
        self.fix.is_locked()
    }

    /// Altitude in whole metres (truncated)
    #[must_use]
    pub const fn altitude_m(&self) -> i32 {
        self.alt_raw / 1000
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for GpsFix {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Fix({} lat={} lon={} alt={}m sats={} {}:{}:{})",
            self.fix.0,
            self.lat_raw,
            self.lon_raw,
            self.altitude_m(),
            self.sats_raw,
            self.hours,
            self.minutes,
            self.seconds
        );
    }
}

/// ADC channel assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcChannel {
    /// Battery voltage divider
    Battery,
    /// Disable button sense line
    Button,
}

impl AdcChannel {
    /// Index into the sample bank
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Battery => 0,
            Self::Button => 1,
        }
    }
}
