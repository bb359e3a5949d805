//! Power Management
//!
//! Battery monitoring, device temperature and the LED power-saving policy.

use crate::config::{ADC_FULL_SCALE, BATTERY_SCALE_CENTIVOLTS};

/// Battery voltage reading
///
/// Stored in centivolts (330 = 3.30 V), the unit the telemetry sentence
/// multiplies by ten to report millivolts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BatteryVoltage {
    centivolts: u16,
}

impl BatteryVoltage {
    /// Create from a raw 12-bit ADC reading of the battery divider
    #[must_use]
    pub const fn from_adc(raw: u16) -> Self {
        let cv = raw as u32 * BATTERY_SCALE_CENTIVOLTS / ADC_FULL_SCALE;
        Self {
            centivolts: cv as u16,
        }
    }

    /// Create from centivolts
    #[must_use]
    pub const fn from_centivolts(centivolts: u16) -> Self {
        Self { centivolts }
    }

    /// Get voltage in centivolts
    #[must_use]
    pub const fn centivolts(&self) -> u16 {
        self.centivolts
    }

    /// Get voltage in millivolts (the value sent in the RTTY sentence)
    #[must_use]
    pub const fn millivolts(&self) -> u32 {
        self.centivolts as u32 * 10
    }

    /// Scale to one byte where 255 is 5.00 V (Horus Binary encoding)
    #[must_use]
    pub const fn as_horus_byte(&self) -> u8 {
        let scaled = self.centivolts as u32 * 255 / 500;
        if scaled > 255 {
            255
        } else {
            scaled as u8
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for BatteryVoltage {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{}V", self.centivolts / 100, self.centivolts % 100);
    }
}

/// Radio die temperature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Temperature {
    celsius: i8,
}

impl Temperature {
    /// Create from whole degrees Celsius
    #[must_use]
    pub const fn from_celsius(celsius: i8) -> Self {
        Self { celsius }
    }

    /// Convert an SI4032 ADC reading (temperature sensor range -64..64 °C,
    /// 0.5 °C per count, with the 16 °C offset programmed at startup)
    #[must_use]
    pub const fn from_si4032_adc(raw: u8) -> Self {
        let celsius = -64 + (raw as i16 * 5 / 10) - 16;
        Self {
            celsius: celsius as i8,
        }
    }

    /// Get temperature in Celsius
    #[must_use]
    pub const fn celsius(&self) -> i8 {
        self.celsius
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Temperature {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}°C", self.celsius);
    }
}

/// Decide whether the indicator LEDs may be lit for a given fix
///
/// Without a lock the LEDs stay on so the payload can be checked on the
/// ground; above the altitude threshold they are switched off.
#[must_use]
pub const fn leds_enabled(has_lock: bool, altitude_m: i32, threshold_m: i32) -> bool {
    !has_lock || altitude_m <= threshold_m
}
