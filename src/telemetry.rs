//! Telemetry Snapshot
//!
//! Captures everything one transmit cycle reports, once, before any
//! formatting starts. Both packet formatters read the same snapshot, so a
//! GPS update arriving mid-cycle can never tear a packet.

use crate::config::EngineConfig;
use crate::power::{leds_enabled, BatteryVoltage, Temperature};
use crate::types::GpsFix;

/// Monotonic frame counter, one step per transmit cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounter(u32);

impl FrameCounter {
    /// Create a counter that has not produced a frame yet
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Advance and return the new frame number (first frame is 1)
    pub fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    /// Last frame number handed out
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.0
    }
}

/// Immutable data captured for one packet cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    frame: u32,
    temperature: Temperature,
    voltage: BatteryVoltage,
    fix: GpsFix,
    gps_lock: bool,
    led_enabled: bool,
}

impl TelemetrySnapshot {
    /// Build a snapshot from values already copied out of their sources
    ///
    /// Without a 3D fix the position is zeroed so stale or invalid
    /// coordinates never reach the map.
    #[must_use]
    pub fn new(
        frame: u32,
        temperature: Temperature,
        voltage: BatteryVoltage,
        mut fix: GpsFix,
        config: &EngineConfig,
    ) -> Self {
        let gps_lock = fix.has_lock();
        if !gps_lock {
            fix.lat_raw = 0;
            fix.lon_raw = 0;
        }
        let led_enabled = leds_enabled(gps_lock, fix.altitude_m(), config.led_disable_altitude_m);

        Self {
            frame,
            temperature,
            voltage,
            fix,
            gps_lock,
            led_enabled,
        }
    }

    /// Frame counter value
    #[must_use]
    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Radio die temperature
    #[must_use]
    pub const fn temperature(&self) -> Temperature {
        self.temperature
    }

    /// Battery voltage
    #[must_use]
    pub const fn voltage(&self) -> BatteryVoltage {
        self.voltage
    }

    /// GPS fix copy (position zeroed without lock)
    #[must_use]
    pub const fn fix(&self) -> &GpsFix {
        &self.fix
    }

    /// GPS lock flag
    #[must_use]
    pub const fn gps_lock(&self) -> bool {
        self.gps_lock
    }

    /// LED enable flag
    #[must_use]
    pub const fn led_enabled(&self) -> bool {
        self.led_enabled
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TelemetrySnapshot {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "Snapshot(#{} {} {} lock={} {})",
            self.frame,
            self.voltage,
            self.temperature,
            self.gps_lock,
            self.fix
        );
    }
}
