//! Type Safety Tests
//!
//! Tests for the domain types, power conversions and telemetry capture.
//! Run with: cargo test --test types_tests

use balloon_tx::config::EngineConfig;
use balloon_tx::power::{leds_enabled, BatteryVoltage, Temperature};
use balloon_tx::telemetry::{FrameCounter, TelemetrySnapshot};
use balloon_tx::types::{AdcChannel, FixQuality, Frequency, GpsFix, Modulation, TxMode};

// =============================================================================
// Frequency
// =============================================================================

#[test]
fn frequency_bounds() {
    assert!(Frequency::from_hz(Frequency::MIN_HZ).is_some());
    assert!(Frequency::from_hz(Frequency::MAX_HZ).is_some());
    assert!(Frequency::from_hz(Frequency::MIN_HZ - 1).is_none());
    assert!(Frequency::from_hz(Frequency::MAX_HZ + 1).is_none());
}

#[test]
fn frequency_from_khz() {
    let freq = Frequency::from_khz(434_650).unwrap();
    assert_eq!(freq.as_hz(), 434_650_000);
    assert_eq!(freq.as_khz(), 434_650);
    assert!(Frequency::from_khz(u32::MAX).is_none());
}

#[test]
fn frequency_band_split() {
    assert!(!Frequency::from_hz(479_999_999).unwrap().is_high_band());
    assert!(Frequency::from_hz(480_000_000).unwrap().is_high_band());
}

#[test]
fn frequency_debug() {
    let freq = Frequency::from_hz(434_650_000).unwrap();
    assert_eq!(format!("{freq:?}"), "Frequency(434650000 Hz)");
}

// =============================================================================
// Modes
// =============================================================================

#[test]
fn tx_mode_modulation() {
    assert_eq!(TxMode::default(), TxMode::Startup);
    assert_eq!(TxMode::Startup.modulation(), None);
    assert_eq!(TxMode::Rtty.modulation(), Some(Modulation::Rtty));
    assert_eq!(TxMode::Fsk4.modulation(), Some(Modulation::Fsk4));
    assert_eq!(TxMode::Fsk2.modulation(), Some(Modulation::Fsk2));
}

// =============================================================================
// GPS Fix
// =============================================================================

#[test]
fn lock_requires_3d_fix() {
    assert!(!FixQuality::NONE.is_locked());
    assert!(!FixQuality::DEAD_RECKONING.is_locked());
    assert!(!FixQuality::FIX_2D.is_locked());
    assert!(FixQuality::FIX_3D.is_locked());
    // GPS + dead reckoning
    assert!(FixQuality(4).is_locked());
}

#[test]
fn altitude_truncates_millimetres() {
    let fix = GpsFix {
        alt_raw: 12_345_999,
        ..GpsFix::default()
    };
    assert_eq!(fix.altitude_m(), 12_345);
    assert!(!fix.has_lock());
}

#[test]
fn adc_channel_slots() {
    assert_eq!(AdcChannel::Battery.index(), 0);
    assert_eq!(AdcChannel::Button.index(), 1);
}

// =============================================================================
// Power
// =============================================================================

#[test]
fn battery_from_adc() {
    assert_eq!(BatteryVoltage::from_adc(2048).centivolts(), 300);
    assert_eq!(BatteryVoltage::from_adc(2048).millivolts(), 3000);
}

#[test]
fn horus_battery_byte_scale() {
    assert_eq!(BatteryVoltage::from_centivolts(0).as_horus_byte(), 0);
    assert_eq!(BatteryVoltage::from_centivolts(250).as_horus_byte(), 127);
}

#[test]
fn si4032_temperature_conversion() {
    assert_eq!(Temperature::from_si4032_adc(200).celsius(), 20);
    assert_eq!(Temperature::from_si4032_adc(160).celsius(), 0);
}

#[test]
fn led_policy() {
    // No lock: always lit
    assert!(leds_enabled(false, 30_000, 1000));
    assert!(leds_enabled(true, 1000, 1000));
    assert!(!leds_enabled(true, 1001, 1000));
}

// =============================================================================
// Telemetry
// =============================================================================

#[test]
fn frame_counter_starts_at_one() {
    let mut counter = FrameCounter::new();
    assert_eq!(counter.current(), 0);
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.next(), 2);
    assert_eq!(counter.current(), 2);
}

#[test]
fn snapshot_zeroes_position_without_lock() {
    let fix = GpsFix {
        fix: FixQuality::FIX_2D,
        lat_raw: 100,
        lon_raw: -100,
        alt_raw: 5_000_000,
        ..GpsFix::default()
    };
    let snap = TelemetrySnapshot::new(
        1,
        Temperature::default(),
        BatteryVoltage::default(),
        fix,
        &EngineConfig::default(),
    );
    assert!(!snap.gps_lock());
    assert_eq!(snap.fix().lat_raw, 0);
    assert_eq!(snap.fix().lon_raw, 0);
    assert_eq!(snap.fix().alt_raw, 5_000_000);
    assert!(snap.led_enabled());
}

#[test]
fn snapshot_dims_leds_at_altitude() {
    let fix = GpsFix {
        fix: FixQuality::FIX_3D,
        alt_raw: 2_000_000,
        ..GpsFix::default()
    };
    let snap = TelemetrySnapshot::new(
        7,
        Temperature::from_celsius(-40),
        BatteryVoltage::from_centivolts(290),
        fix,
        &EngineConfig::default(),
    );
    assert!(snap.gps_lock());
    assert!(!snap.led_enabled());
    assert_eq!(snap.frame(), 7);
    assert_eq!(snap.temperature().celsius(), -40);
    assert_eq!(snap.voltage().centivolts(), 290);
}
