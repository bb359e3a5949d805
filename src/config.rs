//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the balloon transmitter.
//! Callsign, RF parameters, symbol timing and pin mappings are centralized here.
//! [`EngineConfig`] gathers the values the transmission engine reads at runtime.

use crate::protocol::binary::FskPayload;
use crate::types::{Frequency, TxMode};

/// Payload callsign placed at the start of every RTTY sentence
pub const CALLSIGN: &str = "HORUS";

/// Maximum callsign length accepted by the sentence formatter
pub const MAX_CALLSIGN_LEN: usize = 14;

/// Symbol rate in baud (symbol clock ticks per second)
pub const RTTY_SPEED: u32 = 50;

/// Carrier frequency in Hz
pub const RTTY_FREQUENCY_HZ: u32 = 434_650_000;

/// SI4032 TX power setting (0-7, 7 = +20 dBm)
pub const TX_POWER: u8 = 0;

/// Deviation register value written for an RTTY mark (shift = value * 156 Hz)
pub const RTTY_DEVIATION: u8 = 0x03;

/// Mark symbols sent before the first character of each RTTY sentence
pub const RTTY_PRE_START_BITS: u8 = 10;

/// RTTY data bits per character (7 or 8)
pub const RTTY_DATA_BITS: u8 = 8;

/// RTTY stop bits per character (1 or 2)
pub const RTTY_STOP_BITS: u8 = 2;

/// Guard interval between the end of one packet and the next, in ms
pub const TX_DELAY_MS: u32 = 1000;

/// LEDs are switched off above this altitude (metres) to save power
pub const LED_DISABLE_ALTITUDE_M: i32 = 1000;

/// Enable the disable-arm safety latch on ADC channel 1
pub const ALLOW_DISABLE_BY_BUTTON: bool = true;

/// Initial ADC baseline for the disable button before the first quiet sample
pub const DISARM_INITIAL_BASELINE: u16 = 2000;

/// Baseline ratio numerator (baseline = quiet sample * 11 / 10)
pub const DISARM_BASELINE_NUM: u32 = 11;

/// Baseline ratio denominator
pub const DISARM_BASELINE_DEN: u32 = 10;

/// The button must be held for more than `RTTY_SPEED / DISARM_PRESS_DIVISOR` ticks
pub const DISARM_PRESS_DIVISOR: u32 = 3;

/// Ticks between status LED toggles
pub const HEARTBEAT_PERIOD_TICKS: u16 = 200;

/// Ticks before the first status LED toggle after power-up
pub const HEARTBEAT_FIRST_TICKS: u16 = 10;

/// FSK phase of the transmit cycle (`Fsk4` or `Fsk2`)
pub const FSK_MODE: TxMode = TxMode::Fsk4;

/// Content of the FSK packet; `HorusBinary { payload_id: 1 }` sends live telemetry
pub const FSK_PAYLOAD: FskPayload = FskPayload::TestFrame;

/// Size of the RTTY and FSK transmit buffers in bytes
pub const TX_BUFFER_SIZE: usize = 200;

/// SI4032 crystal frequency in Hz
pub const SI4032_XTAL_HZ: u32 = 26_000_000;

/// GPS UART baud rate
pub const GPS_BAUD_RATE: u32 = 9600;

/// ADC full scale (12-bit)
pub const ADC_FULL_SCALE: u32 = 4096;

/// Battery channel scaling: centivolts at ADC full scale
pub const BATTERY_SCALE_CENTIVOLTS: u32 = 600;

/// SI4032 register map used by the engine
pub mod reg {
    //! SI4032 register addresses

    /// Operating & function control 1
    pub const OPERATING_MODE: u8 = 0x07;

    /// ADC configuration (bit 7 starts a conversion)
    pub const ADC_CONFIG: u8 = 0x0F;

    /// ADC value
    pub const ADC_VALUE: u8 = 0x11;

    /// Temperature sensor calibration
    pub const TEMP_CALIBRATION: u8 = 0x12;

    /// Temperature value offset
    pub const TEMP_OFFSET: u8 = 0x13;

    /// TX power
    pub const TX_POWER: u8 = 0x6D;

    /// Modulation mode control 2
    pub const MODULATION_MODE: u8 = 0x71;

    /// Frequency offset (deviation) register driven by the symbol clock
    pub const FREQUENCY_OFFSET: u8 = 0x73;

    /// Frequency band select
    pub const FREQUENCY_BAND: u8 = 0x75;

    /// Nominal carrier frequency, high byte
    pub const CARRIER_FREQ_1: u8 = 0x76;

    /// Nominal carrier frequency, low byte
    pub const CARRIER_FREQ_0: u8 = 0x77;
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments for the RS41 board

    /// Status LED, active low
    pub const LED_GREEN: &str = "PB7";

    /// TX / disable-armed LED
    pub const LED_RED: &str = "PB8";

    /// Failsafe cutoff trigger
    pub const CUTOFF: &str = "PA12";

    /// Battery voltage ADC (channel 0)
    pub const ADC_BATTERY: &str = "PA5";

    /// Disable button ADC (channel 1)
    pub const ADC_BUTTON: &str = "PA6";

    /// GPS UART RX
    pub const GPS_RX: &str = "PA10";

    /// GPS UART TX
    pub const GPS_TX: &str = "PA9";

    /// SI4032 SPI chip select
    pub const RADIO_CS: &str = "PC13";
}

/// Runtime view of the engine configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Symbol rate in baud
    pub symbol_rate: u32,
    /// Deviation register value for an RTTY mark
    pub rtty_deviation: u8,
    /// Mark symbols before the first character
    pub pre_start_bits: u8,
    /// Data bits per RTTY character
    pub data_bits: u8,
    /// Stop bits per RTTY character
    pub stop_bits: u8,
    /// Inter-packet guard interval in ms
    pub tx_delay_ms: u32,
    /// Disable-arm latch enabled
    pub allow_disable: bool,
    /// Initial disable button baseline
    pub disarm_initial_baseline: u16,
    /// Ticks between heartbeat toggles
    pub heartbeat_period: u16,
    /// Ticks before the first heartbeat toggle
    pub heartbeat_first: u16,
    /// Altitude above which the LEDs are switched off
    pub led_disable_altitude_m: i32,
}

impl EngineConfig {
    /// Ticks the disable button must be held before the latch arms
    #[must_use]
    pub const fn press_threshold_ticks(&self) -> u32 {
        self.symbol_rate / DISARM_PRESS_DIVISOR
    }

    /// Guard interval expressed in symbol clock ticks
    #[must_use]
    pub const fn tx_delay_ticks(&self) -> u32 {
        let ms_per_tick = 1000 / self.symbol_rate;
        if ms_per_tick == 0 {
            self.tx_delay_ms
        } else {
            self.tx_delay_ms / ms_per_tick
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol_rate: RTTY_SPEED,
            rtty_deviation: RTTY_DEVIATION,
            pre_start_bits: RTTY_PRE_START_BITS,
            data_bits: RTTY_DATA_BITS,
            stop_bits: RTTY_STOP_BITS,
            tx_delay_ms: TX_DELAY_MS,
            allow_disable: ALLOW_DISABLE_BY_BUTTON,
            disarm_initial_baseline: DISARM_INITIAL_BASELINE,
            heartbeat_period: HEARTBEAT_PERIOD_TICKS,
            heartbeat_first: HEARTBEAT_FIRST_TICKS,
            led_disable_altitude_m: LED_DISABLE_ALTITUDE_M,
        }
    }
}

/// Build the carrier frequency
#[must_use]
pub const fn carrier_frequency() -> Option<Frequency> {
    Frequency::from_hz(RTTY_FREQUENCY_HZ)
}
