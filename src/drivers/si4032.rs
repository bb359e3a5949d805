//! `SI4032` Transmitter Driver
//!
//! Register access over SPI plus the frequency synthesizer math.
//!
//! The SI4032 is programmed with a band select and a 16-bit fractional
//! carrier word derived from the 26 MHz crystal:
//!
//! ```text
//! hbsel = f >= 480 MHz
//! n     = f * 3 / (xtal * (1 + hbsel))
//! fb    = n - 24
//! fc    = frac(n) * 64000
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::{Error as _, ErrorKind, SpiBus};

use super::traits::RadioPort;
use crate::config::{reg, SI4032_XTAL_HZ};
use crate::power::Temperature;
use crate::types::Frequency;

/// Write flag in the SPI address byte
const WRITE_FLAG: u8 = 0x80;

/// Operating mode: TX on, crystal on
const MODE_TX_ON: u8 = 0x48;

/// Operating mode: software reset
const MODE_SOFT_RESET: u8 = 0x80;

/// Start an ADC conversion (temperature sensor input)
const ADC_START: u8 = 0x80;

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Si4032Error {
    /// SPI bus error
    Spi(ErrorKind),
    /// Chip select pin error
    ChipSelect,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Si4032Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi(_) => defmt::write!(f, "SPI error"),
            Self::ChipSelect => defmt::write!(f, "CS pin error"),
        }
    }
}

/// Synthesizer register values for one carrier frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencyWords {
    /// Frequency band select register (0x75)
    pub band: u8,
    /// Nominal carrier word (0x76/0x77)
    pub carrier: u16,
}

impl FrequencyWords {
    /// Compute the register values for `freq` with a crystal of `xtal_hz`
    #[must_use]
    pub const fn compute(freq: Frequency, xtal_hz: u32) -> Self {
        let hbsel: u64 = if freq.is_high_band() { 1 } else { 0 };
        let unit = xtal_hz as u64 * (1 + hbsel);
        let scaled = freq.as_hz() as u64 * 3;
        let n = scaled / unit;
        let fb = (n - 24) as u8;
        let carrier = ((scaled - n * unit) * 64_000 / unit) as u16;
        Self {
            band: 0x40 | (fb & 0x1F) | ((hbsel as u8) << 5),
            carrier,
        }
    }
}

/// SI4032 on an SPI bus with a dedicated chip select
pub struct Si4032<SPI, CS> {
    spi: SPI,
    cs: CS,
    errors: u32,
    last_temperature: Temperature,
}

impl<SPI: SpiBus, CS: OutputPin> Si4032<SPI, CS> {
    /// Wrap the bus; chip select is driven inactive (high)
    pub fn new(spi: SPI, mut cs: CS) -> Self {
        let _ = cs.set_high();
        Self {
            spi,
            cs,
            errors: 0,
            last_temperature: Temperature::default(),
        }
    }

    /// Number of failed register accesses absorbed so far
    #[must_use]
    pub const fn error_count(&self) -> u32 {
        self.errors
    }

    /// Release the bus and chip select
    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn select<T>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> Result<T, SPI::Error>,
    ) -> Result<T, Si4032Error> {
        self.cs.set_low().map_err(|_| Si4032Error::ChipSelect)?;
        let result = f(&mut self.spi).and_then(|value| self.spi.flush().map(|()| value));
        self.cs.set_high().map_err(|_| Si4032Error::ChipSelect)?;
        result.map_err(|e| Si4032Error::Spi(e.kind()))
    }

    /// Write one register
    pub fn write(&mut self, addr: u8, value: u8) -> Result<(), Si4032Error> {
        self.select(|spi| spi.write(&[addr | WRITE_FLAG, value]))
    }

    /// Read one register
    pub fn read(&mut self, addr: u8) -> Result<u8, Si4032Error> {
        self.select(|spi| {
            let mut frame = [addr & !WRITE_FLAG, 0xFF];
            spi.transfer_in_place(&mut frame)?;
            Ok(frame[1])
        })
    }

    /// Reset all registers to their power-on values
    pub fn soft_reset(&mut self) -> Result<(), Si4032Error> {
        self.write(reg::OPERATING_MODE, MODE_SOFT_RESET)
    }

    /// Program the synthesizer
    pub fn set_frequency(&mut self, freq: Frequency) -> Result<(), Si4032Error> {
        let words = FrequencyWords::compute(freq, SI4032_XTAL_HZ);
        let [hi, lo] = words.carrier.to_be_bytes();
        self.write(reg::FREQUENCY_BAND, words.band)?;
        self.write(reg::CARRIER_FREQ_1, hi)?;
        self.write(reg::CARRIER_FREQ_0, lo)
    }

    /// Read the temperature converted by the previous ADC cycle and start the next one
    pub fn temperature(&mut self) -> Result<Temperature, Si4032Error> {
        let raw = self.read(reg::ADC_VALUE)?;
        self.write(reg::ADC_CONFIG, ADC_START)?;
        Ok(Temperature::from_si4032_adc(raw))
    }

    fn absorb<T>(&mut self, result: Result<T, Si4032Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(_e) => {
                self.errors = self.errors.wrapping_add(1);
                #[cfg(feature = "embedded")]
                defmt::warn!("SI4032 access failed: {}", _e);
                None
            }
        }
    }
}

impl<SPI: SpiBus, CS: OutputPin> RadioPort for Si4032<SPI, CS> {
    fn set_tx_frequency(&mut self, freq: Frequency) {
        let result = self.set_frequency(freq);
        self.absorb(result);
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        let result = self.write(addr, value);
        self.absorb(result);
    }

    fn read_temperature(&mut self) -> i8 {
        let result = self.temperature();
        if let Some(temperature) = self.absorb(result) {
            self.last_temperature = temperature;
        }
        self.last_temperature.celsius()
    }

    fn enable_tx(&mut self) {
        let result = self.write(reg::OPERATING_MODE, MODE_TX_ON);
        self.absorb(result);
    }
}
