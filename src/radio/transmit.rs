//! Symbol Clock
//!
//! Runs once per symbol period from the highest priority context and
//! performs, in order:
//!
//! 1. disable-arm sensing on the button ADC channel
//! 2. modulation of the active packet (one symbol per tick)
//! 3. the inter-packet guard countdown
//! 4. the status LED heartbeat
//!
//! The carrier stays keyed between packets; only the deviation register
//! is driven here.

use heapless::Vec;

use super::disarm::{DisarmAction, DisarmMonitor};
use super::heartbeat::Heartbeat;
use super::link::{PacketConsumer, TxBuffer, TxLink};
use crate::config::{reg, EngineConfig};
use crate::drivers::traits::{AdcSamples, Indicators, RadioPort};
use crate::modem::mfsk::{Fsk2Encoder, Fsk4Encoder, SymbolEncoder};
use crate::modem::rtty::{RttyEncoder, RttySymbol};
use crate::types::{AdcChannel, Frequency, Modulation};

/// Deviation register value while idle
const IDLE_DEVIATION: u8 = 0;

/// Something worth logging that happened during a tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// A queued packet started keying
    PacketStarted(Modulation),
    /// The active packet sent its last symbol
    PacketComplete(Modulation),
    /// Guard interval elapsed; the main loop may arm again
    ReadyToTransmit,
    /// The disable latch armed
    DisableArmed,
    /// The cutoff output fired for the first time
    CutoffAsserted,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ClockEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::PacketStarted(m) => defmt::write!(f, "{} start", m),
            Self::PacketComplete(m) => defmt::write!(f, "{} done", m),
            Self::ReadyToTransmit => defmt::write!(f, "ready"),
            Self::DisableArmed => defmt::write!(f, "disable armed"),
            Self::CutoffAsserted => defmt::write!(f, "CUTOFF"),
        }
    }
}

/// Events from one tick (at most one of each kind fits)
pub type ClockEvents = Vec<ClockEvent, 4>;

/// Outcome of one FSK step
enum FskStep {
    Symbol(u8),
    End,
}

/// Next FSK symbol, advancing the cursor across byte boundaries
fn next_fsk_symbol<E: SymbolEncoder>(encoder: &mut E, packet: &TxBuffer, cursor: &mut usize) -> FskStep {
    let symbol = packet
        .get(*cursor)
        .and_then(|byte| encoder.next_symbol(byte))
        .or_else(|| {
            *cursor += 1;
            if *cursor >= packet.len() {
                return None;
            }
            packet.get(*cursor).and_then(|byte| encoder.next_symbol(byte))
        });

    match symbol {
        Some(symbol) => FskStep::Symbol(symbol),
        None => {
            encoder.reset();
            FskStep::End
        }
    }
}

/// Down-counter started when a packet ends
#[derive(Clone, Copy, Debug, Default)]
struct GuardDelay {
    remaining: Option<u32>,
}

impl GuardDelay {
    fn start(&mut self, ticks: u32) {
        self.remaining = Some(ticks.max(1));
    }

    fn tick(&mut self) -> bool {
        match self.remaining {
            Some(1) => {
                self.remaining = None;
                true
            }
            Some(n) => {
                self.remaining = Some(n - 1);
                false
            }
            None => false,
        }
    }
}

/// Per-tick transmission engine
pub struct SymbolClock<'a> {
    config: EngineConfig,
    link: &'a TxLink,
    packets: PacketConsumer<'a>,
    active: Option<TxBuffer>,
    cursor: usize,
    rtty: RttyEncoder,
    fsk4: Fsk4Encoder,
    fsk2: Fsk2Encoder,
    disarm: DisarmMonitor,
    guard: GuardDelay,
    heartbeat: Heartbeat,
}

impl<'a> SymbolClock<'a> {
    /// Create the clock; it keys whatever the main loop arms through `link`
    #[must_use]
    pub fn new(config: EngineConfig, link: &'a TxLink, packets: PacketConsumer<'a>) -> Self {
        Self {
            config,
            link,
            packets,
            active: None,
            cursor: 0,
            rtty: RttyEncoder::new(config.data_bits, config.stop_bits),
            fsk4: Fsk4Encoder::new(),
            fsk2: Fsk2Encoder::new(),
            disarm: DisarmMonitor::new(&config),
            guard: GuardDelay::default(),
            heartbeat: Heartbeat::new(&config),
        }
    }

    /// Byte offset of the symbol being keyed
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Modulation of the packet being keyed
    #[must_use]
    pub fn active_modulation(&self) -> Option<Modulation> {
        self.active.as_ref().map(TxBuffer::modulation)
    }

    /// Check if the disable latch has armed
    #[must_use]
    pub const fn is_disable_armed(&self) -> bool {
        self.disarm.is_armed()
    }

    /// Run one symbol period
    pub fn tick<R, I, A>(&mut self, radio: &mut R, leds: &mut I, adc: &A) -> ClockEvents
    where
        R: RadioPort,
        I: Indicators,
        A: AdcSamples,
    {
        let mut events = ClockEvents::new();

        if self.config.allow_disable {
            match self.disarm.update(adc.sample(AdcChannel::Button)) {
                DisarmAction::Armed => {
                    leds.set_tx_led(true);
                    radio.write_register(reg::FREQUENCY_OFFSET, IDLE_DEVIATION);
                    let _ = events.push(ClockEvent::DisableArmed);
                }
                DisarmAction::Cutoff { first } => {
                    leds.trigger_cutoff();
                    if first {
                        let _ = events.push(ClockEvent::CutoffAsserted);
                    }
                }
                DisarmAction::Idle | DisarmAction::Pressed => {}
            }
        }

        if self.link.is_transmitting() {
            self.modulate(radio, leds, &mut events);
        }

        if !self.link.is_transmitting() && self.guard.tick() {
            self.link.mark_ready();
            let _ = events.push(ClockEvent::ReadyToTransmit);
        }

        if let Some(level) = self.heartbeat.tick(self.link.gps_lock()) {
            if self.link.led_enabled() {
                leds.set_status_led(level);
            }
        }

        events
    }

    fn modulate<R: RadioPort, I: Indicators>(&mut self, radio: &mut R, leds: &mut I, events: &mut ClockEvents) {
        if self.active.is_none() {
            let Some(packet) = self.packets.dequeue() else {
                // Raised without a packet; nothing to key
                self.link.finish_packet();
                self.guard.start(self.config.tx_delay_ticks());
                return;
            };
            let _ = events.push(ClockEvent::PacketStarted(packet.modulation()));
            self.begin(packet);
        }
        let Some(modulation) = self.active_modulation() else {
            return;
        };

        let muted = self.disarm.is_armed();
        let finished = match modulation {
            Modulation::Rtty => self.step_rtty(radio, leds, muted),
            Modulation::Fsk4 | Modulation::Fsk2 => self.step_fsk(radio, modulation, muted),
        };

        if finished {
            self.active = None;
            self.cursor = 0;
            self.link.finish_packet();
            self.guard.start(self.config.tx_delay_ticks());
            let _ = events.push(ClockEvent::PacketComplete(modulation));
        }
    }

    fn begin(&mut self, packet: TxBuffer) {
        self.cursor = 0;
        self.rtty.begin(self.config.pre_start_bits);
        self.fsk4.reset();
        self.fsk2.reset();
        self.active = Some(packet);
    }

    /// Returns true once the terminating NUL (or the buffer end) is reached
    fn step_rtty<R: RadioPort, I: Indicators>(&mut self, radio: &mut R, leds: &mut I, muted: bool) -> bool {
        let Some(packet) = self.active.as_ref() else {
            return true;
        };
        let byte = packet.get(self.cursor).unwrap_or(0);
        if byte == 0 {
            return true;
        }

        let show = self.link.led_enabled() && !muted;
        match self.rtty.next_symbol(byte) {
            RttySymbol::Mark => {
                if !muted {
                    radio.write_register(reg::FREQUENCY_OFFSET, self.config.rtty_deviation);
                }
                if show {
                    leds.set_tx_led(true);
                }
                false
            }
            RttySymbol::Space => {
                if !muted {
                    radio.write_register(reg::FREQUENCY_OFFSET, IDLE_DEVIATION);
                }
                if show {
                    leds.set_tx_led(false);
                }
                false
            }
            RttySymbol::End => {
                if show {
                    leds.set_tx_led(true);
                }
                self.cursor += 1;
                packet.get(self.cursor).unwrap_or(0) == 0
            }
        }
    }

    /// Returns true once the cursor passes the last byte
    fn step_fsk<R: RadioPort>(&mut self, radio: &mut R, modulation: Modulation, muted: bool) -> bool {
        let Some(packet) = self.active.as_ref() else {
            return true;
        };
        let step = if modulation == Modulation::Fsk2 {
            next_fsk_symbol(&mut self.fsk2, packet, &mut self.cursor)
        } else {
            next_fsk_symbol(&mut self.fsk4, packet, &mut self.cursor)
        };

        let (value, finished) = match step {
            FskStep::Symbol(symbol) => (symbol, false),
            FskStep::End => (IDLE_DEVIATION, true),
        };
        if !muted {
            radio.write_register(reg::FREQUENCY_OFFSET, value);
        }
        finished
    }
}

/// Bring the SI4032 up as a keyed carrier on `freq`
///
/// Sets the carrier, output power, unmodulated direct mode, the
/// temperature sensor calibration, starts the first ADC conversion and
/// keys the transmitter.
pub fn configure_transmitter<R: RadioPort>(radio: &mut R, freq: Frequency, tx_power: u8) {
    radio.set_tx_frequency(freq);
    radio.write_register(reg::TX_POWER, tx_power & 0x07);
    radio.write_register(reg::MODULATION_MODE, 0x00);
    radio.write_register(reg::TEMP_OFFSET, 0xF0);
    radio.write_register(reg::TEMP_CALIBRATION, 0x00);
    radio.write_register(reg::ADC_CONFIG, 0x80);
    radio.enable_tx();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_fires_once() {
        let mut guard = GuardDelay::default();
        assert!(!guard.tick());
        guard.start(3);
        assert!(!guard.tick());
        assert!(!guard.tick());
        assert!(guard.tick());
        assert!(!guard.tick());
    }
}
