//! Transmit cycle state machine
//!
//! ```text
//! Startup ──► Rtty ──► Fsk4 | Fsk2 ──► Startup ...
//! ```
//!
//! The main loop calls [`ModeSequencer::step`] whenever it wakes. A step
//! only does work once the symbol clock has finished the previous packet
//! and the guard interval has elapsed. Each cycle captures one snapshot
//! in `Startup`; the RTTY sentence and the FSK frame are both built from
//! it.

use core::fmt;

use super::link::{ArmError, PacketProducer, TxBuffer, TxLink};
use crate::config::EngineConfig;
use crate::drivers::traits::{AdcSamples, GpsSource, RadioPort};
use crate::power::{BatteryVoltage, Temperature};
use crate::protocol::binary::{format_frame, FrameBuf, FskPayload};
use crate::protocol::sentence::{format_sentence, SentenceBuf};
use crate::protocol::FormatError;
use crate::telemetry::{FrameCounter, TelemetrySnapshot};
use crate::types::{AdcChannel, Modulation, TxMode};

/// What a call to [`ModeSequencer::step`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Transmitter busy or guard running; nothing changed
    Waiting,
    /// Moved into this mode (and armed its packet, if it has one)
    Entered(TxMode),
}

/// Failure while preparing a packet
///
/// The mode still advances, so one bad packet costs one slot in the cycle
/// rather than stalling it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequencerError {
    /// The packet could not be rendered
    Format(FormatError),
    /// The symbol clock refused the packet
    Arm(ArmError),
}

impl From<FormatError> for SequencerError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<ArmError> for SequencerError {
    fn from(e: ArmError) -> Self {
        Self::Arm(e)
    }
}

impl fmt::Display for SequencerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "format: {e}"),
            Self::Arm(e) => write!(f, "arm: {e}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SequencerError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Format(e) => defmt::write!(f, "format: {}", e),
            Self::Arm(e) => defmt::write!(f, "arm: {}", e),
        }
    }
}

/// Main loop mode sequencer
pub struct ModeSequencer {
    mode: TxMode,
    fsk_mode: TxMode,
    fsk_payload: FskPayload,
    callsign: &'static str,
    config: EngineConfig,
    frames: FrameCounter,
    snapshot: Option<TelemetrySnapshot>,
    sentence: SentenceBuf,
    frame: FrameBuf,
}

impl ModeSequencer {
    /// Create a sequencer in `Startup` that sends the 4FSK test frame
    #[must_use]
    pub fn new(callsign: &'static str, config: EngineConfig) -> Self {
        Self {
            mode: TxMode::Startup,
            fsk_mode: TxMode::Fsk4,
            fsk_payload: FskPayload::TestFrame,
            callsign,
            config,
            frames: FrameCounter::new(),
            snapshot: None,
            sentence: SentenceBuf::new(),
            frame: FrameBuf::new(),
        }
    }

    /// Select the FSK phase; anything other than `Fsk2` means `Fsk4`
    #[must_use]
    pub fn with_fsk_mode(mut self, mode: TxMode) -> Self {
        self.fsk_mode = if mode == TxMode::Fsk2 {
            TxMode::Fsk2
        } else {
            TxMode::Fsk4
        };
        self
    }

    /// Select the FSK packet content
    #[must_use]
    pub fn with_fsk_payload(mut self, payload: FskPayload) -> Self {
        self.fsk_payload = payload;
        self
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> TxMode {
        self.mode
    }

    /// Frame number of the current cycle
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frames.current()
    }

    /// Snapshot of the current cycle
    #[must_use]
    pub const fn snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.snapshot.as_ref()
    }

    /// Last rendered RTTY sentence
    #[must_use]
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    /// Last rendered FSK frame
    #[must_use]
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Advance the cycle if the transmitter is free
    pub fn step<R, G, A>(
        &mut self,
        link: &TxLink,
        packets: &mut PacketProducer<'_>,
        radio: &mut R,
        gps: &G,
        adc: &A,
    ) -> Result<StepOutcome, SequencerError>
    where
        R: RadioPort,
        G: GpsSource,
        A: AdcSamples,
    {
        if !link.can_advance() {
            return Ok(StepOutcome::Waiting);
        }

        match self.mode {
            TxMode::Startup => {
                self.mode = TxMode::Rtty;
                let snapshot = self.capture(radio, gps, adc);
                link.publish_status(snapshot.gps_lock(), snapshot.led_enabled());
                self.snapshot = Some(snapshot);

                format_sentence(self.callsign, &snapshot, &mut self.sentence)?;
                let packet = TxBuffer::new(Modulation::Rtty, self.sentence.as_bytes())?;
                radio.enable_tx();
                link.arm(packets, packet)?;
            }
            TxMode::Rtty => {
                self.mode = self.fsk_mode;
                let Some(snapshot) = self.snapshot else {
                    return Ok(StepOutcome::Entered(self.mode));
                };
                let modulation = self.mode.modulation().unwrap_or(Modulation::Fsk4);

                format_frame(self.fsk_payload, &snapshot, &mut self.frame)?;
                let packet = TxBuffer::new(modulation, &self.frame)?;
                radio.enable_tx();
                link.arm(packets, packet)?;
            }
            TxMode::Fsk4 | TxMode::Fsk2 => {
                self.mode = TxMode::Startup;
            }
        }
        Ok(StepOutcome::Entered(self.mode))
    }

    fn capture<R: RadioPort, G: GpsSource, A: AdcSamples>(
        &mut self,
        radio: &mut R,
        gps: &G,
        adc: &A,
    ) -> TelemetrySnapshot {
        let frame = self.frames.next();
        let temperature = Temperature::from_celsius(radio.read_temperature());
        let voltage = BatteryVoltage::from_adc(adc.sample(AdcChannel::Battery));
        TelemetrySnapshot::new(frame, temperature, voltage, gps.last_fix(), &self.config)
    }
}
