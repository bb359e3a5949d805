//! Main loop / symbol clock handoff
//!
//! Two contexts share the transmitter:
//!
//! ```text
//! main loop ──arm()──► [ spsc queue ] ──dequeue──► symbol clock
//!     ▲                                              │
//!     └──── tx_enable (guard expired) ◄── tx_on=false┘
//! ```
//!
//! `tx_on` is raised by the main loop when a packet is handed over and
//! dropped by the clock on its last symbol. `tx_enable` is raised by the
//! clock when the guard interval has elapsed and consumed by the next
//! `arm`. The buffer itself travels through a single-slot queue, so the
//! clock owns the bytes it is keying and the main loop can never rewrite
//! them.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};

use heapless::spsc::{Consumer, Producer, Queue};
use heapless::Vec;

use crate::config::TX_BUFFER_SIZE;
use crate::types::Modulation;

/// Queue depth (a `heapless` queue of N holds N - 1 items)
pub const PACKET_QUEUE_DEPTH: usize = 2;

/// Packet handoff queue
pub type PacketQueue = Queue<TxBuffer, PACKET_QUEUE_DEPTH>;

/// Main loop side of the handoff queue
pub type PacketProducer<'a> = Producer<'a, TxBuffer, PACKET_QUEUE_DEPTH>;

/// Symbol clock side of the handoff queue
pub type PacketConsumer<'a> = Consumer<'a, TxBuffer, PACKET_QUEUE_DEPTH>;

/// Reason a packet could not be handed to the symbol clock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmError {
    /// A packet is still being keyed
    Busy,
    /// The guard interval after the previous packet has not elapsed
    NotReady,
    /// The handoff slot is occupied
    QueueFull,
    /// Payload longer than a transmit buffer
    TooLong(usize),
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "transmitter busy"),
            Self::NotReady => write!(f, "guard interval running"),
            Self::QueueFull => write!(f, "packet slot occupied"),
            Self::TooLong(len) => write!(f, "{len} byte payload exceeds {TX_BUFFER_SIZE}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ArmError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Busy => defmt::write!(f, "Busy"),
            Self::NotReady => defmt::write!(f, "NotReady"),
            Self::QueueFull => defmt::write!(f, "QueueFull"),
            Self::TooLong(len) => defmt::write!(f, "TooLong({})", len),
        }
    }
}

/// Bytes to key plus how to key them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxBuffer {
    modulation: Modulation,
    bytes: Vec<u8, TX_BUFFER_SIZE>,
}

impl TxBuffer {
    /// Copy `bytes` into a transmit buffer
    ///
    /// RTTY buffers end at the first NUL (or the end of the buffer); FSK
    /// buffers are keyed in full.
    pub fn new(modulation: Modulation, bytes: &[u8]) -> Result<Self, ArmError> {
        let bytes = Vec::from_slice(bytes).map_err(|()| ArmError::TooLong(bytes.len()))?;
        Ok(Self { modulation, bytes })
    }

    /// Modulation to key with
    #[must_use]
    pub const fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Byte at `index`, if inside the buffer
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// Buffer length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer holds no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw contents
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Flags shared between the main loop and the symbol clock
#[derive(Debug)]
pub struct TxLink {
    tx_on: AtomicBool,
    tx_enable: AtomicBool,
    gps_lock: AtomicBool,
    led_enabled: AtomicBool,
}

impl Default for TxLink {
    fn default() -> Self {
        Self::new()
    }
}

impl TxLink {
    /// Power-up state: idle and ready, LEDs allowed, no lock
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tx_on: AtomicBool::new(false),
            tx_enable: AtomicBool::new(true),
            gps_lock: AtomicBool::new(false),
            led_enabled: AtomicBool::new(true),
        }
    }

    /// Check if a packet is being keyed
    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.tx_on.load(Ordering::Acquire)
    }

    /// Check if the guard interval has elapsed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.tx_enable.load(Ordering::Acquire)
    }

    /// Check if the main loop may leave its current mode
    #[must_use]
    pub fn can_advance(&self) -> bool {
        !self.is_transmitting() && self.is_ready()
    }

    /// Hand a packet to the symbol clock
    ///
    /// Consumes the ready flag before raising `tx_on`, so the two are
    /// never observed set together.
    pub fn arm(&self, producer: &mut PacketProducer<'_>, packet: TxBuffer) -> Result<(), ArmError> {
        if self.is_transmitting() {
            return Err(ArmError::Busy);
        }
        if !self.is_ready() {
            return Err(ArmError::NotReady);
        }
        producer.enqueue(packet).map_err(|_| ArmError::QueueFull)?;
        self.tx_enable.store(false, Ordering::Release);
        self.tx_on.store(true, Ordering::Release);
        Ok(())
    }

    /// Publish the indicator policy for the current cycle
    pub fn publish_status(&self, gps_lock: bool, led_enabled: bool) {
        self.gps_lock.store(gps_lock, Ordering::Relaxed);
        self.led_enabled.store(led_enabled, Ordering::Relaxed);
    }

    /// GPS lock as of the last snapshot
    #[must_use]
    pub fn gps_lock(&self) -> bool {
        self.gps_lock.load(Ordering::Relaxed)
    }

    /// LED policy as of the last snapshot
    #[must_use]
    pub fn led_enabled(&self) -> bool {
        self.led_enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn finish_packet(&self) {
        self.tx_on.store(false, Ordering::Release);
    }

    pub(crate) fn mark_ready(&self) {
        self.tx_enable.store(true, Ordering::Release);
    }
}
