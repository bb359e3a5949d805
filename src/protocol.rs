//! Communication Protocols
//!
//! Wire formats emitted by the transmitter:
//! - [`checksum`]: CRC-16/CCITT-FALSE used by the RTTY sentence and Horus frames
//! - [`sentence`]: the `$$$$$CALLSIGN,...*CRC` RTTY telemetry line and its decoder
//! - [`binary`]: the 4FSK/2FSK test frame and Horus Binary telemetry frame

use core::fmt;

pub mod binary;
pub mod checksum;
pub mod sentence;

/// Packet formatting error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Output does not fit the fixed-capacity transmit buffer
    Overflow,
    /// Callsign is empty, too long, or contains a field delimiter
    InvalidCallsign,
}

impl From<fmt::Error> for FormatError {
    fn from(_: fmt::Error) -> Self {
        Self::Overflow
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "packet exceeds transmit buffer"),
            Self::InvalidCallsign => write!(f, "invalid callsign"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for FormatError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Overflow => defmt::write!(f, "Overflow"),
            Self::InvalidCallsign => defmt::write!(f, "InvalidCallsign"),
        }
    }
}

/// Sentence decoding error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Line does not start with the `$$` marker
    MissingMarker,
    /// No `*XXXX` checksum field
    MissingChecksum,
    /// Checksum field is not four hex digits
    BadChecksumField,
    /// Received and computed checksums differ
    ChecksumMismatch {
        /// Checksum carried by the sentence
        received: u16,
        /// Checksum computed over the body
        computed: u16,
    },
    /// Wrong number of comma-separated fields
    FieldCount(usize),
    /// Field at this index could not be parsed
    InvalidField(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMarker => write!(f, "missing $$ marker"),
            Self::MissingChecksum => write!(f, "missing checksum"),
            Self::BadChecksumField => write!(f, "malformed checksum field"),
            Self::ChecksumMismatch { received, computed } => {
                write!(f, "checksum mismatch: received {received:04X}, computed {computed:04X}")
            }
            Self::FieldCount(n) => write!(f, "expected 10 fields, found {n}"),
            Self::InvalidField(idx) => write!(f, "invalid field {idx}"),
        }
    }
}
