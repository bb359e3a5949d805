//! Binary FSK Frames
//!
//! Every frame starts with a preamble that cycles through all four 4FSK
//! tones (`0x1B` = symbols 0,1,2,3) followed by the Horus unique word.
//! Two payloads are available:
//! - [`FskPayload::TestFrame`]: a fixed counting pattern for checking the
//!   physical layer with a modem on the ground
//! - [`FskPayload::HorusBinary`]: the 22-byte Horus Binary v1 telemetry
//!   packet, sent uncoded

use heapless::Vec;

use super::checksum::crc16_bytes;
use super::FormatError;
use crate::config::TX_BUFFER_SIZE;
use crate::telemetry::TelemetrySnapshot;

/// Preamble byte, one pass through all four tones
pub const PREAMBLE_BYTE: u8 = 0x1B;

/// Number of preamble bytes
pub const PREAMBLE_LEN: usize = 4;

/// Horus unique word
pub const UNIQUE_WORD: [u8; 2] = [0x24, 0x24];

/// Length of the test frame payload
pub const TEST_PAYLOAD_LEN: usize = 16;

/// Length of the Horus Binary v1 packet
pub const HORUS_PACKET_LEN: usize = 22;

/// Buffer holding one binary frame
pub type FrameBuf = Vec<u8, TX_BUFFER_SIZE>;

/// Content of the FSK packet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FskPayload {
    /// Fixed counting pattern
    #[default]
    TestFrame,
    /// Horus Binary v1 telemetry
    HorusBinary {
        /// Payload identifier assigned by the Horus payload list
        payload_id: u8,
    },
}

fn put(out: &mut FrameBuf, bytes: &[u8]) -> Result<(), FormatError> {
    out.extend_from_slice(bytes).map_err(|()| FormatError::Overflow)
}

fn write_header(out: &mut FrameBuf) -> Result<(), FormatError> {
    out.clear();
    put(out, &[PREAMBLE_BYTE; PREAMBLE_LEN])?;
    put(out, &UNIQUE_WORD)
}

/// Write the fixed test frame and return its length in bytes
pub fn test_frame(out: &mut FrameBuf) -> Result<usize, FormatError> {
    write_header(out)?;
    for byte in 0..TEST_PAYLOAD_LEN as u8 {
        put(out, &[byte])?;
    }
    Ok(out.len())
}

/// Build the Horus Binary v1 packet for a snapshot
///
/// Layout (little endian): payload id, counter u16, hours, minutes,
/// seconds, latitude f32, longitude f32, altitude u16, speed km/h u8,
/// sats u8, temperature i8, battery u8, CRC16 u16 over the first 20 bytes.
#[must_use]
pub fn horus_packet(payload_id: u8, snapshot: &TelemetrySnapshot) -> [u8; HORUS_PACKET_LEN] {
    let fix = snapshot.fix();
    let mut packet = [0u8; HORUS_PACKET_LEN];

    packet[0] = payload_id;
    packet[1..3].copy_from_slice(&(snapshot.frame() as u16).to_le_bytes());
    packet[3] = fix.hours;
    packet[4] = fix.minutes;
    packet[5] = fix.seconds;
    packet[6..10].copy_from_slice(&degrees(fix.lat_raw).to_le_bytes());
    packet[10..14].copy_from_slice(&degrees(fix.lon_raw).to_le_bytes());
    let altitude = fix.altitude_m().clamp(0, i32::from(u16::MAX)) as u16;
    packet[14..16].copy_from_slice(&altitude.to_le_bytes());
    packet[16] = (fix.speed_raw.saturating_mul(36) / 1000).min(255) as u8;
    packet[17] = fix.sats_raw;
    packet[18] = snapshot.temperature().celsius().to_le_bytes()[0];
    packet[19] = snapshot.voltage().as_horus_byte();

    let crc = crc16_bytes(&packet[..HORUS_PACKET_LEN - 2]);
    packet[HORUS_PACKET_LEN - 2..].copy_from_slice(&crc.to_le_bytes());
    packet
}

#[allow(clippy::cast_precision_loss)]
fn degrees(raw: i32) -> f32 {
    (f64::from(raw) / 10_000_000.0) as f32
}

/// Write the configured FSK frame and return its length in bytes
pub fn format_frame(
    payload: FskPayload,
    snapshot: &TelemetrySnapshot,
    out: &mut FrameBuf,
) -> Result<usize, FormatError> {
    match payload {
        FskPayload::TestFrame => test_frame(out),
        FskPayload::HorusBinary { payload_id } => {
            write_header(out)?;
            put(out, &horus_packet(payload_id, snapshot))?;
            Ok(out.len())
        }
    }
}
