//! RTTY Telemetry Sentence
//!
//! ```text
//! $$$$$CALLSIGN,FRAME,HH:MM:SS,LAT,LON,ALT,SPEED,SATS,MILLIVOLTS,TEMP*CRC16\n
//! ```
//!
//! The layout matches the existing Horus RTTY payloads so stock decoders
//! (dl-fldigi, habitat) accept it. The checksum covers everything between
//! the `$` marker and the `*`.

use core::fmt::{self, Write};
use core::str::FromStr;

use heapless::String;

use super::checksum::crc16;
use super::{FormatError, ParseError};
use crate::config::{MAX_CALLSIGN_LEN, TX_BUFFER_SIZE};
use crate::telemetry::TelemetrySnapshot;

/// Sync marker that opens every sentence
pub const SENTENCE_MARKER: &str = "$$$$$";

/// Buffer holding one formatted sentence
pub type SentenceBuf = String<TX_BUFFER_SIZE>;

/// Number of comma-separated fields in the body
const FIELD_COUNT: usize = 10;

/// Raw 1e-7 degree coordinate rendered as `[-]DDD.DDDD`
///
/// The sign is emitted only for negative values; the fraction is the
/// remainder truncated to four decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Coordinate(pub i32);

impl Coordinate {
    const SCALE: u32 = 10_000_000;
    const FRACTION_DIVISOR: u32 = 1000;
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let degrees = magnitude / Self::SCALE;
        let fraction = (magnitude % Self::SCALE) / Self::FRACTION_DIVISOR;
        if self.0 < 0 {
            f.write_char('-')?;
        }
        write!(f, "{degrees}.{fraction:04}")
    }
}

fn validate_callsign(callsign: &str) -> Result<(), FormatError> {
    let valid = !callsign.is_empty()
        && callsign.len() <= MAX_CALLSIGN_LEN
        && callsign.bytes().all(|b| b.is_ascii_graphic() && b != b',' && b != b'*' && b != b'$');
    if valid {
        Ok(())
    } else {
        Err(FormatError::InvalidCallsign)
    }
}

/// Render the telemetry sentence for one snapshot into `out`
///
/// `out` is cleared first. On success it holds the complete line including
/// the checksum and trailing newline.
pub fn format_sentence(
    callsign: &str,
    snapshot: &TelemetrySnapshot,
    out: &mut SentenceBuf,
) -> Result<(), FormatError> {
    validate_callsign(callsign)?;
    out.clear();

    let fix = snapshot.fix();
    write!(
        out,
        "{SENTENCE_MARKER}{},{},{:02}:{:02}:{:02},{},{},{},{},{},{},{}",
        callsign,
        snapshot.frame(),
        fix.hours,
        fix.minutes,
        fix.seconds,
        Coordinate(fix.lat_raw),
        Coordinate(fix.lon_raw),
        fix.altitude_m(),
        fix.speed_raw,
        fix.sats_raw,
        snapshot.voltage().millivolts(),
        snapshot.temperature().celsius(),
    )?;

    let crc = crc16(&out.as_bytes()[SENTENCE_MARKER.len()..]);
    write!(out, "*{crc:04X}\n")?;
    Ok(())
}

/// Fields recovered from a received sentence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sentence {
    /// Payload callsign
    pub callsign: String<MAX_CALLSIGN_LEN>,
    /// Frame counter
    pub frame: u32,
    /// UTC time (hours, minutes, seconds)
    pub time: (u8, u8, u8),
    /// Latitude in 1e-7 degrees, truncated to the transmitted precision
    pub lat_raw: i32,
    /// Longitude in 1e-7 degrees, truncated to the transmitted precision
    pub lon_raw: i32,
    /// Altitude in metres
    pub altitude_m: i32,
    /// Speed field as transmitted
    pub speed: u32,
    /// Satellites in use
    pub sats: u8,
    /// Battery voltage in millivolts
    pub millivolts: u32,
    /// Temperature in Celsius
    pub temperature: i8,
    /// Checksum carried by the sentence
    pub checksum: u16,
}

impl Sentence {
    /// Decode one received line (with or without the trailing newline)
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_end_matches(['\n', '\r']);
        if !line.starts_with("$$") {
            return Err(ParseError::MissingMarker);
        }
        let line = line.trim_start_matches('$');

        let (body, crc_field) = line.rsplit_once('*').ok_or(ParseError::MissingChecksum)?;
        if crc_field.len() != 4 {
            return Err(ParseError::BadChecksumField);
        }
        let received = u16::from_str_radix(crc_field, 16).map_err(|_| ParseError::BadChecksumField)?;
        let computed = crc16(body.as_bytes());
        if received != computed {
            return Err(ParseError::ChecksumMismatch { received, computed });
        }

        let mut fields: heapless::Vec<&str, FIELD_COUNT> = heapless::Vec::new();
        for field in body.split(',') {
            fields
                .push(field)
                .map_err(|_| ParseError::FieldCount(body.split(',').count()))?;
        }
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount(fields.len()));
        }

        let callsign = String::try_from(fields[0]).map_err(|()| ParseError::InvalidField(0))?;

        Ok(Self {
            callsign,
            frame: parse_field(fields[1], 1)?,
            time: parse_time(fields[2]).ok_or(ParseError::InvalidField(2))?,
            lat_raw: parse_coordinate(fields[3]).ok_or(ParseError::InvalidField(3))?,
            lon_raw: parse_coordinate(fields[4]).ok_or(ParseError::InvalidField(4))?,
            altitude_m: parse_field(fields[5], 5)?,
            speed: parse_field(fields[6], 6)?,
            sats: parse_field(fields[7], 7)?,
            millivolts: parse_field(fields[8], 8)?,
            temperature: parse_field(fields[9], 9)?,
            checksum: received,
        })
    }
}

fn parse_field<T: FromStr>(field: &str, index: usize) -> Result<T, ParseError> {
    field.parse().map_err(|_| ParseError::InvalidField(index))
}

fn parse_time(field: &str) -> Option<(u8, u8, u8)> {
    let mut parts = field.split(':');
    let h = parts.next()?.parse().ok()?;
    let m = parts.next()?.parse().ok()?;
    let s = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((h, m, s))
}

fn parse_coordinate(field: &str) -> Option<i32> {
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let (whole, fraction) = digits.split_once('.')?;
    if fraction.len() != 4 || whole.is_empty() {
        return None;
    }
    let degrees: i32 = whole.parse().ok()?;
    let fraction: i32 = fraction.parse().ok()?;
    let magnitude = degrees.checked_mul(10_000_000)?.checked_add(fraction * 1000)?;
    Some(if negative { -magnitude } else { magnitude })
}
