//! u-blox UBX Protocol
//!
//! Byte-at-a-time decoder for the four NAV messages that make up a fix,
//! plus builders for the configuration frames sent at startup.
//!
//! Frame layout:
//!
//! ```text
//! B5 62 | class | id | len (LE u16) | payload | ck_a ck_b
//! ```
//!
//! The 8-bit Fletcher checksum runs over class, id, length and payload.

use heapless::Vec;

use super::traits::GpsSource;
use crate::types::{FixQuality, GpsFix};

/// First sync character
pub const SYNC_1: u8 = 0xB5;

/// Second sync character
pub const SYNC_2: u8 = 0x62;

/// Navigation message class
pub const CLASS_NAV: u8 = 0x01;

/// Configuration message class
pub const CLASS_CFG: u8 = 0x06;

/// NAV-POSLLH: geodetic position
pub const NAV_POSLLH: u8 = 0x02;

/// NAV-SOL: navigation solution
pub const NAV_SOL: u8 = 0x06;

/// NAV-VELNED: velocity
pub const NAV_VELNED: u8 = 0x12;

/// NAV-TIMEUTC: UTC time
pub const NAV_TIMEUTC: u8 = 0x21;

/// CFG-PRT: port configuration
pub const CFG_PRT: u8 = 0x00;

/// CFG-MSG: message rate
pub const CFG_MSG: u8 = 0x01;

/// CFG-NAV5: navigation engine settings
pub const CFG_NAV5: u8 = 0x24;

/// Airborne with <1g acceleration
pub const DYN_MODEL_AIRBORNE_1G: u8 = 6;

/// Largest payload the decoder buffers (NAV-SOL)
pub const MAX_PAYLOAD: usize = 52;

/// Largest frame the builders produce
pub const MAX_FRAME: usize = 8 + MAX_PAYLOAD;

/// A complete UBX frame ready to send
pub type UbxFrame = Vec<u8, MAX_FRAME>;

/// Frames sent to the receiver at startup
pub const CONFIG_FRAME_COUNT: usize = 6;

const POSLLH_LEN: usize = 28;
const SOL_LEN: usize = 52;
const VELNED_LEN: usize = 36;
const TIMEUTC_LEN: usize = 20;

/// UBX decode or encode failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UbxError {
    /// Checksum did not match
    Checksum,
    /// Declared payload longer than the decoder buffer
    Oversize(u16),
    /// Known message with an unexpected payload length
    Length {
        /// Message ID
        id: u8,
        /// Received payload length
        len: u16,
    },
}

#[cfg(feature = "embedded")]
impl defmt::Format for UbxError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Checksum => defmt::write!(f, "checksum"),
            Self::Oversize(len) => defmt::write!(f, "oversize payload {}", len),
            Self::Length { id, len } => defmt::write!(f, "id {=u8:#x} len {}", id, len),
        }
    }
}

/// A decoded frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UbxMessage {
    /// Position updated
    PosLlh,
    /// Fix type and satellite count updated
    Sol,
    /// Ground speed updated
    VelNed,
    /// UTC time updated
    TimeUtc,
    /// Valid frame the decoder does not interpret (e.g. ACK)
    Other {
        /// Message class
        class: u8,
        /// Message ID
        id: u8,
    },
}

/// Decoder counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UbxStats {
    /// Frames accepted
    pub frames: u32,
    /// Frames rejected
    pub errors: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    Sync1,
    Sync2,
    Class,
    Id,
    LenLo,
    LenHi,
    Payload,
    CkA,
    CkB,
}

/// Running 8-bit Fletcher checksum
#[derive(Clone, Copy, Debug, Default)]
struct Fletcher8 {
    a: u8,
    b: u8,
}

impl Fletcher8 {
    fn update(&mut self, byte: u8) {
        self.a = self.a.wrapping_add(byte);
        self.b = self.b.wrapping_add(self.a);
    }
}

/// Incremental UBX decoder holding the latest assembled fix
pub struct UbxParser {
    state: DecodeState,
    class: u8,
    id: u8,
    len: u16,
    payload: Vec<u8, MAX_PAYLOAD>,
    checksum: Fletcher8,
    received_ck_a: u8,
    fix: GpsFix,
    stats: UbxStats,
}

impl Default for UbxParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UbxParser {
    /// Create a decoder waiting for a sync character
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DecodeState::Sync1,
            class: 0,
            id: 0,
            len: 0,
            payload: Vec::new(),
            checksum: Fletcher8 { a: 0, b: 0 },
            received_ck_a: 0,
            fix: GpsFix {
                fix: FixQuality::NONE,
                lat_raw: 0,
                lon_raw: 0,
                alt_raw: 0,
                speed_raw: 0,
                sats_raw: 0,
                hours: 0,
                minutes: 0,
                seconds: 0,
            },
            stats: UbxStats { frames: 0, errors: 0 },
        }
    }

    /// Latest fix assembled from received messages
    #[must_use]
    pub const fn fix(&self) -> &GpsFix {
        &self.fix
    }

    /// Decoder counters
    #[must_use]
    pub const fn stats(&self) -> UbxStats {
        self.stats
    }

    /// Feed one received byte
    ///
    /// Returns `Some` when the byte completes a frame.
    pub fn handle_incoming_byte(&mut self, byte: u8) -> Option<Result<UbxMessage, UbxError>> {
        match self.state {
            DecodeState::Sync1 => {
                if byte == SYNC_1 {
                    self.state = DecodeState::Sync2;
                }
            }
            DecodeState::Sync2 => {
                self.state = match byte {
                    SYNC_2 => DecodeState::Class,
                    SYNC_1 => DecodeState::Sync2,
                    _ => DecodeState::Sync1,
                };
            }
            DecodeState::Class => {
                self.checksum = Fletcher8::default();
                self.checksum.update(byte);
                self.class = byte;
                self.state = DecodeState::Id;
            }
            DecodeState::Id => {
                self.checksum.update(byte);
                self.id = byte;
                self.state = DecodeState::LenLo;
            }
            DecodeState::LenLo => {
                self.checksum.update(byte);
                self.len = u16::from(byte);
                self.state = DecodeState::LenHi;
            }
            DecodeState::LenHi => {
                self.checksum.update(byte);
                self.len |= u16::from(byte) << 8;
                self.payload.clear();
                if usize::from(self.len) > MAX_PAYLOAD {
                    return Some(self.reject(UbxError::Oversize(self.len)));
                }
                self.state = if self.len == 0 {
                    DecodeState::CkA
                } else {
                    DecodeState::Payload
                };
            }
            DecodeState::Payload => {
                self.checksum.update(byte);
                // Length was bounded in LenHi
                let _ = self.payload.push(byte);
                if self.payload.len() == usize::from(self.len) {
                    self.state = DecodeState::CkA;
                }
            }
            DecodeState::CkA => {
                self.received_ck_a = byte;
                self.state = DecodeState::CkB;
            }
            DecodeState::CkB => {
                self.state = DecodeState::Sync1;
                if self.received_ck_a != self.checksum.a || byte != self.checksum.b {
                    return Some(self.reject(UbxError::Checksum));
                }
                return Some(self.dispatch());
            }
        }
        None
    }

    fn reject(&mut self, err: UbxError) -> Result<UbxMessage, UbxError> {
        self.state = DecodeState::Sync1;
        self.stats.errors = self.stats.errors.wrapping_add(1);
        Err(err)
    }

    fn dispatch(&mut self) -> Result<UbxMessage, UbxError> {
        if self.class != CLASS_NAV {
            self.stats.frames = self.stats.frames.wrapping_add(1);
            return Ok(UbxMessage::Other {
                class: self.class,
                id: self.id,
            });
        }

        let expected = match self.id {
            NAV_POSLLH => POSLLH_LEN,
            NAV_SOL => SOL_LEN,
            NAV_VELNED => VELNED_LEN,
            NAV_TIMEUTC => TIMEUTC_LEN,
            id => {
                self.stats.frames = self.stats.frames.wrapping_add(1);
                return Ok(UbxMessage::Other { class: CLASS_NAV, id });
            }
        };
        if self.payload.len() != expected {
            return self.reject(UbxError::Length {
                id: self.id,
                len: self.len,
            });
        }

        let p = &self.payload;
        let message = match self.id {
            NAV_POSLLH => {
                self.fix.lon_raw = le_i32(p, 4);
                self.fix.lat_raw = le_i32(p, 8);
                self.fix.alt_raw = le_i32(p, 16);
                UbxMessage::PosLlh
            }
            NAV_SOL => {
                // gpsFixOK flag gates the reported fix type
                self.fix.fix = if p[11] & 0x01 != 0 {
                    FixQuality(p[10])
                } else {
                    FixQuality::NONE
                };
                self.fix.sats_raw = p[47];
                UbxMessage::Sol
            }
            NAV_VELNED => {
                self.fix.speed_raw = le_u32(p, 20);
                UbxMessage::VelNed
            }
            _ => {
                self.fix.hours = p[16];
                self.fix.minutes = p[17];
                self.fix.seconds = p[18];
                UbxMessage::TimeUtc
            }
        };
        self.stats.frames = self.stats.frames.wrapping_add(1);
        Ok(message)
    }
}

impl GpsSource for UbxParser {
    fn last_fix(&self) -> GpsFix {
        self.fix
    }
}

fn le_u32(p: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([p[offset], p[offset + 1], p[offset + 2], p[offset + 3]])
}

fn le_i32(p: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([p[offset], p[offset + 1], p[offset + 2], p[offset + 3]])
}

/// Assemble a frame around `payload`
pub fn build_frame(class: u8, id: u8, payload: &[u8]) -> Result<UbxFrame, UbxError> {
    let len = u16::try_from(payload.len()).map_err(|_| UbxError::Oversize(u16::MAX))?;
    if payload.len() + 8 > MAX_FRAME {
        return Err(UbxError::Oversize(len));
    }

    let mut frame = UbxFrame::new();
    let mut checksum = Fletcher8::default();
    let [len_lo, len_hi] = len.to_le_bytes();
    let _ = frame.extend_from_slice(&[SYNC_1, SYNC_2]);
    for &byte in [class, id, len_lo, len_hi].iter().chain(payload) {
        checksum.update(byte);
        let _ = frame.push(byte);
    }
    let _ = frame.extend_from_slice(&[checksum.a, checksum.b]);
    Ok(frame)
}

/// CFG-PRT: UART1 at `baud`, 8N1, UBX in and out only
pub fn port_config(baud: u32) -> Result<UbxFrame, UbxError> {
    let mut payload = [0u8; 20];
    payload[0] = 1;
    payload[4..8].copy_from_slice(&0x0000_08D0u32.to_le_bytes());
    payload[8..12].copy_from_slice(&baud.to_le_bytes());
    payload[12..14].copy_from_slice(&1u16.to_le_bytes());
    payload[14..16].copy_from_slice(&1u16.to_le_bytes());
    build_frame(CLASS_CFG, CFG_PRT, &payload)
}

/// CFG-NAV5: set only the dynamic platform model
pub fn dynamic_model(model: u8) -> Result<UbxFrame, UbxError> {
    let mut payload = [0u8; 36];
    payload[0..2].copy_from_slice(&1u16.to_le_bytes());
    payload[2] = model;
    build_frame(CLASS_CFG, CFG_NAV5, &payload)
}

/// CFG-MSG: emit `class`/`id` on every navigation solution
pub fn message_rate(class: u8, id: u8, rate: u8) -> Result<UbxFrame, UbxError> {
    build_frame(CLASS_CFG, CFG_MSG, &[class, id, rate])
}

/// Everything sent to the receiver after power-up, in order
pub fn configuration_frames(baud: u32) -> Result<Vec<UbxFrame, CONFIG_FRAME_COUNT>, UbxError> {
    let frames = [
        port_config(baud)?,
        dynamic_model(DYN_MODEL_AIRBORNE_1G)?,
        message_rate(CLASS_NAV, NAV_POSLLH, 1)?,
        message_rate(CLASS_NAV, NAV_SOL, 1)?,
        message_rate(CLASS_NAV, NAV_VELNED, 1)?,
        message_rate(CLASS_NAV, NAV_TIMEUTC, 1)?,
    ];
    Ok(frames.into_iter().collect())
}
