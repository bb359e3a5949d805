//! CRC-16/CCITT-FALSE
//!
//! Register starts at `0xFFFF`, polynomial `0x1021`, input bytes are XORed
//! into the high byte, no reflection and no final XOR. This is the
//! `CRC_16_IBM_3740` catalogue entry; the `NoTable` variant keeps the
//! bitwise, table-free computation so no flash is spent on a lookup table.
//!
//! Input is treated as a C string: everything from the first NUL on is
//! ignored, matching what ground-station decoders checksum.

use crc::{Crc, Digest, NoTable, CRC_16_IBM_3740};

/// Value of the register before any input
pub const CRC16_INIT: u16 = 0xFFFF;

static CRC16: Crc<u16, NoTable> = Crc::<u16, NoTable>::new(&CRC_16_IBM_3740);

/// Compute the checksum of a NUL-terminated ASCII sequence
#[must_use]
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(until_nul(data))
}

/// Compute the checksum over every byte, NULs included (binary frames)
#[must_use]
pub fn crc16_bytes(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

fn until_nul(data: &[u8]) -> &[u8] {
    data.iter()
        .position(|&b| b == 0)
        .map_or(data, |end| &data[..end])
}

/// Incremental checksum over input arriving in pieces
pub struct Crc16Stream {
    digest: Digest<'static, u16, NoTable>,
    terminated: bool,
}

impl Crc16Stream {
    /// Start a new checksum
    #[must_use]
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
            terminated: false,
        }
    }

    /// Feed more bytes; input after a NUL is ignored
    pub fn update(&mut self, data: &[u8]) {
        if self.terminated {
            return;
        }
        let body = until_nul(data);
        self.terminated = body.len() < data.len();
        self.digest.update(body);
    }

    /// Finish and return the checksum
    #[must_use]
    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16Stream {
    fn default() -> Self {
        Self::new()
    }
}
