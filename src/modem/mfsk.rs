//! Multi-level FSK Symbol Extraction
//!
//! Both encoders walk one byte at a time, most significant bits first, and
//! return `None` once the byte is exhausted. The caller then advances its
//! cursor and queries again with the next byte in the same tick, so the
//! `None` never costs a symbol period.

/// Source of FSK symbols for one byte at a time
pub trait SymbolEncoder {
    /// Bits carried by one symbol
    const BITS_PER_SYMBOL: u8;

    /// Next symbol of `byte`, or `None` when all its bits have been sent
    fn next_symbol(&mut self, byte: u8) -> Option<u8>;

    /// Forget any partially sent byte
    fn reset(&mut self);

    /// Symbols needed for one byte
    #[must_use]
    fn symbols_per_byte() -> u8 {
        8 / Self::BITS_PER_SYMBOL
    }
}

/// 4-level FSK: four 2-bit symbols per byte
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fsk4Encoder {
    symbol: u8,
}

impl Fsk4Encoder {
    /// Create an encoder positioned at the start of a byte
    #[must_use]
    pub const fn new() -> Self {
        Self { symbol: 0 }
    }
}

impl SymbolEncoder for Fsk4Encoder {
    const BITS_PER_SYMBOL: u8 = 2;

    fn next_symbol(&mut self, byte: u8) -> Option<u8> {
        if self.symbol == 4 {
            self.symbol = 0;
            return None;
        }
        let shift = 6 - 2 * self.symbol;
        self.symbol += 1;
        Some((byte >> shift) & 0x03)
    }

    fn reset(&mut self) {
        self.symbol = 0;
    }
}

/// 2-level FSK: eight 1-bit symbols per byte
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fsk2Encoder {
    bit: u8,
}

impl Fsk2Encoder {
    /// Create an encoder positioned at the start of a byte
    #[must_use]
    pub const fn new() -> Self {
        Self { bit: 0 }
    }
}

impl SymbolEncoder for Fsk2Encoder {
    const BITS_PER_SYMBOL: u8 = 1;

    fn next_symbol(&mut self, byte: u8) -> Option<u8> {
        if self.bit == 8 {
            self.bit = 0;
            return None;
        }
        let shift = 7 - self.bit;
        self.bit += 1;
        Some((byte >> shift) & 0x01)
    }

    fn reset(&mut self) {
        self.bit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_byte_walks_all_tones() {
        let mut enc = Fsk4Encoder::new();
        let symbols: [Option<u8>; 5] = core::array::from_fn(|_| enc.next_symbol(0x1B));
        assert_eq!(symbols, [Some(0), Some(1), Some(2), Some(3), None]);
    }

    #[test]
    fn symbols_per_byte() {
        assert_eq!(Fsk4Encoder::symbols_per_byte(), 4);
        assert_eq!(Fsk2Encoder::symbols_per_byte(), 8);
    }
}
