//! RTTY Bit Framer
//!
//! Produces asynchronous serial framing one symbol per call:
//!
//! ```text
//! [mark x pre-start] | space | d0 d1 .. dN | mark x stop | End
//! ```
//!
//! Pre-start marks are sent once per sentence so the receiver can lock
//! onto the carrier. `End` takes one tick of its own and tells the caller
//! to move to the next character; the radio keeps the last mark during it.

/// RTTY symbol to key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RttySymbol {
    /// Mark tone (logical one, idle level)
    Mark,
    /// Space tone (logical zero)
    Space,
    /// Character finished, advance the buffer
    End,
}

#[cfg(feature = "embedded")]
impl defmt::Format for RttySymbol {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Mark => defmt::write!(f, "MARK"),
            Self::Space => defmt::write!(f, "SPACE"),
            Self::End => defmt::write!(f, "END"),
        }
    }
}

/// Framer state machine state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FramerState {
    /// Marks left before the first start bit
    PreStart(u8),
    /// Sending data bit N
    DataBit(u8),
    /// Sending stop bit N
    StopBit(u8),
    /// Stop bits done, next call reports the character end
    End,
}

/// RTTY character framer
#[derive(Clone, Copy, Debug)]
pub struct RttyEncoder {
    data_bits: u8,
    stop_bits: u8,
    state: FramerState,
}

impl RttyEncoder {
    /// Create a framer for the given character format (7/8 data bits, 1/2 stop bits)
    #[must_use]
    pub fn new(data_bits: u8, stop_bits: u8) -> Self {
        Self {
            data_bits: data_bits.clamp(5, 8),
            stop_bits: stop_bits.clamp(1, 2),
            state: FramerState::PreStart(0),
        }
    }

    /// Prepare for a new sentence, leading with `pre_start_bits` marks
    pub fn begin(&mut self, pre_start_bits: u8) {
        self.state = FramerState::PreStart(pre_start_bits);
    }

    /// Data bits per character
    #[must_use]
    pub const fn data_bits(&self) -> u8 {
        self.data_bits
    }

    /// Stop bits per character
    #[must_use]
    pub const fn stop_bits(&self) -> u8 {
        self.stop_bits
    }

    /// Ticks one character occupies, including the `End` tick
    #[must_use]
    pub const fn ticks_per_char(&self) -> u32 {
        1 + self.data_bits as u32 + self.stop_bits as u32 + 1
    }

    /// Check if the pre-start marks are still being sent
    #[must_use]
    pub const fn in_preamble(&self) -> bool {
        matches!(self.state, FramerState::PreStart(n) if n > 0)
    }

    /// Produce the next symbol for `byte`
    pub fn next_symbol(&mut self, byte: u8) -> RttySymbol {
        match self.state {
            FramerState::PreStart(remaining) if remaining > 0 => {
                self.state = FramerState::PreStart(remaining - 1);
                RttySymbol::Mark
            }
            FramerState::PreStart(_) => {
                self.state = FramerState::DataBit(0);
                RttySymbol::Space
            }
            FramerState::DataBit(bit) => {
                self.state = if bit + 1 < self.data_bits {
                    FramerState::DataBit(bit + 1)
                } else {
                    FramerState::StopBit(0)
                };
                if (byte >> bit) & 0x01 != 0 {
                    RttySymbol::Mark
                } else {
                    RttySymbol::Space
                }
            }
            FramerState::StopBit(bit) => {
                self.state = if bit + 1 < self.stop_bits {
                    FramerState::StopBit(bit + 1)
                } else {
                    FramerState::End
                };
                RttySymbol::Mark
            }
            FramerState::End => {
                self.state = FramerState::PreStart(0);
                RttySymbol::End
            }
        }
    }
}

impl Default for RttyEncoder {
    fn default() -> Self {
        Self::new(crate::config::RTTY_DATA_BITS, crate::config::RTTY_STOP_BITS)
    }
}
