//! Modulation Symbol Generators
//!
//! Pure "next symbol" state machines queried once per symbol clock tick:
//! - [`rtty`]: asynchronous start/data/stop framing, LSB first
//! - [`mfsk`]: 4-level and 2-level FSK symbol extraction, MSB first
//!
//! None of them touch hardware; the symbol clock maps their output onto
//! the radio's deviation register.

pub mod mfsk;
pub mod rtty;
