//! Transmission Engine
//!
//! The functional core of the transmitter, split by execution context:
//! - [`transmit`]: the symbol clock run from the timer interrupt
//! - [`state`]: the mode sequencer run from the main loop
//! - [`link`]: the flags and queue the two share
//! - [`disarm`], [`heartbeat`]: per-tick helpers used by the clock

pub mod disarm;
pub mod heartbeat;
pub mod link;
pub mod state;
pub mod transmit;

pub use link::{ArmError, PacketQueue, TxBuffer, TxLink};
pub use state::{ModeSequencer, StepOutcome};
pub use transmit::{ClockEvent, SymbolClock};
