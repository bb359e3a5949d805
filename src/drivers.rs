//! Peripheral Drivers
//!
//! High-level drivers for the external ICs on the payload board.
//! These provide domain-specific abstractions over the HAL layer and the
//! collaborator traits the transmission engine is written against.

pub mod si4032;
pub mod traits;
pub mod ublox;

pub use traits::{AdcSamples, GpsSource, Indicators, RadioPort};
