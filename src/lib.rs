//! Balloon Telemetry Transmitter Firmware Library
//!
//! Core functionality for an STM32F100 + SI4032 radiosonde board
//! repurposed as a high-altitude balloon tracker. Every cycle the payload
//! sends one RTTY telemetry sentence followed by one 4FSK (or 2FSK)
//! packet, keyed symbol by symbol on the SI4032 deviation register.
//!
//! # Data flow
//!
//! ```text
//!  u-blox ──UART──► UbxParser ──GpsFix──┐
//!  ADC ──────────► AdcBank ─────────────┤
//!                                       ▼
//!                 ModeSequencer (main loop, embassy thread executor)
//!                   snapshot ─► sentence / FSK frame ─► TxLink::arm
//!                                       │ spsc queue
//!                                       ▼
//!                 SymbolClock (interrupt executor, one tick per symbol)
//!                   disarm ─► modulate ─► guard ─► heartbeat
//!                                       │
//!                                       ▼
//!                 SI4032 deviation register, LEDs, cutoff
//! ```
//!
//! # Conventions
//!
//! - Every buffer is a fixed-capacity `heapless` container
//! - Hardware is reached only through the traits in [`drivers::traits`]
//! - Unsafe is limited to the interrupt-executor vector in `main.rs`
//! - Fallible operations return `Result`; the symbol clock never fails

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// Indicator outputs and the shared ADC sample bank.
pub mod hal;

/// Peripheral Drivers
///
/// SI4032 transmitter, u-blox GPS and the traits the engine uses to reach them.
pub mod drivers;

/// Symbol Generators
///
/// RTTY framing and multi-level FSK symbol extraction.
pub mod modem;

/// Transmission Engine
///
/// Symbol clock, mode sequencer and the handoff between them.
pub mod radio;

/// Power Management
///
/// Battery monitoring, die temperature and the LED power policy.
pub mod power;

/// Telemetry capture
pub mod telemetry;

/// Communication Protocols
///
/// RTTY sentence, FSK frames and their CRC16.
pub mod protocol;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use crate::drivers::traits::{AdcSamples, GpsSource, Indicators, RadioPort};
    pub use embedded_hal::digital::OutputPin;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
