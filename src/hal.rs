//! Hardware Abstraction Layer
//!
//! Safe wrappers over the STM32F100 peripherals the transmitter drives
//! directly. Both modules are written against `embedded-hal` traits or
//! plain atomics so they also build for host tests.

pub mod adc;
pub mod gpio;
