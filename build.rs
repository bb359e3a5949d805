//! Build script for the balloon transmitter firmware
//!
//! Handles:
//! - Memory layout configuration
//! - Linker scripts for the embedded binary

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds (tests) need no linker setup
    if std::env::var_os("CARGO_FEATURE_EMBEDDED").is_none() {
        return;
    }

    // memory.x is generated by embassy-stm32 (memory-x feature)
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}
