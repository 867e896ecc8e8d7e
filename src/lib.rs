//! Drive one hobby servo from a Pico PWM slice: hold a few fixed positions, then
//! sweep between the extremes.
//!
//! - [`servo_config`] — named constants and validated configuration types.
//! - [`servo_driver`] — hardware-independent position driver ([`ServoDriver`](servo_driver::ServoDriver)).
//! - [`servo`] — `embassy_rp` PWM backend (embedded builds only).
//!
//! # Glossary
//!
//! - **PWM ([Pulse Width Modulation](https://en.wikipedia.org/wiki/Pulse-width_modulation)) Slices:** Both Pico 1 and 2 have 8 slices (& 16 channels); the RP2350B has 12. These "slices"
//!   are unrelated to Rust slices.
//! - **Wrap:** the counter value after which the PWM period restarts at zero.
//! - **Level:** the compare value; the output is high while the counter is below it.
//! - **Dwell:** how long a commanded position is held before the next command.
#![cfg_attr(not(feature = "host"), no_std)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(feature = "host", any(feature = "pico1", feature = "pico2")))]
compile_error!("The 'host' feature is for tests: use --no-default-features --features host");

// Compile-time checks: an architecture must be selected (unless testing with host feature)
#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the 'arm' architecture feature");

mod error;
#[cfg(not(feature = "host"))]
pub mod servo;
pub mod servo_config;
pub mod servo_driver;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
