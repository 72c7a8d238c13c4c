//! Servo control for Pico 1 and 2, built on a fixed-capacity servo registry.
//!
//! # Glossary
//!
//! Resources available on the Pico 1 and Pico 2:
//!
//! - **PWM ([Pulse Width Modulation](https://en.wikipedia.org/wiki/Pulse-width_modulation)) Slices:** Pico 1 has 8 slices (& 16 channels), Pico 2 (RP2350B) has 12. These "slices"
//!   are unrelated to Rust slices. Each slice has two channels (A and B), and each GPIO pin
//!   drives exactly one (slice, channel) pair. Two pins on the same slice share its clock
//!   divider, wrap count and enable bit, but each has its own compare level.
//! - **Wrap count:** The counter value at which a slice starts a new period. A slice
//!   counts `wrap_count + 1` ticks per period.
//! - **Clock divider:** An 8.4 fixed-point factor (1.0 to 255.9375) applied to the system
//!   clock to derive the slice's tick rate.
//!
//! # Modules
//!
//! - [`pwm_params`] derives the (wrap count, clock divider) pair for a target frequency.
//! - [`servo`] holds the [`ServoRegistry`](servo::ServoRegistry), the table of managed servos.
//! - [`hardware`] is the capability the registry drives: a register-level backend for the
//!   Pico and a simulator for host tests.
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

#[cfg(all(feature = "arm", feature = "riscv"))]
compile_error!("Cannot enable both 'arm' and 'riscv' features simultaneously");

// Compile-time check: pico1 only supports ARM
#[cfg(all(feature = "pico1", feature = "riscv"))]
compile_error!("Pico 1 (RP2040) only supports ARM architecture, not RISC-V");

mod error;
pub mod hardware;
pub mod pwm_params;
pub mod servo;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
