//! Memory-Mapped IO Devices.
//!
//! The core itself only owns the CLINT. Other peripherals attach to the memory controller
//! through the [`Device`] trait.

/// Core Local Interruptor (timer and software interrupt controller).
pub mod clint;

pub use clint::Clint;

pub use crate::soc::traits::Device;
