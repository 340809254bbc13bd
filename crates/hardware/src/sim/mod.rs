//! Simulation driver and program loading.
//!
//! Provides the `Simulator` that owns and clocks a core, and the loader that places
//! binary, hex, and ELF images into memory.

/// Image loading (flat binary, hex words, ELF).
pub mod loader;

/// The simulator driver and its run outcomes.
pub mod simulator;

pub use self::loader::{ImageFormat, LoadError, LoadedImage};
pub use self::simulator::{RunOutcome, SimError, Simulator};
