//! RISC-V Privilege Modes.
//!
//! This module defines the privilege levels the core implements:
//! 1. **Mode Classification:** User (U) and Machine (M) modes.
//! 2. **Encoding:** Conversion to and from the two-bit `mstatus.MPP` field.

/// RISC-V privilege mode levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PrivilegeMode {
    /// User mode (U-mode), for unprivileged code.
    User = 0,

    /// Machine mode (M-mode). The reset mode and the mode every trap enters.
    #[default]
    Machine = 3,
}

impl PrivilegeMode {
    /// Decodes a two-bit privilege field.
    ///
    /// # Arguments
    ///
    /// * `bits` - The encoded level.
    /// * `user_mode` - Whether U-mode is implemented.
    ///
    /// # Returns
    ///
    /// `User` for 0 when U-mode exists, `Machine` for every other value.
    pub const fn from_bits(bits: u64, user_mode: bool) -> Self {
        if bits & 3 == 0 && user_mode {
            Self::User
        } else {
            Self::Machine
        }
    }

    /// Encodes the mode into a two-bit field.
    pub const fn to_bits(self) -> u64 {
        self as u64
    }

    /// Human-readable name of the mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
