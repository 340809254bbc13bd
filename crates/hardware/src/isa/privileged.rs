//! Privileged architecture encodings: system instructions and trap causes.

/// SYSTEM opcode and its fixed encodings.
pub mod opcodes {
    /// SYSTEM major opcode: CSR access, ECALL, EBREAK, MRET, WFI.
    pub const OP_SYSTEM: u32 = 0b111_0011;

    /// ECALL.
    pub const ECALL: u32 = 0x0000_0073;
    /// EBREAK.
    pub const EBREAK: u32 = 0x0010_0073;
    /// MRET.
    pub const MRET: u32 = 0x3020_0073;
    /// WFI.
    pub const WFI: u32 = 0x1050_0073;

    /// funct3 of the non-CSR SYSTEM instructions.
    pub const PRIV: u32 = 0b000;
    /// CSR read/write.
    pub const CSRRW: u32 = 0b001;
    /// CSR read and set bits.
    pub const CSRRS: u32 = 0b010;
    /// CSR read and clear bits.
    pub const CSRRC: u32 = 0b011;
    /// CSR read/write, immediate source.
    pub const CSRRWI: u32 = 0b101;
    /// CSR read and set bits, immediate source.
    pub const CSRRSI: u32 = 0b110;
    /// CSR read and clear bits, immediate source.
    pub const CSRRCI: u32 = 0b111;
}

/// Trap cause codes as written into the low bits of `mcause`.
///
/// The interrupt flag occupies the top bit of the register and is added by the
/// privileged unit according to the configured `xlen`.
pub mod cause {
    /// Interrupt codes.
    pub mod interrupt {
        /// Machine software interrupt.
        pub const MACHINE_SOFTWARE: u64 = 3;
        /// Machine timer interrupt.
        pub const MACHINE_TIMER: u64 = 7;
        /// Machine external interrupt.
        pub const MACHINE_EXTERNAL: u64 = 11;
    }

    /// Exception codes.
    pub mod exception {
        /// Instruction address misaligned.
        pub const INSTRUCTION_ADDRESS_MISALIGNED: u64 = 0;
        /// Instruction access fault.
        pub const INSTRUCTION_ACCESS_FAULT: u64 = 1;
        /// Illegal instruction.
        pub const ILLEGAL_INSTRUCTION: u64 = 2;
        /// Breakpoint.
        pub const BREAKPOINT: u64 = 3;
        /// Load address misaligned.
        pub const LOAD_ADDRESS_MISALIGNED: u64 = 4;
        /// Load access fault.
        pub const LOAD_ACCESS_FAULT: u64 = 5;
        /// Store address misaligned.
        pub const STORE_ADDRESS_MISALIGNED: u64 = 6;
        /// Store access fault.
        pub const STORE_ACCESS_FAULT: u64 = 7;
        /// Environment call from U-mode.
        pub const ENVIRONMENT_CALL_FROM_U_MODE: u64 = 8;
        /// Environment call from M-mode.
        pub const ENVIRONMENT_CALL_FROM_M_MODE: u64 = 11;
    }
}
