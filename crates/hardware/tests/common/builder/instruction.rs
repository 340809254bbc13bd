use rvpipe_core::isa::base::{funct3, funct7, opcodes::*};
use rvpipe_core::isa::mext;
use rvpipe_core::isa::privileged::opcodes as sys;

/// Fluent RISC-V instruction encoder.
///
/// Set the fields directly or through one of the mnemonic helpers, then call `build`.
/// The encoding format is chosen from the opcode.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstructionBuilder {
    opcode: u32,
    rd: u32,
    funct3: u32,
    rs1: u32,
    rs2: u32,
    funct7: u32,
    imm: i64,
}

impl InstructionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opcode(mut self, op: u32) -> Self {
        self.opcode = op;
        self
    }

    pub fn rd(mut self, rd: u32) -> Self {
        self.rd = rd;
        self
    }

    pub fn rs1(mut self, rs1: u32) -> Self {
        self.rs1 = rs1;
        self
    }

    pub fn rs2(mut self, rs2: u32) -> Self {
        self.rs2 = rs2;
        self
    }

    pub fn funct3(mut self, funct3: u32) -> Self {
        self.funct3 = funct3;
        self
    }

    pub fn funct7(mut self, funct7: u32) -> Self {
        self.funct7 = funct7;
        self
    }

    pub fn imm(mut self, imm: i64) -> Self {
        self.imm = imm;
        self
    }

    // --- Helpers for Common Instructions ---

    fn reg(mut self, opcode: u32, f3: u32, f7: u32, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.opcode = opcode;
        self.funct3 = f3;
        self.funct7 = f7;
        self.rd = rd;
        self.rs1 = rs1;
        self.rs2 = rs2;
        self
    }

    fn itype(mut self, opcode: u32, f3: u32, rd: u32, rs1: u32, imm: i64) -> Self {
        self.opcode = opcode;
        self.funct3 = f3;
        self.rd = rd;
        self.rs1 = rs1;
        self.imm = imm;
        self
    }

    fn stype(mut self, f3: u32, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.opcode = OP_STORE;
        self.funct3 = f3;
        self.rs1 = rs1;
        self.rs2 = rs2;
        self.imm = imm;
        self
    }

    fn btype(mut self, f3: u32, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.opcode = OP_BRANCH;
        self.funct3 = f3;
        self.rs1 = rs1;
        self.rs2 = rs2;
        self.imm = imm;
        self
    }

    pub fn add(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG, funct3::ADD_SUB, funct7::DEFAULT, rd, rs1, rs2)
    }

    pub fn sub(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG, funct3::ADD_SUB, funct7::ALT, rd, rs1, rs2)
    }

    pub fn addw(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG_32, funct3::ADD_SUB, funct7::DEFAULT, rd, rs1, rs2)
    }

    pub fn mul(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG, mext::funct3::MUL, mext::FUNCT7_MULDIV, rd, rs1, rs2)
    }

    pub fn mulh(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG, mext::funct3::MULH, mext::FUNCT7_MULDIV, rd, rs1, rs2)
    }

    pub fn div(self, rd: u32, rs1: u32, rs2: u32) -> Self {
        self.reg(OP_REG, mext::funct3::DIV, mext::FUNCT7_MULDIV, rd, rs1, rs2)
    }

    pub fn addi(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_IMM, funct3::ADD_SUB, rd, rs1, imm)
    }

    pub fn slli(self, rd: u32, rs1: u32, shamt: u32) -> Self {
        self.itype(OP_IMM, funct3::SLL, rd, rs1, i64::from(shamt))
    }

    pub fn srai(self, rd: u32, rs1: u32, shamt: u32) -> Self {
        self.itype(OP_IMM, funct3::SRL_SRA, rd, rs1, 0x400 | i64::from(shamt))
    }

    pub fn lui(mut self, rd: u32, upper: u32) -> Self {
        self.opcode = OP_LUI;
        self.rd = rd;
        self.imm = i64::from(upper);
        self
    }

    pub fn auipc(mut self, rd: u32, upper: u32) -> Self {
        self.opcode = OP_AUIPC;
        self.rd = rd;
        self.imm = i64::from(upper);
        self
    }

    pub fn lb(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_LOAD, funct3::LB, rd, rs1, imm)
    }

    pub fn lw(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_LOAD, funct3::LW, rd, rs1, imm)
    }

    pub fn lwu(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_LOAD, funct3::LWU, rd, rs1, imm)
    }

    pub fn ld(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_LOAD, funct3::LD, rd, rs1, imm)
    }

    pub fn sb(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.stype(funct3::SB, rs1, rs2, imm)
    }

    pub fn sw(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.stype(funct3::SW, rs1, rs2, imm)
    }

    pub fn sd(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.stype(funct3::SD, rs1, rs2, imm)
    }

    pub fn beq(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.btype(funct3::BEQ, rs1, rs2, imm)
    }

    pub fn bne(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.btype(funct3::BNE, rs1, rs2, imm)
    }

    pub fn blt(self, rs1: u32, rs2: u32, imm: i64) -> Self {
        self.btype(funct3::BLT, rs1, rs2, imm)
    }

    pub fn jal(mut self, rd: u32, imm: i64) -> Self {
        self.opcode = OP_JAL;
        self.rd = rd;
        self.imm = imm;
        self
    }

    pub fn jalr(self, rd: u32, rs1: u32, imm: i64) -> Self {
        self.itype(OP_JALR, 0, rd, rs1, imm)
    }

    pub fn csrrw(self, rd: u32, csr: u16, rs1: u32) -> Self {
        self.itype(sys::OP_SYSTEM, sys::CSRRW, rd, rs1, i64::from(csr))
    }

    pub fn csrrs(self, rd: u32, csr: u16, rs1: u32) -> Self {
        self.itype(sys::OP_SYSTEM, sys::CSRRS, rd, rs1, i64::from(csr))
    }

    pub fn csrrc(self, rd: u32, csr: u16, rs1: u32) -> Self {
        self.itype(sys::OP_SYSTEM, sys::CSRRC, rd, rs1, i64::from(csr))
    }

    pub fn csrrsi(self, rd: u32, csr: u16, uimm: u32) -> Self {
        self.itype(sys::OP_SYSTEM, sys::CSRRSI, rd, uimm, i64::from(csr))
    }

    /// `csrr rd, csr` (`csrrs rd, csr, x0`).
    pub fn csrr(self, rd: u32, csr: u16) -> Self {
        self.csrrs(rd, csr, 0)
    }

    /// `csrw csr, rs1` (`csrrw x0, csr, rs1`).
    pub fn csrw(self, csr: u16, rs1: u32) -> Self {
        self.csrrw(0, csr, rs1)
    }

    pub fn build(self) -> u32 {
        let imm = self.imm as u32;
        let base = self.opcode & 0x7F;
        let rd = (self.rd & 0x1F) << 7;
        let f3 = (self.funct3 & 0x7) << 12;
        let rs1 = (self.rs1 & 0x1F) << 15;
        let rs2 = (self.rs2 & 0x1F) << 20;
        match self.opcode {
            OP_REG | OP_REG_32 => ((self.funct7 & 0x7F) << 25) | rs2 | rs1 | f3 | rd | base,
            OP_STORE => {
                ((imm >> 5) & 0x7F) << 25 | rs2 | rs1 | f3 | (imm & 0x1F) << 7 | base
            }
            OP_BRANCH => {
                ((imm >> 12) & 1) << 31
                    | ((imm >> 5) & 0x3F) << 25
                    | rs2
                    | rs1
                    | f3
                    | ((imm >> 1) & 0xF) << 8
                    | ((imm >> 11) & 1) << 7
                    | base
            }
            OP_LUI | OP_AUIPC => (imm & 0xF_FFFF) << 12 | rd | base,
            OP_JAL => {
                ((imm >> 20) & 1) << 31
                    | ((imm >> 1) & 0x3FF) << 21
                    | ((imm >> 11) & 1) << 20
                    | ((imm >> 12) & 0xFF) << 12
                    | rd
                    | base
            }
            _ => (imm & 0xFFF) << 20 | rs1 | f3 | rd | base,
        }
    }
}

/// `addi x0, x0, 0`.
pub fn nop() -> u32 {
    InstructionBuilder::new().addi(0, 0, 0).build()
}

pub fn ecall() -> u32 {
    sys::ECALL
}

pub fn ebreak() -> u32 {
    sys::EBREAK
}

pub fn mret() -> u32 {
    sys::MRET
}

pub fn wfi() -> u32 {
    sys::WFI
}

/// Shorthand for `InstructionBuilder::new()`.
pub fn asm() -> InstructionBuilder {
    InstructionBuilder::new()
}

#[test]
fn encodings_match_reference_assembler() {
    assert_eq!(asm().addi(1, 0, 1).build(), 0x0010_0093);
    assert_eq!(asm().add(3, 1, 2).build(), 0x0020_81B3);
    assert_eq!(asm().sw(1, 2, 8).build(), 0x0020_A423);
    assert_eq!(asm().beq(0, 0, 8).build(), 0x0000_0463);
    assert_eq!(asm().jal(0, 0).build(), 0x0000_006F);
    assert_eq!(asm().jal(1, -4).build(), 0xFFDF_F0EF);
    assert_eq!(asm().lui(1, 0x10000).build(), 0x1000_00B7);
    assert_eq!(asm().csrr(10, 0x342).build(), 0x3420_2573);
    assert_eq!(asm().addi(2, 2, -2048).build(), 0x8001_0113);
}
