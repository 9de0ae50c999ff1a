//! Decoded form of an AURORA instruction word.

use crate::fields::*;
use crate::opcodes::*;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid opcode {0}")]
    InvalidOpcode(u32),
}

/// One decoded instruction.
///
/// The decoder only looks at the fields a given opcode uses, so an
/// encoded word and its decoded form carry the same opcode, register,
/// immediate and address fields on both machine variants. Semantics
/// that differ between the 32- and 128-bit machines (register width,
/// interrupt wiring) live with the cores, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Nop,
    /// rd = rs1 + rs2, wrapping
    Add { rd: u8, rs1: u8, rs2: u8 },
    /// rd = rs1 - rs2, wrapping
    Sub { rd: u8, rs1: u8, rs2: u8 },
    /// rd = rs1 + sign-extended imm, wrapping
    Addi { rd: u8, rs1: u8, imm: i16 },
    /// rd = mem[rs1 + sign-extended imm]
    Load { rd: u8, rs1: u8, imm: i16 },
    /// mem[rs1 + sign-extended imm] = rd
    Store { rd: u8, rs1: u8, imm: i16 },
    /// pc = addr
    Jmp { addr: u32 },
    /// If rd == rs1, pc = pc + imm*4 (imm sign-extended)
    Beq { rd: u8, rs1: u8, imm: i16 },
    Halt,
    /// r31 = pc, pc = addr
    Call { addr: u32 },
    /// pc = r31
    Ret,
    /// Return from interrupt: restore the pc saved at dispatch
    /// (128-bit machine only)
    Reti,
    /// Raise the software interrupt line (128-bit machine only)
    Syscall,
    /// rd = count of leading zero bits in rs1 (128-bit machine only)
    Clz { rd: u8, rs1: u8 },
    /// Compare mem[rs1] with rs2; if equal store rd; rd receives the
    /// old memory value either way (128-bit machine only)
    Cas { rd: u8, rs1: u8, rs2: u8 },
}

impl Instr {
    pub fn decode(instr: u32) -> Result<Self, DecodeError> {
        let op = opcode(instr);
        match op {
            OP_NOP => Ok(Self::Nop),
            OP_ADD => Ok(Self::Add {
                rd: rd(instr),
                rs1: rs1(instr),
                rs2: rs2(instr),
            }),
            OP_SUB => Ok(Self::Sub {
                rd: rd(instr),
                rs1: rs1(instr),
                rs2: rs2(instr),
            }),
            OP_ADDI => Ok(Self::Addi {
                rd: rd(instr),
                rs1: rs1(instr),
                imm: imm16(instr),
            }),
            OP_LOAD => Ok(Self::Load {
                rd: rd(instr),
                rs1: rs1(instr),
                imm: imm16(instr),
            }),
            OP_STORE => Ok(Self::Store {
                rd: rd(instr),
                rs1: rs1(instr),
                imm: imm16(instr),
            }),
            OP_JMP => Ok(Self::Jmp {
                addr: addr26(instr),
            }),
            OP_BEQ => Ok(Self::Beq {
                rd: rd(instr),
                rs1: rs1(instr),
                imm: imm16(instr),
            }),
            OP_HALT => Ok(Self::Halt),
            OP_CALL => Ok(Self::Call {
                addr: addr26(instr),
            }),
            OP_RET => Ok(Self::Ret),
            OP_RETI => Ok(Self::Reti),
            OP_SYSCALL => Ok(Self::Syscall),
            OP_CLZ => Ok(Self::Clz {
                rd: rd(instr),
                rs1: rs1(instr),
            }),
            OP_CAS => Ok(Self::Cas {
                rd: rd(instr),
                rs1: rs1(instr),
                rs2: rs2(instr),
            }),
            _ => Err(DecodeError::InvalidOpcode(op)),
        }
    }

    /// The opcode this instruction encodes to
    pub fn opcode(&self) -> u32 {
        match self {
            Self::Nop => OP_NOP,
            Self::Add { .. } => OP_ADD,
            Self::Sub { .. } => OP_SUB,
            Self::Addi { .. } => OP_ADDI,
            Self::Load { .. } => OP_LOAD,
            Self::Store { .. } => OP_STORE,
            Self::Jmp { .. } => OP_JMP,
            Self::Beq { .. } => OP_BEQ,
            Self::Halt => OP_HALT,
            Self::Call { .. } => OP_CALL,
            Self::Ret => OP_RET,
            Self::Reti => OP_RETI,
            Self::Syscall => OP_SYSCALL,
            Self::Clz { .. } => OP_CLZ,
            Self::Cas { .. } => OP_CAS,
        }
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "NOP"),
            Self::Add { rd, rs1, rs2 } => write!(f, "ADD R{rd}, R{rs1}, R{rs2}"),
            Self::Sub { rd, rs1, rs2 } => write!(f, "SUB R{rd}, R{rs1}, R{rs2}"),
            Self::Addi { rd, rs1, imm } => write!(f, "ADDI R{rd}, R{rs1}, {imm}"),
            Self::Load { rd, rs1, imm } => write!(f, "LOAD R{rd}, R{rs1}, {imm}"),
            Self::Store { rd, rs1, imm } => write!(f, "STORE R{rd}, R{rs1}, {imm}"),
            Self::Jmp { addr } => write!(f, "JMP {addr:#x}"),
            Self::Beq { rd, rs1, imm } => write!(f, "BEQ R{rd}, R{rs1}, {imm}"),
            Self::Halt => write!(f, "HALT"),
            Self::Call { addr } => write!(f, "CALL {addr:#x}"),
            Self::Ret => write!(f, "RET"),
            Self::Reti => write!(f, "RETI"),
            Self::Syscall => write!(f, "SYSCALL"),
            Self::Clz { rd, rs1 } => write!(f, "CLZ R{rd}, R{rs1}"),
            Self::Cas { rd, rs1, rs2 } => write!(f, "CAS R{rd}, R{rs1}, R{rs2}"),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn decode_rtype_fields() {
        let instr = Instr::decode(encode_r(OP_ADD, 3, 1, 2)).unwrap();
        assert_eq!(
            instr,
            Instr::Add {
                rd: 3,
                rs1: 1,
                rs2: 2
            }
        );
    }

    #[test]
    fn decode_negative_immediate() {
        let instr = Instr::decode(encode_i(OP_BEQ, 0, 0, -2)).unwrap();
        assert_eq!(
            instr,
            Instr::Beq {
                rd: 0,
                rs1: 0,
                imm: -2
            }
        );
    }

    #[test]
    fn decode_word_zero_is_nop() {
        assert_eq!(Instr::decode(0).unwrap(), Instr::Nop);
    }

    #[test]
    fn reserved_opcodes_are_invalid() {
        for op in [13u32, 15, 17, 25, 63] {
            let result = Instr::decode(encode_j(op, 0));
            assert_eq!(result, Err(DecodeError::InvalidOpcode(op)));
        }
    }
}
