//! Two-pass assembler.
//!
//! Pass 1 walks the source interning label addresses; pass 2 walks it
//! again encoding one 32-bit word per instruction line. The output
//! image is the words in source order, little-endian, with no header.
//!
//! Addresses start at a configurable base (default 0). Every
//! diagnostic carries the 1-based source line number.

use thiserror::Error;

use crate::fields::{encode_i, encode_j, encode_r};
use crate::opcodes::*;

use self::symtab::SymbolTable;

pub mod expand;
pub mod lexer;
pub mod symtab;

/// Per-line assembly failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    #[error("unknown instruction: {0}")]
    UnknownMnemonic(String),
    #[error("invalid register: {0}")]
    InvalidRegister(String),
    #[error("malformed number: {0}")]
    MalformedNumber(String),
    #[error("immediate {0} does not fit in 16 bits")]
    ImmediateOutOfRange(i64),
    #[error("branch target {target:#x} out of range from {from:#x}")]
    BranchOffsetOutOfRange { target: u32, from: u32 },
    #[error("undefined label: {0}")]
    UndefinedLabel(String),
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),
    #[error("missing operand {0}")]
    MissingOperand(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct AsmError {
    pub line: usize,
    pub kind: LineError,
}

/// Assemble source text into the instruction image
pub fn assemble(source: &str, base_address: u32) -> Result<Vec<u32>, AsmError> {
    let symbols = first_pass(source, base_address)?;
    second_pass(source, base_address, &symbols)
}

/// Serialise an image as the little-endian byte stream written to
/// disk
pub fn image_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Collect labels: a label line interns the current address, any
/// other instruction line advances it by 4
fn first_pass(source: &str, base_address: u32) -> Result<SymbolTable, AsmError> {
    let mut symbols = SymbolTable::new();
    let mut address = base_address;
    for (number, raw) in source.lines().enumerate() {
        let Some(line) = lexer::clean_line(raw) else {
            continue;
        };
        if let Some(name) = lexer::label_name(line) {
            symbols.insert(name, address).map_err(|kind| AsmError {
                line: number + 1,
                kind,
            })?;
        } else {
            address += 4;
        }
    }
    Ok(symbols)
}

fn second_pass(
    source: &str,
    base_address: u32,
    symbols: &SymbolTable,
) -> Result<Vec<u32>, AsmError> {
    let mut image = Vec::new();
    let mut address = base_address;
    for (number, raw) in source.lines().enumerate() {
        let Some(line) = lexer::clean_line(raw) else {
            continue;
        };
        if lexer::label_name(line).is_some() {
            continue;
        }
        let word = encode_line(line, address, symbols).map_err(|kind| AsmError {
            line: number + 1,
            kind,
        })?;
        image.push(word);
        address += 4;
    }
    Ok(image)
}

fn operand<'a>(operands: &[&'a str], index: usize) -> Result<&'a str, LineError> {
    operands
        .get(index)
        .copied()
        .filter(|text| !text.is_empty())
        .ok_or(LineError::MissingOperand(index + 1))
}

fn register(operands: &[&str], index: usize) -> Result<u32, LineError> {
    lexer::parse_register(operand(operands, index)?)
}

fn immediate(operands: &[&str], index: usize) -> Result<i16, LineError> {
    let value = lexer::parse_number(operand(operands, index)?)?;
    i16::try_from(value).map_err(|_| LineError::ImmediateOutOfRange(value))
}

/// A branch or jump target: a numeric literal is taken as-is, any
/// other token is looked up as a label
fn target(operands: &[&str], index: usize, symbols: &SymbolTable) -> Result<u32, LineError> {
    let text = operand(operands, index)?;
    if text.starts_with(|c: char| c.is_ascii_digit()) {
        let value = lexer::parse_number(text)?;
        u32::try_from(value).map_err(|_| LineError::MalformedNumber(text.to_string()))
    } else {
        symbols.lookup(text)
    }
}

/// PC-relative word offset for BEQ, measured from the address of the
/// following instruction
fn branch_offset(target: u32, current_address: u32) -> Result<i16, LineError> {
    let offset = (i64::from(target) - i64::from(current_address) - 4) / 4;
    i16::try_from(offset).map_err(|_| LineError::BranchOffsetOutOfRange {
        target,
        from: current_address,
    })
}

fn encode_line(line: &str, current_address: u32, symbols: &SymbolTable) -> Result<u32, LineError> {
    let (mnemonic, ops) = lexer::split_line(line);
    match mnemonic.to_ascii_uppercase().as_str() {
        "NOP" => Ok(encode_j(OP_NOP, 0)),
        "ADD" => Ok(encode_r(
            OP_ADD,
            register(&ops, 0)?,
            register(&ops, 1)?,
            register(&ops, 2)?,
        )),
        "SUB" => Ok(encode_r(
            OP_SUB,
            register(&ops, 0)?,
            register(&ops, 1)?,
            register(&ops, 2)?,
        )),
        "ADDI" => Ok(encode_i(
            OP_ADDI,
            register(&ops, 0)?,
            register(&ops, 1)?,
            immediate(&ops, 2)?,
        )),
        "LOAD" => Ok(encode_i(
            OP_LOAD,
            register(&ops, 0)?,
            register(&ops, 1)?,
            immediate(&ops, 2)?,
        )),
        "STORE" => Ok(encode_i(
            OP_STORE,
            register(&ops, 0)?,
            register(&ops, 1)?,
            immediate(&ops, 2)?,
        )),
        "BEQ" => {
            let rd = register(&ops, 0)?;
            let rs1 = register(&ops, 1)?;
            let offset = branch_offset(target(&ops, 2, symbols)?, current_address)?;
            Ok(encode_i(OP_BEQ, rd, rs1, offset))
        }
        "JMP" => Ok(encode_j(OP_JMP, target(&ops, 0, symbols)?)),
        "CALL" => Ok(encode_j(OP_CALL, target(&ops, 0, symbols)?)),
        "RET" => Ok(encode_j(OP_RET, 0)),
        "HALT" => Ok(encode_j(OP_HALT, 0)),
        "RETI" => Ok(encode_j(OP_RETI, 0)),
        "SYSCALL" => Ok(encode_j(OP_SYSCALL, 0)),
        "CLZ" => Ok(encode_r(OP_CLZ, register(&ops, 0)?, register(&ops, 1)?, 0)),
        "CAS" => Ok(encode_r(
            OP_CAS,
            register(&ops, 0)?,
            register(&ops, 1)?,
            register(&ops, 2)?,
        )),
        unknown => Err(LineError::UnknownMnemonic(unknown.to_string())),
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::fields;
    use crate::instr::Instr;

    #[test]
    fn assemble_arithmetic_program() {
        let source = "\
            ADDI R1, R0, 10\n\
            ADDI R2, R0, 20\n\
            ADD R3, R1, R2\n\
            HALT\n";
        let image = assemble(source, 0).unwrap();
        assert_eq!(image.len(), 4);
        assert_eq!(
            Instr::decode(image[0]).unwrap(),
            Instr::Addi {
                rd: 1,
                rs1: 0,
                imm: 10
            }
        );
        assert_eq!(
            Instr::decode(image[2]).unwrap(),
            Instr::Add {
                rd: 3,
                rs1: 1,
                rs2: 2
            }
        );
        assert_eq!(Instr::decode(image[3]).unwrap(), Instr::Halt);
    }

    #[test]
    fn labels_comments_and_case_are_tolerated() {
        let source = "\
            ; leading comment\n\
            start:\n\
            \t  addi R1, R0, 0x10   ; hex immediate\n\
            \n\
            jmp start\n";
        let image = assemble(source, 0).unwrap();
        assert_eq!(image.len(), 2);
        assert_eq!(
            Instr::decode(image[0]).unwrap(),
            Instr::Addi {
                rd: 1,
                rs1: 0,
                imm: 16
            }
        );
        assert_eq!(Instr::decode(image[1]).unwrap(), Instr::Jmp { addr: 0 });
    }

    #[test]
    fn backward_branch_offset() {
        // The BEQ at address 4 targets address 0, so the word
        // offset is (0 - 8) / 4 = -2
        let source = "\
            L1: ADDI R1, R1, 1\n\
            BEQ R0, R0, L1\n";
        let image = assemble(source, 0).unwrap();
        assert_eq!(fields::imm16(image[1]), -2);
        assert_eq!(fields::imm16(image[1]) as u16, 0xfffe);
    }

    #[test]
    fn branch_offset_law_holds_with_base_address() {
        let base = 0x1000;
        let source = "\
            NOP\n\
            loop:\n\
            NOP\n\
            NOP\n\
            BEQ R1, R2, loop\n";
        let image = assemble(source, base).unwrap();
        // The BEQ is the fourth word, at base + 12
        let beq_address = base + 12;
        let imm = i64::from(fields::imm16(image[3]));
        let label_address = i64::from(base) + 4;
        assert_eq!(label_address, i64::from(beq_address) + 4 + imm * 4);
    }

    #[test]
    fn jump_to_numeric_target() {
        let image = assemble("JMP 0x2000\nCALL 16\n", 0).unwrap();
        assert_eq!(fields::addr26(image[0]), 0x2000);
        assert_eq!(fields::addr26(image[1]), 16);
    }

    #[test]
    fn store_and_clz_encodings() {
        let image = assemble("STORE R1, R0, 0x400\nCLZ R4, R10\n", 0).unwrap();
        assert_eq!(
            Instr::decode(image[0]).unwrap(),
            Instr::Store {
                rd: 1,
                rs1: 0,
                imm: 0x400
            }
        );
        assert_eq!(
            Instr::decode(image[1]).unwrap(),
            Instr::Clz { rd: 4, rs1: 10 }
        );
    }

    #[test]
    fn octal_immediates_parse() {
        let image = assemble("ADDI R1, R0, 010\n", 0).unwrap();
        assert_eq!(fields::imm16(image[0]), 8);
    }

    #[test]
    fn unknown_mnemonic_is_diagnosed_with_line() {
        let err = assemble("NOP\nFROB R1, R2\n", 0).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, LineError::UnknownMnemonic("FROB".to_string()));
    }

    #[test]
    fn bad_register_is_diagnosed() {
        let err = assemble("ADD R1, R2, X3\n", 0).unwrap_err();
        assert_eq!(err.kind, LineError::InvalidRegister("X3".to_string()));
        let err = assemble("ADD R1, R2, R32\n", 0).unwrap_err();
        assert_eq!(err.kind, LineError::InvalidRegister("R32".to_string()));
    }

    #[test]
    fn undefined_label_is_diagnosed() {
        let err = assemble("JMP nowhere\n", 0).unwrap_err();
        assert_eq!(err.kind, LineError::UndefinedLabel("nowhere".to_string()));
    }

    #[test]
    fn duplicate_label_is_diagnosed() {
        let err = assemble("here:\nNOP\nhere:\n", 0).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.kind, LineError::DuplicateLabel("here".to_string()));
    }

    #[test]
    fn immediate_overflow_is_diagnosed() {
        let err = assemble("ADDI R1, R0, 40000\n", 0).unwrap_err();
        assert_eq!(err.kind, LineError::ImmediateOutOfRange(40000));
    }

    #[test]
    fn branch_offset_overflow_is_diagnosed() {
        // Offset (0x80000 - 4) / 4 words does not fit in 16 bits
        let err = assemble("BEQ R0, R0, 0x80000\n", 0).unwrap_err();
        assert!(matches!(
            err.kind,
            LineError::BranchOffsetOutOfRange { target: 0x80000, .. }
        ));
    }

    #[test]
    fn missing_operand_is_diagnosed() {
        let err = assemble("ADD R1, R2\n", 0).unwrap_err();
        assert_eq!(err.kind, LineError::MissingOperand(3));
    }

    #[test]
    fn image_bytes_are_little_endian() {
        let bytes = image_bytes(&[0x0403_0201, 0x0807_0605]);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
