//! The 32-bit machine core.
//!
//! Thirty-two 32-bit scalar registers, a 32-bit program counter, and
//! the base opcode set. R30 starts as the stack pointer (last aligned
//! word of memory) and R31 is the link register. The system opcodes
//! (RETI, SYSCALL, CLZ, CAS) are not supported on this variant and
//! terminate execution as invalid opcodes.

use crate::instr::Instr;
use crate::memory::{Memory, MEMORY_SIZE};

use super::ExecError;

#[derive(Debug)]
pub struct Aur32 {
    pub registers: [u32; 32],
    pub pc: u32,
    pub running: bool,
    pub memory: Memory,
}

impl Aur32 {
    pub fn new() -> Self {
        let mut registers = [0u32; 32];
        registers[30] = MEMORY_SIZE - 4;
        Self {
            registers,
            pc: 0,
            running: true,
            memory: Memory::new(),
        }
    }

    /// Fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<(), ExecError> {
        let word = self.memory.read32(self.pc)?;
        self.pc = self.pc.wrapping_add(4);
        let instr = Instr::decode(word)?;
        self.execute(instr)?;
        // R0 is wired to zero at every fetch
        self.registers[0] = 0;
        Ok(())
    }

    fn execute(&mut self, instr: Instr) -> Result<(), ExecError> {
        match instr {
            Instr::Nop => {}
            Instr::Add { rd, rs1, rs2 } => {
                self.registers[rd as usize] =
                    self.registers[rs1 as usize].wrapping_add(self.registers[rs2 as usize]);
            }
            Instr::Sub { rd, rs1, rs2 } => {
                self.registers[rd as usize] =
                    self.registers[rs1 as usize].wrapping_sub(self.registers[rs2 as usize]);
            }
            Instr::Addi { rd, rs1, imm } => {
                self.registers[rd as usize] =
                    self.registers[rs1 as usize].wrapping_add_signed(imm.into());
            }
            Instr::Load { rd, rs1, imm } => {
                let address = self.registers[rs1 as usize].wrapping_add_signed(imm.into());
                self.registers[rd as usize] = self.memory.read32(address)?;
            }
            Instr::Store { rd, rs1, imm } => {
                let address = self.registers[rs1 as usize].wrapping_add_signed(imm.into());
                self.memory.write32(address, self.registers[rd as usize])?;
            }
            Instr::Jmp { addr } => {
                self.pc = addr;
            }
            Instr::Beq { rd, rs1, imm } => {
                if self.registers[rd as usize] == self.registers[rs1 as usize] {
                    self.pc = self.pc.wrapping_add_signed(i32::from(imm) * 4);
                }
            }
            Instr::Halt => {
                self.running = false;
            }
            Instr::Call { addr } => {
                self.registers[31] = self.pc;
                self.pc = addr;
            }
            Instr::Ret => {
                self.pc = self.registers[31];
            }
            // The system opcodes exist only on the 128-bit machine
            Instr::Reti | Instr::Syscall | Instr::Clz { .. } | Instr::Cas { .. } => {
                return Err(ExecError::Unsupported(instr.opcode()));
            }
        }
        Ok(())
    }
}

impl Default for Aur32 {
    fn default() -> Self {
        Self::new()
    }
}
