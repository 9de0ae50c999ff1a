//! The 128-bit machine core.
//!
//! Registers and the program counter widen to four-limb quadwords;
//! decode stays identical to the 32-bit machine. This variant adds
//! the vectored interrupt mechanism and the system opcodes: RETI,
//! SYSCALL, CLZ and CAS.
//!
//! Interrupts are level-triggered pending bits dispatched only at
//! fetch boundaries: when interrupts are enabled and a bit is
//! pending, the step consumes the cycle by saving the current PC and
//! redirecting to the vector, without fetching an instruction. The
//! saved PC lives in a dedicated interrupt-return register restored
//! by RETI; R30 remains the stack pointer.

use crate::fields::encode_j;
use crate::instr::{DecodeError, Instr};
use crate::memory::{Memory, MEMORY_SIZE};
use crate::opcodes::{OP_HALT, OP_RETI};
use crate::quad::Quad;

use super::ExecError;

pub const VECTOR_BASE: u32 = 0x200;
pub const VECTOR_SIZE: u32 = 4;
pub const VECTOR_COUNT: usize = 16;

/// Interrupt line raised on an invalid opcode; its default vector
/// holds HALT
pub const INT_INVALID: u32 = 0;
/// Interrupt line raised by SYSCALL
pub const INT_SOFTWARE: u32 = 2;

#[derive(Debug)]
pub struct Aur128 {
    pub registers: [Quad; 32],
    pub pc: Quad,
    pub running: bool,
    /// Interrupt enable flag
    pub ie: bool,
    /// Level-triggered pending bitmask, one bit per line
    pub pending: u16,
    pub vectors: [Quad; VECTOR_COUNT],
    irq_return_pc: Quad,
    pub memory: Memory,
}

impl Aur128 {
    /// A reset machine: vectors point at `VECTOR_BASE + i*VECTOR_SIZE`
    /// and each vector slot in memory is seeded with RETI, except the
    /// invalid-opcode vector which gets HALT.
    pub fn new() -> Self {
        let mut memory = Memory::new();
        let mut vectors = [Quad::ZERO; VECTOR_COUNT];
        for (i, vector) in vectors.iter_mut().enumerate() {
            let address = VECTOR_BASE + i as u32 * VECTOR_SIZE;
            *vector = Quad::from_low(address);
            let word = if i as u32 == INT_INVALID {
                encode_j(OP_HALT, 0)
            } else {
                encode_j(OP_RETI, 0)
            };
            memory
                .write32(address, word)
                .expect("vector table lies inside memory");
        }
        let mut registers = [Quad::ZERO; 32];
        registers[30] = Quad::from_low(MEMORY_SIZE - 4);
        Self {
            registers,
            pc: Quad::ZERO,
            running: true,
            ie: true,
            pending: 0,
            vectors,
            irq_return_pc: Quad::ZERO,
            memory,
        }
    }

    /// Set the pending bit for an interrupt line. Lines at or above
    /// `VECTOR_COUNT` are ignored.
    pub fn raise_interrupt(&mut self, irq: u32) {
        if irq as usize >= VECTOR_COUNT {
            return;
        }
        self.pending |= 1 << irq;
    }

    /// If enabled and anything is pending, dispatch the lowest-index
    /// line: clear its bit, save the PC and redirect to the vector.
    fn dispatch_interrupt(&mut self) -> bool {
        if !self.ie || self.pending == 0 {
            return false;
        }
        let irq = self.pending.trailing_zeros();
        self.pending &= !(1 << irq);
        self.irq_return_pc = self.pc;
        self.pc = self.vectors[irq as usize];
        true
    }

    /// Run one cycle: either dispatch a pending interrupt, or fetch,
    /// decode and execute one instruction
    pub fn step(&mut self) -> Result<(), ExecError> {
        if self.dispatch_interrupt() {
            return Ok(());
        }
        let word = self.memory.read32(self.pc.low)?;
        self.pc.low = self.pc.low.wrapping_add(4);
        match Instr::decode(word) {
            Ok(instr) => self.execute(instr)?,
            Err(DecodeError::InvalidOpcode(op)) => {
                eprintln!("INVALID OPCODE {op}");
                self.raise_interrupt(INT_INVALID);
            }
        }
        self.registers[0] = Quad::ZERO;
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
                    self.registers[rs1 as usize].wrapping_add(Quad::from_imm16(imm));
            }
            Instr::Load { rd, rs1, imm } => {
                let address = self.effective_address(rs1, imm);
                self.registers[rd as usize] = self.memory.read128(address)?;
            }
            Instr::Store { rd, rs1, imm } => {
                let address = self.effective_address(rs1, imm);
                self.memory.write128(address, self.registers[rd as usize])?;
            }
            Instr::Jmp { addr } => {
                self.pc.low = addr;
            }
            Instr::Beq { rd, rs1, imm } => {
                // Only the Low limbs take part in the comparison
                if self.registers[rd as usize].low == self.registers[rs1 as usize].low {
                    self.pc.low = self.pc.low.wrapping_add_signed(i32::from(imm) * 4);
                }
            }
            Instr::Halt => {
                self.running = false;
            }
            Instr::Call { addr } => {
                self.registers[31] = self.pc;
                self.pc.low = addr;
            }
            Instr::Ret => {
                self.pc = self.registers[31];
            }
            Instr::Reti => {
                self.pc = self.irq_return_pc;
            }
            Instr::Clz { rd, rs1 } => {
                self.registers[rd as usize] =
                    Quad::from_low(self.registers[rs1 as usize].leading_zeros());
            }
            Instr::Cas { rd, rs1, rs2 } => {
                let address = self.registers[rs1 as usize].low;
                let current = self.memory.read128(address)?;
                if current == self.registers[rs2 as usize] {
                    self.memory.write128(address, self.registers[rd as usize])?;
                }
                // The caller always observes the prior memory value
                self.registers[rd as usize] = current;
            }
            Instr::Syscall => {
                self.raise_interrupt(INT_SOFTWARE);
            }
        }
        Ok(())
    }

    /// Effective address arithmetic works on the Low limb only
    fn effective_address(&self, rs1: u8, imm: i16) -> u32 {
        self.registers[rs1 as usize].low.wrapping_add_signed(imm.into())
    }
}

impl Default for Aur128 {
    fn default() -> Self {
        Self::new()
    }
}
