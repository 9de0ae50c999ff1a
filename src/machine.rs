//! Machine variants and the dispatch layer.
//!
//! The boot options select one of two cores: the 32-bit `Aur32` or
//! the 128-bit `Aur128`. The selection is carried in the `Machine`
//! sum type, and everything the host needs (stepping, loading,
//! console draining, the state dump) dispatches on it. There is no
//! process-wide machine-type state.

use itertools::Itertools;
use thiserror::Error;

use crate::instr::DecodeError;
use crate::memory::MemoryFault;

pub use self::aur128::Aur128;
pub use self::aur32::Aur32;

pub mod aur128;
pub mod aur32;

/// Host-fatal execution failures. On the 128-bit machine an invalid
/// opcode pends an interrupt instead of surfacing here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error(transparent)]
    Memory(#[from] MemoryFault),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("invalid opcode {0}")]
    Unsupported(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineType {
    Aur32,
    Aur128,
}

#[derive(Debug)]
pub enum Machine {
    Aur32(Aur32),
    Aur128(Aur128),
}

impl Machine {
    pub fn new(machine_type: MachineType) -> Self {
        match machine_type {
            MachineType::Aur32 => Self::Aur32(Aur32::new()),
            MachineType::Aur128 => Self::Aur128(Aur128::new()),
        }
    }

    pub fn machine_type(&self) -> MachineType {
        match self {
            Self::Aur32(_) => MachineType::Aur32,
            Self::Aur128(_) => MachineType::Aur128,
        }
    }

    pub fn running(&self) -> bool {
        match self {
            Self::Aur32(cpu) => cpu.running,
            Self::Aur128(cpu) => cpu.running,
        }
    }

    pub fn step(&mut self) -> Result<(), ExecError> {
        match self {
            Self::Aur32(cpu) => cpu.step(),
            Self::Aur128(cpu) => cpu.step(),
        }
    }

    /// Step until the guest halts
    pub fn run(&mut self) -> Result<(), ExecError> {
        while self.running() {
            self.step()?;
        }
        Ok(())
    }

    /// Copy an image into memory starting at base, clamped to the end
    /// of memory
    pub fn load_bytes(&mut self, base: u32, bytes: &[u8]) {
        match self {
            Self::Aur32(cpu) => cpu.memory.load_bytes(base, bytes),
            Self::Aur128(cpu) => cpu.memory.load_bytes(base, bytes),
        }
    }

    pub fn set_pc(&mut self, address: u32) {
        match self {
            Self::Aur32(cpu) => cpu.pc = address,
            Self::Aur128(cpu) => cpu.pc.low = address,
        }
    }

    /// Drain the bytes the guest has written to the console window
    pub fn flush_console(&mut self) -> Vec<u8> {
        match self {
            Self::Aur32(cpu) => cpu.memory.flush_console(),
            Self::Aur128(cpu) => cpu.memory.flush_console(),
        }
    }

    /// Diagnostic register dump: R0..R31 and the program counter
    pub fn dump(&self) -> String {
        match self {
            Self::Aur32(cpu) => {
                let registers = cpu
                    .registers
                    .iter()
                    .enumerate()
                    .map(|(i, value)| format!("R{i} = {value}"))
                    .join("\n");
                format!("Dumping machine state...\n{registers}\nPC = {}", cpu.pc)
            }
            Self::Aur128(cpu) => {
                let registers = cpu
                    .registers
                    .iter()
                    .enumerate()
                    .map(|(i, value)| format!("R{i} = {value}"))
                    .join("\n");
                format!("Dumping machine state...\n{registers}\nPC = {}", cpu.pc)
            }
        }
    }
}
