//! Flat image loading.
//!
//! An image is a headerless stream of 32-bit little-endian words. The
//! loader copies it into memory at a caller-supplied base address
//! (clamped to the end of memory) and points the program counter at
//! the base. When no binary is given, a built-in test program is
//! loaded at address 0 instead.

use std::fs;

use thiserror::Error;

use crate::asm::image_bytes;
use crate::fields::{encode_i, encode_j, encode_r};
use crate::machine::Machine;
use crate::opcodes::*;
use crate::utils::interpret_u16_as_signed;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {message}")]
    Io { path: String, message: String },
}

/// Read a flat binary into memory at the base address and set the
/// program counter to it
pub fn load_binary(machine: &mut Machine, path: &str, base: u32) -> Result<(), LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::Io {
        path: path.to_string(),
        message: e.to_string(),
    })?;
    machine.load_bytes(base, &bytes);
    machine.set_pc(base);
    Ok(())
}

/// Built-in test program: take a lock with CAS, probe a priority mask
/// with CLZ, raise a syscall, halt. Exercises the system opcodes, so
/// it only runs to completion on the 128-bit machine.
pub fn test_program() -> Vec<u32> {
    vec![
        // R1 holds the lock address, R2 the unlocked state, R3 the
        // lock request
        encode_i(OP_ADDI, 1, 0, 0x500),
        encode_i(OP_ADDI, 2, 0, 0),
        encode_i(OP_ADDI, 3, 0, 1),
        encode_r(OP_CAS, 3, 1, 2),
        // Priority probe: R4 = leading zeros of the mask in R10
        encode_i(OP_ADDI, 10, 0, interpret_u16_as_signed(0x8000)),
        encode_r(OP_CLZ, 4, 10, 0),
        // R5 carries a service code for the syscall handler
        encode_i(OP_ADDI, 5, 0, 5),
        encode_j(OP_SYSCALL, 0),
        encode_j(OP_HALT, 0),
    ]
}

pub fn load_test_program(machine: &mut Machine) {
    machine.load_bytes(0, &image_bytes(&test_program()));
    machine.set_pc(0);
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::machine::MachineType;
    use crate::quad::Quad;

    #[test]
    fn binary_loads_at_base_and_sets_pc() {
        let path = std::env::temp_dir().join("aurora_loader_test.bin");
        let image = image_bytes(&[encode_i(OP_ADDI, 1, 0, 3), encode_j(OP_HALT, 0)]);
        fs::write(&path, image).unwrap();

        let mut machine = Machine::new(MachineType::Aur32);
        load_binary(&mut machine, path.to_str().unwrap(), 0x1000).unwrap();
        machine.run().unwrap();
        let Machine::Aur32(cpu) = machine else {
            panic!("expected the 32-bit variant")
        };
        assert_eq!(cpu.registers[1], 3);
        // PC started at the base and advanced past both words
        assert_eq!(cpu.pc, 0x1008);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_binary_is_an_error() {
        let mut machine = Machine::new(MachineType::Aur32);
        let result = load_binary(&mut machine, "/nonexistent/image.bin", 0);
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_program_runs_on_the_128_bit_machine() {
        let mut machine = Machine::new(MachineType::Aur128);
        load_test_program(&mut machine);
        machine.run().unwrap();
        let Machine::Aur128(cpu) = machine else {
            panic!("expected the 128-bit variant")
        };
        // The CAS took the lock and returned the unlocked state
        assert_eq!(cpu.memory.read128(0x500).unwrap(), Quad::from_low(1));
        assert_eq!(cpu.registers[3], Quad::ZERO);
        // The mask immediate sign-extends, so the leading zero count
        // is zero
        assert_eq!(cpu.registers[4], Quad::ZERO);
        assert!(!cpu.running);
    }

    #[test]
    fn test_program_faults_on_the_32_bit_machine() {
        // The built-in sequence uses the system opcodes, which the
        // 32-bit variant rejects
        let mut machine = Machine::new(MachineType::Aur32);
        load_test_program(&mut machine);
        assert!(machine.run().is_err());
    }
}
