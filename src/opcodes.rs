//! Opcode values for the AURORA instruction set.
//!
//! All three instruction formats carry the opcode in bits 31..26.
//! The values 13, 15 and 17..63 are reserved; fetching one of them
//! traps (host-fatal on the 32-bit machine, the invalid-opcode
//! interrupt on the 128-bit machine).

pub const OP_NOP: u32 = 0;
pub const OP_ADD: u32 = 1;
pub const OP_SUB: u32 = 2;
pub const OP_ADDI: u32 = 3;
pub const OP_LOAD: u32 = 4;
pub const OP_STORE: u32 = 5;
pub const OP_JMP: u32 = 6;
pub const OP_BEQ: u32 = 7;
pub const OP_HALT: u32 = 8;
pub const OP_CALL: u32 = 9;
pub const OP_RET: u32 = 10;
pub const OP_RETI: u32 = 11;
pub const OP_SYSCALL: u32 = 12;
pub const OP_CLZ: u32 = 14;
pub const OP_CAS: u32 = 16;
