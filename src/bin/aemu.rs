use aurora::asm::lexer;
use aurora::loader::{load_binary, load_test_program};
use aurora::machine::{ExecError, Machine, MachineType};
use clap::{Parser, ValueEnum};
use std::io::{self, Write};
use std::process::exit;

/// Emulate an AURORA machine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to a flat binary image to load
    #[arg(long)]
    bin: Option<String>,

    /// Load and start address (decimal, 0x hexadecimal or 0-prefixed
    /// octal)
    #[arg(long, default_value = "0x1000", value_parser = parse_address)]
    addr: u32,

    /// Machine variant to boot
    #[arg(long, value_enum, default_value = "aur32")]
    cpu: CpuType,

    /// Load the built-in test program instead of a binary
    #[arg(long)]
    test: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CpuType {
    Aur32,
    Aur128,
}

impl From<CpuType> for MachineType {
    fn from(cpu: CpuType) -> Self {
        match cpu {
            CpuType::Aur32 => MachineType::Aur32,
            CpuType::Aur128 => MachineType::Aur128,
        }
    }
}

fn parse_address(text: &str) -> Result<u32, String> {
    let value = lexer::parse_number(text).map_err(|e| e.to_string())?;
    u32::try_from(value).map_err(|_| format!("address {value} out of range"))
}

/// Write the guest's console bytes through to stdout
fn drain_console(machine: &mut Machine) {
    let bytes = machine.flush_console();
    if bytes.is_empty() {
        return;
    }
    let mut stdout = io::stdout();
    stdout
        .write_all(&bytes)
        .and_then(|()| stdout.flush())
        .expect("console write to stdout should work");
}

fn main() {
    let args = Args::parse();

    let mut machine = Machine::new(args.cpu.into());

    // No binary means the built-in test program
    let use_test_program = args.test || args.bin.is_none();
    if use_test_program {
        load_test_program(&mut machine);
    } else if let Some(bin) = &args.bin {
        if let Err(e) = load_binary(&mut machine, bin, args.addr) {
            eprintln!("{e}");
            exit(1);
        }
    }

    while machine.running() {
        let result = machine.step();
        drain_console(&mut machine);
        if let Err(e) = result {
            match e {
                ExecError::Memory(fault) => {
                    eprintln!("***MEMORY FAULT {fault} stopping execution")
                }
                other => eprintln!("{other}"),
            }
            exit(1);
        }
    }

    println!("{}", machine.dump());
}
