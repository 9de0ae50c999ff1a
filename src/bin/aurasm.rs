use aurora::asm::{self, lexer};
use clap::Parser;
use std::fs;
use std::process::exit;

/// Assemble AURORA source into a flat binary image
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to input assembly source
    input: String,

    /// Path to output binary image
    output: String,

    /// Base address of the first instruction (decimal, 0x
    /// hexadecimal or 0-prefixed octal)
    #[arg(long, default_value = "0", value_parser = parse_address)]
    addr: u32,
}

fn parse_address(text: &str) -> Result<u32, String> {
    let value = lexer::parse_number(text).map_err(|e| e.to_string())?;
    u32::try_from(value).map_err(|_| format!("address {value} out of range"))
}

fn main() {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("cannot open {}: {e}", args.input);
            exit(1);
        }
    };

    let image = match asm::assemble(&source, args.addr) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("{}: {e}", args.input);
            exit(1);
        }
    };

    if let Err(e) = fs::write(&args.output, asm::image_bytes(&image)) {
        eprintln!("cannot create {}: {e}", args.output);
        exit(1);
    }

    println!(
        "Assembled {} to {} (base {:#x})",
        args.input, args.output, args.addr
    );
}
