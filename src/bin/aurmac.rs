use aurora::asm::{self, expand, lexer};
use clap::Parser;
use std::fs;
use std::process::exit;

/// Expand MOVL macros and assemble the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Path to input macro-assembly source
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

    let expanded = expand::expand_source(&source);

    let image = match asm::assemble(&expanded, args.addr) {
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

    println!("Done.");
}
