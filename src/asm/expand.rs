//! MOVL macro expansion.
//!
//! The macro layer rewrites the MOVL convenience forms into base
//! instructions before assembly; every other line passes through
//! unchanged, so source line numbers survive into diagnostics.
//!
//! * `MOVL #<hex>h, Rn`  becomes `ADDI Rn, R0, 0x<hex>`
//! * `MOVL #<dec>, Rn`   becomes `ADDI Rn, R0, <dec>`
//! * `MOVL Rn, <addr>`   becomes `STORE Rn, R0, <addr>` when the
//!   second operand is a numeric literal

use itertools::Itertools;

pub fn expand_source(source: &str) -> String {
    source.lines().map(expand_line).join("\n")
}

pub fn expand_line(line: &str) -> String {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix("MOVL") else {
        return line.to_string();
    };
    if !rest.starts_with(char::is_whitespace) {
        return line.to_string();
    }
    let Some((first, second)) = rest.split_once(',') else {
        return line.to_string();
    };
    let (first, second) = (first.trim(), second.trim());

    if let Some(imm) = first.strip_prefix('#') {
        if let Some(hex) = imm.strip_suffix('h') {
            if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return format!("ADDI {second}, R0, 0x{hex}");
            }
        }
        if imm.parse::<i64>().is_ok() {
            return format!("ADDI {second}, R0, {imm}");
        }
        return line.to_string();
    }

    if second.starts_with("0x") || second.starts_with("0X")
        || second.starts_with(|c: char| c.is_ascii_digit())
    {
        return format!("STORE {first}, R0, {second}");
    }

    line.to_string()
}
