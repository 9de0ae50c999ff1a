//! Line-level lexing for assembly source.
//!
//! One instruction per line. `;` starts a comment running to the end
//! of the line; a line whose last non-whitespace character is `:`
//! defines a label. Mnemonics are case-insensitive, registers are
//! `R<decimal>`, and numeric literals follow strtol conventions
//! (decimal, `0x` hex, leading-`0` octal).

use super::LineError;

/// Strip any comment and surrounding whitespace. Returns None for
/// blank and comment-only lines.
pub fn clean_line(line: &str) -> Option<&str> {
    let without_comment = &line[..line.find(';').unwrap_or(line.len())];
    let trimmed = without_comment.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// If the (cleaned) line is a label definition, return the label name
pub fn label_name(line: &str) -> Option<&str> {
    line.strip_suffix(':').map(str::trim)
}

/// Split a cleaned instruction line into its mnemonic and
/// comma-separated operands
pub fn split_line(line: &str) -> (&str, Vec<&str>) {
    match line.split_once(char::is_whitespace) {
        None => (line, Vec::new()),
        Some((mnemonic, rest)) => (mnemonic, rest.split(',').map(str::trim).collect()),
    }
}

/// Parse `R<digits>` (case-insensitive) into a register index
pub fn parse_register(text: &str) -> Result<u32, LineError> {
    text.strip_prefix(['R', 'r'])
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|index| *index < 32)
        .ok_or_else(|| LineError::InvalidRegister(text.to_string()))
}

/// Parse a numeric literal with strtol base-0 rules: an optional
/// sign, then `0x`/`0X` hex, a leading `0` for octal, or decimal
pub fn parse_number(text: &str) -> Result<i64, LineError> {
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (radix, digits) = if let Some(hex) = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        (16, hex)
    } else if magnitude.len() > 1 && magnitude.starts_with('0') {
        (8, &magnitude[1..])
    } else {
        (10, magnitude)
    };
    let value = i64::from_str_radix(digits, radix)
        .map_err(|_| LineError::MalformedNumber(text.to_string()))?;
    Ok(if negative { -value } else { value })
}
