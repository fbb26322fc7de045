//! Random program-name generation.
//!
//! Synthesized view programs need globally unique, syntactically valid
//! identifiers. Names are fixed-format — 16 lowercase alphanumerics, first
//! character alphabetic — but cryptographically unpredictable: 128 bits from
//! the operating system's secure source, fixed-radix encoded.

use rand::rngs::OsRng;
use rand::RngCore;

const LETTERS: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHANUMERICS: &[u8; 36] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Total generated length, first character included.
pub const PROGRAM_NAME_LEN: usize = 16;

/// Generate a fresh program name from secure randomness.
pub fn random_program_name() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    encode(u128::from_le_bytes(bytes))
}

/// Fixed-radix encoding: one base-26 digit (the leading letter) followed by
/// base-36 digits.
fn encode(mut value: u128) -> String {
    let mut name = String::with_capacity(PROGRAM_NAME_LEN);
    name.push(LETTERS[(value % 26) as usize] as char);
    value /= 26;
    for _ in 1..PROGRAM_NAME_LEN {
        name.push(ALPHANUMERICS[(value % 36) as usize] as char);
        value /= 36;
    }
    name
}
