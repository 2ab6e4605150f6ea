use crate::foundation::error::DecodeError;

/// The 83 symbols, in digit order.
pub const ALPHABET: &[u8; 83] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz#$%*+,-.:;=?@[]^_{|}~";

const INVALID: u8 = u8::MAX;

static DIGITS: [u8; 128] = build_digits();

const fn build_digits() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

fn digit(symbol: char) -> Option<u64> {
    let idx = symbol as usize;
    if idx >= DIGITS.len() || DIGITS[idx] == INVALID {
        return None;
    }
    Some(u64::from(DIGITS[idx]))
}

/// Whether `symbol` belongs to the base83 alphabet.
pub fn is_symbol(symbol: char) -> bool {
    digit(symbol).is_some()
}

/// Decode a base83 string, most significant symbol first.
pub fn decode(symbols: &str) -> Result<u64, DecodeError> {
    let mut value = 0u64;
    for (position, symbol) in symbols.chars().enumerate() {
        let d = digit(symbol).ok_or(DecodeError::InvalidSymbol { symbol, position })?;
        value = value
            .checked_mul(83)
            .and_then(|v| v.checked_add(d))
            .ok_or(DecodeError::Overflow)?;
    }
    Ok(value)
}

/// Encode `value` as exactly `length` symbols. Higher digits that do not fit are dropped.
pub fn encode(value: u64, length: usize) -> String {
    let mut out = vec![b'0'; length];
    let mut rest = value;
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(rest % 83) as usize];
        rest /= 83;
    }
    out.into_iter().map(char::from).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/codec/base83.rs"]
mod tests;
