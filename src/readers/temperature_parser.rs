use crate::error::{ProcessingError, Result};
use crate::utils::constants::{DECIMAL_POINT, MINUS_SIGN};

/// Parse `-?D{1,2}.D` into tenths of a degree (`"-8.2"` -> `-82`).
///
/// The integer width is decided by the byte right after the first digit:
/// a decimal point there means a single integer digit. No whitespace or
/// alternative notations are accepted.
#[inline]
pub fn parse_temperature(field: &[u8]) -> Result<i16> {
    let (negative, digits) = match field.split_first() {
        Some((&MINUS_SIGN, rest)) => (true, rest),
        _ => (false, field),
    };

    if digits.len() < 3 {
        return Err(ProcessingError::invalid_temperature(field));
    }

    let digit = |index: usize| -> Result<i16> {
        let byte = digits[index];
        if byte.is_ascii_digit() {
            Ok(i16::from(byte - b'0'))
        } else {
            Err(ProcessingError::invalid_temperature(field))
        }
    };

    let magnitude = if digits[1] == DECIMAL_POINT {
        // 1.2
        if digits.len() != 3 {
            return Err(ProcessingError::invalid_temperature(field));
        }
        digit(0)? * 10 + digit(2)?
    } else {
        // 12.3
        if digits.len() != 4 || digits[2] != DECIMAL_POINT {
            return Err(ProcessingError::invalid_temperature(field));
        }
        digit(0)? * 100 + digit(1)? * 10 + digit(3)?
    };

    Ok(if negative { -magnitude } else { magnitude })
}
