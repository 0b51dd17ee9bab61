//! Integer parsing with kernel `kstrtoint` rules.
//!
//! Accepts an optional sign, then a `0x`/`0X` hexadecimal, leading-`0` octal
//! or decimal magnitude, optionally followed by one newline. Nothing else is
//! tolerated, including surrounding whitespace.

use crate::error::ControlError;

pub fn parse_int(input: &str) -> Result<i64, ControlError> {
    let failure = || ControlError::ParseFailure {
        input: input.trim_end().to_string(),
    };

    let body = input.strip_suffix('\n').unwrap_or(input);
    let (negative, magnitude) = match body.as_bytes().first() {
        Some(b'-') => (true, &body[1..]),
        Some(b'+') => (false, &body[1..]),
        _ => (false, body),
    };

    let (digits, radix) = if let Some(hex) = magnitude
        .strip_prefix("0x")
        .or_else(|| magnitude.strip_prefix("0X"))
    {
        (hex, 16)
    } else if magnitude.len() > 1 && magnitude.starts_with('0') {
        (&magnitude[1..], 8)
    } else {
        (magnitude, 10)
    };

    // from_str_radix would accept its own sign character; ours is already consumed.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(failure());
    }

    let value = i64::from_str_radix(digits, radix).map_err(|_| failure())?;
    let value = if negative { -value } else { value };
    i32::try_from(value).map(i64::from).map_err(|_| failure())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_with_and_without_newline() {
        assert_eq!(parse_int("120").unwrap(), 120);
        assert_eq!(parse_int("120\n").unwrap(), 120);
        assert_eq!(parse_int("+7").unwrap(), 7);
        assert_eq!(parse_int("-3").unwrap(), -3);
        assert_eq!(parse_int("0").unwrap(), 0);
    }

    #[test]
    fn hex_and_octal_prefixes() {
        assert_eq!(parse_int("0x1F").unwrap(), 31);
        assert_eq!(parse_int("0X10\n").unwrap(), 16);
        assert_eq!(parse_int("010").unwrap(), 8);
    }

    #[test]
    fn rejects_garbage_and_whitespace() {
        for input in ["", "\n", "abc", "12 13", " 5", "5 ", "5\n\n", "0x", "08", "-", "+-1"] {
            assert!(
                matches!(parse_int(input), Err(ControlError::ParseFailure { .. })),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn rejects_values_outside_i32() {
        assert!(parse_int("2147483648").is_err());
        assert_eq!(parse_int("-2147483648").unwrap(), i64::from(i32::MIN));
    }
}
