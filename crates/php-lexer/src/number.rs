//! Numeric literal classification.
//!
//! Integer literals are accumulated in checked 64-bit arithmetic; once a
//! digit overflows, accumulation continues in `f64` and the literal is
//! reported as a float. Digit-count checks only short-circuit the common
//! case and never change the result.

/// Result of reading an integer literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegerLiteral {
    Int(i64),
    /// The value overflowed `i64` and was accumulated as a float.
    Overflow(f64),
}

/// Result of reading a real literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealLiteral {
    pub value: f64,
    pub overflowed: bool,
}

/// Digit characters after any `0x`/`0b`/`0o` prefix, leading zeros and
/// separators stripped.
fn significant_digits(digits: &[char], radix: u32) -> impl Iterator<Item = u32> + Clone + '_ {
    digits
        .iter()
        .filter(|&&c| c != '_')
        .skip_while(|&&c| c == '0')
        .map_while(move |c| c.to_digit(radix))
}

/// Whether a literal with `count` significant digits is certain to fit in
/// an `i64`.
pub(crate) fn fits_by_digit_count(count: usize, radix: u32) -> bool {
    match radix {
        2 => count < 64,
        8 => count < 22,
        10 => count < 19,
        16 => count < 16,
        _ => false,
    }
}

/// Read the digits of an integer literal in the given radix.
///
/// `digits` excludes any radix prefix and may contain `_` separators.
/// Reading stops at the first character that is not a digit of `radix`.
pub fn parse_integer(digits: &[char], radix: u32) -> IntegerLiteral {
    let significant = significant_digits(digits, radix);
    let count = significant.clone().count();

    if radix == 16 {
        return parse_hex(significant, count);
    }
    if fits_by_digit_count(count, radix) {
        let value = significant.fold(0i64, |acc, d| acc * i64::from(radix) + i64::from(d));
        return IntegerLiteral::Int(value);
    }
    accumulate(significant, radix)
}

/// Hex literals fit when fewer than 16 digits remain, or exactly 16 with a
/// first digit below 8.
fn parse_hex(digits: impl Iterator<Item = u32> + Clone, count: usize) -> IntegerLiteral {
    let fits = count < 16 || (count == 16 && digits.clone().next().is_some_and(|d| d < 8));
    if fits {
        IntegerLiteral::Int(digits.fold(0i64, |acc, d| (acc << 4) | i64::from(d)))
    } else {
        let value = digits.fold(0f64, |acc, d| acc * 16.0 + f64::from(d));
        IntegerLiteral::Overflow(value)
    }
}

/// Exact overflow-checked accumulation with a float fallback.
pub(crate) fn accumulate(digits: impl Iterator<Item = u32>, radix: u32) -> IntegerLiteral {
    let base = i64::from(radix);
    let mut value: i64 = 0;
    let mut digits = digits;
    while let Some(d) = digits.next() {
        match value.checked_mul(base).and_then(|v| v.checked_add(i64::from(d))) {
            Some(next) => value = next,
            None => {
                let mut float = value as f64 * f64::from(radix) + f64::from(d);
                for d in digits {
                    float = float * f64::from(radix) + f64::from(d);
                }
                return IntegerLiteral::Overflow(float);
            }
        }
    }
    IntegerLiteral::Int(value)
}

/// Parse a real literal such as `1.5`, `.5e3` or `1_000.0`.
///
/// An overflow produces an infinity signed like the literal.
pub fn parse_real(text: &str) -> RealLiteral {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let value = cleaned.parse::<f64>().unwrap_or(0.0);
    if value.is_infinite() {
        let value = if cleaned.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return RealLiteral {
            value,
            overflowed: true,
        };
    }
    RealLiteral {
        value,
        overflowed: false,
    }
}
