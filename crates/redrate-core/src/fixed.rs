//! Checked fixed-point arithmetic and decimal text encoding.
//!
//! All helpers return `None` (or an error) instead of wrapping. Division
//! truncates toward zero, matching the floor-per-multiply rule of the
//! compounder for non-negative operands.

use serde::{Deserialize, Deserializer, Serializer};

use crate::constants::{RAY, WAD};
use crate::error::ConfigError;
use crate::types::Fixed;

/// `a * b / denom`, or `None` on overflow or a zero denominator.
pub fn mul_div(a: Fixed, b: Fixed, denom: Fixed) -> Option<Fixed> {
    if denom == Fixed::ZERO {
        return None;
    }
    a.checked_mul(b)?.checked_div(denom)
}

/// `a * b / RAY`.
pub fn rmul(a: Fixed, b: Fixed) -> Option<Fixed> {
    mul_div(a, b, RAY)
}

/// `a * b / WAD`.
pub fn wmul(a: Fixed, b: Fixed) -> Option<Fixed> {
    mul_div(a, b, WAD)
}

/// `a * RAY / b`.
pub fn rdiv(a: Fixed, b: Fixed) -> Option<Fixed> {
    mul_div(a, RAY, b)
}

/// `10^exp`, or `None` past 256 bits.
pub fn ten_pow(exp: u32) -> Option<Fixed> {
    let ten = Fixed::new(10);
    (0..exp).try_fold(Fixed::ONE, |acc, _| acc.checked_mul(ten))
}

/// Parse a raw fixed-point integer such as `"1_000_000_000_000_000_000"`.
///
/// Underscores and surrounding whitespace are ignored.
pub fn parse_fixed(text: &str) -> Result<Fixed, ConfigError> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    cleaned.parse::<Fixed>().map_err(|_| ConfigError::Parse {
        value: text.to_string(),
    })
}

/// Parse a human decimal such as `"1.05"` or `"-0.5"` into a fixed-point
/// integer with `decimals` fractional digits. Extra digits are truncated.
///
/// # Examples
///
/// ```
/// use redrate_core::constants::RAY;
/// use redrate_core::fixed::parse_decimal;
/// use redrate_core::types::Fixed;
///
/// let v = parse_decimal("1.05", 27).unwrap();
/// assert_eq!(v, RAY + RAY / Fixed::new(20));
/// ```
pub fn parse_decimal(text: &str, decimals: u32) -> Result<Fixed, ConfigError> {
    let err = || ConfigError::Parse {
        value: text.to_string(),
    };
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(err());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(err());
    }

    let scale = ten_pow(decimals).ok_or_else(err)?;
    let int_value = if int_part.is_empty() {
        Fixed::ZERO
    } else {
        int_part.parse::<Fixed>().map_err(|_| err())?
    };

    let mut frac_digits: String = frac_part.chars().take(decimals as usize).collect();
    while frac_digits.len() < decimals as usize {
        frac_digits.push('0');
    }
    let frac_value = if frac_digits.is_empty() {
        Fixed::ZERO
    } else {
        frac_digits.parse::<Fixed>().map_err(|_| err())?
    };

    let magnitude = int_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(err)?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Render a fixed-point integer with `decimals` fractional digits,
/// trimming trailing zeros (`1.05`, `-0.5`, `3`).
pub fn format_decimal(value: Fixed, decimals: u32) -> String {
    let Some(scale) = ten_pow(decimals) else {
        return value.to_string();
    };
    let negative = value < Fixed::ZERO;
    let magnitude = value.checked_abs().unwrap_or(Fixed::MAX);
    let int_part = magnitude / scale;
    let frac_part = magnitude % scale;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_part.to_string());
    if frac_part != Fixed::ZERO {
        let digits = format!("{:0>width$}", frac_part.to_string(), width = decimals as usize);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// Serde adapter writing a [`Fixed`] as a decimal integer string.
///
/// TOML and JSON integers cannot carry 10^27-scaled values, so every
/// fixed-point config field goes through this module.
pub mod string {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_fixed(&text).map_err(serde::de::Error::custom)
    }
}
