//! Validation and normalization of user-entered filter values

use serde::Serialize;
use std::num::IntErrorKind;
use thiserror::Error;

use crate::models::packet::{Field, FieldValue};

/// Longest accepted text value; longer input is truncated
pub const TEXT_MAX_LEN: usize = 10;

/// Membership check for a text field. Returns the canonical text on
/// acceptance.
pub type Membership = fn(&str) -> Option<String>;

/// Why a single filter value (or a whole rule) was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("not a number")]
    NotANumber,

    #[error("value must be between {min} and {max}")]
    OutOfRange { min: u32, max: u32 },

    #[error("not a recognised value")]
    NotAMember,

    #[error("rule has no conditions")]
    EmptyRule,
}

/// How a field's input is interpreted
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Free text, optionally restricted by a membership check.
    /// `suggestions` only feed the input's completion list.
    Text {
        max_len: usize,
        suggestions: &'static [&'static str],
        membership: Option<Membership>,
    },

    /// Integer in `radix`, accepted within `[min, max]`, shown
    /// zero-padded to `width` digits
    Integer {
        radix: u32,
        min: u32,
        max: u32,
        width: usize,
    },
}

/// Static declaration of one filterable field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// Result of validating one raw input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    /// Comparison value; `None` is the wildcard
    pub value: Option<FieldValue>,

    /// Canonical text to write back into the input
    pub normalized: String,
}

impl ValidatedInput {
    fn wildcard() -> Self {
        Self {
            value: None,
            normalized: String::new(),
        }
    }
}

impl FieldKind {
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Text { .. })
    }

    /// Canonical text of a value of this kind
    pub fn format(&self, value: &FieldValue) -> String {
        match (self, value) {
            (FieldKind::Integer { radix, width, .. }, FieldValue::Number(n)) => {
                let width = *width;
                match *radix {
                    16 => format!("{:0width$x}", n),
                    8 => format!("{:0width$o}", n),
                    2 => format!("{:0width$b}", n),
                    _ => format!("{:0width$}", n),
                }
            }
            (_, FieldValue::Number(n)) => n.to_string(),
            (_, FieldValue::Text(s)) => s.clone(),
        }
    }
}

impl FieldSpec {
    /// Validate one raw input against this spec
    pub fn validate(&self, raw: &str) -> Result<ValidatedInput, ValidationError> {
        validate(raw, self)
    }
}

/// Validate `raw` against `spec`, producing the canonical value.
/// Blank input is the wildcard.
pub fn validate(raw: &str, spec: &FieldSpec) -> Result<ValidatedInput, ValidationError> {
    let input = raw.trim();
    if input.is_empty() {
        return Ok(ValidatedInput::wildcard());
    }

    let value = match spec.kind {
        FieldKind::Text {
            max_len,
            membership,
            ..
        } => match membership {
            Some(check) => FieldValue::Text(check(input).ok_or(ValidationError::NotAMember)?),
            None => FieldValue::Text(input.chars().take(max_len).collect()),
        },
        FieldKind::Integer {
            radix, min, max, ..
        } => {
            let n = parse_integer(input, radix).ok_or(ValidationError::NotANumber)?;
            if n < i64::from(min) || n > i64::from(max) {
                return Err(ValidationError::OutOfRange { min, max });
            }
            // in [min, max], so fits u32
            FieldValue::Number(n as u32)
        }
    };

    Ok(ValidatedInput {
        normalized: spec.kind.format(&value),
        value: Some(value),
    })
}

/// Parse a signed integer in `radix`, accepting the conventional prefix
/// for radix 16, 8 and 2
fn parse_integer(input: &str, radix: u32) -> Option<i64> {
    let (negative, digits) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    let prefix = match radix {
        16 => Some("0x"),
        8 => Some("0o"),
        2 => Some("0b"),
        _ => None,
    };
    let digits = match prefix {
        Some(p)
            if digits.len() > p.len()
                && digits.get(..p.len()).is_some_and(|d| d.eq_ignore_ascii_case(p)) =>
        {
            &digits[p.len()..]
        }
        _ => digits,
    };

    if !(2..=36).contains(&radix)
        || digits.is_empty()
        || !digits.chars().all(|c| c.is_digit(radix))
    {
        return None;
    }

    let n = match i64::from_str_radix(digits, radix) {
        Ok(n) => n,
        // too large for any field; saturate so the range check rejects it
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
        Err(_) => return None,
    };
    Some(if negative { -n } else { n })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integer(radix: u32, min: u32, max: u32, width: usize) -> FieldSpec {
        FieldSpec {
            field: Field::OperationCode,
            label: "test",
            kind: FieldKind::Integer {
                radix,
                min,
                max,
                width,
            },
        }
    }

    fn text(membership: Option<Membership>) -> FieldSpec {
        FieldSpec {
            field: Field::Head,
            label: "test",
            kind: FieldKind::Text {
                max_len: TEXT_MAX_LEN,
                suggestions: &["HDLMIRACLE"],
                membership,
            },
        }
    }

    fn only_hdlmiracle(s: &str) -> Option<String> {
        (s == "HDLMIRACLE").then(|| s.to_string())
    }

    #[test]
    fn test_blank_is_wildcard() {
        let validated = validate("   ", &integer(10, 0, 255, 0)).unwrap();
        assert_eq!(validated.value, None);
        assert_eq!(validated.normalized, "");

        assert_eq!(validate("", &text(Some(only_hdlmiracle))).unwrap().value, None);
    }

    #[test]
    fn test_decimal_out_of_range() {
        assert_eq!(
            validate("256", &integer(10, 0, 255, 0)),
            Err(ValidationError::OutOfRange { min: 0, max: 255 })
        );
        assert_eq!(
            validate("-1", &integer(10, 0, 255, 0)),
            Err(ValidationError::OutOfRange { min: 0, max: 255 })
        );
    }

    #[test]
    fn test_huge_number_out_of_range() {
        let spec = integer(10, 0, 255, 0);
        assert_eq!(
            validate("99999999999999999999", &spec),
            Err(ValidationError::OutOfRange { min: 0, max: 255 })
        );
        assert_eq!(
            validate("-99999999999999999999", &spec),
            Err(ValidationError::OutOfRange { min: 0, max: 255 })
        );
        assert_eq!(
            validate("0xffffffffffffffffffff", &integer(16, 0, 0xffff, 4)),
            Err(ValidationError::OutOfRange { min: 0, max: 0xffff })
        );
        assert_eq!(
            validate("9999999999999999999x", &spec),
            Err(ValidationError::NotANumber)
        );
    }

    #[test]
    fn test_hex_is_zero_padded() {
        let validated = validate("ff", &integer(16, 0, 0xffff, 4)).unwrap();
        assert_eq!(validated.value, Some(FieldValue::Number(255)));
        assert_eq!(validated.normalized, "00ff");

        let validated = validate(" 0X1A ", &integer(16, 0, 0xffff, 4)).unwrap();
        assert_eq!(validated.normalized, "001a");
    }

    #[test]
    fn test_not_a_number() {
        let spec = integer(10, 0, 255, 0);
        assert_eq!(validate("12a", &spec), Err(ValidationError::NotANumber));
        assert_eq!(validate("0x10", &spec), Err(ValidationError::NotANumber));
        assert_eq!(validate("--1", &spec), Err(ValidationError::NotANumber));
        assert_eq!(validate("gg", &integer(16, 0, 0xffff, 4)), Err(ValidationError::NotANumber));
    }

    #[test]
    fn test_decimal_normalizes_leading_zeros() {
        let validated = validate("007", &integer(10, 0, 255, 0)).unwrap();
        assert_eq!(validated.value, Some(FieldValue::Number(7)));
        assert_eq!(validated.normalized, "7");
    }

    #[test]
    fn test_text_truncated_without_membership() {
        let validated = validate("  toolong-string  ", &text(None)).unwrap();
        assert_eq!(validated.value, Some(FieldValue::Text("toolong-st".to_string())));
        assert_eq!(validated.normalized, "toolong-st");
    }

    #[test]
    fn test_text_membership() {
        let spec = text(Some(only_hdlmiracle));
        assert_eq!(validate("toolong-string", &spec), Err(ValidationError::NotAMember));
        assert_eq!(
            validate(" HDLMIRACLE ", &spec).unwrap().value,
            Some(FieldValue::Text("HDLMIRACLE".to_string()))
        );
    }
}
