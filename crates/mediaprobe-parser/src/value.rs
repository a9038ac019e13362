//! Field typing for flat output.
//!
//! The flat grammar carries no type information. A value that is an unsigned
//! integer or decimal literal (digits, optionally a point and more digits; no
//! sign, no exponent) becomes a number; anything else stays a string.

use serde_json::{Number, Value};

/// Type one raw field value.
///
/// The value is trimmed first. Strings keep their internal whitespace.
pub fn type_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if is_decimal_literal(trimmed) {
        if let Some(number) = to_number(trimmed) {
            return Value::Number(number);
        }
    }
    Value::String(trimmed.to_string())
}

/// `true` for `\d*(\.\d+)?` with at least one digit.
pub fn is_decimal_literal(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, |f| !f.is_empty() && all_digits(f))
}

fn to_number(literal: &str) -> Option<Number> {
    if !literal.contains('.') {
        if let Ok(n) = literal.parse::<u64>() {
            return Some(Number::from(n));
        }
    }
    let padded;
    let literal = if literal.starts_with('.') {
        padded = format!("0{literal}");
        padded.as_str()
    } else {
        literal
    };
    literal.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integers() {
        assert_eq!(type_value("48000"), json!(48000));
        assert_eq!(type_value("0"), json!(0));
        assert_eq!(type_value(" 2 "), json!(2));
        assert_eq!(type_value("007"), json!(7));
    }

    #[test]
    fn decimals() {
        assert_eq!(type_value("1.5"), json!(1.5));
        assert_eq!(type_value("227.160000"), json!(227.16));
        assert_eq!(type_value(".5"), json!(0.5));
    }

    #[test]
    fn oversized_integer_falls_back_to_float() {
        let value = type_value("123456789012345678901234567890");
        assert!(value.is_f64());
    }

    #[test]
    fn non_numeric_stays_string() {
        assert_eq!(type_value("aac"), json!("aac"));
        assert_eq!(type_value("16/9"), json!("16/9"));
        assert_eq!(type_value(""), json!(""));
        assert_eq!(type_value("N/A"), json!("N/A"));
        assert_eq!(type_value("-1"), json!("-1"));
        assert_eq!(type_value("1e5"), json!("1e5"));
        assert_eq!(type_value("5."), json!("5."));
        assert_eq!(type_value("."), json!("."));
        assert_eq!(type_value("1.2.3"), json!("1.2.3"));
    }

    #[test]
    fn strings_are_trimmed_but_keep_inner_whitespace() {
        assert_eq!(type_value("  Lavf 58.76.100 \t"), json!("Lavf 58.76.100"));
    }

    #[test]
    fn literal_detection() {
        assert!(is_decimal_literal("10"));
        assert!(is_decimal_literal("0.25"));
        assert!(!is_decimal_literal(""));
        assert!(!is_decimal_literal("+1"));
        assert!(!is_decimal_literal("1,5"));
    }
}
