// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Type normalization of untrusted military rank properties.
//!
//! Sanitization never fails: it only turns whatever the client sent into the shapes that the
//! validator expects, leaving all decisions about acceptability to the validator.  In particular,
//! values that are absent or that coerce to not-a-number are reported as absent so that they become
//! "missing" errors, while any other number (infinities included) is passed through untouched so
//! that out-of-range values become "invalid" errors.

use crate::model::{RawMilitaryRankProps, SanitizedMilitaryRankProps};
use serde_json::{Number, Value};

/// Renders a JSON number the way it would be shown to a user.
///
/// Integers have no decimal part, and very large or very small magnitudes switch to exponent
/// notation with an explicitly signed exponent (`1e+21`, `1e-7`).
fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => float_to_string(f),
        None => n.to_string(),
    }
}

/// Renders a float with plain decimals for magnitudes in `[1e-6, 1e21)` and exponents otherwise.
fn float_to_string(f: f64) -> String {
    if f == 0.0 {
        return "0".to_owned();
    }
    if !f.is_finite() || (1e-6..1e21).contains(&f.abs()) {
        return f.to_string();
    }
    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// Normalizes the abbreviation into a trimmed string, or an empty one if unusable.
fn sanitize_abbreviation(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => number_to_string(n),
        _ => String::new(),
    }
}

/// Parses the digits of an integer literal written in `radix`.
fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// Parses a textual number.  Surrounding whitespace is ignored and a blank string counts as zero.
///
/// Accepts decimal notation, `Infinity` with an optional sign, and unsigned `0x`, `0o` and `0b`
/// integer literals.  Anything else, including `NaN`, is not a number.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    match s {
        "" => return Some(0.0),
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => (),
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix(&s[2..], radix);
    }

    if !s.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Coerces an array into a number by way of its comma-joined textual form.
///
/// Only empty arrays (zero) and single-element arrays can produce a number.
fn array_to_number(items: &[Value]) -> Option<f64> {
    match items {
        [] => Some(0.0),
        [item] => match item {
            Value::Null => Some(0.0),
            Value::Bool(_) | Value::Object(_) => None,
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(s),
            Value::Array(inner) => array_to_number(inner),
        },
        _ => None,
    }
}

/// Normalizes the order into a number, or `None` if absent or not a number.
///
/// Infinities are numbers and are passed through for the validator to reject.
fn sanitize_order(value: Option<&Value>) -> Option<f64> {
    let order = match value? {
        Value::Null => return None,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => parse_number(s)?,
        Value::Array(items) => array_to_number(items)?,
        Value::Object(_) => return None,
    };
    if order.is_nan() {
        None
    } else {
        Some(order)
    }
}

/// Normalizes `raw` props into their canonical types.
pub(super) fn sanitize(raw: &RawMilitaryRankProps) -> SanitizedMilitaryRankProps {
    SanitizedMilitaryRankProps {
        abbreviation: sanitize_abbreviation(raw.abbreviation.as_ref()),
        order: sanitize_order(raw.order.as_ref()),
    }
}
