//! Canonical JSON encoding
//!
//! Exactly one place produces canonical bytes; fingerprints, stored member
//! text and container identity all route through [`encode`].
//!
//! # Canonicalization rules
//!
//! 1. `null`, `true`, `false` are written literally.
//! 2. Integers are plain decimal with a leading `-` only when negative.
//!    Integer zero has no sign.
//! 3. Floats use the shortest digit sequence that round-trips to the same
//!    `f64` and always carry a decimal point: `1.0`, `3.14`, `1.0e300`,
//!    `1.5e-7`. Float `-0.0` keeps its sign. NaN and infinities are rejected.
//! 4. Strings escape `"`, `\`, and every code point below U+0020
//!    (`\b \f \n \r \t` short forms, otherwise `\u00xx` with lowercase hex).
//!    All other code points are emitted as raw UTF-8.
//! 5. Arrays keep element order. Objects are written in byte-wise key order.
//! 6. No whitespace anywhere.
//!
//! [`decode`] is a general JSON parser; it accepts canonical text and any
//! other well-formed JSON, keeping the integer/float distinction of the
//! source literal. The integer literal `-0` decodes to `Int(0)`.

use crate::error::{EncodingError, Error, Result};
use crate::value::Value;
use std::borrow::Cow;
use std::fmt::Write;

/// Literal token for null
pub const NULL_TOKEN: &str = "null";

/// Encode a value to canonical bytes
///
/// # Errors
///
/// Returns [`EncodingError::UnsupportedType`] if the value contains a
/// non-finite float.
pub fn encode(value: &Value) -> std::result::Result<Vec<u8>, EncodingError> {
    to_canonical_string(value).map(String::into_bytes)
}

/// Encode a value to its canonical text
///
/// Canonical output is always valid UTF-8, so the text form is the one
/// stored in member rows.
pub fn to_canonical_string(value: &Value) -> std::result::Result<String, EncodingError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> std::result::Result<(), EncodingError> {
    match value {
        Value::Null => out.push_str(NULL_TOKEN),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Value::Float(f) => write_float(out, *f)?,
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // BTreeMap<String, _> iterates in byte-wise key order
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_float(out: &mut String, f: f64) -> std::result::Result<(), EncodingError> {
    let number = serde_json::Number::from_f64(f)
        .ok_or_else(|| EncodingError::UnsupportedType(format!("non-finite float {}", f)))?;
    let digits = number.to_string();
    match digits.find('e') {
        Some(exp) if !digits[..exp].contains('.') => {
            out.push_str(&digits[..exp]);
            out.push_str(".0");
            out.push_str(&digits[exp..]);
        }
        _ => out.push_str(&digits),
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c < '\u{20}' => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Parse JSON text into a value
///
/// # Errors
///
/// Returns [`Error::Decode`] for malformed JSON, duplicate object keys,
/// integers outside `i64`, or nesting beyond the parser's recursion limit.
pub fn decode(text: &str) -> Result<Value> {
    serde_json::from_str(&unsign_integer_zero(text)).map_err(|e| Error::Decode(e.to_string()))
}

/// Drop the sign from bare `-0` number tokens outside strings.
///
/// serde_json hands `-0` to visitors as the float `-0.0`, which would give
/// integer zero a second canonical form.
fn unsign_integer_zero(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut prev = b' ';

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
        } else if b == b'"' {
            in_string = true;
        } else if b == b'-'
            && matches!(prev, b' ' | b'\t' | b'\n' | b'\r' | b'[' | b',' | b':')
            && bytes.get(i + 1) == Some(&b'0')
            && !matches!(bytes.get(i + 2), Some(b'.' | b'e' | b'E' | b'0'..=b'9'))
        {
            let out = out.get_or_insert_with(|| String::with_capacity(text.len()));
            out.push_str(&text[copied..i]);
            copied = i + 1;
        }
        prev = b;
    }

    match out {
        Some(mut out) => {
            out.push_str(&text[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(text),
    }
}

/// Parse JSON bytes into a value, validating UTF-8 first
///
/// # Errors
///
/// Returns [`EncodingError::InvalidUtf8`] if the bytes are not UTF-8, and
/// the errors of [`decode`] otherwise.
pub fn decode_bytes(bytes: &[u8]) -> Result<Value> {
    let text = std::str::from_utf8(bytes).map_err(|e| EncodingError::InvalidUtf8(e.to_string()))?;
    decode(text)
}

/// Re-emit arbitrary JSON text in canonical form
pub fn canonicalize_text(text: &str) -> Result<String> {
    Ok(to_canonical_string(&decode(text)?)?)
}
