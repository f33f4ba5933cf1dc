// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Literal forms for primitives, keys and patterns.
//!
//! Output must stay inert when pasted inside a `<script>` element, so `<`,
//! `>` and `/` never appear raw inside string or pattern literals, and line
//! terminators never appear raw at all.

use crate::value::{JsString, Scalar, Value};

/// Append the canonical literal of a primitive.
///
/// Objects and functions are not primitives; they render as `void 0` here
/// and must be handled by the emitter before reaching this point.
pub fn primitive(value: &Value, out: &mut String) {
    match value {
        Value::Undefined | Value::Object(_) | Value::Function(_) => out.push_str("void 0"),
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => number(*n, out),
        Value::BigInt(n) => {
            out.push_str(&n.to_string());
            out.push('n');
        }
        Value::String(s) => text(s, out),
    }
}

/// Append the literal of a boxed scalar's inner primitive.
pub fn scalar(scalar: &Scalar, out: &mut String) {
    primitive(&Value::from(scalar), out);
}

/// Append a number: `-0` is kept, and a leading `0` before the decimal point
/// is dropped (`0.5` becomes `.5`).
pub fn number(n: f64, out: &mut String) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == 0.0 {
        out.push_str(if n.is_sign_negative() { "-0" } else { "0" });
    } else {
        let s = ecma_number(n);
        if let Some(rest) = s.strip_prefix("0.") {
            out.push('.');
            out.push_str(rest);
        } else if let Some(rest) = s.strip_prefix("-0.") {
            out.push_str("-.");
            out.push_str(rest);
        } else {
            out.push_str(&s);
        }
    }
}

/// `Number.prototype.toString()` for finite, non-zero `n`.
fn ecma_number(n: f64) -> String {
    let sign = if n < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-tripping digits, e.g. `1.2345e4`.
    let sci = format!("{:e}", n.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return n.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let point = exp.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        let zeros = usize::try_from(point - k).unwrap_or(0);
        format!("{digits}{}", "0".repeat(zeros))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(usize::try_from(point).unwrap_or(0));
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        let zeros = usize::try_from(-point).unwrap_or(0);
        format!("0.{}{digits}", "0".repeat(zeros))
    } else {
        let e = point - 1;
        let e_sign = if e < 0 { '-' } else { '+' };
        let (lead, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{lead}e{e_sign}{}", e.abs())
        } else {
            format!("{lead}.{rest}e{e_sign}{}", e.abs())
        }
    };
    format!("{sign}{body}")
}

/// Append a double-quoted string literal.
///
/// Surrogate pairs pass through as their character; lone surrogates become
/// `\uXXXX` with uppercase hex.
pub fn text(s: &JsString, out: &mut String) {
    out.push('"');
    let mut chars = char::decode_utf16(s.units().iter().copied()).peekable();
    while let Some(next) = chars.next() {
        let c = match next {
            Ok(c) => c,
            Err(err) => {
                out.push_str(&format!("\\u{:04X}", err.unpaired_surrogate()));
                continue;
            }
        };
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '<' => out.push_str("\\u003C"),
            '>' => out.push_str("\\u003E"),
            '/' => out.push_str("\\u002F"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            // `\0` followed by a digit would read as a legacy octal escape.
            '\0' if matches!(chars.peek(), Some(Ok(d)) if d.is_ascii_digit()) => {
                out.push_str("\\u0000");
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// True for `[_$A-Za-z][_$A-Za-z0-9]*`.
pub fn is_identifier(s: &JsString) -> bool {
    let is_start = |u: u16| {
        u8::try_from(u).is_ok_and(|b| b == b'_' || b == b'$' || b.is_ascii_alphabetic())
    };
    let is_part = |u: u16| is_start(u) || u8::try_from(u).is_ok_and(|b| b.is_ascii_digit());
    match s.units().split_first() {
        Some((first, rest)) => is_start(*first) && rest.iter().all(|u| is_part(*u)),
        None => false,
    }
}

/// Append an object-literal key: bare when identifier-shaped, quoted
/// otherwise. `__proto__` is emitted computed so it stays an own property.
pub fn key(k: &JsString, out: &mut String) {
    if *k == "__proto__" {
        out.push('[');
        text(k, out);
        out.push(']');
    } else if is_identifier(k) {
        out.push_str(&k.to_string());
    } else {
        text(k, out);
    }
}

/// Append a property accessor: `.name` or `["quoted"]`.
pub fn property(k: &JsString, out: &mut String) {
    if is_identifier(k) {
        out.push('.');
        out.push_str(&k.to_string());
    } else {
        out.push('[');
        text(k, out);
        out.push(']');
    }
}

/// Append a regular-expression literal `/source/flags`.
///
/// The literal matches the same strings as the input pattern, but its
/// `.source` can differ: `<` is written `\x3C` and a bare `/` outside a class
/// is written `\/`, so `a/[/]b<` reads back with source `a\/[/]b\x3C`.
/// A raw `<` could close the enclosing script element.
pub fn regexp(source: &str, flags: &str, out: &mut String) {
    out.push('/');
    if source.is_empty() {
        out.push_str("(?:)");
    }
    let mut in_class = false;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('<') => out.push_str("\\x3C"),
                Some(escaped) => {
                    out.push('\\');
                    pattern_char(escaped, out);
                }
                None => out.push_str("\\\\"),
            },
            '[' if !in_class => {
                in_class = true;
                out.push(c);
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            '/' if !in_class => out.push_str("\\/"),
            c => pattern_char(c, out),
        }
    }
    out.push('/');
    out.push_str(flags);
}

fn pattern_char(c: char, out: &mut String) {
    match c {
        '<' => out.push_str("\\x3C"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\u{2028}' => out.push_str("\\u2028"),
        '\u{2029}' => out.push_str("\\u2029"),
        c => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> String {
        let mut out = String::new();
        number(n, &mut out);
        out
    }

    fn string(s: &str) -> String {
        let mut out = String::new();
        text(&s.into(), &mut out);
        out
    }

    fn pattern(source: &str, flags: &str) -> String {
        let mut out = String::new();
        regexp(source, flags, &mut out);
        out
    }

    #[test]
    fn numbers_follow_ecmascript_formatting() {
        assert_eq!(num(-0.0), "-0");
        assert_eq!(num(0.0), "0");
        assert_eq!(num(0.5), ".5");
        assert_eq!(num(-0.5), "-.5");
        assert_eq!(num(1.0), "1");
        assert_eq!(num(-42.0), "-42");
        assert_eq!(num(1.25), "1.25");
        assert_eq!(num(123_456.789), "123456.789");
        assert_eq!(num(1e21), "1e+21");
        assert_eq!(num(1.5e21), "1.5e+21");
        assert_eq!(num(1e20), "100000000000000000000");
        assert_eq!(num(0.000_001), ".000001");
        assert_eq!(num(1e-7), "1e-7");
        assert_eq!(num(-2.5e-8), "-2.5e-8");
        assert_eq!(num(f64::NAN), "NaN");
        assert_eq!(num(f64::INFINITY), "Infinity");
        assert_eq!(num(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn text_escapes_markup_and_control_characters() {
        assert_eq!(string("</script>"), r#""\u003C\u002Fscript\u003E""#);
        assert_eq!(string("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(string("\u{8}\u{c}\n\r\t"), r#""\b\f\n\r\t""#);
        assert_eq!(string("\u{2028}\u{2029}"), r#""\u2028\u2029""#);
        assert_eq!(string("\0x"), r#""\0x""#);
        assert_eq!(string("\u{0}1"), r#""\u00001""#);
        assert_eq!(string("héllo 😀"), "\"héllo 😀\"");
    }

    #[test]
    fn lone_surrogates_are_escaped_uppercase() {
        let mut out = String::new();
        text(&JsString::from_utf16(vec![0x61, 0xD83D, 0x62, 0xDE00]), &mut out);
        assert_eq!(out, r#""a\uD83Db\uDE00""#);

        let mut out = String::new();
        text(&JsString::from_utf16(vec![0xD83D, 0xDE00]), &mut out);
        assert_eq!(out, "\"😀\"");
    }

    #[test]
    fn keys_are_bare_only_when_identifier_shaped() {
        let render = |k: &str| {
            let mut out = String::new();
            key(&k.into(), &mut out);
            out
        };
        assert_eq!(render("abc"), "abc");
        assert_eq!(render("_$x9"), "_$x9");
        assert_eq!(render("9x"), "\"9x\"");
        assert_eq!(render("a-b"), "\"a-b\"");
        assert_eq!(render(""), "\"\"");
        assert_eq!(render("é"), "\"é\"");
        assert_eq!(render("__proto__"), "[\"__proto__\"]");
    }

    #[test]
    fn property_access_forms() {
        let render = |k: &str| {
            let mut out = String::new();
            property(&k.into(), &mut out);
            out
        };
        assert_eq!(render("x"), ".x");
        assert_eq!(render("two words"), "[\"two words\"]");
    }

    #[test]
    fn regexp_literals_stay_embeddable() {
        assert_eq!(pattern("ab+c", "gi"), "/ab+c/gi");
        assert_eq!(pattern("", ""), "/(?:)/");
        assert_eq!(pattern("<\\/script>", ""), "/\\x3C\\/script>/");
        assert_eq!(pattern("a/b", ""), "/a\\/b/");
        assert_eq!(pattern("[/]", "u"), "/[/]/u");
        assert_eq!(pattern("\\<", ""), "/\\x3C/");
    }

    #[test]
    fn regexp_source_is_rewritten_for_embedding() {
        // Same language, different `.source`; `<` must never appear raw.
        let out = pattern("a/[/]b<", "");
        assert_eq!(out, r"/a\/[/]b\x3C/");
        assert!(!out.contains('<'));
    }

    #[test]
    fn primitives() {
        let render = |v: Value| {
            let mut out = String::new();
            primitive(&v, &mut out);
            out
        };
        assert_eq!(render(Value::Undefined), "void 0");
        assert_eq!(render(Value::Null), "null");
        assert_eq!(render(Value::Bool(true)), "true");
        assert_eq!(render(Value::BigInt(-12)), "-12n");
        assert_eq!(render(Value::from("1")), "\"1\"");
        assert_eq!(render(Value::from(1)), "1");
    }
}
