//! Built-in globals and methods.
//!
//! The globals are the only functions an expression can reach besides the
//! ones the host puts into state. Methods are dispatched on the receiver's
//! kind; there is no prototype chain.

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::error::ExprError;
use crate::value::{format_number, string_to_number, Value};

static GLOBALS: OnceLock<IndexMap<&'static str, Value>> = OnceLock::new();

fn globals() -> &'static IndexMap<&'static str, Value> {
    GLOBALS.get_or_init(build_globals)
}

/// Look up a built-in global.
pub fn global(name: &str) -> Option<Value> {
    globals().get(name).cloned()
}

/// Names of all built-in globals.
pub fn global_names() -> impl Iterator<Item = &'static str> {
    globals().keys().copied()
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn number_fn<F>(name: &str, f: F) -> Value
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
{
    Value::function(name, move |args| Ok(Value::from(f(arg(args, 0).to_number()))))
}

fn build_globals() -> IndexMap<&'static str, Value> {
    let math = Value::object([
        ("PI", Value::from(std::f64::consts::PI)),
        ("E", Value::from(std::f64::consts::E)),
        ("abs", number_fn("abs", f64::abs)),
        ("floor", number_fn("floor", f64::floor)),
        ("ceil", number_fn("ceil", f64::ceil)),
        ("round", number_fn("round", |x| (x + 0.5).floor())),
        ("trunc", number_fn("trunc", f64::trunc)),
        ("sign", number_fn("sign", |x| if x == 0.0 || x.is_nan() { x } else { x.signum() })),
        ("sqrt", number_fn("sqrt", f64::sqrt)),
        (
            "pow",
            Value::function("pow", |args| {
                Ok(Value::from(arg(args, 0).to_number().powf(arg(args, 1).to_number())))
            }),
        ),
        ("min", Value::function("min", |args| Ok(Value::from(fold_numbers(args, f64::INFINITY, f64::min))))),
        ("max", Value::function("max", |args| Ok(Value::from(fold_numbers(args, f64::NEG_INFINITY, f64::max))))),
    ]);

    let json = Value::object([
        (
            "stringify",
            Value::function("stringify", |args| {
                let value = arg(args, 0);
                if matches!(value, Value::Undefined | Value::Function(_)) {
                    return Ok(Value::Undefined);
                }
                let json = value.to_json();
                let text = if arg(args, 2).truthy() {
                    serde_json::to_string_pretty(&json)
                } else {
                    serde_json::to_string(&json)
                };
                text.map(Value::from).map_err(|e| e.to_string())
            }),
        ),
        (
            "parse",
            Value::function("parse", |args| {
                serde_json::from_str::<serde_json::Value>(&arg(args, 0).to_string())
                    .map(Value::from)
                    .map_err(|e| format!("JSON.parse: {e}"))
            }),
        ),
    ]);

    IndexMap::from([
        ("Math", math),
        ("JSON", json),
        ("NaN", Value::from(f64::NAN)),
        ("Infinity", Value::from(f64::INFINITY)),
        (
            "String",
            Value::function("String", |args| {
                Ok(args.first().map_or_else(|| Value::from(""), |v| Value::from(v.to_string())))
            }),
        ),
        (
            "Number",
            Value::function("Number", |args| {
                Ok(Value::from(args.first().map_or(0.0, Value::to_number)))
            }),
        ),
        (
            "Boolean",
            Value::function("Boolean", |args| Ok(Value::from(arg(args, 0).truthy()))),
        ),
        (
            "parseInt",
            Value::function("parseInt", |args| {
                let radix = match arg(args, 1) {
                    Value::Undefined => None,
                    other => Some(other.to_number()),
                };
                Ok(Value::from(parse_int(&arg(args, 0).to_string(), radix)))
            }),
        ),
        (
            "parseFloat",
            Value::function("parseFloat", |args| {
                Ok(Value::from(parse_float(&arg(args, 0).to_string())))
            }),
        ),
        (
            "isNaN",
            Value::function("isNaN", |args| Ok(Value::from(arg(args, 0).to_number().is_nan()))),
        ),
    ])
}

fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for value in args {
        let n = value.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}

fn parse_int(text: &str, radix: Option<f64>) -> f64 {
    let trimmed = text.trim_start();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let radix = match radix.map(|r| r.trunc()) {
        None => None,
        Some(r) if r == 0.0 || r.is_nan() => None,
        Some(r) if (2.0..=36.0).contains(&r) => Some(r as u32),
        Some(_) => return f64::NAN,
    };
    let has_hex_prefix = body.starts_with("0x") || body.starts_with("0X");
    let (radix, body) = match radix {
        None | Some(16) if has_hex_prefix => (16, &body[2..]),
        Some(r) => (r, body),
        None => (10, body),
    };
    let digits: Vec<u32> = body.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let magnitude = digits
        .iter()
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(*d));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_float(text: &str) -> f64 {
    let t = text.trim_start();
    let bytes = t.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if t[end..].starts_with("Infinity") {
        return if t.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == digits_start || &t[digits_start..end] == "." {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    t[..end].parse().unwrap_or(f64::NAN)
}

/// Resolve a possibly negative, possibly absent index against `len`.
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn not_a_function(receiver: &Value, name: &str) -> ExprError {
    ExprError::type_error(format!("{name} is not a function on {}", receiver.kind()))
}

/// Call method `name` on `receiver`.
pub(crate) fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match receiver {
        Value::Object(map) => match map.get(name) {
            Some(Value::Function(f)) => f.call(args).map_err(ExprError::Host),
            Some(_) => Err(not_a_function(receiver, name)),
            None if name == "toString" => Ok(Value::from(receiver.to_string())),
            None => Err(not_a_function(receiver, name)),
        },
        Value::String(s) => string_method(receiver, s, name, args),
        Value::Array(items) => array_method(receiver, items, name, args),
        Value::Number(n) => number_method(receiver, *n, name, args),
        Value::Bool(_) if name == "toString" => Ok(Value::from(receiver.to_string())),
        _ => Err(not_a_function(receiver, name)),
    }
}

fn string_method(receiver: &Value, s: &str, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    let needle = || arg(args, 0).to_string();
    let value = match name {
        "toUpperCase" => Value::from(s.to_uppercase()),
        "toLowerCase" => Value::from(s.to_lowercase()),
        "trim" => Value::from(s.trim()),
        "trimStart" => Value::from(s.trim_start()),
        "trimEnd" => Value::from(s.trim_end()),
        "toString" => receiver.clone(),
        "includes" => Value::from(s.contains(needle().as_str())),
        "startsWith" => Value::from(s.starts_with(needle().as_str())),
        "endsWith" => Value::from(s.ends_with(needle().as_str())),
        "indexOf" => Value::from(
            s.find(needle().as_str())
                .map_or(-1.0, |byte| s[..byte].chars().count() as f64),
        ),
        "charAt" => {
            let index = arg(args, 0).to_number();
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            let c = if index < 0.0 { None } else { s.chars().nth(index as usize) };
            Value::from(c.map(String::from).unwrap_or_default())
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let start = relative_index(&arg(args, 0), chars.len(), 0);
            let end = relative_index(&arg(args, 1), chars.len(), chars.len());
            let slice: String = chars.get(start..end.max(start)).unwrap_or_default().iter().collect();
            Value::from(slice)
        }
        "split" => match arg(args, 0) {
            Value::Undefined => Value::array([receiver.clone()]),
            sep => {
                let sep = sep.to_string();
                if sep.is_empty() {
                    Value::array(s.chars().map(|c| Value::from(c.to_string())))
                } else {
                    Value::array(s.split(sep.as_str()).map(Value::from))
                }
            }
        },
        "repeat" => {
            let count = arg(args, 0).to_number();
            if !(0.0..=1e6).contains(&count) {
                return Err(ExprError::Host(format!("invalid repeat count {}", format_number(count))));
            }
            Value::from(s.repeat(count as usize))
        }
        "padStart" | "padEnd" => {
            let target = arg(args, 0).to_number();
            let target = if target.is_nan() { 0 } else { target.clamp(0.0, 1e6) as usize };
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_string(),
            };
            let len = s.chars().count();
            if target <= len || fill.is_empty() {
                receiver.clone()
            } else {
                let padding: String = fill.chars().cycle().take(target - len).collect();
                if name == "padStart" {
                    Value::from(padding + s)
                } else {
                    Value::from(format!("{s}{padding}"))
                }
            }
        }
        _ => return Err(not_a_function(receiver, name)),
    };
    Ok(value)
}

fn array_method(
    receiver: &Value,
    items: &[Value],
    name: &str,
    args: &[Value],
) -> Result<Value, ExprError> {
    let value = match name {
        "join" => {
            let sep = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                .collect();
            Value::from(parts.join(&sep))
        }
        "toString" => Value::from(receiver.to_string()),
        "includes" => {
            let needle = arg(args, 0);
            Value::from(items.iter().any(|item| item.same_value_zero(&needle)))
        }
        "indexOf" => {
            let needle = arg(args, 0);
            Value::from(
                items
                    .iter()
                    .position(|item| item.strict_equals(&needle))
                    .map_or(-1.0, |i| i as f64),
            )
        }
        "at" => {
            let index = arg(args, 0).to_number();
            let index = if index.is_nan() { 0.0 } else { index.trunc() };
            let resolved = if index < 0.0 { items.len() as f64 + index } else { index };
            if resolved < 0.0 {
                Value::Undefined
            } else {
                items.get(resolved as usize).cloned().unwrap_or_default()
            }
        }
        "slice" => {
            let start = relative_index(&arg(args, 0), items.len(), 0);
            let end = relative_index(&arg(args, 1), items.len(), items.len());
            Value::array(items.get(start..end.max(start)).unwrap_or_default().iter().cloned())
        }
        "concat" => {
            let mut out = items.to_vec();
            for extra in args {
                match extra {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::from(out)
        }
        _ => return Err(not_a_function(receiver, name)),
    };
    Ok(value)
}

fn number_method(receiver: &Value, n: f64, name: &str, args: &[Value]) -> Result<Value, ExprError> {
    match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits.trunc() };
            if !(0.0..=100.0).contains(&digits) {
                return Err(ExprError::Host(format!(
                    "toFixed() digits argument must be between 0 and 100, got {}",
                    format_number(digits)
                )));
            }
            if !n.is_finite() {
                return Ok(Value::from(format_number(n)));
            }
            Ok(Value::from(format!("{:.*}", digits as usize, n)))
        }
        "toString" => Ok(Value::from(receiver.to_string())),
        _ => Err(not_a_function(receiver, name)),
    }
}

/// Index named by a canonical numeric key: `"0"` or `"12"`, never `"01"`.
pub(crate) fn canonical_index(key: &str) -> Option<usize> {
    let n = string_to_number(key);
    (n.fract() == 0.0 && n >= 0.0 && format_number(n) == key).then_some(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_global(path: &[&str], args: &[Value]) -> Value {
        let mut value = global(path[0]).unwrap();
        for segment in &path[1..] {
            let Value::Object(map) = &value else {
                panic!("{segment} on non-object");
            };
            value = map.get(*segment).cloned().unwrap();
        }
        let Value::Function(f) = value else {
            panic!("{path:?} is not a function");
        };
        f.call(args).unwrap()
    }

    #[test]
    fn math_functions() {
        assert_eq!(call_global(&["Math", "max"], &[1.into(), 5.into(), 3.into()]), Value::from(5));
        assert_eq!(call_global(&["Math", "min"], &[]), Value::from(f64::INFINITY));
        assert_eq!(call_global(&["Math", "round"], &[2.5.into()]), Value::from(3));
        assert_eq!(call_global(&["Math", "round"], &[(-2.5).into()]), Value::from(-2));
        assert_eq!(call_global(&["Math", "pow"], &[2.into(), 10.into()]), Value::from(1024));
    }

    #[test]
    fn conversion_functions() {
        assert_eq!(call_global(&["String"], &[Value::from(12)]), Value::from("12"));
        assert_eq!(call_global(&["String"], &[]), Value::from(""));
        assert_eq!(call_global(&["Number"], &["  7 ".into()]), Value::from(7));
        assert_eq!(call_global(&["Boolean"], &["".into()]), Value::from(false));
    }

    #[test]
    fn parse_int_reads_leading_digits() {
        assert_eq!(parse_int("42px", None), 42.0);
        assert_eq!(parse_int("  -17", None), -17.0);
        assert_eq!(parse_int("0x1A", None), 26.0);
        assert_eq!(parse_int("101", Some(2.0)), 5.0);
        assert!(parse_int("px", None).is_nan());
        assert!(parse_int("1", Some(40.0)).is_nan());
    }

    #[test]
    fn parse_float_reads_leading_number() {
        assert_eq!(parse_float("3.25rem"), 3.25);
        assert_eq!(parse_float("-1e3x"), -1000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float(".").is_nan());
        assert!(parse_float("abc").is_nan());
    }

    #[test]
    fn json_stringify_and_parse() {
        let value = Value::object([("a", Value::from(1)), ("b", Value::array([Value::from("x")]))]);
        let text = call_global(&["JSON", "stringify"], &[value.clone()]);
        assert_eq!(text, Value::from(r#"{"a":1,"b":["x"]}"#));
        assert_eq!(call_global(&["JSON", "parse"], &[text]), value);
        assert_eq!(call_global(&["JSON", "stringify"], &[Value::Undefined]), Value::Undefined);
    }

    #[test]
    fn string_methods() {
        let s = Value::from("Hello World");
        assert_eq!(call_method(&s, "toUpperCase", &[]).unwrap(), Value::from("HELLO WORLD"));
        assert_eq!(call_method(&s, "indexOf", &["World".into()]).unwrap(), Value::from(6));
        assert_eq!(call_method(&s, "slice", &[(-5).into()]).unwrap(), Value::from("World"));
        assert_eq!(call_method(&s, "slice", &[0.into(), 5.into()]).unwrap(), Value::from("Hello"));
        assert_eq!(
            call_method(&"a,b".into(), "split", &[",".into()]).unwrap(),
            Value::array([Value::from("a"), Value::from("b")])
        );
        assert_eq!(
            call_method(&"7".into(), "padStart", &[3.into(), "0".into()]).unwrap(),
            Value::from("007")
        );
        assert!(call_method(&s, "nope", &[]).is_err());
    }

    #[test]
    fn array_methods() {
        let items = Value::array([Value::from(1), Value::from(2), Value::from(3)]);
        assert_eq!(call_method(&items, "join", &[" - ".into()]).unwrap(), Value::from("1 - 2 - 3"));
        assert_eq!(call_method(&items, "includes", &[2.into()]).unwrap(), Value::from(true));
        assert_eq!(call_method(&items, "indexOf", &[9.into()]).unwrap(), Value::from(-1));
        assert_eq!(call_method(&items, "at", &[(-1).into()]).unwrap(), Value::from(3));
        assert_eq!(
            call_method(&items, "slice", &[1.into()]).unwrap(),
            Value::array([Value::from(2), Value::from(3)])
        );
        assert_eq!(
            call_method(&items, "concat", &[Value::array([Value::from(4)]), 5.into()]).unwrap(),
            Value::array([1, 2, 3, 4, 5].map(Value::from))
        );
    }

    #[test]
    fn number_methods() {
        assert_eq!(call_method(&Value::from(3.14159), "toFixed", &[2.into()]).unwrap(), Value::from("3.14"));
        assert_eq!(call_method(&Value::from(3), "toFixed", &[]).unwrap(), Value::from("3"));
        assert!(call_method(&Value::from(1), "toFixed", &[101.into()]).is_err());
    }

    #[test]
    fn object_members_are_callable() {
        let obj = Value::object([(
            "greet",
            Value::function("greet", |args| Ok(Value::from(format!("hi {}", arg(args, 0))))),
        )]);
        assert_eq!(call_method(&obj, "greet", &["ann".into()]).unwrap(), Value::from("hi ann"));
        assert!(matches!(call_method(&obj, "missing", &[]), Err(ExprError::Type(_))));
    }

    #[test]
    fn canonical_indices() {
        assert_eq!(canonical_index("0"), Some(0));
        assert_eq!(canonical_index("12"), Some(12));
        assert_eq!(canonical_index("01"), None);
        assert_eq!(canonical_index("-1"), None);
        assert_eq!(canonical_index("name"), None);
    }

    #[test]
    fn global_names_include_math() {
        assert!(global_names().any(|name| name == "Math"));
        assert!(global("document").is_none());
    }
}
