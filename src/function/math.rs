//! Mathematical functions.
//!
//! Type-preserving functions (`abs`, `ceil`, `floor`) carry one overload per
//! numeric type. Transcendental functions take DOUBLE and rely on widening
//! for narrower arguments. Results outside a function's real domain are NULL.

use crate::data::{ExprType, ExprValue};
use crate::expression::{ExpressionError, ExpressionResult};
use crate::function::{FunctionResolver, RepositoryBuilder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const D: ExprType = ExprType::Double;
const I: ExprType = ExprType::Integer;
const L: ExprType = ExprType::Long;
const F: ExprType = ExprType::Float;
const S: ExprType = ExprType::String;

pub fn register(repo: &mut RepositoryBuilder) {
    repo.register(per_number("abs", abs));
    repo.register(per_number("ceil", ceil));
    repo.register(per_number("ceiling", ceil));
    repo.register(per_number("floor", floor));

    repo.register(unary_double("exp", |x| Some(x.exp())));
    repo.register(unary_double("ln", ln));
    repo.register(unary_double("log10", |x| ln(x).map(|_| x.log10())));
    repo.register(unary_double("log2", |x| ln(x).map(|_| x.log2())));
    repo.register(unary_double("sqrt", |x| (x >= 0.0).then(|| x.sqrt())));
    repo.register(unary_double("acos", |x| (-1.0..=1.0).contains(&x).then(|| x.acos())));
    repo.register(unary_double("asin", |x| (-1.0..=1.0).contains(&x).then(|| x.asin())));
    repo.register(unary_double("cos", |x| Some(x.cos())));
    repo.register(unary_double("sin", |x| Some(x.sin())));
    repo.register(unary_double("tan", |x| Some(x.tan())));
    repo.register(unary_double("degrees", |x| Some(x.to_degrees())));
    repo.register(unary_double("radians", |x| Some(x.to_radians())));
    repo.register(
        unary_double("atan", |x| Some(x.atan())).merge(binary_double("atan", |y, x| Some(y.atan2(x)))),
    );
    repo.register(binary_double("atan2", |y, x| Some(y.atan2(x))));
    repo.register(FunctionResolver::new("cot").scalar(&[D], D, |args| {
        let x = args[0].double_value()?;
        if x == 0.0 {
            return Err(ExpressionError::evaluation(format!("infinite result of cot({})", x)));
        }
        Ok(ExprValue::Double(1.0 / x.tan()))
    }));

    // log(x) is natural, log(b, x) takes the base first
    repo.register(unary_double("log", ln).merge(binary_double("log", |base, x| {
        if base <= 0.0 || base == 1.0 {
            return None;
        }
        ln(x).map(|ln_x| ln_x / base.ln())
    })));
    repo.register(binary_double("pow", |x, y| Some(x.powf(y))));
    repo.register(binary_double("power", |x, y| Some(x.powf(y))));

    repo.register(FunctionResolver::new("sign").scalar(&[D], I, |args| {
        let x = args[0].double_value()?;
        Ok(ExprValue::Integer(if x > 0.0 {
            1
        } else if x < 0.0 {
            -1
        } else {
            0
        }))
    }));

    repo.register(decimal_rounding("round", Rounding::HalfUp));
    repo.register(decimal_rounding("truncate", Rounding::Down));
    repo.register(ExprType::NUMBERS.into_iter().fold(
        FunctionResolver::new("round"),
        |resolver, ty| resolver.scalar(&[ty], L, |args| round_to_long(&args[0])),
    ));

    repo.register(FunctionResolver::new("pi").scalar(&[], D, |_| Ok(ExprValue::Double(std::f64::consts::PI))));
    repo.register(FunctionResolver::new("e").scalar(&[], D, |_| Ok(ExprValue::Double(std::f64::consts::E))));
    repo.register(
        FunctionResolver::new("rand")
            .scalar(&[], F, |_| Ok(ExprValue::Float(rand::thread_rng().gen::<f32>())))
            .scalar(&[I], F, |args| {
                let seed = args[0].long_value()? as u64;
                Ok(ExprValue::Float(StdRng::seed_from_u64(seed).gen::<f32>()))
            }),
    );

    repo.register(
        FunctionResolver::new("conv")
            .scalar(&[S, I, I], S, |args| {
                conv_value(args[0].string_value()?, &args[1], &args[2])
            })
            .scalar(&[L, I, I], S, |args| {
                conv_value(&args[0].long_value()?.to_string(), &args[1], &args[2])
            }),
    );
    repo.register(FunctionResolver::new("crc32").scalar(&[S], L, |args| {
        let text = args[0].string_value()?;
        Ok(ExprValue::Long(i64::from(crc32fast::hash(text.as_bytes()))))
    }));
}

fn per_number(name: &str, f: fn(&ExprValue) -> ExpressionResult<ExprValue>) -> FunctionResolver {
    ExprType::NUMBERS
        .into_iter()
        .fold(FunctionResolver::new(name), |resolver, ty| {
            resolver.scalar(&[ty], ty, move |args| f(&args[0]))
        })
}

/// `None` from `f` means the input is outside the domain and yields NULL
fn unary_double(name: &str, f: fn(f64) -> Option<f64>) -> FunctionResolver {
    FunctionResolver::new(name).scalar(&[D], D, move |args| {
        Ok(finite_or_null(f(args[0].double_value()?)))
    })
}

fn binary_double(name: &str, f: fn(f64, f64) -> Option<f64>) -> FunctionResolver {
    FunctionResolver::new(name).scalar(&[D, D], D, move |args| {
        Ok(finite_or_null(f(args[0].double_value()?, args[1].double_value()?)))
    })
}

fn finite_or_null(result: Option<f64>) -> ExprValue {
    match result {
        Some(v) if !v.is_nan() => ExprValue::Double(v),
        _ => ExprValue::Null,
    }
}

fn ln(x: f64) -> Option<f64> {
    (x > 0.0).then(|| x.ln())
}

fn not_a_number(value: &ExprValue) -> ExpressionError {
    ExpressionError::evaluation(format!("expected a number but got {}", value.expr_type()))
}

fn abs(value: &ExprValue) -> ExpressionResult<ExprValue> {
    match value {
        ExprValue::Integer(v) => Ok(ExprValue::Integer(v.wrapping_abs())),
        ExprValue::Long(v) => Ok(ExprValue::Long(v.wrapping_abs())),
        ExprValue::Float(v) => Ok(ExprValue::Float(v.abs())),
        ExprValue::Double(v) => Ok(ExprValue::Double(v.abs())),
        other => Err(not_a_number(other)),
    }
}

fn ceil(value: &ExprValue) -> ExpressionResult<ExprValue> {
    match value {
        ExprValue::Integer(_) | ExprValue::Long(_) => Ok(value.clone()),
        ExprValue::Float(v) => Ok(ExprValue::Float(v.ceil())),
        ExprValue::Double(v) => Ok(ExprValue::Double(v.ceil())),
        other => Err(not_a_number(other)),
    }
}

fn floor(value: &ExprValue) -> ExpressionResult<ExprValue> {
    match value {
        ExprValue::Integer(_) | ExprValue::Long(_) => Ok(value.clone()),
        ExprValue::Float(v) => Ok(ExprValue::Float(v.floor())),
        ExprValue::Double(v) => Ok(ExprValue::Double(v.floor())),
        other => Err(not_a_number(other)),
    }
}

/// Round half away from zero to an integral LONG
fn round_to_long(value: &ExprValue) -> ExpressionResult<ExprValue> {
    match value {
        ExprValue::Integer(_) | ExprValue::Long(_) => Ok(ExprValue::Long(value.long_value()?)),
        ExprValue::Float(v) => Ok(ExprValue::Long(v.round() as i64)),
        ExprValue::Double(v) => Ok(ExprValue::Long(v.round() as i64)),
        other => Err(not_a_number(other)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    HalfUp,
    Down,
}

/// `(x, scale)` overloads: integers return LONG, floating types keep their type
fn decimal_rounding(name: &str, mode: Rounding) -> FunctionResolver {
    ExprType::NUMBERS
        .into_iter()
        .fold(FunctionResolver::new(name), |resolver, ty| {
            let return_type = if ty == I { L } else { ty };
            resolver.scalar(&[ty, I], return_type, move |args| {
                let scale = args[1].integer_value()?;
                match &args[0] {
                    ExprValue::Integer(_) | ExprValue::Long(_) => Ok(ExprValue::Long(
                        round_integer(args[0].long_value()?, scale, mode),
                    )),
                    ExprValue::Float(v) => Ok(ExprValue::Float(round_float(*v, scale, mode))),
                    ExprValue::Double(v) => Ok(ExprValue::Double(round_double(*v, scale, mode))),
                    other => Err(not_a_number(other)),
                }
            })
        })
}

fn round_integer(value: i64, scale: i32, mode: Rounding) -> i64 {
    if scale >= 0 {
        return value;
    }
    let Some(unit) = 10i64.checked_pow(scale.unsigned_abs()) else {
        return 0;
    };
    let mut quotient = value / unit;
    if mode == Rounding::HalfUp && (value % unit).unsigned_abs() * 2 >= unit.unsigned_abs() {
        quotient += value.signum();
    }
    quotient.wrapping_mul(unit)
}

fn round_double(value: f64, scale: i32, mode: Rounding) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let rounded = round_decimal_text(&value.abs().to_string(), scale, mode);
    rounded.parse::<f64>().map_or(value, |v| v.copysign(value))
}

fn round_float(value: f32, scale: i32, mode: Rounding) -> f32 {
    if !value.is_finite() {
        return value;
    }
    let rounded = round_decimal_text(&value.abs().to_string(), scale, mode);
    rounded.parse::<f32>().map_or(value, |v| v.copysign(value))
}

/// Round a non-negative plain decimal string to `scale` fractional digits.
///
/// Working on the shortest decimal rendering keeps `round(2.675, 2)` at
/// `2.68` even though the nearest binary double lies just below it.
fn round_decimal_text(text: &str, scale: i32, mode: Rounding) -> String {
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .collect();
    let mut point = int_part.len() as i64;
    let keep = point + i64::from(scale);
    if keep < 0 {
        return "0".to_string();
    }
    let keep = keep as usize;
    if keep >= digits.len() {
        return text.to_string();
    }

    let round_up = mode == Rounding::HalfUp && digits[keep] >= 5;
    digits.truncate(keep);
    if round_up {
        let mut i = keep;
        loop {
            if i == 0 {
                digits.insert(0, 1);
                point += 1;
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }
    while (digits.len() as i64) < point {
        digits.push(0);
    }
    if digits.is_empty() {
        return "0".to_string();
    }

    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let (int_digits, frac_digits) = digits.split_at(point as usize);
    let int_text = if int_digits.is_empty() { "0".to_string() } else { render(int_digits) };
    if frac_digits.is_empty() {
        int_text
    } else {
        format!("{}.{}", int_text, render(frac_digits))
    }
}

fn conv_value(text: &str, from: &ExprValue, to: &ExprValue) -> ExpressionResult<ExprValue> {
    Ok(conv(text, from.integer_value()?, to.integer_value()?).map_or(ExprValue::Null, ExprValue::String))
}

/// Convert the digits of `text` from one base to another (2 to 36)
fn conv(text: &str, from_base: i32, to_base: i32) -> Option<String> {
    let (from, to) = (from_base.unsigned_abs(), to_base.unsigned_abs());
    if !(2..=36).contains(&from) || !(2..=36).contains(&to) {
        return None;
    }
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let mut value: u64 = 0;
    for c in body.chars() {
        match c.to_digit(from) {
            Some(d) => value = value.checked_mul(u64::from(from))?.checked_add(u64::from(d))?,
            None => break,
        }
    }
    if value == 0 {
        return Some("0".to_string());
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(std::char::from_digit((value % u64::from(to)) as u32, to)?);
        value /= u64::from(to);
    }
    if negative {
        out.push('-');
    }
    Some(out.into_iter().rev().collect())
}
