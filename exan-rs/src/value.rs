//! Runtime value type for the expression language.
//!
//! Every value has one of six declared types.  Numbers are arbitrary
//! precision decimals; division is the only operation that can produce a
//! non-terminating expansion and is therefore always performed at a fixed
//! scale (see [`divide`]).

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, Zero};

use crate::config::Rounding;

// ── DataType ──────────────────────────────────────────────────────────────────

/// Declared type of a value, also used in function signatures where
/// [`DataType::Any`] accepts every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Number,
    Boolean,
    Date,
    Character,
    String,
    Any,
}

impl DataType {
    pub fn name(self) -> &'static str {
        match self {
            DataType::Number => "NUMBER",
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Character => "CHARACTER",
            DataType::String => "STRING",
            DataType::Any => "ANY",
        }
    }

    /// `true` if a value of type `actual` may be passed where `self` is declared.
    pub fn accepts(self, actual: DataType) -> bool {
        self == DataType::Any || self == actual
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── HostValue ─────────────────────────────────────────────────────────────────

/// An opaque object supplied by the embedding program.
///
/// Scripts cannot inspect it; they can only store it in variables and pass
/// it to functions declared with an `ANY` parameter.  Two host values are
/// equal only if they are the same allocation.
#[derive(Clone)]
pub struct HostValue(Arc<dyn Any + Send + Sync>);

impl HostValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        HostValue(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostValue(..)")
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(BigDecimal),
    Boolean(bool),
    Date(NaiveDateTime),
    Character(char),
    String(String),
    Any(HostValue),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Character(c) => write!(f, "{c}"),
            Value::String(s) => f.write_str(s),
            Value::Any(_) => f.write_str("<any>"),
        }
    }
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Number(_) => DataType::Number,
            Value::Boolean(_) => DataType::Boolean,
            Value::Date(_) => DataType::Date,
            Value::Character(_) => DataType::Character,
            Value::String(_) => DataType::String,
            Value::Any(_) => DataType::Any,
        }
    }

    /// Coerce to boolean.  Only `BOOLEAN` values convert; there is no
    /// truthiness for other types.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&BigDecimal> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Character(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&HostValue> {
        match self {
            Value::Any(h) => Some(h),
            _ => None,
        }
    }

    /// Build a number from an `f64`.  Returns `None` for NaN and infinities.
    pub fn from_f64(x: f64) -> Option<Value> {
        BigDecimal::from_f64(x).map(Value::Number)
    }

    /// Parse `text` as a single literal of the language (`12.5`, `true`,
    /// `'c'`, `"str"`, `[2024-01-31]`).  Anything that is not exactly one
    /// literal is taken verbatim as a string.
    pub fn parse_literal(text: &str) -> Value {
        crate::lexical::scan_literal(text).unwrap_or_else(|| Value::String(text.to_owned()))
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────
    //
    // Each helper returns `None` when the operand types are not compatible.

    /// `+`: numeric addition, or concatenation when either side is a string.
    pub fn arith_add(&self, rhs: &Value) -> Option<Value> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                Some(Value::String(format!("{self}{rhs}")))
            }
            _ => None,
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Option<Value> {
        let (a, b) = Self::numbers(self, rhs)?;
        Some(Value::Number(a - b))
    }

    pub fn arith_mul(&self, rhs: &Value) -> Option<Value> {
        let (a, b) = Self::numbers(self, rhs)?;
        Some(Value::Number(a * b))
    }

    pub fn arith_neg(&self) -> Option<Value> {
        self.as_number().map(|n| Value::Number(-n))
    }

    /// Ordering between two values of the same orderable type.
    pub fn compare(&self, rhs: &Value) -> Option<Ordering> {
        match (self, rhs) {
            (Value::Number(a), Value::Number(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Character(a), Value::Character(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn numbers<'a>(a: &'a Value, b: &'a Value) -> Option<(&'a BigDecimal, &'a BigDecimal)> {
        Some((a.as_number()?, b.as_number()?))
    }
}

// ── Decimal helpers ───────────────────────────────────────────────────────────

/// Exact decimal division rounded to `scale` fractional digits.
///
/// The quotient is computed exactly to one digit past `scale`.  A nonzero
/// remainder adds a further sticky digit, so the single rounding step sees
/// whether the discarded tail was exactly half.
///
/// Returns `None` when `y` is zero or the scales involved are too large to
/// represent.
pub fn divide(x: &BigDecimal, y: &BigDecimal, scale: i64, rounding: Rounding) -> Option<BigDecimal> {
    if y.is_zero() {
        return None;
    }
    let (xi, xs) = x.as_bigint_and_exponent();
    let (yi, ys) = y.as_bigint_and_exponent();
    let target = scale.checked_add(1)?;
    // x / y * 10^target == xi * 10^(ys + target - xs) / yi
    let shift = ys.checked_add(target)?.checked_sub(xs)?;
    let (num, den) = if shift >= 0 {
        (xi * pow10(shift)?, yi)
    } else {
        (xi, yi * pow10(shift.checked_neg()?)?)
    };
    let quotient = &num / &den;
    let exact = (&num % &den).is_zero();
    let (digits, digits_scale) = if exact {
        (quotient, target)
    } else {
        let sticky = if num.is_negative() == den.is_negative() { 1 } else { -1 };
        (quotient * 10u32 + sticky, target.checked_add(1)?)
    };
    Some(BigDecimal::new(digits, digits_scale).with_scale_round(scale, rounding.into()))
}

/// Round `x` to `scale` fractional digits.
pub fn round_to_scale(x: &BigDecimal, scale: i64, rounding: Rounding) -> BigDecimal {
    x.with_scale_round(scale, rounding.into())
}

fn pow10(exp: i64) -> Option<BigInt> {
    let exp = u32::try_from(exp).ok()?;
    Some(BigInt::from(10u32).pow(exp))
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<BigDecimal> for Value {
    fn from(n: BigDecimal) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(BigDecimal::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Character(c)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d.and_time(NaiveTime::default()))
    }
}

impl From<HostValue> for Value {
    fn from(h: HostValue) -> Self {
        Value::Any(h)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
