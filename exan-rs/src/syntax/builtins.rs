//! Built-in functions.
//!
//! Each body receives arguments already checked against its declared
//! parameters and returns `Result<Value, String>`.  The table is built once
//! and shared; scripts see it after any custom functions of the same name.

use std::sync::{Arc, LazyLock};

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use super::function::{Function, FunctionRegistry, Params};
use crate::config::{check_scale, EvalConfig};
use crate::value::{round_to_scale, DataType, Value};

type Body = fn(&[Value], &EvalConfig) -> Result<Value, String>;

/// A function from the fixed built-in table.
pub struct Builtin {
    name: &'static str,
    params: Params,
    body: Body,
}

impl Function for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn call(&self, args: &[Value], config: &EvalConfig) -> Result<Value, String> {
        (self.body)(args, config)
    }
}

fn fixed(name: &'static str, types: &[DataType], body: Body) -> Builtin {
    Builtin {
        name,
        params: Params::Fixed(types.to_vec()),
        body,
    }
}

fn variadic(name: &'static str, t: DataType, body: Body) -> Builtin {
    Builtin {
        name,
        params: Params::Variadic(t),
        body,
    }
}

static STANDARD: LazyLock<Arc<FunctionRegistry>> = LazyLock::new(|| {
    use DataType as T;

    let mut reg = FunctionRegistry::new();
    reg.register(fixed("max", &[T::Number, T::Number], |args, _| {
        let (a, b) = (get_num(args, 0)?, get_num(args, 1)?);
        Ok(Value::Number(if b > a { b.clone() } else { a.clone() }))
    }));
    reg.register(fixed("min", &[T::Number, T::Number], |args, _| {
        let (a, b) = (get_num(args, 0)?, get_num(args, 1)?);
        Ok(Value::Number(if b < a { b.clone() } else { a.clone() }))
    }));
    reg.register(fixed("abs", &[T::Number], |args, _| {
        Ok(Value::Number(get_num(args, 0)?.abs()))
    }));
    reg.register(fixed("round", &[T::Number, T::Number], |args, config| {
        let x = get_num(args, 0)?;
        let scale = get_num(args, 1)?;
        if !scale.is_integer() {
            return Err(format!("scale must be an integer, got {scale}"));
        }
        let digits = check_scale(scale.to_i64().unwrap_or(i64::MAX))?;
        Ok(Value::Number(round_to_scale(x, digits, config.rounding)))
    }));
    reg.register(fixed("judge", &[T::Boolean, T::Any, T::Any], |args, _| {
        let cond = args
            .first()
            .and_then(Value::as_bool)
            .ok_or("expected a boolean condition")?;
        let pick = if cond { 1 } else { 2 };
        args.get(pick).cloned().ok_or_else(|| "too few args".to_owned())
    }));
    reg.register(variadic("sum", T::Number, |args, _| {
        let mut total = BigDecimal::from(0);
        for i in 0..args.len() {
            total += get_num(args, i)?;
        }
        Ok(Value::Number(total))
    }));
    reg.register(variadic("concat", T::Any, |args, _| {
        Ok(Value::String(args.iter().map(Value::to_string).collect()))
    }));
    reg.register(fixed("length", &[T::String], |args, _| {
        Ok(Value::from(get_str(args, 0)?.chars().count() as i64))
    }));
    reg.register(fixed("upper", &[T::String], |args, _| {
        Ok(Value::from(get_str(args, 0)?.to_uppercase()))
    }));
    reg.register(fixed("lower", &[T::String], |args, _| {
        Ok(Value::from(get_str(args, 0)?.to_lowercase()))
    }));
    Arc::new(reg)
});

/// The shared built-in table.
pub fn standard() -> Arc<FunctionRegistry> {
    Arc::clone(&STANDARD)
}

// ── Argument helpers ──────────────────────────────────────────────────────────

fn get_num(args: &[Value], idx: usize) -> Result<&BigDecimal, String> {
    args.get(idx)
        .and_then(Value::as_number)
        .ok_or_else(|| format!("argument {} is not a number", idx + 1))
}

fn get_str(args: &[Value], idx: usize) -> Result<&str, String> {
    args.get(idx)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("argument {} is not a string", idx + 1))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rounding;
    use std::str::FromStr;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        call_with(name, args, &EvalConfig::default())
    }

    fn call_with(name: &str, args: &[Value], config: &EvalConfig) -> Result<Value, String> {
        let reg = standard();
        let f = reg.get(name).unwrap();
        let types: Vec<DataType> = args.iter().map(Value::data_type).collect();
        assert!(f.params().accepts(&types), "{} rejects {types:?}", f.signature());
        f.call(args, config)
    }

    fn num(s: &str) -> Value {
        Value::Number(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn table_contents() {
        let reg = standard();
        assert_eq!(
            reg.names(),
            vec!["abs", "concat", "judge", "length", "lower", "max", "min", "round", "sum", "upper"]
        );
        assert_eq!(reg.get("max").unwrap().signature(), "max(NUMBER,NUMBER)");
        assert_eq!(reg.get("sum").unwrap().signature(), "sum(NUMBER...)");
        assert_eq!(reg.get("judge").unwrap().signature(), "judge(BOOLEAN,ANY,ANY)");
    }

    #[test]
    fn max_min_abs() {
        assert_eq!(call("max", &[num("3"), num("7.5")]), Ok(num("7.5")));
        assert_eq!(call("min", &[num("3"), num("7.5")]), Ok(num("3")));
        assert_eq!(call("abs", &[num("-2.25")]), Ok(num("2.25")));
    }

    #[test]
    fn round_uses_configured_mode() {
        assert_eq!(call("round", &[num("2.345"), num("2")]), Ok(num("2.35")));
        let down = EvalConfig::new().with_division(16, Rounding::Down);
        assert_eq!(call_with("round", &[num("2.345"), num("2")], &down), Ok(num("2.34")));
        assert!(call("round", &[num("2.345"), num("1.5")]).is_err());
    }

    #[test]
    fn round_rejects_huge_scales() {
        assert_eq!(call("round", &[num("5"), num("3")]), Ok(num("5")));
        for scale in ["4294967296", "100000000", "-100000000", "99999999999999999999999"] {
            let err = call("round", &[num("5"), num(scale)]).unwrap_err();
            assert!(err.contains("outside"), "{scale}: {err}");
        }
    }

    #[test]
    fn judge_selects() {
        let args = [Value::from(true), Value::from("yes"), Value::from(0)];
        assert_eq!(call("judge", &args), Ok(Value::from("yes")));
        let args = [Value::from(false), Value::from("yes"), Value::from(0)];
        assert_eq!(call("judge", &args), Ok(Value::from(0)));
    }

    #[test]
    fn variadics() {
        assert_eq!(call("sum", &[]), Ok(num("0")));
        assert_eq!(call("sum", &[num("1"), num("2.5"), num("3")]), Ok(num("6.5")));
        assert_eq!(
            call("concat", &[Value::from("n"), Value::from(1), Value::from('c')]),
            Ok(Value::from("n1c"))
        );
    }

    #[test]
    fn string_functions() {
        assert_eq!(call("length", &[Value::from("héllo")]), Ok(Value::from(5)));
        assert_eq!(call("upper", &[Value::from("abc")]), Ok(Value::from("ABC")));
        assert_eq!(call("lower", &[Value::from("ÀB")]), Ok(Value::from("àb")));
    }
}
