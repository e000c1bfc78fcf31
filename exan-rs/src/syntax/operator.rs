//! Operator executables.

use std::cmp::Ordering;
use std::fmt;

use crate::config::EvalConfig;
use crate::value::{divide, DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Assign,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Neg,
    Not,
}

/// Why an operator refused its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorError {
    /// Operand types do not fit the operator.
    Mismatch,
    Arithmetic(String),
}

impl Operator {
    pub fn arity(self) -> usize {
        match self {
            Operator::Neg | Operator::Not => 1,
            _ => 2,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::Or => "||",
            Operator::And => "&&",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Add => "+",
            Operator::Sub | Operator::Neg => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Not => "!",
        }
    }

    /// Declared operand types, as shown in mismatch errors.
    pub fn signature(self) -> String {
        let params = match self {
            Operator::Assign => "VARIABLE,ANY",
            Operator::Or | Operator::And => "BOOLEAN,BOOLEAN",
            Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                "ANY,ANY"
            }
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Rem => {
                "NUMBER,NUMBER"
            }
            Operator::Neg => "NUMBER",
            Operator::Not => "BOOLEAN",
        };
        format!("{}({params})", self.symbol())
    }

    /// Apply the operator to already-resolved operands.
    ///
    /// `Assign` simply yields its right operand; storing it is up to the
    /// caller.
    pub fn apply(self, args: &[Value], config: &EvalConfig) -> Result<Value, OperatorError> {
        if args.len() != self.arity() {
            return Err(OperatorError::Mismatch);
        }
        let mismatch = || OperatorError::Mismatch;
        let lhs = &args[0];
        let rhs = args.get(1);

        match self {
            Operator::Neg => lhs.arith_neg().ok_or(OperatorError::Mismatch),
            Operator::Not => lhs.as_bool().map(|b| Value::Boolean(!b)).ok_or(OperatorError::Mismatch),
            _ => {
                let rhs = rhs.ok_or_else(mismatch)?;
                match self {
                    Operator::Assign => Ok(rhs.clone()),
                    Operator::Or | Operator::And => {
                        let (a, b) = (lhs.as_bool().ok_or_else(mismatch)?, rhs.as_bool().ok_or_else(mismatch)?);
                        Ok(Value::Boolean(if self == Operator::Or { a || b } else { a && b }))
                    }
                    Operator::Eq | Operator::Ne => {
                        if lhs.data_type() != rhs.data_type() {
                            return Err(OperatorError::Mismatch);
                        }
                        Ok(Value::Boolean((lhs == rhs) == (self == Operator::Eq)))
                    }
                    Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                        let ord = lhs.compare(rhs).ok_or_else(mismatch)?;
                        Ok(Value::Boolean(match self {
                            Operator::Lt => ord == Ordering::Less,
                            Operator::Le => ord != Ordering::Greater,
                            Operator::Gt => ord == Ordering::Greater,
                            _ => ord != Ordering::Less,
                        }))
                    }
                    Operator::Add => lhs.arith_add(rhs).ok_or_else(mismatch),
                    Operator::Sub => lhs.arith_sub(rhs).ok_or_else(mismatch),
                    Operator::Mul => lhs.arith_mul(rhs).ok_or_else(mismatch),
                    Operator::Div | Operator::Rem => {
                        let (a, b) = match (lhs.as_number(), rhs.as_number()) {
                            (Some(a), Some(b)) => (a, b),
                            _ => return Err(OperatorError::Mismatch),
                        };
                        if num_traits::Zero::is_zero(b) {
                            let what = if self == Operator::Rem { "remainder" } else { "division" };
                            return Err(OperatorError::Arithmetic(format!("{what} by zero")));
                        }
                        if self == Operator::Rem {
                            return Ok(Value::Number(a % b));
                        }
                        divide(a, b, config.division_scale, config.rounding)
                            .map(Value::Number)
                            .ok_or_else(|| OperatorError::Arithmetic("quotient scale out of range".into()))
                    }
                    Operator::Neg | Operator::Not => Err(OperatorError::Mismatch),
                }
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Operand types as listed in a mismatch error.
pub fn operand_types(args: &[Value]) -> Vec<DataType> {
    args.iter().map(Value::data_type).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rounding;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn num(s: &str) -> Value {
        Value::Number(BigDecimal::from_str(s).unwrap())
    }

    fn apply(op: Operator, args: &[Value]) -> Result<Value, OperatorError> {
        op.apply(args, &EvalConfig::default())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(apply(Operator::Add, &[num("1.5"), num("2")]), Ok(num("3.5")));
        assert_eq!(apply(Operator::Sub, &[num("1"), num("3")]), Ok(num("-2")));
        assert_eq!(apply(Operator::Mul, &[num("1.5"), num("4")]), Ok(num("6")));
        assert_eq!(apply(Operator::Rem, &[num("7"), num("3")]), Ok(num("1")));
        assert_eq!(apply(Operator::Neg, &[num("4")]), Ok(num("-4")));
    }

    #[test]
    fn division_uses_config() {
        let config = EvalConfig::new().with_division(4, Rounding::HalfUp);
        assert_eq!(Operator::Div.apply(&[num("1"), num("3")], &config), Ok(num("0.3333")));
        assert_eq!(
            apply(Operator::Div, &[num("1"), num("0")]),
            Err(OperatorError::Arithmetic("division by zero".into()))
        );
        assert!(matches!(
            apply(Operator::Rem, &[num("1"), num("0.0")]),
            Err(OperatorError::Arithmetic(_))
        ));
    }

    #[test]
    fn concatenation() {
        assert_eq!(apply(Operator::Add, &[Value::from("a"), num("1")]), Ok(Value::from("a1")));
        assert_eq!(apply(Operator::Sub, &[Value::from("a"), num("1")]), Err(OperatorError::Mismatch));
    }

    #[test]
    fn logic_and_equality() {
        let t = Value::from(true);
        let f = Value::from(false);
        assert_eq!(apply(Operator::Or, &[f.clone(), t.clone()]), Ok(t.clone()));
        assert_eq!(apply(Operator::And, &[f.clone(), t.clone()]), Ok(f.clone()));
        assert_eq!(apply(Operator::Not, &[t.clone()]), Ok(f.clone()));
        assert_eq!(apply(Operator::Eq, &[num("1.0"), num("1")]), Ok(t.clone()));
        assert_eq!(apply(Operator::Ne, &[Value::from('a'), Value::from('b')]), Ok(t));
        assert_eq!(apply(Operator::Eq, &[num("1"), Value::from("1")]), Err(OperatorError::Mismatch));
        assert_eq!(apply(Operator::And, &[f, num("1")]), Err(OperatorError::Mismatch));
    }

    #[test]
    fn comparisons() {
        assert_eq!(apply(Operator::Lt, &[num("1"), num("2")]), Ok(Value::from(true)));
        assert_eq!(apply(Operator::Ge, &[num("2"), num("2")]), Ok(Value::from(true)));
        assert_eq!(apply(Operator::Gt, &[Value::from("a"), Value::from("b")]), Ok(Value::from(false)));
        assert_eq!(apply(Operator::Le, &[Value::from(true), Value::from(true)]), Err(OperatorError::Mismatch));
    }

    #[test]
    fn signatures() {
        assert_eq!(Operator::Add.signature(), "+(NUMBER,NUMBER)");
        assert_eq!(Operator::Neg.signature(), "-(NUMBER)");
        assert_eq!(Operator::Assign.signature(), "=(VARIABLE,ANY)");
    }

    #[test]
    fn wrong_arity_is_a_mismatch() {
        assert_eq!(apply(Operator::Add, &[num("1")]), Err(OperatorError::Mismatch));
    }
}
