//! End-to-end behaviour of the language through the public API.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use exan::lexical;
use exan::syntax::builtins;
use exan::token::TokenKind;
use exan::{
    eval, DataType, Error, EvalConfig, Expression, FunctionRegistry, HostValue, NativeFunction,
    Params, Rounding, Value,
};

fn num(s: &str) -> Value {
    Value::Number(BigDecimal::from_str(s).unwrap())
}

fn texts(src: &str) -> Vec<String> {
    lexical::scan(src, &FunctionRegistry::new(), &builtins::standard())
        .unwrap()
        .tokens
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// ── Scanning ──────────────────────────────────────────────────────────────────

#[test]
fn double_delimiter_fallback() {
    assert_eq!(texts("a<=b"), ["a", "<=", "b"]);
    assert_eq!(texts("a<-b"), ["a", "<", "-", "b"]);
}

#[test]
fn trailing_comment_is_ignored() {
    let reg = FunctionRegistry::new();
    let b = builtins::standard();
    let plain = lexical::scan("x = 1", &reg, &b).unwrap();
    let commented = lexical::scan("x = 1 ## trailing", &reg, &b).unwrap();
    assert_eq!(plain.tokens, commented.tokens);
}

#[test]
fn comment_only_script_has_no_result() {
    assert_eq!(eval("## only a comment").unwrap(), None);
    assert!(matches!(eval("  \n").unwrap_err(), Error::Lexical { .. }));
}

#[test]
fn escaped_literals_resolve() {
    let script = lexical::scan(r#"'\n' "a\tb""#, &FunctionRegistry::new(), &builtins::standard())
        .unwrap();
    let values: Vec<&Value> = script.tokens.iter().filter_map(|t| script.constant(t)).collect();
    assert_eq!(values, [&Value::from('\n'), &Value::from("a\tb")]);
}

// ── Evaluation ────────────────────────────────────────────────────────────────

#[test]
fn if_else_picks_the_effective_branch() {
    let mut e = Expression::new("if (false) { x = 1 } else { x = 2 }");
    assert_eq!(e.evaluate().unwrap(), Some(num("2")));
    assert_eq!(e.variable("x"), Some(&num("2")));
}

#[test]
fn discarded_branch_leaves_variables_alone() {
    let mut e = Expression::new("if (x < 0) { x = x * 100; y = 1 }");
    e.set_variable("x", 7);
    e.evaluate().unwrap();
    assert_eq!(e.variable("x"), Some(&num("7")));
    assert_eq!(e.variable("y"), None);
}

#[test]
fn discarded_branch_still_raises() {
    let err = eval("if (false) { y = missing + 1 }").unwrap_err();
    assert!(matches!(err, Error::InBranch { .. }));
    assert!(matches!(err.innermost(), Error::VariableNotInitialized { name, .. } if name == "missing"));
}

#[test]
fn division_respects_scale() {
    let mut e = Expression::new("1 / 3");
    e.set_config(EvalConfig::new().with_division(4, Rounding::HalfUp));
    assert_eq!(e.evaluate().unwrap(), Some(num("0.3333")));

    assert_eq!(eval("1 / 3").unwrap(), Some(num("0.3333333333333333")));
}

#[test]
fn round_bounds_its_scale() {
    assert_eq!(eval("round(2.345, 2)").unwrap(), Some(num("2.35")));
    let err = eval("round(5, 4294967296)").unwrap_err();
    assert!(matches!(err, Error::FunctionFailed { ref function, .. } if function == "round"), "{err}");
}

#[test]
fn unresolved_variables() {
    let mut e = Expression::new("fresh = 5");
    assert_eq!(e.evaluate().unwrap(), Some(num("5")));

    let err = eval("fresh + 1").unwrap_err();
    assert!(matches!(err, Error::VariableNotInitialized { ref name, line: 1, column: 1 } if name == "fresh"));
}

#[test]
fn function_arguments_are_checked() {
    assert_eq!(eval("max(2, 9)").unwrap(), Some(num("9")));
    let err = eval("max(2)").unwrap_err();
    assert!(err.to_string().contains("max(NUMBER,NUMBER)"), "{err}");
    let err = eval("max(2, true)").unwrap_err();
    assert!(matches!(err, Error::ArgumentsMismatch { ref args, .. } if args == &[DataType::Number, DataType::Boolean]));
}

#[test]
fn last_statement_wins() {
    let mut e = Expression::new("a = 1; b = a + 1;");
    assert_eq!(e.evaluate().unwrap(), Some(num("2")));
    assert_eq!(e.variable("a"), Some(&num("1")));
    assert_eq!(e.variable("b"), Some(&num("2")));
}

#[test]
fn dates_characters_and_strings_compare() {
    assert_eq!(eval("[2024-01-01] < [2024-01-01 00:00:01]").unwrap(), Some(Value::from(true)));
    assert_eq!(eval("'a' < 'b'").unwrap(), Some(Value::from(true)));
    assert_eq!(eval("\"abc\" == \"abc\"").unwrap(), Some(Value::from(true)));
    assert_eq!(eval("\"total: \" + 2.50").unwrap(), Some(Value::from("total: 2.50")));
}

#[test]
fn custom_functions_receive_host_values() {
    struct Account {
        balance: i64,
    }

    let mut e = Expression::new("balance(acct) >= limit");
    e.add_function(NativeFunction::new(
        "balance",
        Params::Fixed(vec![DataType::Any]),
        |args| {
            let acct = args[0]
                .as_host()
                .and_then(HostValue::downcast_ref::<Account>)
                .ok_or("not an account")?;
            Ok(Value::from(acct.balance))
        },
    ));
    e.set_variable("acct", HostValue::new(Account { balance: 120 }));
    e.set_variable("limit", 100);
    assert_eq!(e.evaluate().unwrap(), Some(Value::from(true)));

    e.set_variable("acct", "not a host value");
    assert!(matches!(e.evaluate().unwrap_err(), Error::FunctionFailed { .. }));
}

#[test]
fn re_evaluation_with_new_variables() {
    let mut e = Expression::new("if (score >= 50) { grade = \"pass\" } else { grade = \"fail\" }");
    e.set_variable("score", 72);
    e.evaluate().unwrap();
    assert_eq!(e.variable("grade"), Some(&Value::from("pass")));

    e.set_variable("score", 12);
    e.evaluate().unwrap();
    assert_eq!(e.variable("grade"), Some(&Value::from("fail")));
}

#[test]
fn assignment_targets_are_marked_in_tokens() {
    let mut e = Expression::new("y = x + 1");
    let flags: Vec<bool> = e
        .tokens()
        .unwrap()
        .iter()
        .filter_map(|t| match t.kind {
            TokenKind::Variable { to_be_assigned } => Some(to_be_assigned),
            _ => None,
        })
        .collect();
    assert_eq!(flags, [true, false]);
}

#[test]
fn errors_carry_positions() {
    let err = eval("a = 1;\nb = a +* 2").unwrap_err();
    let pos = err.position().unwrap();
    assert_eq!((pos.line, pos.column), (2, 8));
    let err = eval("x = 1 $ 2").unwrap_err();
    assert!(matches!(err, Error::Lexical { line: 1, column: 7, .. }));
}
