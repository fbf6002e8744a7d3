use loxwalk::prelude::*;

fn make_expression(source: &'static str) -> Expr {
    let tokens = Scanner::new(source).scan_tokens().expect("failed to scan the source");
    let stmt = Parser::new(tokens)
        .parse()
        .expect("failed to parse the source")
        .pop()
        .expect("no statement was created");

    match stmt {
        Stmt::Expression { expr } => expr,
        _ => panic!("statement is not an expression"),
    }
}

fn evaluate(source: &'static str) -> Result<Object, RuntimeError> {
    let mut ipr = Interpreter::new();
    let expr = make_expression(source);
    ipr.evaluate_expr(&expr)
}

macro_rules! assert_literal {
    ($source:literal, $expected:expr) => {
        let res = evaluate($source);
        assert!(res.is_ok(), "{:?}", res);
        assert_eq!(res.unwrap(), $expected);
    };
}

macro_rules! assert_integer {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, Object::Integer($expected));
    };
}

macro_rules! assert_float {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, Object::Float($expected));
    };
}

macro_rules! assert_string {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, Object::from($expected));
    };
}

macro_rules! assert_boolean {
    ($source:literal, $expected:expr) => {
        assert_literal!($source, Object::Boolean($expected));
    };
}

macro_rules! assert_error {
    ($source:literal, $kind:pat) => {
        let res = evaluate($source);
        assert!(matches!(res, Err(RuntimeError { kind: $kind, .. })), "{:?}", res);
    };
}

#[test]
fn unary_minus() {
    assert_float!("-3.14;", -3.14);
    assert_integer!("-3;", -3);
}

#[test]
fn unary_bang() {
    assert_boolean!("!true;", false);
    assert_boolean!("!false;", true);
    assert_boolean!("!nil;", true);
    assert_boolean!("!0;", false);
}

#[test]
fn binary_plus_numbers() {
    assert_integer!("10 + 20;", 30);
    assert_float!("10 + 0.5;", 10.5);
}

#[test]
fn binary_plus_strings() {
    assert_string!(r#" "Hello " + "World!"; "#, "Hello World!");
    assert_string!(r#" "n" + 1; "#, "n1");
    assert_string!(r#" 1.0 + 'x'; "#, "1.0x");
}

#[test]
fn binary_minus() {
    assert_integer!("10 - 20;", -10);
}

#[test]
fn binary_star() {
    assert_integer!("10 * 20;", 200);
    assert_float!("2 * 1.5;", 3.0);
}

#[test]
fn binary_slash() {
    assert_integer!("10 / 20;", 0);
    assert_integer!("7 / 2;", 3);
    assert_float!("10 / 20.0;", 0.5);
}

#[test]
fn binary_percent() {
    assert_integer!("7 % 3;", 1);
    assert_float!("7.5 % 2;", 1.5);
}

#[test]
fn binary_greater() {
    assert_boolean!("10 > 20;", false);
    assert_boolean!("20 > 10;", true);
    assert_boolean!("2.5 > 2;", true);
}

#[test]
fn binary_greater_equal() {
    assert_boolean!("10 >= 20;", false);
    assert_boolean!("20 >= 10;", true);
}

#[test]
fn binary_less() {
    assert_boolean!("10 < 20;", true);
    assert_boolean!("20 < 10;", false);
    assert_boolean!(r#" "a" < "b"; "#, true);
}

#[test]
fn binary_less_equal() {
    assert_boolean!("10 <= 20;", true);
    assert_boolean!("20 <= 10;", false);
}

#[test]
fn binary_equal_equal() {
    assert_boolean!("10 == 20;", false);
    assert_boolean!("10 == 10;", true);
    assert_boolean!("1 == 1.0;", true);
    assert_boolean!(r#" 1 == "1"; "#, false);
    assert_boolean!("nil == false;", false);
    assert_boolean!("nil == nil;", true);
}

#[test]
fn binary_bang_equal() {
    assert_boolean!("10 != 20;", true);
    assert_boolean!("10 != 10;", false);
}

#[test]
fn logical_operators_return_an_operand() {
    assert_integer!("nil or 3;", 3);
    assert_string!(r#" "a" or 3; "#, "a");
    assert_literal!("nil and 3;", Object::Null);
    assert_integer!("1 and 2;", 2);
}

#[test]
fn collection_literals_and_indexing() {
    assert_integer!("[1, 2, 3][1];", 2);
    assert_integer!("[1, 2, 3][-1];", 3);
    assert_string!(r#" "abc"[2]; "#, "c");
    assert_integer!("len([1, 2] + [3]);", 3);
}

#[test]
fn builtins() {
    assert_string!("type(1.5);", "float");
    assert_string!("str([1, 'a']);", "[1, 'a']");
    assert_integer!("max(3, 9, 4);", 9);
    assert_float!("min(3, 0.5);", 0.5);
}

#[test]
fn runtime_errors() {
    assert_error!("5 / 0;", ErrorKind::DivisionByZero);
    assert_error!("5 % 0;", ErrorKind::DivisionByZero);
    assert_error!(r#" 1 < "a"; "#, ErrorKind::TypeMismatch(_));
    assert_error!(r#" -"a"; "#, ErrorKind::TypeMismatch(_));
    assert_error!("ghost;", ErrorKind::UndefinedVariable(_));
    assert_error!("[1][5];", ErrorKind::IndexOutOfBounds { index: 5, length: 1 });
    assert_error!("len(1, 2);", ErrorKind::ArityMismatch { expected: 1, got: 2 });
    assert_error!("1();", ErrorKind::TypeMismatch(_));
}

#[test]
fn float_division_by_zero_follows_ieee() {
    assert_float!("5.0 / 0.0;", f64::INFINITY);
    assert_float!("-5 / 0.0;", f64::NEG_INFINITY);
}
