//! Operator semantics shared by the evaluator and the builtins.
//!
//! Integers stay integers as long as both operands are integers; any float
//! operand promotes the operation to floats. Integer arithmetic wraps.

use std::cmp::Ordering;

use crate::prelude::*;

enum Operands {
    Integers(i64, i64),
    Floats(f64, f64),
}

fn numeric_operands(left: &Object, right: &Object) -> Option<Operands> {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => Some(Operands::Integers(*l, *r)),
        _ => Some(Operands::Floats(left.number()?, right.number()?)),
    }
}

fn operand_error(operator: &Token, left: &Object, right: &Object, expected: &str) -> RuntimeError {
    RuntimeError::type_mismatch(
        operator.line,
        format!(
            "Operands of '{}' must be {expected}; got {} and {}.",
            operator.lexeme,
            left.type_name(),
            right.type_name()
        ),
    )
}

fn division_by_zero(operator: &Token) -> RuntimeError {
    RuntimeError::new(ErrorKind::DivisionByZero, operator.line)
}

/// Ordering between two numbers or two strings; `None` for anything else.
pub(crate) fn compare(left: &Object, right: &Object) -> Option<Ordering> {
    match (left, right) {
        (Object::String(l), Object::String(r)) => Some(l.as_str().cmp(r.as_str())),
        _ => match numeric_operands(left, right)? {
            Operands::Integers(l, r) => Some(l.cmp(&r)),
            Operands::Floats(l, r) => l.partial_cmp(&r),
        },
    }
}

/// Applies a non-short-circuiting binary operator to evaluated operands.
pub(crate) fn binary(
    operator: &Token,
    left: Object,
    right: Object,
) -> Result<Object, RuntimeError> {
    match operator.token_type {
        TokenType::Plus => add(operator, left, right),
        TokenType::Minus => arithmetic(operator, &left, &right, i64::wrapping_sub, |l, r| l - r),
        TokenType::Star => arithmetic(operator, &left, &right, i64::wrapping_mul, |l, r| l * r),
        TokenType::Slash => match numeric_operands(&left, &right) {
            Some(Operands::Integers(_, 0)) => Err(division_by_zero(operator)),
            Some(Operands::Integers(l, r)) => Ok(Object::Integer(l.wrapping_div(r))),
            Some(Operands::Floats(l, r)) => Ok(Object::Float(l / r)),
            None => Err(operand_error(operator, &left, &right, "numbers")),
        },
        TokenType::Percent => match numeric_operands(&left, &right) {
            Some(Operands::Integers(_, 0)) => Err(division_by_zero(operator)),
            Some(Operands::Integers(l, r)) => Ok(Object::Integer(l.wrapping_rem(r))),
            Some(Operands::Floats(l, r)) => Ok(Object::Float(l % r)),
            None => Err(operand_error(operator, &left, &right, "numbers")),
        },
        TokenType::Greater => ordering(operator, &left, &right, Ordering::is_gt),
        TokenType::GreaterEqual => ordering(operator, &left, &right, Ordering::is_ge),
        TokenType::Less => ordering(operator, &left, &right, Ordering::is_lt),
        TokenType::LessEqual => ordering(operator, &left, &right, Ordering::is_le),

        TokenType::EqualEqual => Ok(Object::Boolean(left == right)),
        TokenType::BangEqual => Ok(Object::Boolean(left != right)),

        _ => Err(RuntimeError::type_mismatch(
            operator.line,
            format!("'{}' is not a binary operator.", operator.lexeme),
        )),
    }
}

pub(crate) fn negate(operator: &Token, value: Object) -> Result<Object, RuntimeError> {
    match value {
        Object::Integer(n) => Ok(Object::Integer(n.wrapping_neg())),
        Object::Float(n) => Ok(Object::Float(-n)),
        other => Err(RuntimeError::type_mismatch(
            operator.line,
            format!("Operand of '-' must be a number; got {}.", other.type_name()),
        )),
    }
}

fn add(operator: &Token, left: Object, right: Object) -> Result<Object, RuntimeError> {
    match (&left, &right) {
        (Object::String(l), r) => Ok(Object::from(format!("{l}{r}"))),
        (l, Object::String(r)) => Ok(Object::from(format!("{l}{r}"))),
        (Object::List(l), Object::List(r)) => {
            let mut items = l.snapshot();
            items.extend(r.snapshot());
            Ok(Object::list(items))
        }
        _ => arithmetic(operator, &left, &right, i64::wrapping_add, |l, r| l + r),
    }
}

fn arithmetic(
    operator: &Token,
    left: &Object,
    right: &Object,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Object, RuntimeError> {
    match numeric_operands(left, right) {
        Some(Operands::Integers(l, r)) => Ok(Object::Integer(int_op(l, r))),
        Some(Operands::Floats(l, r)) => Ok(Object::Float(float_op(l, r))),
        None => Err(operand_error(operator, left, right, "numbers")),
    }
}

fn ordering(
    operator: &Token,
    left: &Object,
    right: &Object,
    test: fn(Ordering) -> bool,
) -> Result<Object, RuntimeError> {
    match (left, right) {
        (Object::String(_), Object::String(_)) => {}
        _ if left.number().is_some() && right.number().is_some() => {}
        _ => return Err(operand_error(operator, left, right, "two numbers or two strings")),
    }

    // NaN compares false with everything.
    Ok(Object::Boolean(compare(left, right).map_or(false, test)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(token_type: TokenType, lexeme: &str) -> Token {
        Token::new(token_type, lexeme, None, 3)
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        let plus = op(TokenType::Plus, "+");
        assert_eq!(
            binary(&plus, Object::Integer(1), Object::Integer(1)).unwrap().type_name(),
            "int"
        );
        assert_eq!(
            binary(&plus, Object::Integer(1), Object::Float(1.0)).unwrap().type_name(),
            "float"
        );
    }

    #[test]
    fn integer_division_truncates() {
        let slash = op(TokenType::Slash, "/");
        assert_eq!(binary(&slash, Object::Integer(7), Object::Integer(2)), Ok(Object::Integer(3)));
        assert_eq!(
            binary(&slash, Object::Integer(-7), Object::Integer(2)),
            Ok(Object::Integer(-3))
        );
    }

    #[test]
    fn integer_overflow_wraps() {
        let plus = op(TokenType::Plus, "+");
        assert_eq!(
            binary(&plus, Object::Integer(i64::MAX), Object::Integer(1)),
            Ok(Object::Integer(i64::MIN))
        );
        let minus = op(TokenType::Minus, "-");
        assert_eq!(negate(&minus, Object::Integer(i64::MIN)), Ok(Object::Integer(i64::MIN)));
    }

    #[test]
    fn modulo_by_zero_is_an_error_for_integers_only() {
        let percent = op(TokenType::Percent, "%");
        let err = binary(&percent, Object::Integer(5), Object::Integer(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.line, Some(3));

        match binary(&percent, Object::Float(5.0), Object::Float(0.0)) {
            Ok(Object::Float(n)) => assert!(n.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn comparison_type_errors_name_both_operands() {
        let less = op(TokenType::Less, "<");
        let err = binary(&less, Object::Integer(1), Object::from("a")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[line 3] Operands of '<' must be two numbers or two strings; got int and string."
        );
    }

    #[test]
    fn strings_order_lexicographically() {
        let less = op(TokenType::Less, "<");
        assert_eq!(
            binary(&less, Object::from("abc"), Object::from("abd")),
            Ok(Object::Boolean(true))
        );
    }

    #[test]
    fn nan_is_never_ordered() {
        let ge = op(TokenType::GreaterEqual, ">=");
        assert_eq!(
            binary(&ge, Object::Float(f64::NAN), Object::Float(1.0)),
            Ok(Object::Boolean(false))
        );
    }

    #[test]
    fn plus_stringifies_the_other_operand() {
        let plus = op(TokenType::Plus, "+");
        assert_eq!(
            binary(&plus, Object::from("n="), Object::Float(2.0)),
            Ok(Object::from("n=2.0"))
        );
        assert_eq!(binary(&plus, Object::Null, Object::from("!")), Ok(Object::from("nil!")));
    }

    #[test]
    fn plus_concatenates_lists_into_a_new_list() {
        let plus = op(TokenType::Plus, "+");
        let joined = binary(
            &plus,
            Object::list(vec![Object::Integer(1)]),
            Object::list(vec![Object::Integer(2)]),
        )
        .unwrap();
        assert_eq!(joined, Object::list(vec![Object::Integer(1), Object::Integer(2)]));
    }
}
