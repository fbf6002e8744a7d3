use std::rc::Rc;

use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;

use super::{ops, InterpreterResult};

impl Interpreter {
    pub fn evaluate_expr(&mut self, expr: &Expr) -> InterpreterResult {
        ensure_sufficient_stack(|| self.evaluate(expr))
    }

    fn evaluate(&mut self, expr: &Expr) -> InterpreterResult {
        match expr {
            Expr::Literal { value } => Ok(value.clone()),
            Expr::Grouping { expr: inner } => self.evaluate_expr(inner.as_ref()),
            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),
            Expr::Binary { left, operator, right } => {
                // Left to right; both sides always run.
                let left_value = self.evaluate_expr(left)?;
                let right_value = self.evaluate_expr(right)?;
                ops::binary(operator, left_value, right_value)
            }
            Expr::Variable { name } => self.environment.borrow().get(name),
            Expr::Assignment { name, value } => {
                let value = self.evaluate_expr(value.as_ref())?;
                self.environment.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Get { object, name } => {
                let object = self.evaluate_expr(object)?;
                match object.as_property_bearing() {
                    Some(bearer) => bearer.get_property(name),
                    None => Err(RuntimeError::type_mismatch(
                        name.line,
                        format!("Only instances have properties; got {}.", object.type_name()),
                    )),
                }
            }
            Expr::Set { object, name, value } => {
                let object = self.evaluate_expr(object)?;
                let value = self.evaluate_expr(value)?;

                if let Object::Instance(instance) = object {
                    instance.set_property(name, value.clone())?;
                    Ok(value)
                } else {
                    Err(RuntimeError::type_mismatch(
                        name.line,
                        format!("Only instances have fields; got {}.", object.type_name()),
                    ))
                }
            }
            Expr::Index { object, bracket, index } => {
                let object = self.evaluate_expr(object)?;
                let index = self.evaluate_expr(index)?;
                self.evaluate_index(object, bracket, index)
            }
            Expr::IndexSet { object, bracket, index, value } => {
                let object = self.evaluate_expr(object)?;
                let index = self.evaluate_expr(index)?;
                let value = self.evaluate_expr(value)?;
                self.evaluate_index_set(object, bracket, index, value.clone())?;
                Ok(value)
            }
            Expr::Super { keyword, method } => self.evaluate_super(keyword, method),
            Expr::This { keyword } => self.environment.borrow().get(keyword),
            Expr::List { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expr(element)?);
                }
                Ok(Object::list(items))
            }
            Expr::Dict { entries, .. } => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.evaluate_expr(key)?;
                    let value = self.evaluate_expr(value)?;
                    pairs.push((key, value));
                }
                Ok(Object::dict(pairs))
            }
            Expr::Lambda { declaration } => {
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                Ok(Object::Callable(Rc::new(function)))
            }
            Expr::Logical { left, operator, right } => {
                let left_val = self.evaluate_expr(left)?;

                if operator.token_type == TokenType::Or {
                    if left_val.is_truthy() {
                        return Ok(left_val);
                    }
                } else {
                    // TokenType::And
                    if !left_val.is_truthy() {
                        return Ok(left_val);
                    }
                }

                self.evaluate_expr(right)
            }
            Expr::Call { callee, paren, arguments } => {
                self.evaluate_call(callee, paren.line, arguments)
            }
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, line: i32, arguments: &[Expr]) -> InterpreterResult {
        let callee = self.evaluate_expr(callee)?;
        let callable = callee.as_callable().ok_or_else(|| {
            RuntimeError::type_mismatch(
                line,
                format!("Can only call functions and classes; got {}.", callee.type_name()),
            )
        })?;

        // Evaluate all arguments, left to right
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.evaluate_expr(arg)?);
        }

        self.call(&callable, args, line)
    }

    fn evaluate_super(&mut self, keyword: &Token, method_name: &Token) -> InterpreterResult {
        let superclass = match self.environment.borrow().get(keyword)? {
            Object::Class(c) => c,
            other => {
                return Err(RuntimeError::type_mismatch(
                    keyword.line,
                    format!("'super' must refer to a class; got {}.", other.type_name()),
                ))
            }
        };

        let this = Token::synthetic(TokenType::This, "this");
        let instance = self.environment.borrow().get(&this)?;

        match superclass.find_method(&method_name.lexeme) {
            Some(method) => Ok(Object::Callable(method.bind(instance))),
            None => Err(RuntimeError::new(
                ErrorKind::UndefinedProperty(method_name.lexeme.clone()),
                method_name.line,
            )),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> InterpreterResult {
        let value = self.evaluate_expr(right)?;
        match operator.token_type {
            TokenType::Minus => ops::negate(operator, value),
            TokenType::Bang => Ok(Object::Boolean(!value.is_truthy())),
            _ => Err(RuntimeError::type_mismatch(
                operator.line,
                format!("'{}' is not a unary operator.", operator.lexeme),
            )),
        }
    }

    fn evaluate_index(&self, object: Object, bracket: &Token, index: Object) -> InterpreterResult {
        match (&object, &index) {
            (Object::List(list), Object::Integer(i)) => {
                list.get(*i).map_err(|kind| RuntimeError::new(kind, bracket.line))
            }
            (Object::String(s), Object::Integer(i)) => {
                let chars: Vec<char> = s.as_str().chars().collect();
                let slot = crate::object::resolve_index(*i, chars.len())
                    .map_err(|kind| RuntimeError::new(kind, bracket.line))?;
                Ok(Object::from(chars[slot].to_string()))
            }
            (Object::Dict(dict), key) => Ok(dict.get(key).unwrap_or(Object::Null)),
            _ => Err(RuntimeError::type_mismatch(
                bracket.line,
                format!("Can't index {} with {}.", object.type_name(), index.type_name()),
            )),
        }
    }

    fn evaluate_index_set(
        &self,
        object: Object,
        bracket: &Token,
        index: Object,
        value: Object,
    ) -> Result<(), RuntimeError> {
        match (&object, index) {
            (Object::List(list), Object::Integer(i)) => {
                list.set(i, value).map_err(|kind| RuntimeError::new(kind, bracket.line))
            }
            (Object::Dict(dict), key) => {
                dict.insert(key, value);
                Ok(())
            }
            (_, index) => Err(RuntimeError::type_mismatch(
                bracket.line,
                format!(
                    "Can't assign to an index of {} with {}.",
                    object.type_name(),
                    index.type_name()
                ),
            )),
        }
    }
}
