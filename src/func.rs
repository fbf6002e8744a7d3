use std::fmt::{Debug, Display};
use std::rc::Rc;

use crate::prelude::*;

/// How many arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Any number of arguments; the count check is skipped.
    Variadic,
}

impl Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{n}"),
            Arity::Variadic => write!(f, "any"),
        }
    }
}

/// Anything that can sit in call position.
///
/// The interpreter checks [`Callable::arity`] against the argument count
/// before calling, so implementations may assume the count is right.
pub trait Callable: Debug + Display {
    fn arity(&self) -> Arity;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError>;
}

#[derive(Debug, Clone)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Shared<Environment>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Shared<Environment>,
        is_initializer: bool,
    ) -> Self {
        Self { declaration, closure, is_initializer }
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Object) -> Rc<LoxFunction> {
        let env = Environment::new().with_enclosing(self.closure.clone()).as_shared();
        env.borrow_mut().define("this", instance);

        Rc::new(LoxFunction::new(self.declaration.clone(), env, self.is_initializer))
    }

    fn bound_this(&self) -> Result<Object, RuntimeError> {
        let this = Token::synthetic(TokenType::This, "this");
        self.closure.borrow().get(&this)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> Arity {
        Arity::Fixed(self.declaration.params.len())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        // The parent is the defining environment, not the caller's. This is
        // what makes scoping lexical.
        let environment = Environment::new().with_enclosing(self.closure.clone()).as_shared();

        {
            let mut env_borrow = environment.borrow_mut();
            for (param, arg) in self.declaration.params.iter().zip(arguments) {
                env_borrow.define(&param.lexeme, arg);
            }
        }

        let completion = interpreter.execute_block(&self.declaration.body, environment)?;

        match completion {
            // An initializer always hands back the instance, even on a bare `return;`
            Completion::Normal | Completion::Return(_) if self.is_initializer => self.bound_this(),
            Completion::Normal => Ok(Object::Null),
            Completion::Return(value) => Ok(value),
            Completion::Break | Completion::Continue => {
                tracing::warn!(function = %self, "loop signal escaped a function body");
                Err(RuntimeError::unlocated(ErrorKind::ControlFlowEscape(completion.keyword())))
            }
        }
    }
}

impl Display for LoxFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.declaration.name() {
            Some(name) => write!(f, "<fn {name}>"),
            None => write!(f, "<fn>"),
        }
    }
}
