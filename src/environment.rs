use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Object;
use crate::token::Token;
use crate::Shared;

/// One scope frame. Frames are shared: a closure keeps its defining frame
/// (and that frame's ancestors) alive for as long as the closure exists.
#[derive(Debug, Default)]
pub struct Environment {
    pub enclosing: Option<Shared<Environment>>,
    values: HashMap<String, Object>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(self, enclosing: Shared<Environment>) -> Self {
        Self { enclosing: Some(enclosing), ..self }
    }

    pub fn as_shared(self) -> Shared<Self> {
        Rc::new(RefCell::new(self))
    }

    /// Binds `name` in this frame, replacing any earlier binding here.
    pub fn define(&mut self, name: &str, value: Object) {
        tracing::trace!(name, "define");
        self.values.insert(name.to_owned(), value);
    }

    pub fn assign(&mut self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }

        // Ask one level above if possible
        match self.enclosing {
            Some(ref e) => e.borrow_mut().assign(name, value),
            None => Err(RuntimeError::undefined_variable(name.line, &name.lexeme)),
        }
    }

    pub fn get(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }

        // Ask one level above if possible
        match self.enclosing {
            Some(ref e) => e.borrow().get(name),
            None => Err(RuntimeError::undefined_variable(name.line, &name.lexeme)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}
