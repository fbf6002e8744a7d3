use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::{Rc, Weak};

use crate::prelude::*;

#[derive(Debug)]
pub struct Class {
    name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    superclass: Option<Rc<Self>>,
    // Calling a class needs an owning handle to itself for the new instance.
    this: Weak<Self>,
}

impl Class {
    pub fn new(
        name: impl AsRef<str>,
        methods: HashMap<String, Rc<LoxFunction>>,
        superclass: Option<Rc<Self>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            name: name.as_ref().to_owned(),
            methods,
            superclass,
            this: this.clone(),
        })
    }

    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass.as_ref().and_then(|superclass| superclass.find_method(name))
    }
}

impl Callable for Class {
    fn arity(&self) -> Arity {
        self.find_method("init").map_or(Arity::Fixed(0), |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        let class = self.this.upgrade().ok_or_else(|| {
            RuntimeError::unlocated(ErrorKind::TypeMismatch(format!(
                "Class '{}' is no longer alive.",
                self.name
            )))
        })?;
        let instance = Object::Instance(Rc::new(Instance::new(class)));

        if let Some(initializer) = self.find_method("init") {
            initializer.bind(instance.clone()).call(interpreter, arguments)?;
        }

        Ok(instance)
    }
}

impl Display for Class {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: RefCell<HashMap<String, Object>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self { class, fields: RefCell::new(HashMap::new()) }
    }
}

impl PropertyBearing for Rc<Instance> {
    fn get_property(&self, name: &Token) -> Result<Object, RuntimeError> {
        if let Some(object) = self.fields.borrow().get(&name.lexeme) {
            return Ok(object.clone());
        }

        match self.class.find_method(&name.lexeme) {
            Some(method) => Ok(Object::Callable(method.bind(Object::Instance(self.clone())))),
            None => {
                let kind = ErrorKind::UndefinedProperty(name.lexeme.clone());
                Err(RuntimeError::new(kind, name.line))
            }
        }
    }

    fn set_property(&self, name: &Token, value: Object) -> Result<(), RuntimeError> {
        self.fields.borrow_mut().insert(name.lexeme.clone(), value);
        Ok(())
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} instance", self.class)
    }
}
