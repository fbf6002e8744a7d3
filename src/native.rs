use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::interpreter::ops;
use crate::prelude::*;

#[derive(Debug)]
struct Clock;

impl Callable for Clock {
    fn arity(&self) -> Arity {
        Arity::Fixed(0)
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        _arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();

        Ok(Object::Float(since_epoch.as_millis() as f64 / 1000.0))
    }
}

impl Display for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn clock>")
    }
}

pub fn clock() -> Rc<dyn Callable> {
    Rc::new(Clock)
}

type NativeFn = dyn Fn(&mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError>;

/// A host function exposed to scripts. The closure may capture host state,
/// such as the receiver of a builtin method.
pub struct NativeFunction {
    name: String,
    arity: Arity,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        func: impl Fn(&mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError> + 'static,
    ) -> Self {
        Self { name: name.into(), arity, func: Box::new(func) }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Object>,
    ) -> Result<Object, RuntimeError> {
        (self.func)(interpreter, arguments)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

pub fn define_globals(env: &mut Environment) {
    env.define("clock", Object::Callable(clock()));
    define_native(env, "len", Arity::Fixed(1), len);
    define_native(env, "str", Arity::Fixed(1), |args| Ok(Object::from(single(args).to_string())));
    define_native(env, "type", Arity::Fixed(1), |args| Ok(Object::from(single(args).type_name())));
    define_native(env, "range", Arity::Fixed(2), range);
    define_native(env, "max", Arity::Variadic, |args| extremum("max", args, Ordering::Greater));
    define_native(env, "min", Arity::Variadic, |args| extremum("min", args, Ordering::Less));
    define_native(env, "list", Arity::Variadic, |args| Ok(Object::list(args)));
}

fn define_native(
    env: &mut Environment,
    name: &'static str,
    arity: Arity,
    func: fn(Vec<Object>) -> Result<Object, RuntimeError>,
) {
    let native = NativeFunction::new(name, arity, move |_, args| func(args));
    env.define(name, Object::Callable(Rc::new(native)));
}

fn single(args: Vec<Object>) -> Object {
    args.into_iter().next().unwrap_or(Object::Null)
}

fn type_error(msg: String) -> RuntimeError {
    RuntimeError::unlocated(ErrorKind::TypeMismatch(msg))
}

fn len(args: Vec<Object>) -> Result<Object, RuntimeError> {
    let length = match single(args) {
        Object::String(s) => s.as_str().chars().count(),
        Object::List(l) => l.len(),
        Object::Dict(d) => d.len(),
        other => {
            return Err(type_error(format!(
                "len() expects a string, list or dict; got {}.",
                other.type_name()
            )))
        }
    };
    Ok(Object::Integer(length as i64))
}

fn range(args: Vec<Object>) -> Result<Object, RuntimeError> {
    match (args.first().and_then(Object::integer), args.get(1).and_then(Object::integer)) {
        (Some(start), Some(end)) => Ok(Object::list((start..end).map(Object::Integer).collect())),
        _ => Err(type_error("range() expects two integers.".to_owned())),
    }
}

fn extremum(
    name: &str,
    args: Vec<Object>,
    wanted: Ordering,
) -> Result<Object, RuntimeError> {
    let mut args = args.into_iter();
    let mut best =
        args.next().ok_or_else(|| type_error(format!("{name}() expects at least one argument.")))?;

    for candidate in args {
        match ops::compare(&candidate, &best) {
            Some(ordering) if ordering == wanted => best = candidate,
            Some(_) => {}
            None => {
                return Err(type_error(format!(
                    "{name}() can't compare {} and {}.",
                    candidate.type_name(),
                    best.type_name()
                )))
            }
        }
    }

    Ok(best)
}

fn bound_method<T: 'static>(
    receiver: &Rc<T>,
    name: &str,
    arity: usize,
    func: fn(&T, &mut Interpreter, Vec<Object>) -> Result<Object, RuntimeError>,
) -> Object {
    let receiver = receiver.clone();
    let native = NativeFunction::new(name, Arity::Fixed(arity), move |itpr, args| {
        func(&receiver, itpr, args)
    });
    Object::Callable(Rc::new(native))
}

fn undefined_property(name: &Token) -> RuntimeError {
    RuntimeError::new(ErrorKind::UndefinedProperty(name.lexeme.clone()), name.line)
}

fn callback_argument(method: &str, argument: Object) -> Result<Rc<dyn Callable>, RuntimeError> {
    argument.as_callable().ok_or_else(|| {
        type_error(format!("{method}() expects a function; got {}.", argument.type_name()))
    })
}

impl PropertyBearing for Rc<List> {
    fn get_property(&self, name: &Token) -> Result<Object, RuntimeError> {
        let method = match name.lexeme.as_str() {
            "length" => return Ok(Object::Integer(self.len() as i64)),
            "append" => bound_method(self, "append", 1, |list, _, args| {
                list.push(single(args));
                Ok(Object::Null)
            }),
            "pop" => bound_method(self, "pop", 0, |list, _, _| {
                list.pop().ok_or(RuntimeError::unlocated(ErrorKind::IndexOutOfBounds {
                    index: -1,
                    length: 0,
                }))
            }),
            "contains" => bound_method(self, "contains", 1, |list, _, args| {
                let needle = single(args);
                Ok(Object::Boolean(list.items().iter().any(|item| *item == needle)))
            }),
            "map" => bound_method(self, "map", 1, |list, interpreter, args| {
                let callback = callback_argument("map", single(args))?;
                let mut mapped = Vec::with_capacity(list.len());
                // Iterate a snapshot: the callback may mutate the list.
                for item in list.snapshot() {
                    mapped.push(interpreter.call(&callback, vec![item], -1)?);
                }
                Ok(Object::list(mapped))
            }),
            "filter" => bound_method(self, "filter", 1, |list, interpreter, args| {
                let callback = callback_argument("filter", single(args))?;
                let mut kept = vec![];
                for item in list.snapshot() {
                    if interpreter.call(&callback, vec![item.clone()], -1)?.is_truthy() {
                        kept.push(item);
                    }
                }
                Ok(Object::list(kept))
            }),
            _ => return Err(undefined_property(name)),
        };
        Ok(method)
    }
}

impl PropertyBearing for Rc<Dict> {
    fn get_property(&self, name: &Token) -> Result<Object, RuntimeError> {
        let method = match name.lexeme.as_str() {
            "length" => return Ok(Object::Integer(self.len() as i64)),
            "keys" => bound_method(self, "keys", 0, |dict, _, _| Ok(Object::list(dict.keys()))),
            "values" => {
                bound_method(self, "values", 0, |dict, _, _| Ok(Object::list(dict.values())))
            }
            "contains" => bound_method(self, "contains", 1, |dict, _, args| {
                Ok(Object::Boolean(dict.contains(&single(args))))
            }),
            "remove" => bound_method(self, "remove", 1, |dict, _, args| {
                Ok(dict.remove(&single(args)).unwrap_or(Object::Null))
            }),
            _ => return Err(undefined_property(name)),
        };
        Ok(method)
    }
}

impl PropertyBearing for LoxString {
    fn get_property(&self, name: &Token) -> Result<Object, RuntimeError> {
        match name.lexeme.as_str() {
            "length" => Ok(Object::Integer(self.as_str().chars().count() as i64)),
            _ => Err(undefined_property(name)),
        }
    }
}
