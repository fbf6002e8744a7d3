use crate::prelude::*;
use crate::stack::ensure_sufficient_stack;
use std::cell::{Ref, RefCell};
use std::fmt::Display;
use std::rc::Rc;
use std::thread::LocalKey;

/// Which delimiter a string literal was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    #[default]
    Double,
    Single,
}

impl QuoteStyle {
    pub fn delimiter(self) -> char {
        match self {
            QuoteStyle::Double => '"',
            QuoteStyle::Single => '\'',
        }
    }
}

/// An immutable string that remembers how it was quoted in source.
///
/// The quote style only affects [`LoxString::repr`]; equality looks at the
/// contents alone.
#[derive(Debug, Clone)]
pub struct LoxString {
    value: Rc<str>,
    quote: QuoteStyle,
}

impl LoxString {
    pub fn new(value: impl Into<Rc<str>>) -> Self {
        Self::with_quote(value, QuoteStyle::Double)
    }

    pub fn with_quote(value: impl Into<Rc<str>>, quote: QuoteStyle) -> Self {
        Self { value: value.into(), quote }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn quote(&self) -> QuoteStyle {
        self.quote
    }

    /// The string as it would be written in source, quotes included.
    pub fn repr(&self) -> String {
        let delimiter = self.quote.delimiter();
        let mut out = String::with_capacity(self.value.len() + 2);
        out.push(delimiter);
        for c in self.value.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                '\r' => out.push_str("\\r"),
                '\0' => out.push_str("\\0"),
                '\\' => out.push_str("\\\\"),
                c if c == delimiter => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out.push(delimiter);
        out
    }
}

impl PartialEq for LoxString {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Display for LoxString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Values that expose members through `value.name`.
///
/// Instances, lists, dicts and strings all answer property lookups through
/// this trait; methods come back as ordinary callables bound to the receiver.
pub trait PropertyBearing {
    fn get_property(&self, name: &Token) -> Result<Object, RuntimeError>;

    fn set_property(&self, name: &Token, _value: Object) -> Result<(), RuntimeError> {
        Err(RuntimeError::type_mismatch(name.line, "Only instances have fields."))
    }
}

#[derive(Debug, Default)]
pub struct List {
    items: RefCell<Vec<Object>>,
}

impl List {
    pub fn new(items: Vec<Object>) -> Self {
        Self { items: RefCell::new(items) }
    }

    pub fn items(&self) -> Ref<'_, Vec<Object>> {
        self.items.borrow()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, value: Object) {
        self.items.borrow_mut().push(value);
    }

    pub fn pop(&self) -> Option<Object> {
        self.items.borrow_mut().pop()
    }

    pub fn get(&self, index: i64) -> Result<Object, ErrorKind> {
        let items = self.items.borrow();
        let slot = resolve_index(index, items.len())?;
        Ok(items[slot].clone())
    }

    pub fn set(&self, index: i64, value: Object) -> Result<(), ErrorKind> {
        let mut items = self.items.borrow_mut();
        let slot = resolve_index(index, items.len())?;
        items[slot] = value;
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<Object> {
        self.items.borrow().clone()
    }
}

/// Negative indices count from the end.
pub(crate) fn resolve_index(index: i64, length: usize) -> Result<usize, ErrorKind> {
    let resolved = if index < 0 { index + length as i64 } else { index };
    if resolved < 0 || resolved >= length as i64 {
        return Err(ErrorKind::IndexOutOfBounds { index, length });
    }
    Ok(resolved as usize)
}

/// Insertion-ordered map with structural key comparison.
#[derive(Debug, Default)]
pub struct Dict {
    entries: RefCell<Vec<(Object, Object)>>,
}

impl Dict {
    pub fn new(entries: Vec<(Object, Object)>) -> Self {
        let dict = Self::default();
        for (key, value) in entries {
            dict.insert(key, value);
        }
        dict
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &Object) -> Option<Object> {
        self.entries.borrow().iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    pub fn contains(&self, key: &Object) -> bool {
        self.entries.borrow().iter().any(|(k, _)| k == key)
    }

    // Comparing keys may read this dict again when a key contains it, so
    // the slot is found before any mutable borrow is taken.
    fn position(&self, key: &Object) -> Option<usize> {
        self.entries.borrow().iter().position(|(k, _)| k == key)
    }

    pub fn insert(&self, key: Object, value: Object) {
        let position = self.position(&key);
        let mut entries = self.entries.borrow_mut();
        match position {
            Some(position) => entries[position].1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn remove(&self, key: &Object) -> Option<Object> {
        let position = self.position(key)?;
        let (_, value) = self.entries.borrow_mut().remove(position);
        Some(value)
    }

    pub fn keys(&self) -> Vec<Object> {
        self.entries.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Object> {
        self.entries.borrow().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn entries(&self) -> Ref<'_, Vec<(Object, Object)>> {
        self.entries.borrow()
    }
}

thread_local! {
    static RENDERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Marks a collection, or a pair of them, as being walked until dropped.
///
/// Lists and dicts can contain themselves, so rendering and comparing have
/// to notice when they come back to something already on the stack.
struct Visit<K: Copy + PartialEq + 'static> {
    visiting: &'static LocalKey<RefCell<Vec<K>>>,
    key: K,
}

impl<K: Copy + PartialEq + 'static> Visit<K> {
    /// `None` if `key` is already being walked further up.
    fn enter(visiting: &'static LocalKey<RefCell<Vec<K>>>, key: K) -> Option<Self> {
        visiting.with(|keys| {
            let mut keys = keys.borrow_mut();
            if keys.contains(&key) {
                return None;
            }
            keys.push(key);
            Some(Self { visiting, key })
        })
    }
}

impl<K: Copy + PartialEq + 'static> Drop for Visit<K> {
    fn drop(&mut self) {
        let key = self.key;
        self.visiting.with(|keys| {
            let mut keys = keys.borrow_mut();
            if let Some(position) = keys.iter().rposition(|k| *k == key) {
                keys.remove(position);
            }
        });
    }
}

fn address<T>(collection: &Rc<T>) -> usize {
    Rc::as_ptr(collection) as usize
}

/// Runs `compare` unless the same pair is already being compared, in which
/// case the pair counts as equal.
fn compare_collections<T>(left: &Rc<T>, right: &Rc<T>, compare: impl FnOnce() -> bool) -> bool {
    match Visit::enter(&COMPARING, (address(left), address(right))) {
        Some(_visit) => ensure_sufficient_stack(compare),
        None => true,
    }
}

/// A runtime value.
///
/// Primitives are copied on assignment. Lists, dicts, instances and
/// callables are shared: every binding holding one observes mutations made
/// through any other.
#[derive(Debug, Clone)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(LoxString),
    List(Rc<List>),
    Dict(Rc<Dict>),
    Callable(Rc<dyn Callable>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Integer(left), Self::Integer(right)) => left == right,
            (Self::Float(left), Self::Float(right)) => left == right,
            (Self::Integer(left), Self::Float(right)) => (*left as f64) == *right,
            (Self::Float(left), Self::Integer(right)) => *left == (*right as f64),
            (Self::String(left), Self::String(right)) => left == right,
            (Self::List(left), Self::List(right)) => {
                Rc::ptr_eq(left, right)
                    || compare_collections(left, right, || *left.items() == *right.items())
            }
            (Self::Dict(left), Self::Dict(right)) => {
                Rc::ptr_eq(left, right)
                    || compare_collections(left, right, || {
                        left.len() == right.len()
                            && left
                                .entries()
                                .iter()
                                .all(|(k, v)| right.get(k).as_ref() == Some(v))
                    })
            }
            (Self::Callable(left), Self::Callable(right)) => {
                std::ptr::eq(Rc::as_ptr(left) as *const (), Rc::as_ptr(right) as *const ())
            }
            (Self::Class(left), Self::Class(right)) => Rc::ptr_eq(left, right),
            (Self::Instance(left), Self::Instance(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Object {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "nil",
            Self::Boolean(_) => "bool",
            Self::Integer(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Callable(_) => "function",
            Self::Class(_) => "class",
            Self::Instance(_) => "instance",
        }
    }

    pub fn integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Any numeric value widened to a float.
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<Rc<dyn Callable>> {
        match self {
            Self::Callable(c) => Some(c.clone()),
            Self::Class(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub fn as_property_bearing(&self) -> Option<&dyn PropertyBearing> {
        match self {
            Self::Instance(i) => Some(i),
            Self::List(l) => Some(l),
            Self::Dict(d) => Some(d),
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The values a `for-in` loop walks over, taken eagerly.
    pub fn iterate(&self) -> Option<Vec<Object>> {
        match self {
            Self::List(l) => Some(l.snapshot()),
            Self::Dict(d) => Some(d.keys()),
            Self::String(s) => {
                Some(s.as_str().chars().map(|c| Object::from(c.to_string())).collect())
            }
            _ => None,
        }
    }

    pub fn list(items: Vec<Object>) -> Object {
        Object::List(Rc::new(List::new(items)))
    }

    pub fn dict(entries: Vec<(Object, Object)>) -> Object {
        Object::Dict(Rc::new(Dict::new(entries)))
    }

    /// Like `Display`, but strings keep their quotes.
    pub fn repr(&self) -> String {
        match self {
            Self::String(s) => s.repr(),
            other => other.to_string(),
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i64> for Object {
    fn from(n: i64) -> Self {
        Object::Integer(n)
    }
}

impl From<f64> for Object {
    fn from(n: f64) -> Self {
        Object::Float(n)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::String(LoxString::new(s))
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::String(LoxString::new(s))
    }
}

fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{n:.1}")
    } else {
        format!("{n}")
    }
}

impl Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", format_float(*n)),
            Self::String(s) => write!(f, "{}", s),
            Self::Null => write!(f, "nil"),
            Self::List(l) => match Visit::enter(&RENDERING, address(l)) {
                Some(_visit) => ensure_sufficient_stack(|| {
                    let items: Vec<_> = l.items().iter().map(Object::repr).collect();
                    write!(f, "[{}]", items.join(", "))
                }),
                None => write!(f, "[...]"),
            },
            Self::Dict(d) => match Visit::enter(&RENDERING, address(d)) {
                Some(_visit) => ensure_sufficient_stack(|| {
                    let entries: Vec<_> = d
                        .entries()
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                        .collect();
                    write!(f, "{{{}}}", entries.join(", "))
                }),
                None => write!(f, "{{...}}"),
            },
            Self::Callable(c) => write!(f, "{}", c),
            Self::Class(c) => write!(f, "{}", c),
            Self::Instance(i) => write!(f, "{}", i),
        }
    }
}
