//! Runtime values flowing through namespaces, bindings and attributes.
//!
//! [`Value`] is the dynamic type the markup and the expression language
//! operate on. Equality is structural except for [`Callable`] and
//! [`Factory`](crate::widget::Factory), which compare by identity: a
//! re-resolved `{on_click}` that yields the same closure must not look like
//! an attribute change.

pub mod decimal;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

pub use decimal::Decimal;

use crate::error::BindingError;
use crate::widget::{Factory, NativeElement};

/// A Python-style slice `start:stop[:step]`. Missing bounds are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |p: Option<i64>| p.map(|v| v.to_string()).unwrap_or_default();
        write!(f, "{}:{}", part(self.start), part(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

type CallableFn = dyn Fn(&[Value]) -> Result<Value, BindingError>;

/// A host function exposed to markup (`command={save}`, `{fmt(x)}`).
#[derive(Clone)]
pub struct Callable {
    name: Rc<str>,
    func: Rc<CallableFn>,
}

impl Callable {
    pub fn new(
        name: impl Into<Rc<str>>,
        func: impl Fn(&[Value]) -> Result<Value, BindingError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    /// Wrap a no-argument action that returns nothing.
    pub fn action(name: impl Into<Rc<str>>, action: impl Fn() + 'static) -> Self {
        Self::new(name, move |_| {
            action();
            Ok(Value::None)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, BindingError> {
        (self.func)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

/// Dynamic value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Slice(Slice),
    Path(PathBuf),
    Callable(Callable),
    /// A component constructor stored in a namespace.
    Factory(Factory),
    /// A mounted native element (bound through a tag alias).
    Element(NativeElement),
}

impl Value {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Slice(_) => "slice",
            Value::Path(_) => "path",
            Value::Callable(_) => "callable",
            Value::Factory(_) => "factory",
            Value::Element(_) => "element",
        }
    }

    /// Truthiness, following the usual scripting-language rules.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Decimal(d) => !d.is_zero(),
            Value::Str(s) => !s.is_empty(),
            Value::Tuple(items) | Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Path(p) => !p.as_os_str().is_empty(),
            Value::Slice(_) | Value::Callable(_) | Value::Factory(_) | Value::Element(_) => true,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Elements of a tuple or list, or characters of a string.
    pub fn iter_items(&self) -> Result<Vec<Value>, BindingError> {
        match self {
            Value::Tuple(items) | Value::List(items) => Ok(items.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Map(map) => Ok(map.keys().cloned().map(Value::Str).collect()),
            Value::Slice(slice) => Ok(slice_range(slice)?.map(Value::Int).collect()),
            other => Err(BindingError::Type(format!(
                "'{}' is not iterable",
                other.type_name()
            ))),
        }
    }
}

/// Iterate a slice as a `range(start, stop, step)`.
fn slice_range(slice: &Slice) -> Result<impl Iterator<Item = i64>, BindingError> {
    let start = slice.start.unwrap_or(0);
    let stop = slice
        .stop
        .ok_or_else(|| BindingError::Type("open-ended slice is not iterable".into()))?;
    let step = slice.step.unwrap_or(1);
    if step == 0 {
        return Err(BindingError::Eval("slice step cannot be zero".into()));
    }
    let mut current = start;
    Ok(std::iter::from_fn(move || {
        let more = if step > 0 { current < stop } else { current > stop };
        if more {
            let value = current;
            current += step;
            Some(value)
        } else {
            None
        }
    }))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Int(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Int(a)) => {
                Decimal::from_i64(*a) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Slice(a), Value::Slice(b)) => a == b,
            (Value::Path(a), Value::Path(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Factory(a), Value::Factory(b)) => a.ptr_eq(b),
            (Value::Element(a), Value::Element(b)) => a == b,
            _ => false,
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        match item {
            Value::Str(s) => write!(f, "'{s}'")?,
            other => write!(f, "{other}")?,
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Str(s) => f.write_str(s),
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_seq(f, items)?;
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                f.write_str("}")
            }
            Value::Slice(s) => write!(f, "{s}"),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::Callable(c) => write!(f, "<callable {}>", c.name()),
            Value::Factory(_) => f.write_str("<factory>"),
            Value::Element(e) => write!(f, "<element {}>", e.raw()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Callable> for Value {
    fn from(v: Callable) -> Self {
        Value::Callable(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_script_style() {
        assert_eq!(Value::Int(0).to_string(), "0");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(
            Value::Tuple(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "(1, 2)"
        );
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "['a', 'b']");
    }

    #[test]
    fn int_and_decimal_compare_numerically() {
        let two: Decimal = "2.0".parse().unwrap();
        assert_eq!(Value::Int(2), Value::Decimal(two));
        assert_ne!(Value::Int(3), Value::Decimal(two));
    }

    #[test]
    fn callables_compare_by_identity() {
        let a = Callable::action("a", || {});
        let b = Callable::action("a", || {});
        assert_eq!(Value::Callable(a.clone()), Value::Callable(a));
        assert_ne!(
            Value::Callable(b),
            Value::Callable(Callable::action("a", || {}))
        );
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::List(vec![Value::None]).is_truthy());
        assert!(!Value::Int(0).is_truthy());
    }

    #[test]
    fn slices_iterate_like_ranges() {
        let items = Value::Slice(Slice::new(Some(1), Some(7), Some(2)))
            .iter_items()
            .unwrap();
        assert_eq!(items, vec![Value::Int(1), Value::Int(3), Value::Int(5)]);
        assert!(Value::Slice(Slice::new(Some(1), None, None)).iter_items().is_err());
    }
}
