//! Writeable: a reactive cell with get/set and change notification.
//!
//! Bound writeables re-read their source on every [`Writeable::get`] and
//! keep a subscription on it, so a change upstream is turned into a
//! notification of the writeable's own subscribers when, and only when, the
//! value observed through it changed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::namespace::Namespace;
use super::subscribe::{Observable, Subscribeable, Subscriber, SubscriptionId};
use crate::error::BindingError;
use crate::i18n::Translator;
use crate::value::Value;

/// Name the setter statement of a getter/setter pair reads the written
/// value from.
pub const SET_NAME: &str = "value";

type Getter = Rc<dyn Fn() -> Result<Value, BindingError>>;
type Setter = Rc<dyn Fn(Value) -> Result<(), BindingError>>;

enum Source {
    Value(RefCell<Value>),
    Name {
        namespace: Namespace,
        path: String,
    },
    Expression {
        namespace: Namespace,
        expr: String,
    },
    GetSet {
        namespace: Namespace,
        getter: String,
        setter: String,
    },
    Translation {
        translator: Rc<dyn Translator>,
        key: String,
    },
    Computed {
        getter: Getter,
        setter: Option<Setter>,
    },
}

struct Shared {
    source: Source,
    last: RefCell<Value>,
    changes: Rc<Subscribeable>,
    upstream: RefCell<Subscriber>,
}

/// Shared handle to a reactive cell.
#[derive(Clone)]
pub struct Writeable(Rc<Shared>);

impl Writeable {
    fn build(source: Source) -> Self {
        let cell = Shared {
            source,
            last: RefCell::new(Value::None),
            changes: Subscribeable::shared(),
            upstream: RefCell::new(Subscriber::new()),
        };
        let w = Writeable(Rc::new(cell));
        if let Ok(initial) = w.get() {
            *w.0.last.borrow_mut() = initial;
        }
        w
    }

    /// Forward notifications from `source` into [`watch_changes`](Self::watch_changes).
    fn follow(&self, source: &impl Observable) {
        let weak: Weak<Shared> = Rc::downgrade(&self.0);
        self.0.upstream.borrow_mut().subscribe_to(source, move || {
            if let Some(cell) = weak.upgrade() {
                if let Err(err) = Writeable(cell).watch_changes() {
                    log::debug!("writeable refresh failed: {err}");
                }
            }
        });
    }

    /// A plain value cell.
    pub fn new(value: impl Into<Value>) -> Self {
        Self::build(Source::Value(RefCell::new(value.into())))
    }

    /// Two-way binding to a variable, or a dotted path into a map variable.
    pub fn from_name(namespace: &Namespace, path: impl Into<String>) -> Self {
        let w = Self::build(Source::Name {
            namespace: namespace.clone(),
            path: path.into(),
        });
        w.follow(namespace);
        w
    }

    /// Read-only binding to an expression.
    pub fn from_expression(namespace: &Namespace, expr: impl Into<String>) -> Self {
        let w = Self::build(Source::Expression {
            namespace: namespace.clone(),
            expr: expr.into(),
        });
        w.follow(namespace);
        w
    }

    /// Two-way binding from a getter expression and a setter statement.
    /// The setter sees the written value as [`SET_NAME`].
    pub fn from_get_set(
        namespace: &Namespace,
        getter: impl Into<String>,
        setter: impl Into<String>,
    ) -> Self {
        let w = Self::build(Source::GetSet {
            namespace: namespace.clone(),
            getter: getter.into(),
            setter: setter.into(),
        });
        w.follow(namespace);
        w
    }

    /// Read-only translation of `key`, refreshed when the translator's
    /// catalogue changes.
    pub fn from_translation(translator: Rc<dyn Translator>, key: impl Into<String>) -> Self {
        let changes = Rc::clone(translator.changes());
        let w = Self::build(Source::Translation {
            translator,
            key: key.into(),
        });
        w.follow(&changes);
        w
    }

    /// A cell backed by host closures. Without a setter it is read-only.
    pub fn computed(
        getter: impl Fn() -> Result<Value, BindingError> + 'static,
        setter: Option<Box<dyn Fn(Value) -> Result<(), BindingError>>>,
    ) -> Self {
        Self::build(Source::Computed {
            getter: Rc::new(getter),
            setter: setter.map(Rc::from),
        })
    }

    /// Re-evaluate the source.
    pub fn get(&self) -> Result<Value, BindingError> {
        match &self.0.source {
            Source::Value(value) => Ok(value.borrow().clone()),
            Source::Name { namespace, path } => namespace.get_path(path),
            Source::Expression { namespace, expr } => {
                namespace.env().evaluator().evaluate(expr, namespace)
            }
            Source::GetSet {
                namespace, getter, ..
            } => namespace.env().evaluator().evaluate(getter, namespace),
            Source::Translation { translator, key } => translator.translate(key).map(Value::Str),
            Source::Computed { getter, .. } => getter(),
        }
    }

    /// Write through to the source, then notify if the observed value
    /// changed.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), BindingError> {
        let value = value.into();
        match &self.0.source {
            Source::Value(cell) => *cell.borrow_mut() = value,
            Source::Name { namespace, path } => namespace.set_path(path, value)?,
            Source::GetSet {
                namespace, setter, ..
            } => {
                if !setter.trim().is_empty() {
                    namespace
                        .env()
                        .evaluator()
                        .execute(setter, namespace, &[(SET_NAME, value)])?;
                }
            }
            Source::Computed {
                setter: Some(setter),
                ..
            } => setter(value)?,
            Source::Expression { .. } | Source::Translation { .. } | Source::Computed { .. } => {
                return Err(BindingError::ReadOnly(self.describe()))
            }
        }
        self.watch_changes().map(|_| ())
    }

    pub fn is_read_only(&self) -> bool {
        matches!(
            self.0.source,
            Source::Expression { .. }
                | Source::Translation { .. }
                | Source::Computed { setter: None, .. }
        )
    }

    /// Compare the current value with the last observed one and notify on
    /// difference. Returns whether a notification was sent.
    pub fn watch_changes(&self) -> Result<bool, BindingError> {
        let current = self.get()?;
        {
            let mut last = self.0.last.borrow_mut();
            if *last == current {
                return Ok(false);
            }
            *last = current;
        }
        self.0.changes.notify();
        Ok(true)
    }

    /// Value seen at the last change check.
    pub fn last(&self) -> Value {
        self.0.last.borrow().clone()
    }

    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        self.0.changes.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.0.changes.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.changes.subscriber_count()
    }

    pub fn ptr_eq(&self, other: &Writeable) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Markup-like description of the binding for errors and logs.
    pub fn describe(&self) -> String {
        match &self.0.source {
            Source::Value(_) => "<value>".to_owned(),
            Source::Name { path, .. } => format!("{{{{{path}}}}}"),
            Source::Expression { expr, .. } => format!("{{{expr}}}"),
            Source::GetSet { getter, setter, .. } => format!("{{{{{getter}||{setter}}}}}"),
            Source::Translation { key, .. } => format!("[{key}]"),
            Source::Computed { .. } => "<computed>".to_owned(),
        }
    }
}

impl Observable for Writeable {
    fn changes(&self) -> &Rc<Subscribeable> {
        &self.0.changes
    }
}

impl fmt::Debug for Writeable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writeable")
            .field("source", &self.describe())
            .field("last", &*self.0.last.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::i18n::Dictionary;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn ns() -> Namespace {
        Namespace::new(Rc::new(Environment::default()))
    }

    fn hits(w: &Writeable) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        w.subscribe(move || h.set(h.get() + 1));
        hits
    }

    #[test]
    fn test_plain_value() {
        let w = Writeable::new(1);
        let n = hits(&w);
        w.set(2).unwrap();
        w.set(2).unwrap();
        assert_eq!(w.get().unwrap(), Value::Int(2));
        assert_eq!(n.get(), 1);
        assert!(!w.is_read_only());
    }

    #[test]
    fn test_name_binding_is_two_way() {
        let ns = ns();
        ns.set("count", 0);
        let w = Writeable::from_name(&ns, "count");
        let n = hits(&w);

        ns.set("count", 1);
        assert_eq!(w.get().unwrap(), Value::Int(1));
        assert_eq!(n.get(), 1);

        w.set(5).unwrap();
        assert_eq!(ns.get("count").unwrap(), Value::Int(5));
        assert_eq!(w.get().unwrap(), Value::Int(5));
        assert_eq!(n.get(), 2);
    }

    #[test]
    fn test_get_is_idempotent() {
        let ns = ns();
        ns.set("a", 3);
        let w = Writeable::from_expression(&ns, "a * 2");
        assert_eq!(w.get().unwrap(), w.get().unwrap());
    }

    #[test]
    fn test_unrelated_change_does_not_notify() {
        let ns = ns();
        ns.update([("a", 1), ("b", 1)]);
        let w = Writeable::from_expression(&ns, "a + 1");
        let n = hits(&w);
        ns.set("b", 2);
        assert_eq!(n.get(), 0);
        ns.set("a", 2);
        assert_eq!(n.get(), 1);
    }

    #[test]
    fn test_expression_is_read_only() {
        let ns = ns();
        ns.set("a", 1);
        let w = Writeable::from_expression(&ns, "a");
        assert!(w.is_read_only());
        assert_eq!(w.set(2), Err(BindingError::ReadOnly("{a}".into())));
    }

    #[test]
    fn test_get_set_pair() {
        let ns = ns();
        ns.set("count", 1);
        let w = Writeable::from_get_set(&ns, "str(count)", "count = int(value)");
        assert_eq!(w.get().unwrap(), Value::from("1"));
        w.set("42").unwrap();
        assert_eq!(ns.get("count").unwrap(), Value::Int(42));
        assert_eq!(w.get().unwrap(), Value::from("42"));
        assert!(!ns.contains("value"));
    }

    #[test]
    fn test_translation_follows_dictionary() {
        let dict = Rc::new(Dictionary::new());
        dict.install("en", [("greet", "Hello")]);
        let w = Writeable::from_translation(dict.clone(), "greet");
        let n = hits(&w);
        assert_eq!(w.get().unwrap(), Value::from("Hello"));
        dict.install("fr", [("greet", "Bonjour")]);
        assert_eq!(w.get().unwrap(), Value::from("Bonjour"));
        assert_eq!(n.get(), 1);
        assert!(w.is_read_only());
    }

    #[test]
    fn test_dropping_releases_namespace_subscription() {
        let ns = ns();
        ns.set("a", 1);
        let baseline = ns.subscriber_count();
        let w = Writeable::from_name(&ns, "a");
        assert_eq!(ns.subscriber_count(), baseline + 1);
        drop(w);
        assert_eq!(ns.subscriber_count(), baseline);
    }

    #[test]
    fn test_computed() {
        let store = Rc::new(RefCell::new(Value::Int(0)));
        let (g, s) = (Rc::clone(&store), Rc::clone(&store));
        let w = Writeable::computed(
            move || Ok(g.borrow().clone()),
            Some(Box::new(move |v| {
                *s.borrow_mut() = v;
                Ok(())
            })),
        );
        w.set(7).unwrap();
        assert_eq!(*store.borrow(), Value::Int(7));
        assert_eq!(w.last(), Value::Int(7));
    }
}
