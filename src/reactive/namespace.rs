//! Chained, observable variable scopes.
//!
//! A [`Namespace`] maps names to [`Value`]s and falls back to its parents,
//! in declaration order, for names it does not define. Subscribers are
//! notified once per observed change of the local variable set; a change in
//! any parent is forwarded to the child's subscribers.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::subscribe::{Observable, Subscribeable, Subscriber, SubscriptionId};
use crate::env::Environment;
use crate::error::BindingError;
use crate::value::Value;

struct Scope {
    vars: RefCell<BTreeMap<String, Value>>,
    /// Variable set as of the last notification.
    last: RefCell<BTreeMap<String, Value>>,
    parents: Vec<Namespace>,
    env: Rc<Environment>,
    changes: Rc<Subscribeable>,
    batch_depth: Cell<usize>,
    /// Forwarding subscriptions on the parents.
    upstream: RefCell<Subscriber>,
}

/// Shared handle to a variable scope. Clones refer to the same scope.
#[derive(Clone)]
pub struct Namespace(Rc<Scope>);

/// Non-owning handle to a [`Namespace`].
#[derive(Clone)]
pub struct WeakNamespace(Weak<Scope>);

impl WeakNamespace {
    pub fn upgrade(&self) -> Option<Namespace> {
        self.0.upgrade().map(Namespace)
    }
}

impl Namespace {
    /// A root namespace using `env` for expressions, translations and
    /// resources.
    pub fn new(env: Rc<Environment>) -> Self {
        Self::with_parents(env, Vec::new())
    }

    pub fn with_parents(env: Rc<Environment>, parents: Vec<Namespace>) -> Self {
        let ns = Namespace(Rc::new(Scope {
            vars: RefCell::new(BTreeMap::new()),
            last: RefCell::new(BTreeMap::new()),
            parents,
            env,
            changes: Subscribeable::shared(),
            batch_depth: Cell::new(0),
            upstream: RefCell::new(Subscriber::new()),
        }));

        let mut upstream = ns.0.upstream.borrow_mut();
        for parent in &ns.0.parents {
            let weak = Rc::downgrade(&ns.0);
            upstream.subscribe_to(parent, move || {
                if let Some(scope) = weak.upgrade() {
                    scope.changes.notify();
                }
            });
        }
        drop(upstream);
        ns
    }

    /// A child scope of `self` sharing its environment.
    pub fn child(&self) -> Namespace {
        Self::with_parents(Rc::clone(&self.0.env), vec![self.clone()])
    }

    pub fn env(&self) -> &Rc<Environment> {
        &self.0.env
    }

    pub fn parents(&self) -> &[Namespace] {
        &self.0.parents
    }

    pub fn downgrade(&self) -> WeakNamespace {
        WeakNamespace(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Look `name` up in this scope, then in each parent.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.0.parents.iter().find_map(|p| p.lookup(name))
    }

    pub fn get(&self, name: &str) -> Result<Value, BindingError> {
        self.lookup(name)
            .ok_or_else(|| BindingError::UndefinedName(name.to_owned()))
    }

    /// Resolve a dotted path such as `todo.done`. Each segment after the
    /// first indexes into a map value.
    pub fn get_path(&self, path: &str) -> Result<Value, BindingError> {
        let mut segments = path.split('.').map(str::trim);
        let head = segments.next().unwrap_or_default();
        let mut value = self.get(head)?;
        for segment in segments {
            value = match &value {
                Value::Map(map) => map.get(segment).cloned().ok_or_else(|| {
                    BindingError::UndefinedName(format!("{path} (at '{segment}')"))
                })?,
                other => {
                    return Err(BindingError::Type(format!(
                        "cannot read '{segment}' of {}",
                        other.type_name()
                    )))
                }
            };
        }
        Ok(value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contains_local(name) || self.0.parents.iter().any(|p| p.contains(name))
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.0.vars.borrow().contains_key(name)
    }

    /// Names defined directly in this scope, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.0.vars.borrow().keys().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Define or overwrite `name` in this scope.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.vars.borrow_mut().insert(name.into(), value.into());
        self.changed();
    }

    /// Write `name` into the nearest scope that defines it, or into this
    /// scope when none does.
    pub fn assign(&self, name: &str, value: Value) {
        match self.owner_of(name) {
            Some(owner) => owner.set(name, value),
            None => self.set(name, value),
        }
    }

    fn owner_of(&self, name: &str) -> Option<Namespace> {
        if self.contains_local(name) {
            return Some(self.clone());
        }
        self.0.parents.iter().find_map(|p| p.owner_of(name))
    }

    /// Write through a dotted path. The map holding the last segment is
    /// rebuilt and the head variable reassigned.
    pub fn set_path(&self, path: &str, value: Value) -> Result<(), BindingError> {
        let segments: Vec<&str> = path.split('.').map(str::trim).collect();
        let Some((head, rest)) = segments.split_first() else {
            return Err(BindingError::UndefinedName(path.to_owned()));
        };
        if rest.is_empty() {
            self.assign(head, value);
            return Ok(());
        }
        let root = self.get(head)?;
        let rebuilt = replace_in(root, rest, value)?;
        self.assign(head, rebuilt);
        Ok(())
    }

    /// Set several variables with a single notification.
    pub fn update<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.batch(|ns| {
            for (k, v) in entries {
                ns.set(k, v);
            }
        });
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        let removed = self.0.vars.borrow_mut().remove(name);
        if removed.is_some() {
            self.changed();
        }
        removed
    }

    /// Run `f` with notifications deferred until it returns.
    pub fn batch<R>(&self, f: impl FnOnce(&Namespace) -> R) -> R {
        let depth = &self.0.batch_depth;
        depth.set(depth.get() + 1);
        let result = f(self);
        depth.set(depth.get() - 1);
        if depth.get() == 0 {
            self.watch_changes();
        }
        result
    }

    fn changed(&self) {
        if self.0.batch_depth.get() == 0 {
            self.watch_changes();
        }
    }

    /// Notify subscribers if the variable set differs from the last
    /// notified snapshot. Returns whether a notification was sent.
    pub fn watch_changes(&self) -> bool {
        {
            let vars = self.0.vars.borrow();
            let mut last = self.0.last.borrow_mut();
            if *vars == *last {
                return false;
            }
            *last = vars.clone();
        }
        log::trace!("namespace changed: {:?}", self.keys());
        self.0.changes.notify();
        true
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        self.0.changes.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.0.changes.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.changes.subscriber_count()
    }
}

fn replace_in(container: Value, path: &[&str], value: Value) -> Result<Value, BindingError> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(value);
    };
    match container {
        Value::Map(mut map) => {
            let inner = if rest.is_empty() {
                value
            } else {
                let current = map.remove(*key).ok_or_else(|| {
                    BindingError::UndefinedName((*key).to_owned())
                })?;
                replace_in(current, rest, value)?
            };
            map.insert((*key).to_owned(), inner);
            Ok(Value::Map(map))
        }
        other => Err(BindingError::Type(format!(
            "cannot assign '{key}' on {}",
            other.type_name()
        ))),
    }
}

impl Observable for Namespace {
    fn changes(&self) -> &Rc<Subscribeable> {
        &self.0.changes
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("vars", &*self.0.vars.borrow())
            .field("parents", &self.0.parents.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root() -> Namespace {
        Namespace::new(Rc::new(Environment::default()))
    }

    fn counter(ns: &Namespace) -> Rc<Cell<usize>> {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        ns.subscribe(move || h.set(h.get() + 1));
        hits
    }

    #[test]
    fn test_lookup_order() {
        let a = root();
        let b = root();
        a.set("x", 1);
        b.set("x", 2);
        b.set("y", 3);
        let child = Namespace::with_parents(Rc::clone(a.env()), vec![a.clone(), b.clone()]);
        assert_eq!(child.get("x").unwrap(), Value::Int(1));
        assert_eq!(child.get("y").unwrap(), Value::Int(3));
        child.set("x", 9);
        assert_eq!(child.get("x").unwrap(), Value::Int(9));
        assert_eq!(a.get("x").unwrap(), Value::Int(1));
        assert_eq!(
            child.get("nope"),
            Err(BindingError::UndefinedName("nope".into()))
        );
    }

    #[test]
    fn test_notifies_once_per_change() {
        let ns = root();
        let hits = counter(&ns);
        ns.set("a", 1);
        ns.set("a", 1);
        assert_eq!(hits.get(), 1);
        ns.set("a", 2);
        assert_eq!(hits.get(), 2);
        assert!(!ns.watch_changes());
    }

    #[test]
    fn test_batch_coalesces() {
        let ns = root();
        let hits = counter(&ns);
        ns.update([("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(hits.get(), 1);
        ns.batch(|ns| {
            ns.set("a", 10);
            ns.set("a", 1);
        });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_remove() {
        let ns = root();
        ns.set("a", 1);
        let hits = counter(&ns);
        assert_eq!(ns.remove("a"), Some(Value::Int(1)));
        assert_eq!(ns.remove("a"), None);
        assert_eq!(hits.get(), 1);
        assert!(!ns.contains("a"));
    }

    #[test]
    fn test_parent_change_reaches_child_subscribers() {
        let parent = root();
        let child = parent.child();
        let hits = counter(&child);
        parent.set("x", 1);
        assert_eq!(hits.get(), 1);
        drop(child);
        assert_eq!(parent.subscriber_count(), 0);
    }

    #[test]
    fn test_assign_writes_to_defining_scope() {
        let parent = root();
        parent.set("count", 0);
        let child = parent.child();
        child.assign("count", Value::Int(5));
        child.assign("local", Value::Int(1));
        assert_eq!(parent.get("count").unwrap(), Value::Int(5));
        assert!(!child.contains_local("count"));
        assert!(child.contains_local("local"));
    }

    #[test]
    fn test_dotted_paths() {
        let ns = root();
        let mut inner = BTreeMap::new();
        inner.insert("done".to_owned(), Value::Bool(false));
        ns.set("todo", Value::Map(inner));
        assert_eq!(ns.get_path("todo.done").unwrap(), Value::Bool(false));
        ns.set_path("todo.done", Value::Bool(true)).unwrap();
        assert_eq!(ns.get_path("todo.done").unwrap(), Value::Bool(true));
        assert!(matches!(
            ns.get_path("todo.done.x"),
            Err(BindingError::Type(_))
        ));
    }

    #[test]
    fn test_weak_handle() {
        let ns = root();
        let weak = ns.downgrade();
        assert!(weak.upgrade().is_some_and(|n| n.ptr_eq(&ns)));
        drop(ns);
        assert!(weak.upgrade().is_none());
    }
}
