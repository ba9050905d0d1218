//! Name → component constructor table.

use std::collections::BTreeMap;

use crate::widget::Factory;

use super::{button, checkbutton, entry, frame, label};

/// Component kinds resolvable by tag name before the namespace is
/// consulted.
#[derive(Debug, Clone)]
pub struct Registry {
    kinds: BTreeMap<String, Factory>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    /// A registry with no kinds at all.
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// `frame`, `label`, `button`, `entry` and `checkbutton`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for factory in [
            frame::factory(),
            label::factory(),
            button::factory(),
            entry::factory(),
            checkbutton::factory(),
        ] {
            registry.register(factory);
        }
        registry
    }

    /// Register under the factory's name, replacing any previous kind.
    pub fn register(&mut self, factory: Factory) {
        self.kinds.insert(factory.name().to_owned(), factory);
    }

    pub fn get(&self, name: &str) -> Option<&Factory> {
        self.kinds.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetError;

    #[test]
    fn test_builtin_kinds() {
        let r = Registry::builtin();
        assert_eq!(
            r.names().collect::<Vec<_>>(),
            ["button", "checkbutton", "entry", "frame", "label"]
        );
        assert!(r.get("frame").unwrap().schema().unwrap().accepts_children());
        assert!(!r.contains("canvas"));
    }

    #[test]
    fn test_register_replaces() {
        let mut r = Registry::empty();
        r.register(Factory::new("label", |_| Err(WidgetError::NotMounted)));
        assert!(r.get("label").unwrap().schema().is_none());
        r.register(label::factory());
        assert!(r.get("label").unwrap().schema().is_some());
    }
}
