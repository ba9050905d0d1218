//! Translation lookup for `[key]` / `@key` literals.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::BindingError;
use crate::reactive::Subscribeable;

/// Resolves translation keys. Implementations notify
/// [`changes`](Translator::changes) whenever a lookup may return something
/// different, e.g. after switching language.
pub trait Translator {
    fn translate(&self, key: &str) -> Result<String, BindingError>;
    fn changes(&self) -> &Rc<Subscribeable>;
}

/// In-memory translation catalogue keyed by dotted paths
/// (`menu.file.open`).
#[derive(Default)]
pub struct Dictionary {
    language: RefCell<Option<String>>,
    entries: RefCell<BTreeMap<String, String>>,
    changes: Rc<Subscribeable>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active catalogue and notify every bound translation.
    pub fn install<K, V>(&self, language: &str, entries: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        log::debug!("installing '{language}' dictionary ({} entries)", entries.len());
        *self.language.borrow_mut() = Some(language.to_owned());
        *self.entries.borrow_mut() = entries;
        self.changes.notify();
    }

    pub fn language(&self) -> Option<String> {
        self.language.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Translator for Dictionary {
    fn translate(&self, key: &str) -> Result<String, BindingError> {
        self.entries
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| BindingError::MissingTranslation(key.to_owned()))
    }

    fn changes(&self) -> &Rc<Subscribeable> {
        &self.changes
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("language", &*self.language.borrow())
            .field("entries", &self.len())
            .finish()
    }
}
