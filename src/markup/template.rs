//! Parsed templates and the parse cache.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::instruction::Instruction;
use super::parser::parse;
use crate::error::SyntaxError;

/// Markup source paired with its parsed instruction tree.
#[derive(Debug, Clone)]
pub struct Template {
    source: Rc<str>,
    root: Rc<Instruction>,
}

impl Template {
    /// Parse `source` without going through a cache.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            source: Rc::from(source),
            root: Rc::new(parse(source)?),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Rc<Instruction> {
        &self.root
    }

    /// True when both templates share the same parsed tree.
    pub fn ptr_eq(&self, other: &Template) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }
}

/// Memoizes [`Template`]s by source text.
///
/// Parsing is deterministic, so a hit hands back the tree parsed the first
/// time. Failed parses are not cached. `parse_count` counts real parses.
#[derive(Debug)]
pub struct TemplateCache {
    entries: RefCell<HashMap<Rc<str>, Template>>,
    enabled: bool,
    parses: Cell<usize>,
    hits: Cell<usize>,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            enabled,
            parses: Cell::new(0),
            hits: Cell::new(0),
        }
    }

    pub fn get_or_parse(&self, source: &str) -> Result<Template, SyntaxError> {
        if self.enabled {
            if let Some(hit) = self.entries.borrow().get(source) {
                self.hits.set(self.hits.get() + 1);
                log::trace!("template cache hit ({} bytes)", source.len());
                return Ok(hit.clone());
            }
        }

        log::debug!("parsing template ({} bytes)", source.len());
        self.parses.set(self.parses.get() + 1);
        let template = Template::parse(source)?;
        if self.enabled {
            self.entries
                .borrow_mut()
                .insert(Rc::clone(&template.source), template.clone());
        }
        Ok(template)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn parse_count(&self) -> usize {
        self.parses.get()
    }

    pub fn hit_count(&self) -> usize {
        self.hits.get()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = "\\frame\n  \\label text='hi'\n";

    #[test]
    fn test_cache_skips_reparse() {
        let cache = TemplateCache::default();
        let a = cache.get_or_parse(MARKUP).unwrap();
        let b = cache.get_or_parse(MARKUP).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(cache.parse_count(), 1);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_disabled_cache_always_parses() {
        let cache = TemplateCache::new(false);
        let a = cache.get_or_parse(MARKUP).unwrap();
        let b = cache.get_or_parse(MARKUP).unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(a.root(), b.root());
        assert_eq!(cache.parse_count(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_parse_is_not_cached() {
        let cache = TemplateCache::default();
        assert!(cache.get_or_parse("!if x").is_err());
        assert!(cache.get_or_parse("!if x").is_err());
        assert_eq!(cache.parse_count(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = TemplateCache::default();
        cache.get_or_parse(MARKUP).unwrap();
        cache.clear();
        cache.get_or_parse(MARKUP).unwrap();
        assert_eq!(cache.parse_count(), 2);
    }
}
