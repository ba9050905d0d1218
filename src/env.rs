//! Services shared by every namespace of an application: the expression
//! evaluator, the translator, resource resolvers and toolkit constants.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::BindingError;
use crate::expr::{ExpressionEvaluator, Interpreter};
use crate::i18n::Translator;
use crate::media::{Resource, ResourceResolver, ResourceSpec};
use crate::value::Value;

/// Toolkit constant names recognised as literals, with the value each one
/// stands for.
pub const DEFAULT_CONSTANTS: &[(&str, &str)] = &[
    ("N", "n"),
    ("S", "s"),
    ("E", "e"),
    ("W", "w"),
    ("NE", "ne"),
    ("NW", "nw"),
    ("SE", "se"),
    ("SW", "sw"),
    ("NS", "ns"),
    ("EW", "ew"),
    ("NSEW", "nsew"),
    ("CENTER", "center"),
    ("LEFT", "left"),
    ("RIGHT", "right"),
    ("TOP", "top"),
    ("BOTTOM", "bottom"),
    ("X", "x"),
    ("Y", "y"),
    ("BOTH", "both"),
    ("NONE", "none"),
    ("HORIZONTAL", "horizontal"),
    ("VERTICAL", "vertical"),
    ("NORMAL", "normal"),
    ("DISABLED", "disabled"),
    ("ACTIVE", "active"),
    ("HIDDEN", "hidden"),
    ("END", "end"),
    ("INSERT", "insert"),
    ("FLAT", "flat"),
    ("RAISED", "raised"),
    ("SUNKEN", "sunken"),
    ("GROOVE", "groove"),
    ("RIDGE", "ridge"),
    ("SOLID", "solid"),
    ("WORD", "word"),
    ("CHAR", "char"),
];

/// Default constant table as values.
pub fn default_constants() -> BTreeMap<String, Value> {
    DEFAULT_CONSTANTS
        .iter()
        .map(|(name, value)| ((*name).to_owned(), Value::from(*value)))
        .collect()
}

pub struct Environment {
    evaluator: Rc<dyn ExpressionEvaluator>,
    translator: Option<Rc<dyn Translator>>,
    resolvers: BTreeMap<String, Rc<dyn ResourceResolver>>,
    constants: BTreeMap<String, Value>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            evaluator: Rc::new(Interpreter::new()),
            translator: None,
            resolvers: BTreeMap::new(),
            constants: default_constants(),
        }
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evaluator(mut self, evaluator: Rc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_translator(mut self, translator: Rc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Register the resolver for `prefix:` resource references.
    pub fn with_resolver(
        mut self,
        prefix: impl Into<String>,
        resolver: Rc<dyn ResourceResolver>,
    ) -> Self {
        self.resolvers.insert(prefix.into(), resolver);
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    pub fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    pub fn translator(&self) -> Option<&Rc<dyn Translator>> {
        self.translator.as_ref()
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn has_resolver(&self, prefix: &str) -> bool {
        self.resolvers.contains_key(prefix)
    }

    pub fn resolve_resource(&self, spec: &ResourceSpec) -> Result<Rc<dyn Resource>, BindingError> {
        let resolver = self.resolvers.get(&spec.prefix).ok_or_else(|| {
            BindingError::Resource(format!("no resolver for '{}:' resources", spec.prefix))
        })?;
        resolver.resolve(spec)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("translator", &self.translator.is_some())
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("constants", &self.constants.len())
            .finish()
    }
}
