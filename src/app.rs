//! Application shell: configuration, shared services and views.

use std::cell::RefCell;
use std::rc::Rc;

use crate::env::Environment;
use crate::error::{Error, MountError};
use crate::logging::{init_logging, LoggingConfig};
use crate::markup::{Template, TemplateCache};
use crate::reactive::Namespace;
use crate::tree::{ComponentId, ComponentTree, TreeOptions};
use crate::value::{Callable, Value};
use crate::widget::{Backend, Factory, NativeElement};
use crate::widgets::Registry;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Configuration for the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Share parsed templates between views with the same source.
    pub cache_templates: bool,
    /// Reject attributes a builtin kind does not know.
    pub strict_attributes: bool,
    /// Replace a failing child subtree with a placeholder widget.
    pub placeholder_on_error: bool,
    /// `env_logger` filter used by [`App::init_logging`].
    pub log_filter: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_templates: true,
            strict_attributes: true,
            placeholder_on_error: false,
            log_filter: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_templates(mut self, enabled: bool) -> Self {
        self.cache_templates = enabled;
        self
    }

    pub fn with_strict_attributes(mut self, strict: bool) -> Self {
        self.strict_attributes = strict;
        self
    }

    pub fn with_placeholder_on_error(mut self, enabled: bool) -> Self {
        self.placeholder_on_error = enabled;
        self
    }

    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            strict_attributes: self.strict_attributes,
            placeholder_on_error: self.placeholder_on_error,
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

type CreateHook = Rc<dyn Fn(&View)>;

/// Owns what views share: config, template cache, kind registry, backend
/// and environment.
pub struct App {
    config: AppConfig,
    cache: TemplateCache,
    registry: Rc<Registry>,
    backend: Rc<dyn Backend>,
    env: Rc<Environment>,
    on_create: RefCell<Vec<CreateHook>>,
}

impl App {
    pub fn new(config: AppConfig, backend: Rc<dyn Backend>) -> Self {
        Self {
            cache: TemplateCache::new(config.cache_templates),
            config,
            registry: Rc::new(Registry::builtin()),
            backend,
            env: Rc::new(Environment::new()),
            on_create: RefCell::new(Vec::new()),
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = Rc::new(env);
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Rc::new(registry);
        self
    }

    /// Add a kind to the registry. Views created afterwards see it.
    pub fn register(&mut self, factory: Factory) {
        Rc::make_mut(&mut self.registry).register(factory);
    }

    /// Run `hook` after the first render of every view created afterwards.
    pub fn on_create(&self, hook: impl Fn(&View) + 'static) {
        self.on_create.borrow_mut().push(Rc::new(hook));
    }

    /// Install `env_logger` with the configured filter.
    pub fn init_logging(&self) {
        let mut logging = LoggingConfig::default();
        logging.env_filter = self.config.log_filter.clone();
        init_logging(logging);
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn environment(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn backend(&self) -> &Rc<dyn Backend> {
        &self.backend
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A template, its own namespace and the component tree mounted from it.
pub struct View {
    template: Template,
    namespace: Namespace,
    tree: ComponentTree,
    root: Option<ComponentId>,
    hooks: Vec<CreateHook>,
}

impl View {
    /// Parse `source` (through the app's cache) into an unrendered view.
    pub fn new(app: &App, source: &str) -> Result<Self, Error> {
        let template = app.cache.get_or_parse(source)?;
        let tree = ComponentTree::new(Rc::clone(&app.registry), Rc::clone(&app.backend))
            .with_options(app.config.tree_options());
        Ok(Self {
            template,
            namespace: Namespace::new(Rc::clone(&app.env)),
            tree,
            root: None,
            hooks: app.on_create.borrow().clone(),
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    pub fn root(&self) -> Option<ComponentId> {
        self.root
    }

    /// Native element of the root component.
    pub fn element(&self) -> Option<NativeElement> {
        self.root.and_then(|id| self.tree.element(id))
    }

    /// Bind `name` to `value` in the view namespace.
    pub fn expose(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.namespace.set(name, value);
    }

    /// Bind `name` to an argument-less action.
    pub fn expose_action(&self, name: &str, action: impl Fn() + 'static) {
        self.namespace.set(name, Callable::action(name, action));
    }

    /// Mount the template under `parent`. Create hooks run after the first
    /// successful render.
    pub fn render(&mut self, parent: Option<NativeElement>) -> Result<ComponentId, Error> {
        if let Some(root) = self.root.take() {
            self.tree.destroy(root)?;
        }
        // Start from a clean baseline so only later writes count as changes.
        self.namespace.watch_changes();
        let root = self
            .tree
            .mount(self.template.root(), &self.namespace, parent)?;
        self.root = Some(root);
        log::debug!("rendered view with {} components", self.tree.len());

        for hook in std::mem::take(&mut self.hooks) {
            hook(self);
        }
        Ok(root)
    }

    /// Propagate pending namespace writes to the mounted tree. Returns the
    /// number of components updated.
    pub fn update(&mut self) -> Result<usize, MountError> {
        if self.root.is_none() {
            return Err(MountError::NotMounted);
        }
        self.namespace.watch_changes();
        self.tree.flush()
    }

    pub fn destroy(&mut self) -> Result<(), MountError> {
        let root = self.root.take().ok_or(MountError::NotMounted)?;
        self.tree.destroy(root)
    }

    /// Forward user input on `element` to its two-way binding.
    pub fn input(
        &mut self,
        element: NativeElement,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), MountError> {
        self.tree.input(element, key, value)
    }

    /// Call the callable attribute `key` of `element`.
    pub fn invoke(
        &self,
        element: NativeElement,
        key: &str,
        args: &[Value],
    ) -> Result<Value, MountError> {
        self.tree.invoke(element, key, args)
    }
}
