//! Widget adapters and the rendering backend seam.
//!
//! A [`Backend`] owns the real on-screen widgets and hands back opaque
//! [`NativeElement`] handles. A [`Widget`] adapts one component kind to that
//! backend: it is created from a [`WidgetRequest`] by a [`Factory`], mounts
//! exactly once, then receives only the attributes that changed.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use super::attributes::{AttributeChanges, ResolvedAttributes};
use super::schema::Schema;
use crate::reactive::Namespace;

// ---------------------------------------------------------------------------
// Native handles
// ---------------------------------------------------------------------------

/// Opaque handle to a widget created by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeElement(u64);

impl NativeElement {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Result of a mount: the element itself and where children attach.
///
/// The outlet differs from the element for containers whose body is a
/// separate region (a titled panel mounts children into its body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mounted {
    pub element: NativeElement,
    pub outlet: NativeElement,
}

impl Mounted {
    /// A mount whose children attach to the element itself.
    pub fn leaf(element: NativeElement) -> Self {
        Self {
            element,
            outlet: element,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid attribute '{key}': {message}")]
    InvalidAttribute { key: String, message: String },
    #[error("'{0}' does not accept children")]
    NoChildren(String),
    #[error("widget is not mounted")]
    NotMounted,
    #[error("widget is already mounted")]
    AlreadyMounted,
}

impl WidgetError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            key: key.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// What the backend needs to create one widget.
#[derive(Debug, Clone, Copy)]
pub struct MountRequest<'a> {
    /// Component kind (`label`, `frame`, ...).
    pub kind: &'a str,
    /// Outlet of the nearest mounted ancestor; `None` for a top-level widget.
    pub parent: Option<NativeElement>,
    pub attributes: &'a ResolvedAttributes,
}

/// The pluggable rendering backend.
///
/// Methods take `&self`; backends are shared behind `Rc` by every widget of
/// a tree and keep their own state in cells.
pub trait Backend {
    fn mount(&self, request: MountRequest<'_>) -> Result<Mounted, WidgetError>;

    /// Apply changed attributes. `changes` never contains unchanged keys.
    fn configure(&self, element: NativeElement, changes: &AttributeChanges)
        -> Result<(), WidgetError>;

    fn destroy(&self, element: NativeElement) -> Result<(), WidgetError>;
}

// ---------------------------------------------------------------------------
// Widget adapter
// ---------------------------------------------------------------------------

/// Adapter between a component and the backend.
pub trait Widget {
    fn kind(&self) -> &str;

    /// Mount into `parent`. Called once.
    fn create(
        &mut self,
        parent: Option<NativeElement>,
        attributes: &ResolvedAttributes,
    ) -> Result<Mounted, WidgetError>;

    fn configure(&mut self, changes: &AttributeChanges) -> Result<(), WidgetError>;

    fn destroy(&mut self) -> Result<(), WidgetError>;

    fn element(&self) -> Option<NativeElement>;

    /// Where children mount. Defaults to the element.
    fn outlet(&self) -> Option<NativeElement> {
        self.element()
    }
}

/// Everything a [`Factory`] receives to build an adapter.
#[derive(Clone)]
pub struct WidgetRequest<'a> {
    pub kind: &'a str,
    pub namespace: &'a Namespace,
    pub backend: &'a Rc<dyn Backend>,
}

pub type WidgetFactory = Rc<dyn Fn(&WidgetRequest<'_>) -> Result<Box<dyn Widget>, WidgetError>>;

/// A named component constructor, optionally with an attribute schema.
///
/// Stored in the [`Registry`](crate::widgets::Registry) for builtin kinds
/// and in namespaces (as [`Value::Factory`](crate::value::Value::Factory))
/// for host-defined ones.
#[derive(Clone)]
pub struct Factory {
    name: Rc<str>,
    schema: Option<Rc<Schema>>,
    build: WidgetFactory,
}

impl Factory {
    pub fn new(
        name: impl Into<Rc<str>>,
        build: impl Fn(&WidgetRequest<'_>) -> Result<Box<dyn Widget>, WidgetError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            schema: None,
            build: Rc::new(build),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(Rc::new(schema));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_deref()
    }

    pub fn build(&self, request: &WidgetRequest<'_>) -> Result<Box<dyn Widget>, WidgetError> {
        (self.build)(request)
    }

    pub fn ptr_eq(&self, other: &Factory) -> bool {
        Rc::ptr_eq(&self.build, &other.build)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("name", &self.name)
            .field("schema", &self.schema.is_some())
            .finish()
    }
}
