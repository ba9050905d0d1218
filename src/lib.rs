//! # taktl
//!
//! An indentation-based UI markup compiled into reactive, incrementally
//! updated component trees.
//!
//! A template is parsed once into an immutable instruction tree, then mounted
//! against a scoped, observable namespace. Attribute values are literals or
//! bound expressions; when a bound value changes, only the affected
//! components are reconfigured, and only with the attributes that changed.
//! Rendering is delegated to a pluggable [`Backend`](widget::Backend).
//!
//! ```text
//! \frame pos:grid=0,0
//!   \label text={count}
//!   \button text='+' command={increment}
//!   !if count > 3
//!     \label text='that is a lot'
//!   !enum items:(i, item)
//!     \label text={str(i) + ': ' + item}
//! ```
//!
//! ## Core Systems
//!
//! - **[`markup`]**: Cursor, literal evaluator, parser, template cache
//! - **[`expr`]**: Default bound-expression language (logos lexer, interpreter)
//! - **[`reactive`]**: Subscribe/notify, chained namespaces, writeable cells
//! - **[`tree`]**: Slotmap-backed component tree: mount, update, flush, destroy
//! - **[`widget`]**: Backend seam, widget adapters, attribute grouping, schemas
//! - **[`widgets`]**: Builtin kinds and the kind registry
//! - **[`app`]**: `App`, `AppConfig` and `View`
//! - **[`testing`]**: Recording backend, snapshot helpers, `Pilot`

// Foundation
pub mod error;
pub mod logging;
pub mod value;

// Services
pub mod env;
pub mod i18n;
pub mod media;

// Markup and expressions
pub mod expr;
pub mod markup;

// Reactivity
pub mod reactive;

// Components
pub mod tree;
pub mod widget;
pub mod widgets;

// Application
pub mod app;
pub mod testing;

pub use app::{App, AppConfig, View};
pub use env::Environment;
pub use error::{BindingError, Error, LiteralError, MountError, SyntaxError};
pub use markup::{parse, Template, TemplateCache};
pub use reactive::{Namespace, Writeable};
pub use tree::{ComponentId, ComponentTree};
pub use value::{Callable, Value};
pub use widget::{Backend, Factory, NativeElement};
