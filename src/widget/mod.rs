//! Widget adapters, the backend seam, attribute tables and lifecycle
//! tracking.

pub mod attributes;
pub mod lifecycle;
pub mod schema;
pub mod traits;

pub use attributes::{AttributeChanges, Position, ResolvedAttributes, Weights};
pub use lifecycle::{LifecycleEvent, LifecycleTracker};
pub use schema::Schema;
pub use traits::{
    Backend, Factory, MountRequest, Mounted, NativeElement, Widget, WidgetError, WidgetFactory,
    WidgetRequest,
};
