//! Reactivity core: subscribe/notify graphs, scoped namespaces and
//! writeable cells.

pub mod namespace;
pub mod subscribe;
pub mod writeable;

pub use namespace::{Namespace, WeakNamespace};
pub use subscribe::{Observable, Subscribeable, Subscriber, SubscriptionId};
pub use writeable::{Writeable, SET_NAME};
