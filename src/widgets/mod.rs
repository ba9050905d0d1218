//! Builtin component kinds: frame, label, button, entry, checkbutton.

pub mod button;
pub mod checkbutton;
pub mod entry;
pub mod frame;
pub mod label;
pub mod native;
pub mod registry;

pub use native::NativeWidget;
pub use registry::Registry;
