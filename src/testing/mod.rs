//! Headless testing support: a recording backend, snapshot helpers and the
//! [`Pilot`].
//!
//! Use the [`Pilot`] to drive a [`View`](crate::app::View) without a real
//! toolkit. Use [`render_elements`] and [`render_components`] to capture the
//! resulting trees as plain text for snapshot assertions.

pub mod backend;
pub mod pilot;
pub mod snapshot;

pub use backend::{ElementRecord, RecordingBackend};
pub use pilot::Pilot;
pub use snapshot::{render_components, render_elements};
