//! Pilot: programmatic interaction with a headless view.
//!
//! The `Pilot` owns an [`App`] backed by a [`RecordingBackend`] and one
//! [`View`], and simulates what a toolkit event loop would do: deliver a
//! click or a keystroke, then propagate the resulting namespace changes.

use std::rc::Rc;

use super::backend::RecordingBackend;
use super::snapshot::{render_components, render_elements};
use crate::app::{App, AppConfig, View};
use crate::error::Error;
use crate::reactive::Namespace;
use crate::value::Value;
use crate::widget::NativeElement;

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless driver for one view.
///
/// ```ignore
/// use taktl::testing::Pilot;
///
/// let mut pilot = Pilot::new("\\button text='+' command={inc}")?;
/// pilot.view().expose_action("inc", || {});
/// pilot.render()?;
/// pilot.click(pilot.find("button", 0).unwrap())?;
/// ```
pub struct Pilot {
    backend: Rc<RecordingBackend>,
    app: App,
    view: View,
}

impl Pilot {
    pub fn new(source: &str) -> Result<Self, Error> {
        Self::with_config(AppConfig::default(), source)
    }

    pub fn with_config(config: AppConfig, source: &str) -> Result<Self, Error> {
        let backend = Rc::new(RecordingBackend::new());
        let app = App::new(config, backend.clone());
        let view = View::new(&app, source)?;
        Ok(Self { backend, app, view })
    }

    /// Mount the view at the top level.
    pub fn render(&mut self) -> Result<(), Error> {
        self.view.render(None)?;
        Ok(())
    }

    /// Propagate pending changes. Returns the number of components updated.
    pub fn update(&mut self) -> Result<usize, Error> {
        Ok(self.view.update()?)
    }

    /// The `index`-th live element of `kind`, in creation order.
    pub fn find(&self, kind: &str, index: usize) -> Option<NativeElement> {
        self.backend.elements_of_kind(kind).get(index).copied()
    }

    /// Press a button: run its `command`, then update.
    pub fn click(&mut self, element: NativeElement) -> Result<Value, Error> {
        let result = self.view.invoke(element, "command", &[])?;
        self.update()?;
        Ok(result)
    }

    /// Fire the `bind:<event>` handler of `element`, then update.
    pub fn trigger(
        &mut self,
        element: NativeElement,
        event: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        let result = self.view.invoke(element, &format!("bind:{event}"), args)?;
        self.update()?;
        Ok(result)
    }

    /// Edit a two-way attribute the way the user would, then update.
    pub fn input(
        &mut self,
        element: NativeElement,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        self.view.input(element, key, value)?;
        self.update()?;
        Ok(())
    }

    pub fn namespace(&self) -> &Namespace {
        self.view.namespace()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn backend(&self) -> &RecordingBackend {
        &self.backend
    }

    /// Current value of `key` on `element`, as the backend last received it.
    pub fn attribute(&self, element: NativeElement, key: &str) -> Option<Value> {
        self.backend.attribute(element, key)
    }

    pub fn take_ops(&self) -> Vec<String> {
        self.backend.take_ops()
    }

    /// Live element tree.
    pub fn snapshot(&self) -> String {
        render_elements(&self.backend)
    }

    /// Component tree, structural components included.
    pub fn component_snapshot(&self) -> String {
        render_components(self.view.tree())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
