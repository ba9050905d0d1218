//! Generic adapter forwarding to the [`Backend`].

use std::rc::Rc;

use crate::widget::{
    AttributeChanges, Backend, MountRequest, Mounted, NativeElement, ResolvedAttributes, Widget,
    WidgetError, WidgetRequest,
};

/// A widget that is exactly what the backend creates for its kind.
///
/// Every builtin kind is a `NativeWidget`; kinds differ in their
/// [`Schema`](crate::widget::Schema) only.
pub struct NativeWidget {
    kind: String,
    backend: Rc<dyn Backend>,
    mounted: Option<Mounted>,
}

impl NativeWidget {
    pub fn new(kind: impl Into<String>, backend: Rc<dyn Backend>) -> Self {
        Self {
            kind: kind.into(),
            backend,
            mounted: None,
        }
    }

    /// Factory body shared by the builtin kinds.
    pub fn build(request: &WidgetRequest<'_>) -> Result<Box<dyn Widget>, WidgetError> {
        Ok(Box::new(Self::new(request.kind, Rc::clone(request.backend))))
    }

    fn element_or_err(&self) -> Result<NativeElement, WidgetError> {
        self.mounted
            .map(|m| m.element)
            .ok_or(WidgetError::NotMounted)
    }
}

impl Widget for NativeWidget {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn create(
        &mut self,
        parent: Option<NativeElement>,
        attributes: &ResolvedAttributes,
    ) -> Result<Mounted, WidgetError> {
        if self.mounted.is_some() {
            return Err(WidgetError::AlreadyMounted);
        }
        let mounted = self.backend.mount(MountRequest {
            kind: &self.kind,
            parent,
            attributes,
        })?;
        self.mounted = Some(mounted);
        Ok(mounted)
    }

    fn configure(&mut self, changes: &AttributeChanges) -> Result<(), WidgetError> {
        let element = self.element_or_err()?;
        if changes.is_empty() {
            return Ok(());
        }
        self.backend.configure(element, changes)
    }

    fn destroy(&mut self) -> Result<(), WidgetError> {
        let element = self.element_or_err()?;
        self.mounted = None;
        self.backend.destroy(element)
    }

    fn element(&self) -> Option<NativeElement> {
        self.mounted.map(|m| m.element)
    }

    fn outlet(&self) -> Option<NativeElement> {
        self.mounted.map(|m| m.outlet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBackend;

    #[test]
    fn test_mounts_once_then_configures() {
        let backend = Rc::new(RecordingBackend::new());
        let mut w = NativeWidget::new("label", backend.clone());
        let attrs = ResolvedAttributes::new().with("text", "a");

        assert_eq!(w.configure(&AttributeChanges::default()), Err(WidgetError::NotMounted));
        let mounted = w.create(None, &attrs).unwrap();
        assert_eq!(w.element(), Some(mounted.element));
        assert_eq!(w.create(None, &attrs), Err(WidgetError::AlreadyMounted));

        let newer = attrs.clone().with("text", "b");
        w.configure(&attrs.diff(&newer)).unwrap();
        w.destroy().unwrap();
        assert_eq!(w.element(), None);
        assert_eq!(
            backend.ops(),
            [r#"mount label#1 text="a""#, r#"configure label#1 text="b""#, "destroy label#1"]
        );
    }
}
