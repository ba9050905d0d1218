//! In-memory backend that records every call.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use crate::value::Value;
use crate::widget::{
    AttributeChanges, Backend, MountRequest, Mounted, NativeElement, ResolvedAttributes,
    WidgetError,
};

/// One live element as the backend sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub kind: String,
    pub parent: Option<NativeElement>,
    pub attributes: ResolvedAttributes,
}

#[derive(Default)]
struct State {
    next_id: u64,
    ops: Vec<String>,
    elements: BTreeMap<NativeElement, ElementRecord>,
    failing: HashSet<String>,
}

/// A [`Backend`] keeping elements in memory and logging each call as a
/// line of text:
///
/// ```text
/// mount frame#1
/// mount label#2 in #1 text="0"
/// configure label#2 text="1"
/// destroy label#2
/// ```
///
/// Element ids start at 1 and are never reused.
#[derive(Default)]
pub struct RecordingBackend {
    state: RefCell<State>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later mount of `kind` fail.
    pub fn fail_on(&self, kind: impl Into<String>) {
        self.state.borrow_mut().failing.insert(kind.into());
    }

    pub fn ops(&self) -> Vec<String> {
        self.state.borrow().ops.clone()
    }

    pub fn take_ops(&self) -> Vec<String> {
        std::mem::take(&mut self.state.borrow_mut().ops)
    }

    pub fn record(&self, element: NativeElement) -> Option<ElementRecord> {
        self.state.borrow().elements.get(&element).cloned()
    }

    pub fn kind(&self, element: NativeElement) -> Option<String> {
        self.record(element).map(|r| r.kind)
    }

    pub fn attributes(&self, element: NativeElement) -> Option<ResolvedAttributes> {
        self.record(element).map(|r| r.attributes)
    }

    pub fn attribute(&self, element: NativeElement, key: &str) -> Option<Value> {
        self.state
            .borrow()
            .elements
            .get(&element)
            .and_then(|r| r.attributes.get(key).cloned())
    }

    /// Live elements of `kind`, in creation order.
    pub fn elements_of_kind(&self, kind: &str) -> Vec<NativeElement> {
        self.state
            .borrow()
            .elements
            .iter()
            .filter(|(_, r)| r.kind == kind)
            .map(|(e, _)| *e)
            .collect()
    }

    /// Live elements whose parent is `parent`, in creation order.
    pub fn children_of(&self, parent: Option<NativeElement>) -> Vec<NativeElement> {
        self.state
            .borrow()
            .elements
            .iter()
            .filter(|(_, r)| r.parent == parent)
            .map(|(e, _)| *e)
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().elements.len()
    }
}

impl Backend for RecordingBackend {
    fn mount(&self, request: MountRequest<'_>) -> Result<Mounted, WidgetError> {
        let mut state = self.state.borrow_mut();
        if state.failing.contains(request.kind) {
            return Err(WidgetError::Backend(format!("cannot create '{}'", request.kind)));
        }
        if let Some(parent) = request.parent {
            if !state.elements.contains_key(&parent) {
                return Err(WidgetError::Backend(format!("no parent #{}", parent.raw())));
            }
        }
        state.next_id += 1;
        let element = NativeElement::new(state.next_id);

        let mut op = format!("mount {}#{}", request.kind, element.raw());
        if let Some(parent) = request.parent {
            op.push_str(&format!(" in #{}", parent.raw()));
        }
        if !request.attributes.is_empty() {
            op.push_str(&format!(" {}", request.attributes));
        }
        state.ops.push(op);
        state.elements.insert(
            element,
            ElementRecord {
                kind: request.kind.to_owned(),
                parent: request.parent,
                attributes: request.attributes.clone(),
            },
        );
        Ok(Mounted::leaf(element))
    }

    fn configure(
        &self,
        element: NativeElement,
        changes: &AttributeChanges,
    ) -> Result<(), WidgetError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .elements
            .get_mut(&element)
            .ok_or(WidgetError::NotMounted)?;
        for (key, value) in changes.changed() {
            record.attributes.insert(key.clone(), value.clone());
        }
        let mut remaining = ResolvedAttributes::new();
        for (key, value) in record.attributes.iter() {
            if !changes.removed().iter().any(|r| r == key) {
                remaining.insert(key.clone(), value.clone());
            }
        }
        record.attributes = remaining;
        let op = format!("configure {}#{} {changes}", record.kind, element.raw());
        state.ops.push(op);
        Ok(())
    }

    fn destroy(&self, element: NativeElement) -> Result<(), WidgetError> {
        let mut state = self.state.borrow_mut();
        let record = state
            .elements
            .remove(&element)
            .ok_or(WidgetError::NotMounted)?;
        state.ops.push(format!("destroy {}#{}", record.kind, element.raw()));
        Ok(())
    }
}
