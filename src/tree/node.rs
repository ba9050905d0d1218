//! Component nodes stored in the tree arena.

use std::rc::Rc;

use slotmap::new_key_type;

use crate::error::MountError;
use crate::markup::{Instruction, Literal};
use crate::reactive::{Namespace, Subscriber, Writeable};
use crate::widget::{Factory, NativeElement, ResolvedAttributes, Widget};

new_key_type! {
    /// Identifier of a live component. Stale after the component is destroyed.
    pub struct ComponentId;
}

/// One attribute as bound at mount time.
#[derive(Debug, Clone)]
pub(crate) struct BoundAttribute {
    pub key: String,
    pub literal: Literal,
}

pub(crate) struct TagState {
    pub factory: Factory,
    pub widget: Box<dyn Widget>,
    pub attributes: Vec<BoundAttribute>,
    /// Table sent to the backend by the last mount or configure.
    pub last: ResolvedAttributes,
}

pub(crate) struct ConditionalState {
    pub condition: Writeable,
    pub shown: bool,
}

pub(crate) struct RepeatGroup {
    pub scope: Namespace,
    pub members: Vec<ComponentId>,
}

pub(crate) struct RepeatState {
    pub source: Writeable,
    pub groups: Vec<RepeatGroup>,
}

pub(crate) enum NodeKind {
    Tag(TagState),
    Conditional(ConditionalState),
    Repeat(RepeatState),
    /// Stand-in for a subtree that failed to mount.
    Placeholder {
        element: NativeElement,
        error: MountError,
    },
}

pub(crate) struct Node {
    pub instruction: Rc<Instruction>,
    pub namespace: Namespace,
    pub parent: Option<ComponentId>,
    pub children: Vec<ComponentId>,
    /// Where this node's widget, or a structural node's children, mount.
    pub outlet: Option<NativeElement>,
    pub depth: usize,
    pub kind: NodeKind,
    pub subscriptions: Subscriber,
}

impl Node {
    pub fn element(&self) -> Option<NativeElement> {
        match &self.kind {
            NodeKind::Tag(tag) => tag.widget.element(),
            NodeKind::Placeholder { element, .. } => Some(*element),
            NodeKind::Conditional(_) | NodeKind::Repeat(_) => None,
        }
    }

    /// Where children of this node mount.
    pub fn child_outlet(&self) -> Option<NativeElement> {
        match &self.kind {
            NodeKind::Tag(tag) => tag.widget.outlet(),
            _ => self.outlet,
        }
    }
}

/// Public summary of a component's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Tag { name: String },
    Conditional { shown: bool },
    Repeat { groups: usize },
    Placeholder,
}
