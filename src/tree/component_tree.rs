//! Live component tree: mount, incremental update, teardown.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use super::node::{
    BoundAttribute, ComponentId, ComponentKind, ConditionalState, Node, NodeKind, RepeatGroup,
    RepeatState, TagState,
};
use crate::error::{BindingError, LiteralError, MountError};
use crate::markup::{
    evaluate_literal, ConditionalInstruction, Instruction, InstructionKind, RepeatInstruction,
    TagInstruction,
};
use crate::reactive::{Namespace, Subscriber, Writeable};
use crate::value::Value;
use crate::widget::{
    Backend, Factory, LifecycleEvent, LifecycleTracker, MountRequest, NativeElement,
    ResolvedAttributes, WidgetError, WidgetRequest,
};
use crate::widgets::Registry;

/// Backend kind used for error placeholders.
pub const PLACEHOLDER_KIND: &str = "placeholder";

/// Upper bound on update rounds in one [`ComponentTree::flush`].
const MAX_FLUSH_ROUNDS: usize = 32;

/// Tree-level switches, normally taken from [`AppConfig`](crate::app::AppConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Reject attributes a kind's schema does not list.
    pub strict_attributes: bool,
    /// Mount a placeholder instead of failing when a child subtree fails.
    pub placeholder_on_error: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            strict_attributes: true,
            placeholder_on_error: false,
        }
    }
}

/// Errors scoped to one tag, before the component is known to the arena.
struct TagContext<'a> {
    name: &'a str,
    line: usize,
}

impl TagContext<'_> {
    fn literal(&self, key: &str, source: LiteralError) -> MountError {
        MountError::Literal {
            component: self.name.to_owned(),
            key: key.to_owned(),
            line: self.line,
            source,
        }
    }

    fn binding(&self, key: &str, source: BindingError) -> MountError {
        MountError::Binding {
            component: self.name.to_owned(),
            key: key.to_owned(),
            line: self.line,
            source,
        }
    }

    fn widget(&self, source: WidgetError) -> MountError {
        match source {
            WidgetError::InvalidAttribute { key, message } => MountError::InvalidAttribute {
                component: self.name.to_owned(),
                key,
                line: self.line,
                message,
            },
            source => MountError::Widget {
                component: self.name.to_owned(),
                line: self.line,
                source,
            },
        }
    }
}

/// Mounted components of one or more instruction trees.
///
/// Components live in a slotmap arena. Bindings enqueue their component in
/// the [`LifecycleTracker`] when they change; [`flush`](Self::flush) then
/// updates exactly the queued subtrees.
pub struct ComponentTree {
    nodes: SlotMap<ComponentId, Node>,
    roots: Vec<ComponentId>,
    registry: Rc<Registry>,
    backend: Rc<dyn Backend>,
    lifecycle: Rc<RefCell<LifecycleTracker>>,
    options: TreeOptions,
}

impl ComponentTree {
    pub fn new(registry: Rc<Registry>, backend: Rc<dyn Backend>) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            registry,
            backend,
            lifecycle: Rc::new(RefCell::new(LifecycleTracker::new())),
            options: TreeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_mounted(&self, id: ComponentId) -> bool {
        self.lifecycle.borrow().is_mounted(id)
    }

    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn element(&self, id: ComponentId) -> Option<NativeElement> {
        self.nodes.get(id).and_then(Node::element)
    }

    pub fn namespace(&self, id: ComponentId) -> Option<&Namespace> {
        self.nodes.get(id).map(|n| &n.namespace)
    }

    pub fn instruction(&self, id: ComponentId) -> Option<&Rc<Instruction>> {
        self.nodes.get(id).map(|n| &n.instruction)
    }

    pub fn kind(&self, id: ComponentId) -> Option<ComponentKind> {
        self.nodes.get(id).map(|n| match &n.kind {
            NodeKind::Tag(tag) => ComponentKind::Tag {
                name: tag.widget.kind().to_owned(),
            },
            NodeKind::Conditional(c) => ComponentKind::Conditional { shown: c.shown },
            NodeKind::Repeat(r) => ComponentKind::Repeat {
                groups: r.groups.len(),
            },
            NodeKind::Placeholder { .. } => ComponentKind::Placeholder,
        })
    }

    /// Attributes last sent to the backend for a tag component.
    pub fn attributes(&self, id: ComponentId) -> Option<&ResolvedAttributes> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Tag(tag) => Some(&tag.last),
            _ => None,
        }
    }

    /// Members and scope of each group of a repeat component, in order.
    pub fn repeat_groups(&self, id: ComponentId) -> Vec<(Namespace, Vec<ComponentId>)> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Repeat(r)) => r
                .groups
                .iter()
                .map(|g| (g.scope.clone(), g.members.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The error a placeholder component stands in for.
    pub fn placeholder_error(&self, id: ComponentId) -> Option<&MountError> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Placeholder { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The tag component mounted as `element`.
    pub fn find_by_element(&self, element: NativeElement) -> Option<ComponentId> {
        self.nodes
            .iter()
            .find(|(_, n)| matches!(n.kind, NodeKind::Tag(_)) && n.element() == Some(element))
            .map(|(id, _)| id)
    }

    /// Components in pre-order from every root.
    pub fn walk(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack: Vec<ComponentId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn depth(&self, id: ComponentId) -> Option<usize> {
        self.nodes.get(id).map(|n| n.depth)
    }

    /// Start keeping a log of mount, update and destroy events.
    pub fn record_events(&self) {
        self.lifecycle.borrow_mut().record_events();
    }

    pub fn take_events(&self) -> Vec<LifecycleEvent> {
        self.lifecycle.borrow_mut().take_events()
    }

    pub fn has_pending_updates(&self) -> bool {
        self.lifecycle.borrow().has_dirty()
    }

    // -----------------------------------------------------------------------
    // Mount
    // -----------------------------------------------------------------------

    /// Mount `instruction` and its subtree against `namespace` under
    /// `parent`. On failure nothing of the subtree stays mounted.
    pub fn mount(
        &mut self,
        instruction: &Rc<Instruction>,
        namespace: &Namespace,
        parent: Option<NativeElement>,
    ) -> Result<ComponentId, MountError> {
        let id = self.mount_node(instruction, namespace, None, parent, 0)?;
        self.roots.push(id);
        Ok(id)
    }

    fn mount_node(
        &mut self,
        instruction: &Rc<Instruction>,
        namespace: &Namespace,
        parent: Option<ComponentId>,
        outlet: Option<NativeElement>,
        depth: usize,
    ) -> Result<ComponentId, MountError> {
        log::trace!("mounting {} (line {})", instruction.label(), instruction.line);
        let node = Node {
            instruction: Rc::clone(instruction),
            namespace: namespace.clone(),
            parent,
            children: Vec::new(),
            outlet,
            depth,
            kind: match &instruction.kind {
                InstructionKind::Tag(tag) => {
                    NodeKind::Tag(self.create_tag(tag, instruction, namespace, outlet)?)
                }
                InstructionKind::Conditional(cond) => {
                    NodeKind::Conditional(conditional_state(cond, instruction.line, namespace)?)
                }
                InstructionKind::Repeat(rep) => {
                    NodeKind::Repeat(repeat_state(rep, instruction.line, namespace)?)
                }
            },
            subscriptions: Subscriber::new(),
        };
        let id = self.nodes.insert(node);
        self.lifecycle.borrow_mut().on_mount(id);
        self.bind_alias(id);
        self.subscribe(id);

        if let Err(err) = self.mount_initial_children(id) {
            self.destroy_node(id);
            return Err(err);
        }
        Ok(id)
    }

    fn create_tag(
        &self,
        tag: &TagInstruction,
        instruction: &Instruction,
        namespace: &Namespace,
        outlet: Option<NativeElement>,
    ) -> Result<TagState, MountError> {
        let ctx = TagContext {
            name: &tag.name,
            line: instruction.line,
        };
        let factory = self.resolve_kind(&tag.name, namespace, instruction.line)?;

        if let Some(schema) = factory.schema() {
            let unknown = schema.unknown_keys(tag.attributes.iter().map(|a| a.key.as_str()));
            if let Some(key) = unknown.first() {
                if self.options.strict_attributes {
                    return Err(MountError::UnknownAttribute {
                        component: tag.name.clone(),
                        key: (*key).to_owned(),
                        line: instruction.line,
                    });
                }
                log::warn!(
                    "'{}' (line {}) passes unknown attributes through: {unknown:?}",
                    tag.name,
                    instruction.line
                );
            }
            if !instruction.children.is_empty() && !schema.accepts_children() {
                return Err(ctx.widget(WidgetError::NoChildren(tag.name.clone())));
            }
        }

        let attributes = tag
            .attributes
            .iter()
            .map(|attr| {
                evaluate_literal(&attr.value.text, Some(namespace))
                    .map(|literal| BoundAttribute {
                        key: attr.key.clone(),
                        literal,
                    })
                    .map_err(|e| ctx.literal(&attr.key, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let resolved = resolve_attributes(&ctx, &factory, &attributes)?;

        let mut widget = factory
            .build(&WidgetRequest {
                kind: &tag.name,
                namespace,
                backend: &self.backend,
            })
            .map_err(|e| ctx.widget(e))?;
        widget
            .create(outlet, &resolved)
            .map_err(|e| ctx.widget(e))?;
        log::debug!("mounted '{}' (line {})", tag.name, instruction.line);

        Ok(TagState {
            factory,
            widget,
            attributes,
            last: resolved,
        })
    }

    /// Registry first, then a factory value in the namespace (dotted paths
    /// allowed).
    fn resolve_kind(
        &self,
        name: &str,
        namespace: &Namespace,
        line: usize,
    ) -> Result<Factory, MountError> {
        if let Some(factory) = self.registry.get(name) {
            return Ok(factory.clone());
        }
        match namespace.get_path(name) {
            Ok(Value::Factory(factory)) => Ok(factory),
            _ => Err(MountError::UnknownComponent {
                name: name.to_owned(),
                line,
            }),
        }
    }

    fn bind_alias(&self, id: ComponentId) {
        let node = &self.nodes[id];
        let alias = node.instruction.as_tag().and_then(|t| t.alias.as_deref());
        if let (Some(alias), Some(element)) = (alias, node.element()) {
            node.namespace.set(alias, Value::Element(element));
        }
    }

    fn subscribe(&mut self, id: ComponentId) {
        let tracker = Rc::downgrade(&self.lifecycle);
        let node = &mut self.nodes[id];
        let mut sources: Vec<Writeable> = Vec::new();
        match &node.kind {
            NodeKind::Tag(tag) => sources.extend(
                tag.attributes
                    .iter()
                    .filter_map(|a| a.literal.as_writeable().cloned()),
            ),
            NodeKind::Conditional(c) => sources.push(c.condition.clone()),
            NodeKind::Repeat(r) => sources.push(r.source.clone()),
            NodeKind::Placeholder { .. } => {}
        }
        for source in &sources {
            node.subscriptions.subscribe_to(source, enqueue(&tracker, id));
        }
    }

    fn mount_initial_children(&mut self, id: ComponentId) -> Result<(), MountError> {
        let node = &self.nodes[id];
        let instructions = node.instruction.children.clone();
        match &node.kind {
            NodeKind::Tag(_) => {
                let scope = node.namespace.clone();
                let members = self.mount_children(id, &instructions, &scope)?;
                self.nodes[id].children = members;
            }
            // Shown children share the enclosing scope, so their aliases
            // are visible to siblings of the conditional.
            NodeKind::Conditional(c) if c.shown => {
                let scope = node.namespace.clone();
                let members = self.mount_children(id, &instructions, &scope)?;
                self.nodes[id].children = members;
            }
            NodeKind::Repeat(r) => {
                let items = r.source.get().map_err(|source| MountError::RepeatSource {
                    line: node.instruction.line,
                    source,
                })?;
                let groups = self.mount_groups(id, &items)?;
                self.install_groups(id, groups);
            }
            NodeKind::Conditional(_) | NodeKind::Placeholder { .. } => {}
        }
        Ok(())
    }

    /// Mount `instructions` as children of `id` in `scope`. A failure
    /// unmounts the siblings mounted so far, unless placeholders are enabled.
    fn mount_children(
        &mut self,
        id: ComponentId,
        instructions: &[Rc<Instruction>],
        scope: &Namespace,
    ) -> Result<Vec<ComponentId>, MountError> {
        let outlet = self.nodes[id].child_outlet();
        let depth = self.nodes[id].depth + 1;
        let mut members = Vec::with_capacity(instructions.len());
        for child in instructions {
            match self.mount_node(child, scope, Some(id), outlet, depth) {
                Ok(child_id) => members.push(child_id),
                Err(err) if self.options.placeholder_on_error => {
                    log::warn!("{err}; mounting a placeholder");
                    match self.mount_placeholder(child, scope, id, outlet, depth, err) {
                        Ok(placeholder) => members.push(placeholder),
                        Err(err) => {
                            self.destroy_all(&members);
                            return Err(err);
                        }
                    }
                }
                Err(err) => {
                    self.destroy_all(&members);
                    return Err(err);
                }
            }
        }
        Ok(members)
    }

    fn mount_placeholder(
        &mut self,
        instruction: &Rc<Instruction>,
        scope: &Namespace,
        parent: ComponentId,
        outlet: Option<NativeElement>,
        depth: usize,
        error: MountError,
    ) -> Result<ComponentId, MountError> {
        let attributes = ResolvedAttributes::new().with("text", error.to_string());
        let mounted = self
            .backend
            .mount(MountRequest {
                kind: PLACEHOLDER_KIND,
                parent: outlet,
                attributes: &attributes,
            })
            .map_err(|_| error.clone())?;
        let id = self.nodes.insert(Node {
            instruction: Rc::clone(instruction),
            namespace: scope.clone(),
            parent: Some(parent),
            children: Vec::new(),
            outlet,
            depth,
            kind: NodeKind::Placeholder {
                element: mounted.element,
                error,
            },
            subscriptions: Subscriber::new(),
        });
        self.lifecycle.borrow_mut().on_mount(id);
        Ok(id)
    }

    /// One group per item, each in a fresh child scope holding the index
    /// and item aliases.
    fn mount_groups(
        &mut self,
        id: ComponentId,
        items: &Value,
    ) -> Result<Vec<RepeatGroup>, MountError> {
        let node = &self.nodes[id];
        let line = node.instruction.line;
        let InstructionKind::Repeat(rep) = &node.instruction.kind else {
            return Ok(Vec::new());
        };
        let (index_alias, item_alias) = (rep.index_alias.clone(), rep.item_alias.clone());
        let instructions = node.instruction.children.clone();
        let namespace = node.namespace.clone();
        let items = items
            .iter_items()
            .map_err(|source| MountError::RepeatSource { line, source })?;

        let mut groups: Vec<RepeatGroup> = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let scope = namespace.child();
            scope.update([
                (index_alias.clone(), Value::from(index)),
                (item_alias.clone(), item),
            ]);
            match self.mount_children(id, &instructions, &scope) {
                Ok(members) => groups.push(RepeatGroup { scope, members }),
                Err(err) => {
                    for group in &groups {
                        self.destroy_all(&group.members);
                    }
                    return Err(err);
                }
            }
        }
        Ok(groups)
    }

    fn install_groups(&mut self, id: ComponentId, groups: Vec<RepeatGroup>) {
        let node = &mut self.nodes[id];
        node.children = groups.iter().flat_map(|g| g.members.iter().copied()).collect();
        if let NodeKind::Repeat(r) = &mut node.kind {
            r.groups = groups;
        }
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Re-resolve `id` and its subtree, configuring only changed attributes.
    ///
    /// Sibling subtrees are still updated after a failure; the first error
    /// is returned.
    pub fn update(&mut self, id: ComponentId) -> Result<(), MountError> {
        if !self.is_mounted(id) {
            return Err(MountError::NotMounted);
        }
        let mut visited = HashSet::new();
        self.update_node(id, &mut visited)
    }

    /// Update every component whose bindings changed since the last flush,
    /// outermost first. Returns the number of components updated.
    pub fn flush(&mut self) -> Result<usize, MountError> {
        let mut first_error = None;
        let mut updated = 0;
        for round in 0.. {
            let mut dirty = self.lifecycle.borrow_mut().take_dirty();
            if dirty.is_empty() {
                break;
            }
            if round == MAX_FLUSH_ROUNDS {
                log::warn!("bindings still changing after {MAX_FLUSH_ROUNDS} update rounds");
                break;
            }
            dirty.retain(|id| self.nodes.contains_key(*id));
            dirty.sort_by_key(|id| self.nodes[*id].depth);

            let mut visited = HashSet::new();
            for id in dirty {
                if visited.contains(&id) || !self.is_mounted(id) {
                    continue;
                }
                updated += 1;
                if let Err(err) = self.update_node(id, &mut visited) {
                    log::debug!("update failed: {err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(updated),
        }
    }

    fn update_node(
        &mut self,
        id: ComponentId,
        visited: &mut HashSet<ComponentId>,
    ) -> Result<(), MountError> {
        if !visited.insert(id) || !self.nodes.contains_key(id) {
            return Ok(());
        }
        self.lifecycle.borrow_mut().on_update(id);

        let own = match &self.nodes[id].kind {
            NodeKind::Tag(_) => self.update_tag(id),
            NodeKind::Conditional(_) => return self.update_conditional(id, visited),
            NodeKind::Repeat(_) => return self.update_repeat(id),
            NodeKind::Placeholder { .. } => Ok(()),
        };
        let children_result = self.update_children(id, visited);
        own.and(children_result)
    }

    fn update_children(
        &mut self,
        id: ComponentId,
        visited: &mut HashSet<ComponentId>,
    ) -> Result<(), MountError> {
        let children = self.children(id).to_vec();
        let mut first_error = None;
        for child in children {
            if let Err(err) = self.update_node(child, visited) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn update_tag(&mut self, id: ComponentId) -> Result<(), MountError> {
        let node = &mut self.nodes[id];
        let NodeKind::Tag(tag) = &mut node.kind else {
            return Ok(());
        };
        let Some(tag_instruction) = node.instruction.as_tag() else {
            return Ok(());
        };
        let ctx = TagContext {
            name: &tag_instruction.name,
            line: node.instruction.line,
        };
        let resolved = resolve_attributes(&ctx, &tag.factory, &tag.attributes)?;
        let changes = tag.last.diff(&resolved);
        if changes.is_empty() {
            return Ok(());
        }
        log::debug!("configuring '{}': {changes}", ctx.name);
        tag.widget.configure(&changes).map_err(|e| ctx.widget(e))?;
        tag.last = resolved;
        Ok(())
    }

    fn update_conditional(
        &mut self,
        id: ComponentId,
        visited: &mut HashSet<ComponentId>,
    ) -> Result<(), MountError> {
        let node = &self.nodes[id];
        let NodeKind::Conditional(state) = &node.kind else {
            return Ok(());
        };
        let line = node.instruction.line;
        let now = state
            .condition
            .get()
            .map_err(|source| MountError::Condition { line, source })?
            .is_truthy();

        match (state.shown, now) {
            (false, true) => {
                log::debug!("condition at line {line} became true");
                let scope = node.namespace.clone();
                let instructions = node.instruction.children.clone();
                let members = self.mount_children(id, &instructions, &scope)?;
                let node = &mut self.nodes[id];
                node.children = members;
                if let NodeKind::Conditional(state) = &mut node.kind {
                    state.shown = true;
                }
                Ok(())
            }
            (true, false) => {
                log::debug!("condition at line {line} became false");
                let members = std::mem::take(&mut self.nodes[id].children);
                if let NodeKind::Conditional(state) = &mut self.nodes[id].kind {
                    state.shown = false;
                }
                self.destroy_all(&members);
                Ok(())
            }
            (true, true) => self.update_children(id, visited),
            (false, false) => Ok(()),
        }
    }

    /// Mount a complete new set of groups, then destroy the previous set.
    fn update_repeat(&mut self, id: ComponentId) -> Result<(), MountError> {
        let node = &self.nodes[id];
        let NodeKind::Repeat(state) = &node.kind else {
            return Ok(());
        };
        let line = node.instruction.line;
        let items = state
            .source
            .get()
            .map_err(|source| MountError::RepeatSource { line, source })?;

        let groups = self.mount_groups(id, &items)?;
        log::debug!("repeat at line {line} re-materialized {} groups", groups.len());
        let previous: Vec<ComponentId> = std::mem::take(&mut self.nodes[id].children);
        self.install_groups(id, groups);
        self.destroy_all(&previous);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Destroy
    // -----------------------------------------------------------------------

    /// Destroy `id` and its subtree and detach it from its parent.
    pub fn destroy(&mut self, id: ComponentId) -> Result<(), MountError> {
        let Some(node) = self.nodes.get(id) else {
            return Err(MountError::NotMounted);
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
            if let NodeKind::Repeat(r) = &mut parent.kind {
                for group in &mut r.groups {
                    group.members.retain(|c| *c != id);
                }
            }
        }
        self.roots.retain(|r| *r != id);
        self.destroy_node(id);
        Ok(())
    }

    /// Destroy every root.
    pub fn clear(&mut self) {
        let roots = std::mem::take(&mut self.roots);
        self.destroy_all(&roots);
    }

    fn destroy_all(&mut self, ids: &[ComponentId]) {
        for id in ids {
            self.destroy_node(*id);
        }
    }

    /// Children first, then the widget, then subscriptions. Backend errors
    /// are logged; the component is removed regardless.
    fn destroy_node(&mut self, id: ComponentId) {
        let Some(children) = self.nodes.get(id).map(|n| n.children.clone()) else {
            return;
        };
        self.destroy_all(&children);

        let Some(mut node) = self.nodes.remove(id) else {
            return;
        };
        node.subscriptions.unsubscribe_from_all();
        match &mut node.kind {
            NodeKind::Tag(tag) => {
                let element = tag.widget.element();
                if let Err(err) = tag.widget.destroy() {
                    log::warn!("destroying '{}': {err}", tag.widget.kind());
                }
                let alias = node.instruction.as_tag().and_then(|t| t.alias.as_deref());
                if let (Some(alias), Some(element)) = (alias, element) {
                    if node.namespace.lookup(alias) == Some(Value::Element(element))
                        && node.namespace.contains_local(alias)
                    {
                        node.namespace.remove(alias);
                    }
                }
            }
            NodeKind::Placeholder { element, .. } => {
                if let Err(err) = self.backend.destroy(*element) {
                    log::warn!("destroying placeholder: {err}");
                }
            }
            NodeKind::Conditional(_) | NodeKind::Repeat(_) => {}
        }
        self.lifecycle.borrow_mut().on_destroy(id);
        log::trace!("destroyed {} (line {})", node.instruction.label(), node.instruction.line);
    }

    // -----------------------------------------------------------------------
    // Backend callbacks
    // -----------------------------------------------------------------------

    /// Write user input on `element` back into the binding of `key`.
    ///
    /// The backend already shows `value`, so it is recorded as sent and not
    /// configured again by the next flush.
    pub fn input(
        &mut self,
        element: NativeElement,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), MountError> {
        let value = value.into();
        let id = self.find_by_element(element).ok_or(MountError::NotMounted)?;
        let node = &mut self.nodes[id];
        let NodeKind::Tag(tag) = &mut node.kind else {
            return Err(MountError::NotMounted);
        };
        let name = tag.widget.kind().to_owned();
        let line = node.instruction.line;
        if let Some(schema) = tag.factory.schema() {
            if !schema.is_two_way(key) {
                return Err(MountError::InvalidAttribute {
                    component: name,
                    key: key.to_owned(),
                    line,
                    message: "not written back by the widget".into(),
                });
            }
        }
        tag.last.insert(key, value.clone());
        let binding = tag
            .attributes
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| a.literal.as_writeable().cloned());
        match binding {
            Some(writeable) => writeable.set(value).map_err(|source| MountError::Binding {
                component: name,
                key: key.to_owned(),
                line,
                source,
            }),
            None => Ok(()),
        }
    }

    /// Call the callable held by attribute `key` of `element` (a button's
    /// `command`, a `bind:` handler).
    pub fn invoke(
        &self,
        element: NativeElement,
        key: &str,
        args: &[Value],
    ) -> Result<Value, MountError> {
        let id = self.find_by_element(element).ok_or(MountError::NotMounted)?;
        let node = &self.nodes[id];
        let NodeKind::Tag(tag) = &node.kind else {
            return Err(MountError::NotMounted);
        };
        let binding_error = |source| MountError::Binding {
            component: tag.widget.kind().to_owned(),
            key: key.to_owned(),
            line: node.instruction.line,
            source,
        };
        match tag.last.get(key) {
            Some(Value::Callable(callable)) => callable.call(args).map_err(binding_error),
            Some(other) => Err(binding_error(BindingError::Type(format!(
                "{} is not callable",
                other.type_name()
            )))),
            None => Err(binding_error(BindingError::UndefinedName(key.to_owned()))),
        }
    }
}

impl Drop for ComponentTree {
    fn drop(&mut self) {
        if !self.roots.is_empty() {
            self.clear();
        }
    }
}

fn enqueue(tracker: &Weak<RefCell<LifecycleTracker>>, id: ComponentId) -> impl Fn() + 'static {
    let tracker = tracker.clone();
    move || {
        if let Some(tracker) = tracker.upgrade() {
            match tracker.try_borrow_mut() {
                Ok(mut t) => t.mark_dirty(id),
                Err(_) => log::warn!("dropped an update request raised during tracker access"),
            }
        }
    }
}

/// Resolve every bound attribute, fill schema defaults and validate.
fn resolve_attributes(
    ctx: &TagContext<'_>,
    factory: &Factory,
    attributes: &[BoundAttribute],
) -> Result<ResolvedAttributes, MountError> {
    let mut resolved = ResolvedAttributes::new();
    for attr in attributes {
        let value = attr
            .literal
            .resolve()
            .map_err(|e| ctx.binding(&attr.key, e))?;
        resolved.insert(attr.key.clone(), value);
    }
    if let Some(schema) = factory.schema() {
        schema.apply_defaults(&mut resolved);
        schema.coerce_text(&mut resolved);
        schema.validate(&resolved).map_err(|e| ctx.widget(e))?;
    }
    Ok(resolved)
}

fn checked_expression(
    expr: &str,
    namespace: &Namespace,
    wrap: impl Fn(BindingError) -> MountError,
) -> Result<Writeable, MountError> {
    namespace.env().evaluator().check(expr).map_err(&wrap)?;
    Ok(Writeable::from_expression(namespace, expr))
}

fn conditional_state(
    cond: &ConditionalInstruction,
    line: usize,
    namespace: &Namespace,
) -> Result<ConditionalState, MountError> {
    let wrap = |source| MountError::Condition { line, source };
    let condition = checked_expression(&cond.condition, namespace, wrap)?;
    let shown = condition.get().map_err(wrap)?.is_truthy();
    Ok(ConditionalState { condition, shown })
}

fn repeat_state(
    rep: &RepeatInstruction,
    line: usize,
    namespace: &Namespace,
) -> Result<RepeatState, MountError> {
    let wrap = |source| MountError::RepeatSource { line, source };
    Ok(RepeatState {
        source: checked_expression(&rep.source, namespace, wrap)?,
        groups: Vec::new(),
    })
}
