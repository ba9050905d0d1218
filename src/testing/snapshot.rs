//! Snapshot rendering helpers.
//!
//! Turn the state of a [`RecordingBackend`] or a [`ComponentTree`] into
//! indented plain text for snapshot assertions.

use std::fmt::Write;

use super::backend::RecordingBackend;
use crate::markup::InstructionKind;
use crate::tree::{ComponentId, ComponentKind, ComponentTree};
use crate::widget::NativeElement;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Render the live backend elements as a tree, one element per line:
///
/// ```text
/// frame#1
///   label#2 text="0"
/// ```
pub fn render_elements(backend: &RecordingBackend) -> String {
    let mut out = String::new();
    for root in backend.children_of(None) {
        write_element(backend, root, 0, &mut out);
    }
    trim_final_newline(out)
}

/// Render the component tree, structural components included:
///
/// ```text
/// frame #1
///   !if count > 0 [shown]
///     label #2
/// ```
pub fn render_components(tree: &ComponentTree) -> String {
    let mut out = String::new();
    for root in tree.roots() {
        write_component(tree, *root, 0, &mut out);
    }
    trim_final_newline(out)
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn write_element(
    backend: &RecordingBackend,
    element: NativeElement,
    depth: usize,
    out: &mut String,
) {
    let Some(record) = backend.record(element) else {
        return;
    };
    let _ = write!(out, "{}{}#{}", "  ".repeat(depth), record.kind, element.raw());
    if !record.attributes.is_empty() {
        let _ = write!(out, " {}", record.attributes);
    }
    out.push('\n');
    for child in backend.children_of(Some(element)) {
        write_element(backend, child, depth + 1, out);
    }
}

fn write_component(tree: &ComponentTree, id: ComponentId, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    let (Some(kind), Some(instruction)) = (tree.kind(id), tree.instruction(id)) else {
        return;
    };
    let element = tree
        .element(id)
        .map(|e| format!(" #{}", e.raw()))
        .unwrap_or_default();
    let _ = match (&kind, &instruction.kind) {
        (ComponentKind::Tag { name }, _) => writeln!(out, "{pad}{name}{element}"),
        (ComponentKind::Conditional { shown }, InstructionKind::Conditional(c)) => writeln!(
            out,
            "{pad}!if {} [{}]",
            c.condition,
            if *shown { "shown" } else { "hidden" }
        ),
        (ComponentKind::Repeat { groups }, InstructionKind::Repeat(r)) => writeln!(
            out,
            "{pad}!enum {}:({}, {}) [{groups} groups]",
            r.source, r.index_alias, r.item_alias
        ),
        (ComponentKind::Placeholder, _) => writeln!(out, "{pad}placeholder{element}"),
        _ => writeln!(out, "{pad}{}", instruction.label()),
    };
    for child in tree.children(id) {
        write_component(tree, *child, depth + 1, out);
    }
}

fn trim_final_newline(mut out: String) -> String {
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

// ===========================================================================
// Tests
// ===========================================================================
