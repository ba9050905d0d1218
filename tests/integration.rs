//! Integration tests for taktl.
//!
//! These tests exercise the public API from outside the crate: parsing,
//! literal evaluation, reactivity and the mounted component tree driven
//! through the headless testing backend.

use std::rc::Rc;

use pretty_assertions::assert_eq;
use taktl::error::SyntaxErrorKind;
use taktl::markup::{evaluate_literal, literal_value, InstructionKind};
use taktl::reactive::{Namespace, Writeable};
use taktl::testing::{Pilot, RecordingBackend};
use taktl::tree::ComponentKind;
use taktl::value::{Decimal, Slice};
use taktl::{parse, App, AppConfig, Environment, Error, MountError, TemplateCache, Value, View};

fn namespace() -> Namespace {
    Namespace::new(Rc::new(Environment::new()))
}

fn syntax_kind(source: &str) -> SyntaxErrorKind {
    parse(source).unwrap_err().kind
}

// ---------------------------------------------------------------------------
// Parse determinism
// ---------------------------------------------------------------------------

#[test]
fn test_parse_is_deterministic() {
    let sources = [
        "\\frame",
        "\\frame pos:grid=0,0\n  \\label:title text={name}\n  !if flag\n    \\button",
        "\\frame\n  !enum items:(i, x)\n    \\label text={str(i) + x}",
    ];
    for source in sources {
        assert_eq!(parse(source).unwrap(), parse(source).unwrap());
    }
}

#[test]
fn test_cache_skips_reparsing() {
    let cache = TemplateCache::default();
    let source = "\\frame\n  \\label text='a'";
    let first = cache.get_or_parse(source).unwrap();
    let second = cache.get_or_parse(source).unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(cache.parse_count(), 1);
    assert_eq!(cache.hit_count(), 1);

    cache.get_or_parse("\\label").unwrap();
    assert_eq!(cache.parse_count(), 2);
    assert_eq!(cache.len(), 2);
}

// ---------------------------------------------------------------------------
// Indent laws
// ---------------------------------------------------------------------------

#[test]
fn test_indent_must_be_a_multiple_of_the_unit() {
    assert_eq!(
        syntax_kind("\\frame\n  \\frame\n   \\label"),
        SyntaxErrorKind::BadIndent { unit: 2 }
    );
    assert_eq!(
        syntax_kind("\\frame\n    \\frame\n      \\label"),
        SyntaxErrorKind::BadIndent { unit: 4 }
    );
}

#[test]
fn test_dedent_closes_blocks() {
    let root = parse("\\frame\n  \\frame\n    \\label\n    \\label\n  \\button").unwrap();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].children.len(), 2);
    assert_eq!(root.children[1].label(), "button");
    assert_eq!(root.node_count(), 5);
}

#[test]
fn test_indent_errors_are_distinct() {
    assert_eq!(syntax_kind("\\frame\n\t\\label"), SyntaxErrorKind::TabIndent);
    assert_eq!(
        syntax_kind("\\frame\n  \\frame\n      \\label"),
        SyntaxErrorKind::Overindented
    );
}

#[test]
fn test_dedent_to_root_ends_parsing() {
    let root = parse("\\frame\n  \\frame\n    \\label\n\\button").unwrap();
    assert_eq!(root.node_count(), 3);
    assert_eq!(root.children[0].children[0].label(), "label");

    let shifted = parse("  \\frame\n    \\label\n    \\button").unwrap();
    assert_eq!(shifted.node_count(), 3);
    assert_eq!(shifted.children[1].label(), "button");
}

#[test]
fn test_structural_lines() {
    let root = parse("\\frame\n  !if a > 1\n    \\label\n  !enum rows:(n, row)\n    \\label").unwrap();
    assert!(matches!(&root.children[0].kind, InstructionKind::Conditional(c) if c.condition == "a > 1"));
    assert!(matches!(&root.children[1].kind, InstructionKind::Repeat(r) if r.item_alias == "row"));
}

// ---------------------------------------------------------------------------
// Literal round-trips
// ---------------------------------------------------------------------------

#[test]
fn test_representative_literals() {
    let ns = namespace();
    ns.set("x", 2);
    let eval = |token: &str| literal_value(token, Some(&ns)).unwrap();

    assert_eq!(eval("42"), Value::Int(42));
    assert_eq!(eval("3.14"), Value::Decimal(Decimal::new(314, 2)));
    assert_eq!(eval("'hi'"), Value::from("hi"));
    assert_eq!(eval("(1,2)"), Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
    assert_eq!(eval("1:5"), Value::Slice(Slice::new(Some(1), Some(5), None)));
    assert_eq!(eval("{x+1}"), Value::Int(3));
}

#[test]
fn test_unparsable_literals_fail() {
    let ns = namespace();
    for token in ["{", "{x", "'open", "1,,2", "{{1 + }}"] {
        assert!(evaluate_literal(token, Some(&ns)).is_err(), "{token} should fail");
    }
}

#[test]
fn test_integer_overflow_in_literal_is_an_error() {
    let ns = namespace();
    assert!(literal_value("!{(-9223372036854775807 - 1) / -1}", Some(&ns)).is_err());
    assert!(literal_value("!{(-9223372036854775807 - 1) % -1}", Some(&ns)).is_err());
}

#[test]
fn test_bound_literal_follows_namespace() {
    let ns = namespace();
    ns.set("x", 2);
    let literal = evaluate_literal("{x * 10}", Some(&ns)).unwrap();
    assert!(literal.is_binding());
    assert_eq!(literal.resolve().unwrap(), Value::Int(20));
    ns.set("x", 3);
    assert_eq!(literal.resolve().unwrap(), Value::Int(30));
}

// ---------------------------------------------------------------------------
// Reactivity idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_writeable_get_is_idempotent() {
    let ns = namespace();
    ns.set("a", 5);
    let expr = Writeable::from_expression(&ns, "a + 1");
    assert_eq!(expr.get().unwrap(), expr.get().unwrap());
    assert!(expr.is_read_only());
    assert!(expr.set(1).is_err());

    let name = Writeable::from_name(&ns, "a");
    name.set(9).unwrap();
    assert_eq!(name.get().unwrap(), Value::Int(9));
    assert_eq!(expr.get().unwrap(), Value::Int(10));

    let plain = Writeable::new("v");
    plain.set("w").unwrap();
    assert_eq!(plain.get().unwrap(), Value::from("w"));
    assert_eq!(plain.get().unwrap(), plain.get().unwrap());
}

// ---------------------------------------------------------------------------
// Conditional lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_conditional_mounts_and_destroys_once_per_transition() {
    let mut pilot = Pilot::new("\\frame\n  !if open\n    \\frame\n      \\label text={title}").unwrap();
    pilot.namespace().update([("open", Value::Bool(false)), ("title", Value::from("t"))]);
    pilot.render().unwrap();
    let baseline = pilot.namespace().subscriber_count();
    assert_eq!(pilot.take_ops(), ["mount frame#1"]);

    pilot.namespace().set("open", true);
    pilot.update().unwrap();
    assert_eq!(
        pilot.take_ops(),
        ["mount frame#2 in #1", r#"mount label#3 in #2 text="t""#]
    );

    pilot.namespace().set("open", false);
    pilot.update().unwrap();
    assert_eq!(pilot.take_ops(), ["destroy label#3", "destroy frame#2"]);
    assert_eq!(pilot.namespace().subscriber_count(), baseline);

    pilot.update().unwrap();
    assert!(pilot.take_ops().is_empty());
}

// ---------------------------------------------------------------------------
// Repeat semantics
// ---------------------------------------------------------------------------

#[test]
fn test_repeat_replaces_groups_after_mounting_new_ones() {
    let list = |items: &[&str]| Value::List(items.iter().map(|s| Value::from(*s)).collect());
    let mut pilot =
        Pilot::new("\\frame\n  !enum rows:(n, row)\n    \\label text={str(n) + row}").unwrap();
    pilot.namespace().set("rows", list(&["a", "b", "c"]));
    pilot.render().unwrap();
    pilot.take_ops();

    pilot.namespace().set("rows", list(&["v", "w", "x", "y", "z"]));
    pilot.update().unwrap();
    let ops = pilot.take_ops();
    let last_mount = ops.iter().rposition(|op| op.starts_with("mount")).unwrap();
    let first_destroy = ops.iter().position(|op| op.starts_with("destroy")).unwrap();
    assert!(last_mount < first_destroy);
    assert_eq!(ops.len(), 8);

    let view = pilot.view();
    let tree = view.tree();
    let root = view.root().unwrap();
    let repeat = tree.children(root)[0];
    assert_eq!(tree.kind(repeat), Some(ComponentKind::Repeat { groups: 5 }));
    for (index, (scope, members)) in tree.repeat_groups(repeat).iter().enumerate() {
        assert_eq!(scope.get("n").unwrap(), Value::from(index));
        assert_eq!(members.len(), 1);
    }

    insta::assert_snapshot!(pilot.snapshot(), @r###"
    frame#1
      label#5 text="0v"
      label#6 text="1w"
      label#7 text="2x"
      label#8 text="3y"
      label#9 text="4z"
    "###);
}

// ---------------------------------------------------------------------------
// End-to-end
// ---------------------------------------------------------------------------

#[test]
fn test_counter_end_to_end() {
    let backend = Rc::new(RecordingBackend::new());
    let app = App::new(AppConfig::default(), backend.clone());
    let mut view = View::new(&app, "\\frame\n  \\label text={count}\n  \\button command={inc}").unwrap();

    view.expose("count", 0);
    let target = view.namespace().downgrade();
    view.expose_action("inc", move || {
        if let Some(ns) = target.upgrade() {
            let count = ns.get("count").ok().and_then(|v| v.as_int()).unwrap_or(0);
            ns.set("count", count + 1);
        }
    });
    view.render(None).unwrap();
    let label = backend.elements_of_kind("label")[0];
    let button = backend.elements_of_kind("button")[0];
    assert_eq!(backend.attribute(label, "text"), Some(Value::from("0")));
    let button_before = backend.attributes(button);
    backend.take_ops();

    view.invoke(button, "command", &[]).unwrap();
    assert_eq!(view.update().unwrap(), 1);

    assert_eq!(backend.attribute(label, "text"), Some(Value::from("1")));
    assert_eq!(backend.take_ops(), [r#"configure label#2 text="1""#]);
    assert_eq!(backend.attributes(button), button_before);
}

#[test]
fn test_pilot_snapshot_of_form() {
    let mut pilot = Pilot::new(
        "\\frame\n  \\label:caption text=[greeting]\n  \\entry text={{name}}",
    )
    .unwrap();
    pilot.namespace().set("name", "ada");
    let err = pilot.render().unwrap_err();
    assert!(matches!(err, Error::Mount(MountError::Literal { ref key, .. }) if key == "text"));

    let mut pilot = Pilot::new("\\frame\n  \\entry text={{name}}\n  \\checkbutton checked").unwrap();
    pilot.namespace().set("name", "ada");
    pilot.render().unwrap();
    insta::assert_snapshot!(pilot.snapshot(), @r###"
    frame#1
      entry#2 text="ada"
      checkbutton#3 checked=True
    "###);
    insta::assert_snapshot!(pilot.component_snapshot(), @r###"
    frame #1
      entry #2
      checkbutton #3
    "###);
}
