//! Attribute value literals.
//!
//! [`evaluate_literal`] turns a raw attribute token into a plain [`Value`],
//! a reactive [`Writeable`] binding or an external [`Resource`]. Rules are
//! tried in a fixed order; the first that matches the token's shape decides
//! how it is evaluated:
//!
//! | shape                         | result                          |
//! |-------------------------------|---------------------------------|
//! | `NSEW`, `LEFT`, ...           | toolkit constant                |
//! | `None` `True` `False`         | value                           |
//! | `img:logo{width=32}`, `<img:logo>` | resource                   |
//! | `-12`                         | int                             |
//! | `3.14`                        | decimal                         |
//! | `{expr}`                      | read-only binding               |
//! | `{{path}}`, `{{get\|\|set}}`  | two-way binding                 |
//! | `!{expr}`                     | value, evaluated once           |
//! | `'text'`, `"text"`            | string                          |
//! | `/dir/$HOME/`                 | path                            |
//! | `[key]`, `@key`               | translation binding             |
//! | `1:10:2`                      | slice                           |
//! | `1,2` `(1, 2.5)`              | tuple of numbers                |

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use super::cursor::{unquote, Cursor, CLOSERS, ESCAPE, OPENERS, QUOTES};
use crate::env::DEFAULT_CONSTANTS;
use crate::error::{BindingError, LiteralError, LiteralErrorKind};
use crate::media::{Resource, ResourceSpec};
use crate::reactive::{Namespace, Writeable};
use crate::value::{Decimal, Slice, Value};

/// An evaluated attribute literal.
#[derive(Debug, Clone)]
pub enum Literal {
    Value(Value),
    Binding(Writeable),
    Resource(Rc<dyn Resource>),
}

impl Literal {
    /// The current value: plain values as-is, bindings and resources read
    /// through.
    pub fn resolve(&self) -> Result<Value, BindingError> {
        match self {
            Literal::Value(v) => Ok(v.clone()),
            Literal::Binding(w) => w.get(),
            Literal::Resource(r) => r.get(),
        }
    }

    pub fn as_writeable(&self) -> Option<&Writeable> {
        match self {
            Literal::Binding(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, Literal::Binding(_))
    }
}

impl From<Value> for Literal {
    fn from(v: Value) -> Self {
        Literal::Value(v)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Value(v) => write!(f, "{v}"),
            Literal::Binding(w) => f.write_str(&w.describe()),
            Literal::Resource(r) => write!(f, "<{}>", r.spec()),
        }
    }
}

/// Evaluate `token` against `namespace`.
///
/// Bindings, eager expressions, translations and resources need a
/// namespace (it carries the evaluator, translator and resolvers); without
/// one they fail with [`LiteralErrorKind::Unscoped`].
pub fn evaluate_literal(token: &str, namespace: Option<&Namespace>) -> Result<Literal, LiteralError> {
    let err = |kind| LiteralError::new(kind, token);
    if token.is_empty() {
        return Err(err(LiteralErrorKind::Empty));
    }

    if let Some(value) = constant(token, namespace) {
        return Ok(Literal::Value(value));
    }
    match token {
        "None" => return Ok(Literal::Value(Value::None)),
        "True" => return Ok(Literal::Value(Value::Bool(true))),
        "False" => return Ok(Literal::Value(Value::Bool(false))),
        _ => {}
    }
    if let Some(spec_text) = resource_shape(token) {
        return resource(token, spec_text, namespace);
    }
    if is_int(token) {
        return token
            .parse::<i64>()
            .map(|i| Literal::Value(Value::Int(i)))
            .map_err(|_| err(LiteralErrorKind::BadNumber));
    }
    if is_decimal(token) {
        return token
            .parse::<Decimal>()
            .map(|d| Literal::Value(Value::Decimal(d)))
            .map_err(|_| err(LiteralErrorKind::BadNumber));
    }
    if let Some(literal) = bound_expression(token, namespace)? {
        return Ok(literal);
    }
    if token.starts_with(QUOTES) {
        return quoted(token);
    }
    if token.len() >= 2 && token.starts_with('/') && token.ends_with('/') {
        let body = &token[1..token.len() - 1];
        return Ok(Literal::Value(Value::Path(PathBuf::from(expand_vars(body)))));
    }
    if let Some(key) = translation_key(token) {
        return translation(token, key, namespace);
    }
    if token.contains(':') && token.chars().all(|c| is_number_char(c) || c == ':') {
        return slice(token).map(|s| Literal::Value(Value::Slice(s)));
    }
    if let Some(items) = tuple(token)? {
        return Ok(Literal::Value(Value::Tuple(items)));
    }
    Err(err(LiteralErrorKind::Unrecognized))
}

/// Evaluate and resolve in one step.
pub fn literal_value(token: &str, namespace: Option<&Namespace>) -> Result<Value, LiteralError> {
    evaluate_literal(token, namespace)?
        .resolve()
        .map_err(|e| LiteralError::new(LiteralErrorKind::Binding(e), token))
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn constant(token: &str, namespace: Option<&Namespace>) -> Option<Value> {
    match namespace {
        Some(ns) => ns.env().constant(token).cloned(),
        None => DEFAULT_CONSTANTS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, value)| Value::from(*value)),
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '-' || c == '+'
}

fn unsigned(token: &str) -> &str {
    token.strip_prefix(['-', '+']).unwrap_or(token)
}

fn is_int(token: &str) -> bool {
    let body = unsigned(token);
    !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal(token: &str) -> bool {
    let body = unsigned(token);
    body.bytes().filter(|b| *b == b'.').count() == 1
        && body.bytes().any(|b| b.is_ascii_digit())
        && body.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// `prefix:payload...` with an alphabetic prefix, or `<...>`.
fn resource_shape(token: &str) -> Option<&str> {
    if let Some(inner) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
        return Some(inner);
    }
    let prefix_len = token.bytes().take_while(u8::is_ascii_alphabetic).count();
    (prefix_len > 0 && token[prefix_len..].starts_with(':') && token.len() > prefix_len + 1)
        .then_some(token)
}

fn resource(token: &str, text: &str, namespace: Option<&Namespace>) -> Result<Literal, LiteralError> {
    let offset = token.len() - text.len() - usize::from(token.ends_with('>') && token.starts_with('<'));
    let bad = |fragment: &str, at: usize| {
        LiteralError::new(LiteralErrorKind::BadResource, token).at(fragment, offset + at)
    };

    let Some((prefix, rest)) = text.split_once(':') else {
        return Err(bad(text, 0));
    };
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(bad(prefix, 0));
    }
    let payload_at = prefix.len() + 1;
    let (payload, props_text) = match rest.find('{') {
        Some(open) if rest.ends_with('}') => (&rest[..open], Some(&rest[open + 1..rest.len() - 1])),
        Some(open) => return Err(bad(&rest[open..], payload_at + open)),
        None => (rest, None),
    };
    if payload.is_empty() {
        return Err(bad(text, 0));
    }

    let Some(ns) = namespace else {
        return Err(LiteralError::new(LiteralErrorKind::Unscoped, token));
    };

    let mut props = BTreeMap::new();
    if let Some(body) = props_text {
        let body_at = payload_at + payload.len() + 1;
        let mut cursor = Cursor::new(body);
        while !cursor.is_eof() {
            cursor.skip_spaces();
            let start = cursor.pos();
            let item = cursor
                .scan_balanced(OPENERS, CLOSERS, QUOTES, ESCAPE, |c| c == ',')
                .map_err(|_| bad(&body[start..], body_at + start))?;
            cursor.eat(',');
            let Some((key, value)) = item.split_once('=') else {
                return Err(bad(item, body_at + start));
            };
            let value = literal_value(value.trim(), Some(ns))
                .map_err(|e| LiteralError::new(e.kind, token).at(item, body_at + start))?;
            props.insert(key.trim().to_owned(), value);
        }
    }

    let spec = ResourceSpec {
        prefix: prefix.to_owned(),
        payload: payload.to_owned(),
        props,
    };
    if !ns.env().has_resolver(prefix) {
        return Err(bad(prefix, 0));
    }
    ns.env()
        .resolve_resource(&spec)
        .map(Literal::Resource)
        .map_err(|e| LiteralError::new(LiteralErrorKind::Binding(e), token).at(text, offset))
}

/// Inner text of a token that is exactly one `{...}` group.
fn braced(token: &str) -> Option<&str> {
    if !token.starts_with('{') || !token.ends_with('}') || token.len() < 2 {
        return None;
    }
    let mut cursor = Cursor::at(token, 1);
    cursor
        .scan_balanced(OPENERS, CLOSERS, QUOTES, ESCAPE, |c| c == '}')
        .ok()?;
    (cursor.pos() == token.len() - 1).then(|| &token[1..token.len() - 1])
}

fn is_path(text: &str) -> bool {
    text.split('.').all(|seg| {
        let mut chars = seg.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn bound_expression(
    token: &str,
    namespace: Option<&Namespace>,
) -> Result<Option<Literal>, LiteralError> {
    let (eager, body) = match token.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let Some(inner) = braced(body) else {
        return Ok(None);
    };
    let offset = token.len() - body.len() + 1;
    let fail = |kind, fragment: &str| LiteralError::new(kind, token).at(fragment, offset);

    let Some(ns) = namespace else {
        return Err(fail(LiteralErrorKind::Unscoped, inner));
    };
    let evaluator = ns.env().evaluator();

    if eager {
        let expr = inner.trim();
        if expr.is_empty() {
            return Err(fail(LiteralErrorKind::Empty, inner));
        }
        return evaluator
            .evaluate(expr, ns)
            .map(|v| Some(Literal::Value(v)))
            .map_err(|e| fail(LiteralErrorKind::Binding(e), inner));
    }

    if let Some(two_way) = braced(inner) {
        let two_way = two_way.trim();
        if let Some((getter, setter)) = two_way.split_once("||") {
            let (getter, setter) = (getter.trim(), setter.trim());
            evaluator
                .check(getter)
                .map_err(|e| fail(LiteralErrorKind::Binding(e), getter))?;
            return Ok(Some(Literal::Binding(Writeable::from_get_set(ns, getter, setter))));
        }
        if !is_path(two_way) {
            let e = BindingError::Syntax {
                expr: two_way.to_owned(),
                message: "two-way binding needs a variable path or 'get||set'".into(),
            };
            return Err(fail(LiteralErrorKind::Binding(e), two_way));
        }
        return Ok(Some(Literal::Binding(Writeable::from_name(ns, two_way))));
    }

    let expr = inner.trim();
    if let Some(name) = expr.strip_prefix('$') {
        if is_path(name) {
            return Ok(Some(Literal::Binding(Writeable::from_name(ns, name))));
        }
    }
    if expr.is_empty() {
        return Err(fail(LiteralErrorKind::Empty, inner));
    }
    evaluator
        .check(expr)
        .map_err(|e| fail(LiteralErrorKind::Binding(e), inner))?;
    Ok(Some(Literal::Binding(Writeable::from_expression(ns, expr))))
}

fn quoted(token: &str) -> Result<Literal, LiteralError> {
    let mut cursor = Cursor::new(token);
    match cursor.scan_quoted(ESCAPE) {
        Ok(lit) if lit.len() == token.len() => Ok(Literal::Value(Value::Str(unquote(lit)))),
        Ok(lit) => Err(LiteralError::new(LiteralErrorKind::Unrecognized, token)
            .at(&token[lit.len()..], lit.len())),
        Err(_) => Err(LiteralError::new(LiteralErrorKind::UnterminatedString, token)),
    }
}

/// Expand `$VAR` and `${VAR}`. Unset variables are left as written.
fn expand_vars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = Cursor::new(text);
    while let Some(c) = cursor.bump() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let start = cursor.pos();
        let (name, written) = if cursor.eat('{') {
            let name = cursor.take_while(|c| c != '}');
            if !cursor.eat('}') {
                out.push('$');
                out.push_str(&text[start..]);
                break;
            }
            (name, &text[start - 1..cursor.pos()])
        } else {
            let name = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            (name, &text[start - 1..cursor.pos()])
        };
        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(written),
        }
    }
    out
}

fn translation_key(token: &str) -> Option<&str> {
    token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .or_else(|| token.strip_prefix('@'))
}

fn translation(token: &str, key: &str, namespace: Option<&Namespace>) -> Result<Literal, LiteralError> {
    let offset = usize::from(token.len() > key.len());
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(LiteralError::new(LiteralErrorKind::BadTranslationKey, token).at(key, offset));
    }
    let Some(ns) = namespace else {
        return Err(LiteralError::new(LiteralErrorKind::Unscoped, token));
    };
    let Some(translator) = ns.env().translator() else {
        return Err(LiteralError::new(
            LiteralErrorKind::Binding(BindingError::NoTranslator),
            token,
        ));
    };
    Ok(Literal::Binding(Writeable::from_translation(
        Rc::clone(translator),
        key,
    )))
}

fn slice(token: &str) -> Result<Slice, LiteralError> {
    let parts: Vec<&str> = token.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(LiteralError::new(LiteralErrorKind::BadSlice, token));
    }
    let mut bounds = [None; 3];
    let mut at = 0;
    for (i, part) in parts.iter().enumerate() {
        if !part.is_empty() {
            let n = part.parse::<i64>().map_err(|_| {
                LiteralError::new(LiteralErrorKind::BadSlice, token).at(part, at)
            })?;
            bounds[i] = Some(n);
        }
        at += part.len() + 1;
    }
    Ok(Slice::new(bounds[0], bounds[1], bounds[2]))
}

/// `1,2`, `1,`, `(1, 2.5)`, `()`. `None` when the token is not tuple-shaped.
fn tuple(token: &str) -> Result<Option<Vec<Value>>, LiteralError> {
    let (body, offset) = match token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (inner, 1),
        None if token.contains(',') => (token, 0),
        None => return Ok(None),
    };
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | ' ');
    if !body.chars().all(allowed) {
        return Ok(None);
    }
    if body.trim().is_empty() {
        return Ok(Some(Vec::new()));
    }

    let mut items = Vec::new();
    let pieces: Vec<&str> = body.split(',').collect();
    let last = pieces.len() - 1;
    let mut at = offset;
    for (i, piece) in pieces.iter().enumerate() {
        let element = piece.trim();
        let bad = || LiteralError::new(LiteralErrorKind::BadTuple, token).at(piece, at);
        if element.is_empty() {
            // A single trailing comma makes a one-element tuple.
            if i == last && i > 0 {
                break;
            }
            return Err(bad());
        }
        let value = if is_int(element) {
            element.parse::<i64>().map(Value::Int).map_err(|_| bad())?
        } else if is_decimal(element) {
            element.parse::<Decimal>().map(Value::Decimal).map_err(|_| bad())?
        } else {
            return Err(bad());
        };
        items.push(value);
        at += piece.len() + 1;
    }
    if offset == 1 && items.len() == 1 && !body.contains(',') {
        // `(5)` is a parenthesized number, not a tuple.
        return Ok(None);
    }
    Ok(Some(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::i18n::Dictionary;
    use crate::media::ImageResolver;
    use pretty_assertions::assert_eq;

    fn ns() -> Namespace {
        Namespace::new(Rc::new(Environment::default()))
    }

    fn value(token: &str) -> Value {
        literal_value(token, None).unwrap()
    }

    fn kind(token: &str, namespace: Option<&Namespace>) -> LiteralErrorKind {
        evaluate_literal(token, namespace).unwrap_err().kind
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(value("None"), Value::None);
        assert_eq!(value("True"), Value::Bool(true));
        assert_eq!(value("42"), Value::Int(42));
        assert_eq!(value("-7"), Value::Int(-7));
        assert_eq!(value("3.14"), Value::Decimal("3.14".parse().unwrap()));
        assert_eq!(value("'hi there'"), Value::from("hi there"));
        assert_eq!(value(r#""say \"x\"""#), Value::from("say \"x\""));
        assert_eq!(value("NSEW"), Value::from("nsew"));
    }

    #[test]
    fn test_tuples_and_slices() {
        assert_eq!(value("1,2"), Value::Tuple(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(
            value("(0, 1, 2, 1)"),
            Value::Tuple(vec![Value::Int(0), Value::Int(1), Value::Int(2), Value::Int(1)])
        );
        assert_eq!(value("5,"), Value::Tuple(vec![Value::Int(5)]));
        assert_eq!(value("()"), Value::Tuple(vec![]));
        assert_eq!(value("1:10:2"), Value::Slice(Slice::new(Some(1), Some(10), Some(2))));
        assert_eq!(value(":3"), Value::Slice(Slice::new(None, Some(3), None)));
        assert_eq!(value("2:"), Value::Slice(Slice::new(Some(2), None, None)));
    }

    #[test]
    fn test_literal_errors_locate_fragment() {
        let err = evaluate_literal("1,,2", None).unwrap_err();
        assert_eq!(err.kind, LiteralErrorKind::BadTuple);
        assert_eq!((err.fragment.as_str(), err.position), ("", 2));

        let err = evaluate_literal("1:x:2", None).unwrap_err();
        assert_eq!(err.kind, LiteralErrorKind::Unrecognized);

        let err = evaluate_literal("1:2:3:4", None).unwrap_err();
        assert_eq!(err.kind, LiteralErrorKind::BadSlice);

        let err = evaluate_literal("'abc' x", None).unwrap_err();
        assert_eq!((err.fragment.as_str(), err.position), (" x", 5));

        assert_eq!(kind("'open", None), LiteralErrorKind::UnterminatedString);
        assert_eq!(kind("", None), LiteralErrorKind::Empty);
        assert_eq!(kind("hello", None), LiteralErrorKind::Unrecognized);
        assert_eq!(kind("[bad key]", None), LiteralErrorKind::BadTranslationKey);
    }

    #[test]
    fn test_bindings_need_a_namespace() {
        assert_eq!(kind("{count}", None), LiteralErrorKind::Unscoped);
        assert_eq!(kind("!{count}", None), LiteralErrorKind::Unscoped);
        assert_eq!(kind("[title]", None), LiteralErrorKind::Unscoped);
    }

    #[test]
    fn test_lazy_expression_binding() {
        let ns = ns();
        ns.set("count", 1);
        let lit = evaluate_literal("{count + 1}", Some(&ns)).unwrap();
        let w = lit.as_writeable().unwrap();
        assert!(w.is_read_only());
        assert_eq!(lit.resolve().unwrap(), Value::Int(2));
        ns.set("count", 5);
        assert_eq!(lit.resolve().unwrap(), Value::Int(6));
    }

    #[test]
    fn test_eager_expression() {
        let ns = ns();
        ns.set("count", 1);
        let lit = evaluate_literal("!{count * 10}", Some(&ns)).unwrap();
        ns.set("count", 2);
        assert!(matches!(lit, Literal::Value(Value::Int(10))));
    }

    #[test]
    fn test_two_way_bindings() {
        let ns = ns();
        ns.set("name", "ann");
        let lit = evaluate_literal("{{name}}", Some(&ns)).unwrap();
        let w = lit.as_writeable().unwrap();
        w.set("bob").unwrap();
        assert_eq!(ns.get("name").unwrap(), Value::from("bob"));

        let lit = evaluate_literal("{$name}", Some(&ns)).unwrap();
        assert!(!lit.as_writeable().unwrap().is_read_only());

        ns.set("n", 1);
        let lit = evaluate_literal("{{str(n)||n = int(value)}}", Some(&ns)).unwrap();
        lit.as_writeable().unwrap().set("9").unwrap();
        assert_eq!(ns.get("n").unwrap(), Value::Int(9));

        assert!(matches!(
            kind("{{a + b}}", Some(&ns)),
            LiteralErrorKind::Binding(BindingError::Syntax { .. })
        ));
    }

    #[test]
    fn test_expression_syntax_is_checked_early() {
        let ns = ns();
        let err = evaluate_literal("{a +}", Some(&ns)).unwrap_err();
        assert!(matches!(err.kind, LiteralErrorKind::Binding(BindingError::Syntax { .. })));
        assert_eq!((err.fragment.as_str(), err.position), ("a +", 1));
    }

    #[test]
    fn test_braces_must_enclose_the_whole_token() {
        let ns = ns();
        assert_eq!(kind("{a}{b}", Some(&ns)), LiteralErrorKind::Unrecognized);
    }

    #[test]
    fn test_paths_expand_environment() {
        std::env::set_var("TAKTL_LITERAL_TEST_DIR", "/srv/app");
        assert_eq!(
            value("/$TAKTL_LITERAL_TEST_DIR/media/"),
            Value::Path("/srv/app/media".into())
        );
        assert_eq!(
            value("/${TAKTL_LITERAL_TEST_DIR}x/"),
            Value::Path("/srv/appx".into())
        );
        assert_eq!(
            value("/$TAKTL_UNSET_VARIABLE_XYZ/"),
            Value::Path("$TAKTL_UNSET_VARIABLE_XYZ".into())
        );
    }

    #[test]
    fn test_translations() {
        let dict = Rc::new(Dictionary::new());
        dict.install("en", [("app.title", "Todos")]);
        let env = Environment::new().with_translator(dict.clone());
        let ns = Namespace::new(Rc::new(env));
        assert_eq!(literal_value("[app.title]", Some(&ns)).unwrap(), Value::from("Todos"));
        assert_eq!(literal_value("@app.title", Some(&ns)).unwrap(), Value::from("Todos"));
        assert_eq!(
            kind("[x]", Some(&self::ns())),
            LiteralErrorKind::Binding(BindingError::NoTranslator)
        );
    }

    #[test]
    fn test_resources() {
        let env = Environment::new().with_resolver("img", Rc::new(ImageResolver::new("/media")));
        let ns = Namespace::new(Rc::new(env));

        let lit = evaluate_literal("img:logo{width=32, alt='Logo'}", Some(&ns)).unwrap();
        let Literal::Resource(res) = &lit else {
            panic!("expected a resource, got {lit:?}");
        };
        assert_eq!(res.spec().payload, "logo");
        assert_eq!(res.spec().props.get("width"), Some(&Value::Int(32)));
        assert_eq!(res.spec().props.get("alt"), Some(&Value::from("Logo")));
        assert_eq!(lit.resolve().unwrap(), Value::Path("/media/logo.png".into()));

        let lit = evaluate_literal("<img:icons/save.gif>", Some(&ns)).unwrap();
        assert_eq!(lit.resolve().unwrap(), Value::Path("/media/icons/save.gif".into()));

        let err = evaluate_literal("snd:beep", Some(&ns)).unwrap_err();
        assert_eq!(err.kind, LiteralErrorKind::BadResource);
        assert_eq!(err.fragment, "snd");
    }

    #[test]
    fn test_custom_constants() {
        let env = Environment::new().with_constant("ACCENT", "#36c");
        let ns = Namespace::new(Rc::new(env));
        assert_eq!(literal_value("ACCENT", Some(&ns)).unwrap(), Value::from("#36c"));
    }
}
