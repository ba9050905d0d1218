//! Tree-walking evaluator over [`Value`].

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::ast::*;
use super::parser::{parse_expr, parse_statements};
use super::ExpressionEvaluator;
use crate::error::BindingError;
use crate::reactive::Namespace;
use crate::value::{Callable, Decimal, Value};

/// Default [`ExpressionEvaluator`]. Parsed expressions and statements are
/// cached by source text.
pub struct Interpreter {
    exprs: RefCell<HashMap<String, Rc<Expr>>>,
    stmts: RefCell<HashMap<String, Rc<Vec<Stmt>>>>,
    builtins: BTreeMap<&'static str, Callable>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("cached_exprs", &self.exprs.borrow().len())
            .field("cached_stmts", &self.stmts.borrow().len())
            .finish()
    }
}

/// Names visible to one evaluation: call-site locals, then the namespace,
/// then builtins.
struct Frame<'a> {
    namespace: &'a Namespace,
    locals: &'a [(&'a str, Value)],
    builtins: &'a BTreeMap<&'static str, Callable>,
}

impl Frame<'_> {
    fn lookup(&self, name: &str) -> Result<Value, BindingError> {
        if let Some((_, v)) = self.locals.iter().find(|(n, _)| *n == name) {
            return Ok(v.clone());
        }
        if let Some(v) = self.namespace.lookup(name) {
            return Ok(v);
        }
        self.builtins
            .get(name)
            .map(|c| Value::Callable(c.clone()))
            .ok_or_else(|| BindingError::UndefinedName(name.to_owned()))
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            exprs: RefCell::new(HashMap::new()),
            stmts: RefCell::new(HashMap::new()),
            builtins: builtins(),
        }
    }

    /// Number of distinct expressions parsed so far.
    pub fn cached_expressions(&self) -> usize {
        self.exprs.borrow().len()
    }

    fn parsed_expr(&self, source: &str) -> Result<Rc<Expr>, BindingError> {
        if let Some(hit) = self.exprs.borrow().get(source) {
            return Ok(Rc::clone(hit));
        }
        let expr = Rc::new(parse_expr(source).map_err(|e| BindingError::Syntax {
            expr: source.to_owned(),
            message: e.to_string(),
        })?);
        self.exprs
            .borrow_mut()
            .insert(source.to_owned(), Rc::clone(&expr));
        Ok(expr)
    }

    fn parsed_stmts(&self, source: &str) -> Result<Rc<Vec<Stmt>>, BindingError> {
        if let Some(hit) = self.stmts.borrow().get(source) {
            return Ok(Rc::clone(hit));
        }
        let stmts = Rc::new(parse_statements(source).map_err(|e| BindingError::Syntax {
            expr: source.to_owned(),
            message: e.to_string(),
        })?);
        self.stmts
            .borrow_mut()
            .insert(source.to_owned(), Rc::clone(&stmts));
        Ok(stmts)
    }

    /// Evaluate with extra names shadowing the namespace.
    pub fn evaluate_with(
        &self,
        expr: &str,
        namespace: &Namespace,
        locals: &[(&str, Value)],
    ) -> Result<Value, BindingError> {
        let ast = self.parsed_expr(expr)?;
        let frame = Frame {
            namespace,
            locals,
            builtins: &self.builtins,
        };
        eval(&ast, &frame)
    }
}

impl ExpressionEvaluator for Interpreter {
    fn check(&self, expr: &str) -> Result<(), BindingError> {
        self.parsed_expr(expr).map(|_| ())
    }

    fn evaluate(&self, expr: &str, namespace: &Namespace) -> Result<Value, BindingError> {
        self.evaluate_with(expr, namespace, &[])
    }

    fn execute(
        &self,
        stmt: &str,
        namespace: &Namespace,
        locals: &[(&str, Value)],
    ) -> Result<(), BindingError> {
        let stmts = self.parsed_stmts(stmt)?;
        let frame = Frame {
            namespace,
            locals,
            builtins: &self.builtins,
        };
        for stmt in stmts.iter() {
            match stmt {
                Stmt::Assign(target, expr) => {
                    let value = eval(expr, &frame)?;
                    namespace.set_path(&target.path(), value)?;
                }
                Stmt::Expr(expr) => {
                    eval(expr, &frame)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(expr: &Expr, frame: &Frame<'_>) -> Result<Value, BindingError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Name(name) => frame.lookup(name),
        Expr::Attr(target, name) => match eval(target, frame)? {
            Value::Map(map) => map
                .get(name)
                .cloned()
                .ok_or_else(|| BindingError::UndefinedName(name.clone())),
            other => Err(BindingError::Type(format!(
                "'{}' has no attribute '{name}'",
                other.type_name()
            ))),
        },
        Expr::Index(target, sub) => {
            let target = eval(target, frame)?;
            match sub.as_ref() {
                Subscript::Index(index) => index_value(&target, &eval(index, frame)?),
                Subscript::Slice { start, stop, step } => {
                    let bound = |e: &Option<Expr>| -> Result<Option<i64>, BindingError> {
                        match e {
                            None => Ok(None),
                            Some(e) => match eval(e, frame)? {
                                Value::None => Ok(None),
                                v => v.as_int().map(Some).ok_or_else(|| {
                                    BindingError::Type("slice indices must be integers".into())
                                }),
                            },
                        }
                    };
                    slice_value(&target, bound(start)?, bound(stop)?, bound(step)?)
                }
            }
        }
        Expr::Call(callee, args) => {
            let callee = eval(callee, frame)?;
            let args = args
                .iter()
                .map(|a| eval(a, frame))
                .collect::<Result<Vec<_>, _>>()?;
            match callee {
                Value::Callable(c) => c.call(&args),
                other => Err(BindingError::Type(format!(
                    "'{}' is not callable",
                    other.type_name()
                ))),
            }
        }
        Expr::Unary(op, operand) => unary(*op, eval(operand, frame)?),
        Expr::Binary(op, l, r) => binary(*op, eval(l, frame)?, eval(r, frame)?),
        Expr::And(l, r) => {
            let left = eval(l, frame)?;
            if left.is_truthy() {
                eval(r, frame)
            } else {
                Ok(left)
            }
        }
        Expr::Or(l, r) => {
            let left = eval(l, frame)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(r, frame)
            }
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, frame)?.is_truthy() {
                eval(then, frame)
            } else {
                eval(otherwise, frame)
            }
        }
        Expr::Tuple(items) => Ok(Value::Tuple(eval_all(items, frame)?)),
        Expr::List(items) => Ok(Value::List(eval_all(items, frame)?)),
    }
}

fn eval_all(items: &[Expr], frame: &Frame<'_>) -> Result<Vec<Value>, BindingError> {
    items.iter().map(|e| eval(e, frame)).collect()
}

fn type_error(op: &str, a: &Value, b: &Value) -> BindingError {
    BindingError::Type(format!(
        "unsupported operand types for {op}: '{}' and '{}'",
        a.type_name(),
        b.type_name()
    ))
}

fn overflow() -> BindingError {
    BindingError::Eval("integer overflow".into())
}

fn zero_division() -> BindingError {
    BindingError::Eval("division by zero".into())
}

/// Numeric view of a value: ints (and bools) or decimals.
#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Dec(Decimal),
}

impl Num {
    fn of(v: &Value) -> Option<Num> {
        match v {
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Decimal(d) => Some(Num::Dec(*d)),
            _ => None,
        }
    }

    fn dec(self) -> Decimal {
        match self {
            Num::Int(i) => Decimal::from_i64(i),
            Num::Dec(d) => d,
        }
    }

    fn to_f64(self) -> f64 {
        self.dec().to_f64()
    }
}

fn from_f64(x: f64) -> Result<Value, BindingError> {
    Decimal::from_f64(x)
        .map(Value::Decimal)
        .ok_or_else(|| BindingError::Eval(format!("number {x} is out of range")))
}

fn unary(op: UnaryOp, v: Value) -> Result<Value, BindingError> {
    match (op, Num::of(&v)) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Some(Num::Int(i))) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
        (UnaryOp::Neg, Some(Num::Dec(d))) => Ok(Value::Decimal(d.neg())),
        (UnaryOp::Pos, Some(Num::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Num::Dec(d))) => Ok(Value::Decimal(d)),
        (_, None) => Err(BindingError::Type(format!(
            "bad operand type for unary operator: '{}'",
            v.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, a: Value, b: Value) -> Result<Value, BindingError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(a == b)),
        BinaryOp::NotEq => Ok(Value::Bool(a != b)),
        BinaryOp::Lt => Ok(Value::Bool(compare(&a, &b)? == Ordering::Less)),
        BinaryOp::LtEq => Ok(Value::Bool(compare(&a, &b)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(compare(&a, &b)? == Ordering::Greater)),
        BinaryOp::GtEq => Ok(Value::Bool(compare(&a, &b)? != Ordering::Less)),
        BinaryOp::In => contains(&b, &a).map(Value::Bool),
        BinaryOp::NotIn => contains(&b, &a).map(|c| Value::Bool(!c)),
        BinaryOp::Add => add(a, b),
        BinaryOp::Sub => arith(op, &a, &b, i64::checked_sub, Decimal::checked_sub),
        BinaryOp::Mul => mul(a, b),
        BinaryOp::Div => div(&a, &b),
        BinaryOp::FloorDiv => floor_div(&a, &b),
        BinaryOp::Mod => modulo(&a, &b),
    }
}

fn arith(
    op: BinaryOp,
    a: &Value,
    b: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    dec_op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> Result<Value, BindingError> {
    match (Num::of(a), Num::of(b)) {
        (Some(Num::Int(x)), Some(Num::Int(y))) => int_op(x, y).map(Value::Int).ok_or_else(overflow),
        (Some(x), Some(y)) => dec_op(x.dec(), y.dec())
            .map(|d| Value::Decimal(d.normalize()))
            .ok_or_else(overflow),
        _ => Err(type_error(op.symbol(), a, b)),
    }
}

fn add(a: Value, b: Value) -> Result<Value, BindingError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(x + &y)),
        (Value::List(mut x), Value::List(y)) => {
            x.extend(y);
            Ok(Value::List(x))
        }
        (Value::Tuple(mut x), Value::Tuple(y)) => {
            x.extend(y);
            Ok(Value::Tuple(x))
        }
        (a, b) => arith(BinaryOp::Add, &a, &b, i64::checked_add, Decimal::checked_add),
    }
}

fn repeat_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

fn mul(a: Value, b: Value) -> Result<Value, BindingError> {
    match (&a, &b) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => {
            Ok(Value::Str(s.repeat(repeat_count(*n))))
        }
        (Value::List(items), Value::Int(n)) | (Value::Int(n), Value::List(items)) => {
            let count = repeat_count(*n);
            Ok(Value::List(
                items.iter().cloned().cycle().take(items.len() * count).collect(),
            ))
        }
        _ => arith(BinaryOp::Mul, &a, &b, i64::checked_mul, Decimal::checked_mul),
    }
}

fn numeric_pair(op: BinaryOp, a: &Value, b: &Value) -> Result<(Num, Num), BindingError> {
    match (Num::of(a), Num::of(b)) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(type_error(op.symbol(), a, b)),
    }
}

fn div(a: &Value, b: &Value) -> Result<Value, BindingError> {
    let (x, y) = numeric_pair(BinaryOp::Div, a, b)?;
    if y.dec().is_zero() {
        return Err(zero_division());
    }
    if let (Num::Int(x), Num::Int(y)) = (x, y) {
        if x.checked_rem(y).ok_or_else(overflow)? == 0 {
            let q = x.checked_div(y).ok_or_else(overflow)?;
            return Ok(Value::Decimal(Decimal::from_i64(q)));
        }
    }
    from_f64(x.to_f64() / y.to_f64())
}

fn floor_div(a: &Value, b: &Value) -> Result<Value, BindingError> {
    let (x, y) = numeric_pair(BinaryOp::FloorDiv, a, b)?;
    if y.dec().is_zero() {
        return Err(zero_division());
    }
    match (x, y) {
        (Num::Int(x), Num::Int(y)) => {
            let q = x.checked_div(y).ok_or_else(overflow)?;
            let adjust = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        _ => from_f64((x.to_f64() / y.to_f64()).floor()),
    }
}

fn modulo(a: &Value, b: &Value) -> Result<Value, BindingError> {
    let (x, y) = numeric_pair(BinaryOp::Mod, a, b)?;
    if y.dec().is_zero() {
        return Err(zero_division());
    }
    match (x, y) {
        (Num::Int(x), Num::Int(y)) => {
            let r = x.checked_rem(y).ok_or_else(overflow)?;
            Ok(Value::Int(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }))
        }
        _ => {
            let (x, y) = (x.to_f64(), y.to_f64());
            from_f64(x - y * (x / y).floor())
        }
    }
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, BindingError> {
    if let (Some(x), Some(y)) = (Num::of(a), Num::of(b)) {
        return x
            .dec()
            .partial_cmp(&y.dec())
            .ok_or_else(|| type_error("<", a, b));
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.cmp(y)),
        (Value::Tuple(x), Value::Tuple(y)) | (Value::List(x), Value::List(y)) => {
            for (l, r) in x.iter().zip(y) {
                match compare(l, r)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(x.len().cmp(&y.len()))
        }
        _ => Err(type_error("<", a, b)),
    }
}

fn contains(haystack: &Value, needle: &Value) -> Result<bool, BindingError> {
    match (haystack, needle) {
        (Value::Str(h), Value::Str(n)) => Ok(h.contains(n.as_str())),
        (Value::Str(_), other) => Err(BindingError::Type(format!(
            "'in <str>' requires a string, not '{}'",
            other.type_name()
        ))),
        (Value::List(items) | Value::Tuple(items), n) => Ok(items.contains(n)),
        (Value::Map(map), Value::Str(k)) => Ok(map.contains_key(k)),
        (Value::Map(_), _) => Ok(false),
        (other, _) => Err(BindingError::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against `len`.
fn wrap_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let i = if index < 0 { index + len } else { index };
    (0..len).contains(&i).then(|| i as usize)
}

fn index_value(target: &Value, index: &Value) -> Result<Value, BindingError> {
    let out_of_range = || BindingError::Eval(format!("index {index} out of range"));
    match (target, index) {
        (Value::List(items) | Value::Tuple(items), idx) => {
            let i = idx
                .as_int()
                .ok_or_else(|| BindingError::Type("indices must be integers".into()))?;
            wrap_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or_else(out_of_range)
        }
        (Value::Str(s), idx) if idx.as_int().is_some() => {
            let chars: Vec<char> = s.chars().collect();
            let i = idx.as_int().unwrap_or_default();
            wrap_index(i, chars.len())
                .map(|i| Value::Str(chars[i].to_string()))
                .ok_or_else(out_of_range)
        }
        (Value::Map(map), Value::Str(key)) => map
            .get(key)
            .cloned()
            .ok_or_else(|| BindingError::UndefinedName(key.clone())),
        (other, _) => Err(BindingError::Type(format!(
            "'{}' is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Indices selected by `start:stop:step` over a sequence of `len` items.
fn slice_indices(
    len: usize,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Vec<usize>, BindingError> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(BindingError::Eval("slice step cannot be zero".into()));
    }
    let len = i64::try_from(len).map_err(|_| overflow())?;
    let clamp = |v: i64, lo: i64, hi: i64| {
        let v = if v < 0 { v + len } else { v };
        v.clamp(lo, hi)
    };
    let mut out = Vec::new();
    if step > 0 {
        let mut i = start.map_or(0, |s| clamp(s, 0, len));
        let end = stop.map_or(len, |s| clamp(s, 0, len));
        while i < end {
            out.push(i as usize);
            i += step;
        }
    } else {
        let mut i = start.map_or(len - 1, |s| clamp(s, -1, len - 1));
        let end = stop.map_or(-1, |s| clamp(s, -1, len - 1));
        while i > end {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

fn slice_value(
    target: &Value,
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
) -> Result<Value, BindingError> {
    match target {
        Value::List(items) | Value::Tuple(items) => {
            let picked = slice_indices(items.len(), start, stop, step)?
                .into_iter()
                .map(|i| items[i].clone())
                .collect();
            Ok(match target {
                Value::Tuple(_) => Value::Tuple(picked),
                _ => Value::List(picked),
            })
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(
                slice_indices(chars.len(), start, stop, step)?
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        other => Err(BindingError::Type(format!(
            "'{}' cannot be sliced",
            other.type_name()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Builtins
// ---------------------------------------------------------------------------

fn arity(name: &str, args: &[Value], range: std::ops::RangeInclusive<usize>) -> Result<(), BindingError> {
    if range.contains(&args.len()) {
        Ok(())
    } else {
        Err(BindingError::Type(format!(
            "{name}() takes {} to {} arguments ({} given)",
            range.start(),
            range.end(),
            args.len()
        )))
    }
}

fn builtin_int(args: &[Value]) -> Result<Value, BindingError> {
    arity("int", args, 0..=1)?;
    match args.first() {
        None => Ok(Value::Int(0)),
        Some(Value::Int(i)) => Ok(Value::Int(*i)),
        Some(Value::Bool(b)) => Ok(Value::Int(i64::from(*b))),
        Some(Value::Decimal(d)) => d.trunc().map(Value::Int).ok_or_else(overflow),
        Some(Value::Str(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| BindingError::Eval(format!("invalid literal for int(): '{s}'"))),
        Some(other) => Err(BindingError::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn builtin_len(args: &[Value]) -> Result<Value, BindingError> {
    arity("len", args, 1..=1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(BindingError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::from(n))
}

fn builtin_range(args: &[Value]) -> Result<Value, BindingError> {
    arity("range", args, 1..=3)?;
    let ints = args
        .iter()
        .map(|a| {
            a.as_int()
                .ok_or_else(|| BindingError::Type("range() arguments must be integers".into()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(BindingError::Type("range() takes 1 to 3 arguments".into())),
    };
    if step == 0 {
        return Err(BindingError::Eval("range() step must not be zero".into()));
    }
    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(Value::Int(i));
        i = i.checked_add(step).ok_or_else(overflow)?;
    }
    Ok(Value::List(out))
}

fn builtin_abs(args: &[Value]) -> Result<Value, BindingError> {
    arity("abs", args, 1..=1)?;
    match Num::of(&args[0]) {
        Some(Num::Int(i)) => i.checked_abs().map(Value::Int).ok_or_else(overflow),
        Some(Num::Dec(d)) => Ok(Value::Decimal(if d.mantissa() < 0 { d.neg() } else { d })),
        None => Err(BindingError::Type(format!(
            "bad operand type for abs(): '{}'",
            args[0].type_name()
        ))),
    }
}

fn extremum(name: &str, args: &[Value], want: Ordering) -> Result<Value, BindingError> {
    let items = match args {
        [single] => single.iter_items()?,
        _ => args.to_vec(),
    };
    let mut best: Option<Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                if compare(&item, &current)? == want {
                    item
                } else {
                    current
                }
            }
        });
    }
    best.ok_or_else(|| BindingError::Eval(format!("{name}() arg is an empty sequence")))
}

fn builtins() -> BTreeMap<&'static str, Callable> {
    let mut table = BTreeMap::new();
    let mut add = |name: &'static str, f: fn(&[Value]) -> Result<Value, BindingError>| {
        table.insert(name, Callable::new(name, f));
    };
    add("str", |args| {
        arity("str", args, 0..=1)?;
        Ok(Value::Str(args.first().map(|v| v.to_string()).unwrap_or_default()))
    });
    add("int", builtin_int);
    add("len", builtin_len);
    add("bool", |args| {
        arity("bool", args, 0..=1)?;
        Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
    });
    add("range", builtin_range);
    add("abs", builtin_abs);
    add("min", |args| extremum("min", args, Ordering::Less));
    add("max", |args| extremum("max", args, Ordering::Greater));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use pretty_assertions::assert_eq;

    fn ns() -> Namespace {
        Namespace::new(Rc::new(Environment::default()))
    }

    fn eval_str(src: &str, ns: &Namespace) -> Value {
        Interpreter::new().evaluate(src, ns).unwrap()
    }

    fn dec(s: &str) -> Value {
        Value::Decimal(s.parse().unwrap())
    }

    #[test]
    fn test_arithmetic() {
        let ns = ns();
        assert_eq!(eval_str("1 + 2 * 3", &ns), Value::Int(7));
        assert_eq!(eval_str("7 // 2", &ns), Value::Int(3));
        assert_eq!(eval_str("-7 // 2", &ns), Value::Int(-4));
        assert_eq!(eval_str("-7 % 3", &ns), Value::Int(2));
        assert_eq!(eval_str("6 / 3", &ns), dec("2"));
        assert_eq!(eval_str("1 / 4", &ns), dec("0.25"));
        assert_eq!(eval_str("0.1 + 0.2", &ns), dec("0.3"));
        assert_eq!(eval_str("'ab' * 2 + 'c'", &ns), Value::from("ababc"));
    }

    #[test]
    fn test_errors() {
        let ns = ns();
        let interp = Interpreter::new();
        assert_eq!(
            interp.evaluate("missing + 1", &ns),
            Err(BindingError::UndefinedName("missing".into()))
        );
        assert!(matches!(interp.evaluate("1 / 0", &ns), Err(BindingError::Eval(_))));
        assert!(matches!(
            interp.evaluate("(-9223372036854775807 - 1) / -1", &ns),
            Err(BindingError::Eval(_))
        ));
        assert!(matches!(
            interp.evaluate("(-9223372036854775807 - 1) // -1", &ns),
            Err(BindingError::Eval(_))
        ));
        assert!(matches!(interp.evaluate("'a' - 1", &ns), Err(BindingError::Type(_))));
        assert!(matches!(
            interp.evaluate("1 +", &ns),
            Err(BindingError::Syntax { .. })
        ));
    }

    #[test]
    fn test_names_and_locals() {
        let ns = ns();
        ns.set("count", 2);
        let interp = Interpreter::new();
        assert_eq!(
            interp
                .evaluate_with("count + value", &ns, &[("value", Value::Int(3))])
                .unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn test_boolean_logic() {
        let ns = ns();
        ns.set("items", vec![1, 2, 3]);
        assert_eq!(eval_str("2 in items and not 5 in items", &ns), Value::Bool(true));
        assert_eq!(eval_str("4 not in items", &ns), Value::Bool(true));
        assert_eq!(eval_str("'' or 'fallback'", &ns), Value::from("fallback"));
        assert_eq!(eval_str("'yes' if len(items) > 2 else 'no'", &ns), Value::from("yes"));
        assert_eq!(eval_str("0 < 1 < 2", &ns), Value::Bool(true));
    }

    #[test]
    fn test_indexing_and_slicing() {
        let ns = ns();
        ns.set("items", vec!["a", "b", "c", "d"]);
        assert_eq!(eval_str("items[-1]", &ns), Value::from("d"));
        assert_eq!(eval_str("items[1:3]", &ns), Value::from(vec!["b", "c"]));
        assert_eq!(eval_str("items[::-2]", &ns), Value::from(vec!["d", "b"]));
        assert_eq!(eval_str("'hello'[1:]", &ns), Value::from("ello"));
    }

    #[test]
    fn test_builtins() {
        let ns = ns();
        assert_eq!(eval_str("str(1) + str(True)", &ns), Value::from("1True"));
        assert_eq!(eval_str("int('42') + int(2.9)", &ns), Value::Int(44));
        assert_eq!(eval_str("range(3)", &ns), Value::from(vec![0, 1, 2]));
        assert_eq!(eval_str("max(3, 9, 4)", &ns), Value::Int(9));
        assert_eq!(eval_str("min([3, 9, 4])", &ns), Value::Int(3));
        assert_eq!(eval_str("abs(-2.5)", &ns), dec("2.5"));
        assert_eq!(eval_str("bool([])", &ns), Value::Bool(false));
    }

    #[test]
    fn test_callables_from_namespace() {
        let ns = ns();
        ns.set(
            "double",
            Callable::new("double", |args| {
                let n = args.first().and_then(Value::as_int).unwrap_or_default();
                Ok(Value::Int(n * 2))
            }),
        );
        assert_eq!(eval_str("double(21)", &ns), Value::Int(42));
    }

    #[test]
    fn test_execute_assignments() {
        let ns = ns();
        ns.set("count", 1);
        let interp = Interpreter::new();
        interp
            .execute("count = count + value; label = 'n=' + str(count)", &ns, &[("value", Value::Int(4))])
            .unwrap();
        assert_eq!(ns.get("count").unwrap(), Value::Int(5));
        assert_eq!(ns.get("label").unwrap(), Value::from("n=5"));
    }

    #[test]
    fn test_expression_cache() {
        let ns = ns();
        ns.set("a", 1);
        let interp = Interpreter::new();
        interp.evaluate("a + 1", &ns).unwrap();
        interp.evaluate("a + 1", &ns).unwrap();
        interp.check("a + 2").unwrap();
        assert_eq!(interp.cached_expressions(), 2);
    }
}
