//! Bound-expression language used by `{expr}` literals, `!if` conditions,
//! `!enum` sources and setter statements.

pub mod ast;
pub mod interp;
pub mod lexer;
pub mod parser;

pub use interp::Interpreter;
pub use parser::{parse_expr, parse_statements, ParseError};

use crate::error::BindingError;
use crate::reactive::Namespace;
use crate::value::Value;

/// Evaluates expression source against a namespace.
pub trait ExpressionEvaluator {
    /// Validate `expr` without evaluating it.
    fn check(&self, expr: &str) -> Result<(), BindingError> {
        let _ = expr;
        Ok(())
    }

    fn evaluate(&self, expr: &str, namespace: &Namespace) -> Result<Value, BindingError>;

    /// Run `;`-separated statements. `locals` shadow namespace names for
    /// reads; assignments always write into the namespace.
    fn execute(
        &self,
        stmt: &str,
        namespace: &Namespace,
        locals: &[(&str, Value)],
    ) -> Result<(), BindingError>;
}
