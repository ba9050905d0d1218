//! Error taxonomy.
//!
//! Parse-time problems ([`SyntaxError`]) are fatal for the template being
//! parsed. [`LiteralError`] covers a single attribute value that does not
//! match the literal grammar. [`BindingError`] is raised when reading or
//! writing a bound value fails. [`MountError`] scopes any of those to the
//! component that was being created or updated.

use thiserror::Error;

use crate::widget::WidgetError;

/// Low-level failures from [`Cursor`](crate::markup::Cursor) scanning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("unterminated literal starting at byte {start}")]
    UnterminatedLiteral { start: usize },
    #[error("unmatched '{found}' at byte {position}")]
    UnmatchedBracket { found: char, position: usize },
}

/// What went wrong while parsing markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("indentation is not a multiple of the indent unit ({unit} spaces)")]
    BadIndent { unit: usize },
    #[error("line is indented deeper than its parent allows")]
    Overindented,
    #[error("tabs are not allowed in indentation")]
    TabIndent,
    #[error("unterminated string or bracket")]
    UnterminatedLiteral,
    #[error("unmatched '{0}'")]
    UnmatchedBracket(char),
    #[error("unknown special line '!{0}'")]
    UnknownSpecial(String),
    #[error("expected a tag starting with '\\'")]
    ExpectedTag,
    #[error("template is empty")]
    EmptyTemplate,
    #[error("missing value after '{0}='")]
    MissingValue(String),
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("missing component name after '\\'")]
    MissingName,
    #[error("malformed '!enum': {0}")]
    MalformedRepeat(String),
    #[error("'!if' requires a condition")]
    MissingCondition,
}

/// A positioned markup syntax error. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (line {line}, column {column})")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// What was wrong with a literal token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralErrorKind {
    #[error("empty literal")]
    Empty,
    #[error("unrecognized literal")]
    Unrecognized,
    #[error("invalid number")]
    BadNumber,
    #[error("invalid slice")]
    BadSlice,
    #[error("invalid tuple element")]
    BadTuple,
    #[error("invalid resource reference")]
    BadResource,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("invalid translation key")]
    BadTranslationKey,
    #[error("bound expression used without a namespace")]
    Unscoped,
    #[error("{0}")]
    Binding(#[from] BindingError),
}

/// A literal that could not be evaluated. `position` is the byte offset of
/// the offending substring inside `token`.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: '{fragment}' in literal '{token}' at {position}")]
pub struct LiteralError {
    pub kind: LiteralErrorKind,
    pub token: String,
    pub fragment: String,
    pub position: usize,
}

impl LiteralError {
    pub fn new(kind: LiteralErrorKind, token: &str) -> Self {
        Self {
            kind,
            token: token.to_owned(),
            fragment: token.to_owned(),
            position: 0,
        }
    }

    /// Narrow the error to `fragment` starting at byte `position` in the token.
    pub fn at(mut self, fragment: &str, position: usize) -> Self {
        self.fragment = fragment.to_owned();
        self.position = position;
        self
    }
}

/// Failure while reading or writing a bound value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("name '{0}' is not defined")]
    UndefinedName(String),
    #[error("binding '{0}' is read-only")]
    ReadOnly(String),
    #[error("type error: {0}")]
    Type(String),
    #[error("{0}")]
    Eval(String),
    #[error("invalid expression '{expr}': {message}")]
    Syntax { expr: String, message: String },
    #[error("translation '{0}' not found")]
    MissingTranslation(String),
    #[error("resource error: {0}")]
    Resource(String),
    #[error("no translator is installed")]
    NoTranslator,
}

/// Failure while creating or updating a component subtree.
#[derive(Debug, Clone, Error)]
pub enum MountError {
    #[error("unknown component '{name}' (line {line})")]
    UnknownComponent { name: String, line: usize },
    #[error("attribute '{key}' of '{component}' (line {line}): {source}")]
    Literal {
        component: String,
        key: String,
        line: usize,
        #[source]
        source: LiteralError,
    },
    #[error("binding '{key}' of '{component}' (line {line}): {source}")]
    Binding {
        component: String,
        key: String,
        line: usize,
        #[source]
        source: BindingError,
    },
    #[error("'{component}' does not accept attribute '{key}' (line {line})")]
    UnknownAttribute {
        component: String,
        key: String,
        line: usize,
    },
    #[error("attribute '{key}' of '{component}' (line {line}): {message}")]
    InvalidAttribute {
        component: String,
        key: String,
        line: usize,
        message: String,
    },
    #[error("condition at line {line}: {source}")]
    Condition {
        line: usize,
        #[source]
        source: BindingError,
    },
    #[error("repeat source at line {line}: {source}")]
    RepeatSource {
        line: usize,
        #[source]
        source: BindingError,
    },
    #[error("'{component}' (line {line}): {source}")]
    Widget {
        component: String,
        line: usize,
        #[source]
        source: WidgetError,
    },
    #[error("component is not mounted")]
    NotMounted,
}

/// Umbrella error for the public entry points.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error(transparent)]
    Mount(#[from] MountError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_display_is_positioned() {
        let err = SyntaxError::new(SyntaxErrorKind::BadIndent { unit: 2 }, 3, 4);
        assert_eq!(
            err.to_string(),
            "indentation is not a multiple of the indent unit (2 spaces) (line 3, column 4)"
        );
    }

    #[test]
    fn literal_error_names_fragment() {
        let err = LiteralError::new(LiteralErrorKind::BadTuple, "1,x").at("x", 2);
        assert_eq!(
            err.to_string(),
            "invalid tuple element: 'x' in literal '1,x' at 2"
        );
    }

    #[test]
    fn umbrella_error_is_transparent() {
        let err: Error = BindingError::UndefinedName("count".into()).into();
        assert_eq!(err.to_string(), "name 'count' is not defined");
    }
}
