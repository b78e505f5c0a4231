//! Error types.
//!
//! Expression failures are the only errors that occur while the page is
//! live. They are produced as [`ExprError`] by the lexer, parser and
//! interpreter, then wrapped into a single [`EvalError`] carrying the source
//! text before they leave the evaluator. The remaining types cover the
//! construction surfaces (initial state, configuration, markup).

use thiserror::Error;

/// A failure inside the expression engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The text could not be tokenized or parsed.
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// An identifier did not resolve to a local, a state key or a built-in.
    #[error("{0} is not defined")]
    Reference(String),

    /// An operation was applied to a value of the wrong kind.
    #[error("type error: {0}")]
    Type(String),

    /// Assignment to a name the current scope does not allow writing.
    #[error("cannot assign to `{0}`")]
    ReadOnly(String),

    /// A host-supplied or built-in function reported a failure.
    #[error("{0}")]
    Host(String),

    /// The parser nesting limit was exceeded.
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

impl ExprError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }
}

/// Expression evaluation failure.
///
/// Every compile or run-time error of an attribute expression surfaces as
/// this one kind, carrying the original text alongside the cause.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expression evaluation failure in `{expression}`: {cause}")]
pub struct EvalError {
    /// The attribute text that failed.
    pub expression: String,
    /// What went wrong.
    #[source]
    pub cause: ExprError,
}

impl EvalError {
    pub fn new(expression: impl Into<String>, cause: ExprError) -> Self {
        Self {
            expression: expression.into(),
            cause,
        }
    }
}

/// Failure building a [`Store`](crate::reactive::Store) from serialized state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("initial state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("initial state must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Invalid binder configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("display_attribute must not be empty")]
    EmptyDisplayAttribute,

    #[error("event_prefix must not be empty")]
    EmptyEventPrefix,

    #[error("display_attribute `{0}` is the bare event prefix")]
    DisplayIsPrefix(String),
}

/// Failure reading a markup fragment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkupError {
    #[error("unexpected end of markup inside {0}")]
    UnexpectedEof(&'static str),

    #[error("expected a tag name at offset {0}")]
    MissingTagName(usize),

    #[error("closing tag </{found}> at offset {offset} does not match <{expected}>")]
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("closing tag </{tag}> at offset {offset} has no open element")]
    UnmatchedClose { tag: String, offset: usize },

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}
