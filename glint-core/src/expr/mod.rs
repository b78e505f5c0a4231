//! Expression Evaluator
//!
//! Runs attribute text against application state. Display directives go
//! through [`Evaluator::evaluate_expression`]; event handlers go through
//! [`Evaluator::evaluate_and_update_state`].
//!
//! # How Evaluation Works
//!
//! 1. The text is compiled (tokenized and parsed) into an AST, or taken from
//!    the cache if the same text was compiled before
//! 2. A [`Scope`] is built over the store: a read-only snapshot for display,
//!    a live write-through view for handlers
//! 3. The interpreter walks the AST against the scope
//!
//! Any failure along the way comes back as one [`EvalError`] holding the
//! original text.
//!
//! # Example
//!
//! ```
//! use glint_core::expr::Evaluator;
//! use glint_core::{Store, Value};
//!
//! let store = Store::new([("count", 0)]);
//! let evaluator = Evaluator::default();
//!
//! evaluator.evaluate_and_update_state("count = count + 1", &store, None).unwrap();
//! assert_eq!(evaluator.evaluate_expression("count * 10", &store).unwrap(), Value::from(10));
//! ```

mod ast;
mod builtins;
mod interpreter;
mod lexer;
mod parser;
mod scope;

pub use ast::{
    AssignOp, BinaryOp, Expr, Literal, LogicalOp, Program, Property, Stmt, TemplatePart,
    UnaryOp, UpdateOp,
};
pub use builtins::{global, global_names};
pub use interpreter::Interpreter;
pub use lexer::{tokenize, Punct, Spanned, TemplateChunk, Token};
pub use parser::{parse_expression, parse_program, MAX_DEPTH};
pub use scope::{Scope, SnapshotScope, StoreScope, EVENT_BINDING};

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::dom::Event;
use crate::error::{EvalError, ExprError};
use crate::reactive::Store;
use crate::value::Value;

/// Default number of compiled texts kept per cache.
pub const DEFAULT_CACHE_SIZE: usize = 256;

/// Insertion-ordered cache; the oldest entry goes first when full.
struct FifoCache<T> {
    capacity: usize,
    entries: IndexMap<String, Arc<T>>,
}

impl<T> FifoCache<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::new(),
        }
    }

    fn get(&self, text: &str) -> Option<Arc<T>> {
        self.entries.get(text).cloned()
    }

    fn insert(&mut self, text: &str, value: Arc<T>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(text.to_string(), value);
    }
}

/// Compiles and runs attribute expressions, caching parsed text.
///
/// Display expressions and handler programs are cached separately since the
/// same text parses differently as an expression and as a statement list.
pub struct Evaluator {
    expressions: Mutex<FifoCache<Expr>>,
    programs: Mutex<FifoCache<Program>>,
}

impl Evaluator {
    /// Create an evaluator caching up to `capacity` texts of each kind.
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            expressions: Mutex::new(FifoCache::new(capacity)),
            programs: Mutex::new(FifoCache::new(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.expressions.lock().capacity
    }

    /// Number of compiled texts currently cached, both kinds together.
    pub fn cached_len(&self) -> usize {
        self.expressions.lock().entries.len() + self.programs.lock().entries.len()
    }

    /// Parse `text` as a single expression.
    pub fn compile_expression(&self, text: &str) -> Result<Arc<Expr>, EvalError> {
        if let Some(expr) = self.expressions.lock().get(text) {
            return Ok(expr);
        }
        tracing::trace!(expression = text, "compiling display expression");
        let expr = Arc::new(parse_expression(text).map_err(|e| EvalError::new(text, e))?);
        self.expressions.lock().insert(text, Arc::clone(&expr));
        Ok(expr)
    }

    /// Parse `text` as a statement sequence.
    pub fn compile_program(&self, text: &str) -> Result<Arc<Program>, EvalError> {
        if let Some(program) = self.programs.lock().get(text) {
            return Ok(program);
        }
        tracing::trace!(expression = text, "compiling handler program");
        let program = Arc::new(parse_program(text).map_err(|e| EvalError::new(text, e))?);
        self.programs.lock().insert(text, Arc::clone(&program));
        Ok(program)
    }

    /// Evaluate `text` as an expression against any scope.
    pub fn evaluate_in(&self, text: &str, scope: &mut dyn Scope) -> Result<Value, EvalError> {
        let expr = self.compile_expression(text)?;
        Interpreter::new(scope)
            .eval(&expr)
            .map_err(|e| EvalError::new(text, e))
    }

    /// Execute `text` as a statement sequence against any scope. Returns the
    /// value of the last expression statement.
    pub fn execute_in(&self, text: &str, scope: &mut dyn Scope) -> Result<Value, EvalError> {
        let program = self.compile_program(text)?;
        Interpreter::new(scope)
            .exec(&program)
            .map_err(|e| EvalError::new(text, e))
    }

    /// Evaluate a display expression against a snapshot of `store`.
    ///
    /// The store is never written; an assignment in `text` fails.
    pub fn evaluate_expression(&self, text: &str, store: &Store) -> Result<Value, EvalError> {
        self.evaluate_in(text, &mut SnapshotScope::of(store))
    }

    /// Run handler statements against `store`, writing assignments back.
    ///
    /// Assigning to a name that is neither a local nor a store key creates
    /// the key. When `event` is given it is visible as `event`.
    pub fn evaluate_and_update_state(
        &self,
        text: &str,
        store: &Store,
        event: Option<&Event>,
    ) -> Result<(), EvalError> {
        let mut scope = StoreScope::new(store);
        if let Some(event) = event {
            scope = scope.with_event(event);
        }
        self.execute_in(text, &mut scope).map(|_| ())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("capacity", &self.capacity())
            .field("cached", &self.cached_len())
            .finish()
    }
}

/// Evaluate a display expression without caching.
pub fn evaluate_expression(text: &str, store: &Store) -> Result<Value, EvalError> {
    Evaluator::new(0).evaluate_expression(text, store)
}

/// Run handler statements without caching.
pub fn evaluate_and_update_state(
    text: &str,
    store: &Store,
    event: Option<&Event>,
) -> Result<(), EvalError> {
    Evaluator::new(0).evaluate_and_update_state(text, store, event)
}

/// Whether a failure came from parsing rather than running.
pub fn is_syntax_error(error: &EvalError) -> bool {
    matches!(error.cause, ExprError::Syntax { .. } | ExprError::TooDeep(_))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
