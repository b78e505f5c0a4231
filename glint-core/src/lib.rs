//! Glint Core
//!
//! This crate provides the core runtime for Glint, a minimal attribute-based
//! reactive binding layer for document trees. It implements:
//!
//! - A change-notifying state container
//! - A pre-order tree walker over a small document model
//! - A binder that renders display directives and attaches event directives
//! - An evaluator for a restricted expression language used in attributes
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: the state container, subscribers and the render effect
//! - `expr`: lexer, parser and interpreter for attribute expressions
//! - `dom`: elements, events, the tree walker and a markup reader
//! - `binder`: directive recognition, render passes and event wiring
//! - `value`: the dynamic value type shared by all of the above
//!
//! # Example
//!
//! ```rust
//! use glint_core::{Binder, Document, Event, Store};
//!
//! let document = Document::parse(r#"
//!     <p id="label" @data="`Clicked ${count} times`"></p>
//!     <button id="btn" @click="count += 1">Click</button>
//! "#).unwrap();
//!
//! let store = Store::new([("count", 0)]);
//! let _binder = Binder::bind(&document, &store);
//!
//! let label = document.get_element_by_id("label").unwrap();
//! assert_eq!(document.text_content(label).as_deref(), Some("Clicked 0 times"));
//!
//! let button = document.get_element_by_id("btn").unwrap();
//! document.dispatch(button, Event::new("click"));
//! assert_eq!(document.text_content(label).as_deref(), Some("Clicked 1 times"));
//!
//! // Host writes re-render too.
//! store.set("count", 10);
//! assert_eq!(document.text_content(label).as_deref(), Some("Clicked 10 times"));
//! ```

pub mod binder;
pub mod dom;
pub mod error;
pub mod expr;
pub mod reactive;
pub mod value;

pub use binder::{Binder, BinderBuilder, BinderConfig, Diagnostic, DiagnosticKind, DiagnosticSink};
pub use dom::{Document, Element, Event, NodeId};
pub use error::{ConfigError, EvalError, ExprError, MarkupError, StoreError};
pub use expr::{evaluate_and_update_state, evaluate_expression, Evaluator, Scope};
pub use reactive::{Effect, Store, Subscriber, SubscriberId};
pub use value::{NativeFunction, Value};
