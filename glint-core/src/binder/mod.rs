//! Binder
//!
//! Connects a [`Store`] to a [`Document`]: elements carrying the display
//! attribute show their expression's value, elements carrying event
//! attributes run their handler text when the event fires.
//!
//! # How Binding Works
//!
//! 1. [`Binder::bind`] subscribes a render effect to the store, runs the
//!    first render pass, then attaches listeners once
//! 2. A handler (or host code) writes the store
//! 3. On any changing write the store runs the render effect synchronously,
//!    which re-scans the whole tree and rewrites every display element
//!
//! Listeners are never re-attached. Elements inserted after binding get
//! none.
//!
//! # How a Render Pass Works
//!
//! The pass runs in three phases so that no document lock is held while
//! expressions run (a host function called from an expression may write the
//! store and trigger a nested pass):
//!
//! 1. collect `(element, expression)` pairs in pre-order, under the lock
//! 2. evaluate each expression against a snapshot of the store, unlocked
//! 3. write each result as text content, under the lock
//!
//! A failing expression leaves its element unchanged and is reported to the
//! [`DiagnosticSink`]; the rest of the pass continues. If an expression
//! writes the store during phase 2, the nested pass renders the newer state
//! and the outer pass stops without applying or reporting anything.
//!
//! # Example
//!
//! ```
//! use glint_core::{Binder, Document, Event, Store};
//!
//! let document = Document::parse(
//!     r#"<span id="out" @data="count"></span><button id="inc" @click="count = count + 1">+</button>"#,
//! ).unwrap();
//! let store = Store::new([("count", 0)]);
//! let binder = Binder::bind(&document, &store);
//!
//! let button = document.get_element_by_id("inc").unwrap();
//! document.dispatch(button, Event::new("click"));
//!
//! let out = document.get_element_by_id("out").unwrap();
//! assert_eq!(document.text_content(out).as_deref(), Some("1"));
//! assert_eq!(binder.render_count(), 2);
//! ```

mod config;
mod diagnostics;
mod directive;

pub use config::BinderConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, MemorySink, TracingSink};
pub use directive::{classify, Directive};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use crate::dom::{traverse_mut, Document, Listener, NodeId, Preorder};
use crate::error::{ConfigError, EvalError};
use crate::expr::Evaluator;
use crate::reactive::{Effect, Store, SubscriberId};
use crate::value::Value;

/// A display directive found during the collect phase.
struct PendingRender {
    element: NodeId,
    tag: String,
    expression: String,
}

/// An event directive found during the attachment pass.
struct PendingListener {
    event_type: String,
    handler: String,
}

struct BinderInner {
    document: Document,
    store: Store,
    config: BinderConfig,
    evaluator: Arc<Evaluator>,
    diagnostics: Arc<dyn DiagnosticSink>,
    render: Effect,
    subscription: SubscriberId,
    listeners_attached: AtomicBool,
}

impl BinderInner {
    fn render_pass(&self) {
        let display = self.config.display_attribute.as_str();
        let pending: Vec<PendingRender> = self.document.with_body(|body| {
            Preorder::new(body)
                .filter_map(|element| {
                    element.attribute(display).map(|expression| PendingRender {
                        element: element.id(),
                        tag: element.tag().to_string(),
                        expression: expression.to_string(),
                    })
                })
                .collect()
        });

        let pass = self.render.run_count();
        let mut results = IndexMap::with_capacity(pending.len());
        let mut failures = Vec::new();
        for item in pending {
            match self.evaluator.evaluate_expression(&item.expression, &self.store) {
                Ok(value) => {
                    results.insert(item.element, value.to_string());
                }
                Err(error) => failures.push(Diagnostic::from_eval(
                    DiagnosticKind::Render,
                    item.element,
                    &item.tag,
                    error,
                )),
            }
            // An expression wrote the store and a nested pass has already
            // rendered the newer state; this pass's results are stale.
            if self.render.run_count() != pass {
                tracing::debug!(pass, "render pass superseded by a nested pass");
                return;
            }
        }

        let failed = failures.len();
        for diagnostic in failures {
            self.diagnostics.report(diagnostic);
        }

        let evaluated = results.len();
        let written = self.document.with_body_mut(|body| {
            let mut written = 0;
            traverse_mut(body, |element| {
                if let Some(text) = results.swap_remove(&element.id()) {
                    element.set_text_content(text);
                    written += 1;
                }
            });
            written
        });

        tracing::debug!(
            pass,
            evaluated,
            written,
            failed,
            "render pass complete"
        );
    }

    fn register_event_listeners(&self) -> usize {
        if self.listeners_attached.swap(true, Ordering::SeqCst) {
            tracing::warn!("event listeners already attached; ignoring repeated registration");
            return 0;
        }

        let mut malformed = Vec::new();
        let attached = self.document.with_body_mut(|body| {
            let mut attached = 0;
            traverse_mut(body, |element| {
                let mut pending = Vec::new();
                for (name, value) in element.attributes() {
                    match classify(name, value, &self.config) {
                        Some(Directive::Event {
                            event_type,
                            handler,
                        }) => pending.push(PendingListener {
                            event_type: event_type.to_string(),
                            handler: handler.to_string(),
                        }),
                        Some(Directive::Malformed { attribute }) => malformed.push(Diagnostic {
                            kind: DiagnosticKind::Registration,
                            element: element.id(),
                            tag: element.tag().to_string(),
                            expression: value.to_string(),
                            message: format!("attribute `{attribute}` names no event type"),
                        }),
                        Some(Directive::Display { .. }) | None => {}
                    }
                }
                for item in pending {
                    let listener = self.listener(element.id(), element.tag(), item);
                    element.add_listener(listener);
                    attached += 1;
                }
            });
            attached
        });

        for diagnostic in malformed {
            self.diagnostics.report(diagnostic);
        }
        tracing::debug!(attached, "event listeners attached");
        attached
    }

    /// A listener running `handler` against the store with the event bound.
    fn listener(&self, element: NodeId, tag: &str, pending: PendingListener) -> Listener {
        let PendingListener {
            event_type,
            handler,
        } = pending;
        let store = self.store.clone();
        let evaluator = Arc::clone(&self.evaluator);
        let diagnostics = Arc::clone(&self.diagnostics);
        let tag = tag.to_string();
        let kind = DiagnosticKind::Handler {
            event_type: event_type.clone(),
        };
        Listener::new(event_type, move |event| {
            if let Err(error) = evaluator.evaluate_and_update_state(&handler, &store, Some(event)) {
                diagnostics.report(Diagnostic::from_eval(kind.clone(), element, &tag, error));
            }
        })
    }
}

impl Drop for BinderInner {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

/// Handle to a live binding between a store and a document.
///
/// Clones share the binding. Dropping the last handle unsubscribes from the
/// store; listeners already attached keep working.
#[derive(Clone)]
pub struct Binder {
    inner: Arc<BinderInner>,
}

impl Binder {
    /// Bind with the default configuration, reporting to [`TracingSink`].
    pub fn bind(document: &Document, store: &Store) -> Self {
        Self::construct(
            document,
            store,
            BinderConfig::default(),
            Arc::new(TracingSink),
        )
    }

    /// Start configuring a binding of `store` to `document`.
    pub fn builder(document: &Document, store: &Store) -> BinderBuilder {
        BinderBuilder {
            document: document.clone(),
            store: store.clone(),
            config: BinderConfig::default(),
            diagnostics: Arc::new(TracingSink),
        }
    }

    fn construct(
        document: &Document,
        store: &Store,
        config: BinderConfig,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<BinderInner>| {
            let weak = weak.clone();
            let render = Effect::new_lazy(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.render_pass();
                }
            });
            let subscription = store.subscribe(render.subscriber());
            BinderInner {
                document: document.clone(),
                store: store.clone(),
                evaluator: Arc::new(Evaluator::new(config.expression_cache_size)),
                config,
                diagnostics,
                render,
                subscription,
                listeners_attached: AtomicBool::new(false),
            }
        });
        let binder = Self { inner };
        binder.refresh();
        binder.register_event_listeners();
        binder
    }

    /// Run a full render pass now.
    pub fn refresh(&self) {
        self.inner.render.execute();
    }

    /// Attach a listener for every event directive in the tree.
    ///
    /// Only the first call does anything; later calls log a warning and
    /// return 0. [`Binder::bind`] already makes the first call.
    pub fn register_event_listeners(&self) -> usize {
        self.inner.register_event_listeners()
    }

    /// Number of render passes run so far, first paint included.
    pub fn render_count(&self) -> usize {
        self.inner.render.run_count()
    }

    /// Whether the listener attachment pass has run.
    pub fn listeners_attached(&self) -> bool {
        self.inner.listeners_attached.load(Ordering::SeqCst)
    }

    /// Evaluate a display expression against the bound store.
    pub fn evaluate_expression(&self, text: &str) -> Result<Value, EvalError> {
        self.inner.evaluator.evaluate_expression(text, &self.inner.store)
    }

    /// Run handler statements against the bound store, with no event bound.
    pub fn evaluate_and_update_state(&self, text: &str) -> Result<(), EvalError> {
        self.inner
            .evaluator
            .evaluate_and_update_state(text, &self.inner.store, None)
    }

    /// The bound store.
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    /// The bound document.
    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    /// The configuration in effect.
    pub fn config(&self) -> &BinderConfig {
        &self.inner.config
    }
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("store", &self.inner.store.id())
            .field("render_count", &self.render_count())
            .field("listeners_attached", &self.listeners_attached())
            .finish()
    }
}

/// Configures a [`Binder`] before binding.
pub struct BinderBuilder {
    document: Document,
    store: Store,
    config: BinderConfig,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl BinderBuilder {
    /// Use `config` instead of the defaults. It is validated by [`BinderBuilder::bind`].
    pub fn config(mut self, config: BinderConfig) -> Self {
        self.config = config;
        self
    }

    /// Report failures to `sink` instead of [`TracingSink`].
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Validate the configuration, then bind: first render pass, then
    /// listener attachment.
    pub fn bind(self) -> Result<Binder, ConfigError> {
        self.config.validate()?;
        Ok(Binder::construct(
            &self.document,
            &self.store,
            self.config,
            self.diagnostics,
        ))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
