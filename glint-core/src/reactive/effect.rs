//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever the store
//! it is subscribed to changes. The binder's render pass is an effect.
//!
//! # How Effects Work
//!
//! 1. An effect is created lazily: nothing runs until [`Effect::execute`] is
//!    called (the binder calls it once for first paint).
//!
//! 2. [`Effect::subscriber`] yields a store subscriber that executes the
//!    effect synchronously on every change notification.
//!
//! 3. There is no dependency tracking. Any change to the store re-runs the
//!    whole effect.
//!
//! Each execution is counted, which makes "one render pass per change"
//! observable.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::subscriber::Subscriber;

/// Counter for generating unique effect IDs.
static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique effect ID.
fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A side-effecting computation that runs when the store changes.
///
/// # Example
///
/// ```rust
/// use glint_core::reactive::{Effect, Store};
///
/// let store = Store::new([("count", 0)]);
/// let effect = Effect::new_lazy(|| {});
/// store.subscribe(effect.subscriber());
///
/// store.set("count", 1);
/// assert_eq!(effect.run_count(), 1);
/// ```
pub struct Effect {
    /// Unique identifier for this effect.
    id: u64,

    /// The effect function.
    run: Arc<dyn Fn() + Send + Sync>,

    /// Number of times the effect has run.
    run_count: Arc<AtomicUsize>,
}

impl Effect {
    /// Create a new effect without running it.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: next_effect_id(),
            run: Arc::new(run),
            run_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Execute the effect function.
    ///
    /// The count is bumped before running so a re-entrant execution
    /// triggered from inside the effect is counted as its own pass.
    pub fn execute(&self) {
        self.run_count.fetch_add(1, Ordering::SeqCst);
        (self.run)();
    }

    /// A store subscriber that executes this effect on every change.
    pub fn subscriber(&self) -> Subscriber {
        let effect = self.clone();
        Subscriber::new(move || effect.execute())
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            run: Arc::clone(&self.run),
            run_count: Arc::clone(&self.run_count),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
