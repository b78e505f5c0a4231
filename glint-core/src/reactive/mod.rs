//! Reactive Primitives
//!
//! This module implements the change-tracking half of Glint: a state store
//! that notifies subscribers, and effects that re-run on notification.
//!
//! # Concepts
//!
//! ## Stores
//!
//! A Store is a container for mutable state keyed by name. Every write goes
//! through [`Store::set`]. When the written value differs from the current
//! one (strict equality), all subscribers are notified before `set` returns.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation run once per notification.
//! The binder's render pass is an effect subscribed to the page store.
//!
//! # Implementation Notes
//!
//! There is no dependency tracking. A change to any key re-runs every
//! subscriber, and each changing write notifies on its own: a handler that
//! writes two keys causes two render passes.

mod effect;
mod store;
mod subscriber;

pub use effect::Effect;
pub use store::Store;
pub use subscriber::{Subscriber, SubscriberId};
