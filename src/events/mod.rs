//! Event dispatch for the protocol engine and the lobby layer
//!
//! Both tiers expose their events through the same capability table: a map
//! from event kind to a single handler, populated before the receive loop
//! starts.

pub mod dispatcher;

pub use dispatcher::{handler_fn, Event, EventDispatcher, EventHandler, FailureSlot, FnHandler};
