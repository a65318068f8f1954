//! Service layer for the autohost client
//!
//! This module contains the application state that ties the protocol client,
//! the lobby layer and monitoring together.

pub mod app;

pub use app::{wait_for_shutdown_signal, AppState};
