//! Lobby layer for auto host rotate lobbies
//!
//! This module turns system bot announcements into lobby events, keeps the
//! host rotation queue and issues the lobby commands that follow from it.

pub mod manager;
pub mod patterns;
pub mod queue;
pub mod session;

// Re-export commonly used types
pub use manager::{LobbyManager, LobbyManagerStats};
pub use patterns::{classify, Announcement};
pub use queue::{HostQueue, JoinOutcome};
pub use session::{Beatmap, LobbySession, LobbySnapshot};
