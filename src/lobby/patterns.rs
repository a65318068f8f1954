//! Classification of system bot announcements
//!
//! Rules are tried in order and the first match wins.

use crate::types::{MatchEndReason, PlayerName};
use regex::Regex;
use std::sync::LazyLock;

static PLAYER_JOINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+) joined in slot (\d+)(?: for team \w+)?\.$").expect("valid join pattern")
});

static PLAYER_LEFT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) left the game\.$").expect("valid leave pattern"));

static HOST_CHANGED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) became the host\.$").expect("valid host pattern"));

static BEATMAP_CHANGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Beatmap changed to: (.+) \(https?://[^/\s]+/b/(\d+)\)$")
        .expect("valid beatmap pattern")
});

/// A recognized lobby announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    PlayerJoined { player: PlayerName, slot: u16 },
    PlayerLeft { player: PlayerName },
    HostChanged { player: PlayerName },
    BeatmapChanged { name: String, id: String },
    MatchStarted,
    AllPlayersReady,
    MatchEnded(MatchEndReason),
    HostChoosing,
}

impl Announcement {
    /// Short label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Announcement::PlayerJoined { .. } => "join",
            Announcement::PlayerLeft { .. } => "leave",
            Announcement::HostChanged { .. } => "host_new",
            Announcement::BeatmapChanged { .. } => "beatmap_change",
            Announcement::MatchStarted => "match_start",
            Announcement::AllPlayersReady => "ready",
            Announcement::MatchEnded(_) => "match_end",
            Announcement::HostChoosing => "host_choosing",
        }
    }
}

/// Match a system bot line against the announcement table
pub fn classify(text: &str) -> Option<Announcement> {
    if let Some(caps) = PLAYER_JOINED.captures(text) {
        // A slot number that does not fit is treated as an unknown line
        let slot = caps[2].parse().ok()?;
        return Some(Announcement::PlayerJoined {
            player: caps[1].to_string(),
            slot,
        });
    }
    if let Some(caps) = PLAYER_LEFT.captures(text) {
        return Some(Announcement::PlayerLeft {
            player: caps[1].to_string(),
        });
    }
    if let Some(caps) = HOST_CHANGED.captures(text) {
        return Some(Announcement::HostChanged {
            player: caps[1].to_string(),
        });
    }
    if let Some(caps) = BEATMAP_CHANGED.captures(text) {
        return Some(Announcement::BeatmapChanged {
            name: caps[1].to_string(),
            id: caps[2].to_string(),
        });
    }

    match text {
        "The match has started!" => Some(Announcement::MatchStarted),
        "All players are ready" => Some(Announcement::AllPlayersReady),
        "The match has finished!" => Some(Announcement::MatchEnded(MatchEndReason::Finished)),
        "Aborted the match" => Some(Announcement::MatchEnded(MatchEndReason::Aborted)),
        "Host is changing map..." => Some(Announcement::HostChoosing),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_joined() {
        assert_eq!(
            classify("Carol joined in slot 3."),
            Some(Announcement::PlayerJoined {
                player: "Carol".to_string(),
                slot: 3,
            })
        );
    }

    #[test]
    fn test_player_joined_with_team_and_spaces() {
        assert_eq!(
            classify("Some Player joined in slot 12 for team red."),
            Some(Announcement::PlayerJoined {
                player: "Some Player".to_string(),
                slot: 12,
            })
        );
    }

    #[test]
    fn test_player_left_and_host_changed() {
        assert_eq!(
            classify("Bob left the game."),
            Some(Announcement::PlayerLeft {
                player: "Bob".to_string()
            })
        );
        assert_eq!(
            classify("Alice became the host."),
            Some(Announcement::HostChanged {
                player: "Alice".to_string()
            })
        );
    }

    #[test]
    fn test_beatmap_changed() {
        assert_eq!(
            classify("Beatmap changed to: Song Title (https://osu.ppy.sh/b/42)"),
            Some(Announcement::BeatmapChanged {
                name: "Song Title".to_string(),
                id: "42".to_string(),
            })
        );
        // Names may contain parentheses of their own
        assert_eq!(
            classify("Beatmap changed to: Artist - Song (TV Size) [Hard] (https://osu.ppy.sh/b/7)"),
            Some(Announcement::BeatmapChanged {
                name: "Artist - Song (TV Size) [Hard]".to_string(),
                id: "7".to_string(),
            })
        );
    }

    #[test]
    fn test_fixed_announcements() {
        assert_eq!(
            classify("The match has started!"),
            Some(Announcement::MatchStarted)
        );
        assert_eq!(
            classify("All players are ready"),
            Some(Announcement::AllPlayersReady)
        );
        assert_eq!(
            classify("The match has finished!"),
            Some(Announcement::MatchEnded(MatchEndReason::Finished))
        );
        assert_eq!(
            classify("Aborted the match"),
            Some(Announcement::MatchEnded(MatchEndReason::Aborted))
        );
        assert_eq!(
            classify("Host is changing map..."),
            Some(Announcement::HostChoosing)
        );
    }

    #[test]
    fn test_unrecognized_text() {
        assert_eq!(classify("Room name: Lobby, History: https://osu.ppy.sh/mp/1"), None);
        assert_eq!(classify("Carol joined in slot three."), None);
        assert_eq!(classify("Carol joined in slot 99999999."), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Announcement::MatchStarted.label(), "match_start");
        assert_eq!(
            Announcement::MatchEnded(MatchEndReason::Aborted).label(),
            "match_end"
        );
    }
}
