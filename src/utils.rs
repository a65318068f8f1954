//! Utility functions for the autohost client

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Strip the fixed `!user@host` suffix the server appends to every identity
pub fn strip_identity_suffix<'a>(sender: &'a str, suffix: &str) -> &'a str {
    sender.strip_suffix(suffix).unwrap_or(sender)
}

/// Nickname part of a `nick!user@host` identity
pub fn nick_of(sender: &str) -> &str {
    sender.split('!').next().unwrap_or(sender)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_identity_suffix() {
        assert_eq!(
            strip_identity_suffix("BanchoBot!cho@ppy.sh", "!cho@ppy.sh"),
            "BanchoBot"
        );
        assert_eq!(strip_identity_suffix("BanchoBot", "!cho@ppy.sh"), "BanchoBot");
        assert_eq!(
            strip_identity_suffix("alice!alice@example.org", "!cho@ppy.sh"),
            "alice!alice@example.org"
        );
    }

    #[test]
    fn test_nick_of() {
        assert_eq!(nick_of("alice!alice@example.org"), "alice");
        assert_eq!(nick_of("irc.ppy.sh"), "irc.ppy.sh");
    }
}
