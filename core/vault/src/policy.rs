//! Unlock and PIN policy configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use quorumvault_crypto::MIN_PIN_LENGTH;

/// Tunable policy for PIN validation and progressive unlock.
///
/// The defaults match the documented behavior: a 5-minute sliding quorum
/// window and a 4-character PIN floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockPolicy {
    /// Width of the sliding quorum window, in seconds. A member's PIN
    /// submission only counts toward quorum while it is younger than this.
    pub quorum_window_secs: u32,
    /// Minimum accepted PIN length in characters.
    pub min_pin_length: usize,
}

impl UnlockPolicy {
    /// The quorum window as a duration.
    pub fn quorum_window(&self) -> Duration {
        Duration::seconds(i64::from(self.quorum_window_secs))
    }
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            quorum_window_secs: 300,
            min_pin_length: MIN_PIN_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_is_five_minutes() {
        let policy = UnlockPolicy::default();
        assert_eq!(policy.quorum_window(), Duration::minutes(5));
        assert_eq!(policy.min_pin_length, 4);
    }

    #[test]
    fn test_policy_serde_roundtrip() {
        let policy = UnlockPolicy {
            quorum_window_secs: 120,
            min_pin_length: 6,
        };
        let json = serde_json::to_string(&policy).unwrap();
        let restored: UnlockPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.quorum_window_secs, 120);
        assert_eq!(restored.min_pin_length, 6);
    }
}
