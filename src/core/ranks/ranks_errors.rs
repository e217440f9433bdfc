use std::time::Duration;
use thiserror::Error;

// Every failure the ranking core can report. The Discord layer turns these
// into user-facing text; none of them should ever take the process down.
#[derive(Debug, Error)]
pub enum RanksError {
    /// No XP record for the member (or nothing configured for the community).
    #[error("Member {user_id} is not ranked in guild {guild_id} yet")]
    NotFound { guild_id: u64, user_id: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Persistence backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("No response received within {0:?}")]
    Timeout(Duration),
}

impl RanksError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        RanksError::BackendUnavailable(err.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RanksError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = RanksError::backend("connection refused");
        assert!(err.to_string().contains("connection refused"));

        let not_found = RanksError::NotFound {
            guild_id: 7,
            user_id: 5,
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.to_string(), "Member 5 is not ranked in guild 7 yet");
    }
}
