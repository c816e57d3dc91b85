use core::fmt;

/// Failure of a session or score request. Every variant is request-local.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreError {
    InvalidPlatform,
    MissingFields,
    InvalidSession,
    SessionExpired,
    InvalidName,
    InvalidScore,
    InvalidScope,
    StorageFailure(String),
}

impl ScoreError {
    /// Stable machine-readable code carried in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPlatform => "INVALID_PLATFORM",
            Self::MissingFields => "MISSING_FIELDS",
            Self::InvalidSession => "INVALID_SESSION",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::InvalidName => "INVALID_NAME",
            Self::InvalidScore => "INVALID_SCORE",
            Self::InvalidScope => "INVALID_SCOPE",
            Self::StorageFailure(_) => "STORAGE_FAILURE",
        }
    }

    /// Human message safe to return to clients. Storage details stay out of it.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidPlatform => "Platform must be mobile or desktop",
            Self::MissingFields => "All fields are required",
            Self::InvalidSession => "Invalid or already used session",
            Self::SessionExpired => "Session has expired",
            Self::InvalidName => "Player name must be 1-12 characters, alphanumeric + space/_/-",
            Self::InvalidScore => "Score must be between 0 and 1,000,000,000",
            Self::InvalidScope => "Scope must be weekly or alltime",
            Self::StorageFailure(_) => "Storage error",
        }
    }
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StorageFailure(detail) => write!(f, "storage failure: {detail}"),
            other => write!(f, "{}: {}", other.code(), other.public_message()),
        }
    }
}

impl std::error::Error for ScoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_screaming_snake_case() {
        let all = [
            ScoreError::InvalidPlatform,
            ScoreError::MissingFields,
            ScoreError::InvalidSession,
            ScoreError::SessionExpired,
            ScoreError::InvalidName,
            ScoreError::InvalidScore,
            ScoreError::InvalidScope,
            ScoreError::StorageFailure("disk full".into()),
        ];
        for err in all {
            assert!(err
                .code()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn storage_detail_only_in_display() {
        let err = ScoreError::StorageFailure("database is locked".into());
        assert_eq!(err.public_message(), "Storage error");
        assert!(err.to_string().contains("database is locked"));
    }
}
