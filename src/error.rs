//! Error types for the curtain skill

use thiserror::Error;

/// Result type alias for skill operations
pub type Result<T> = std::result::Result<T, SkillError>;

/// Error types for curtain skill operations
#[derive(Error, Debug)]
pub enum SkillError {
    /// Device registry cache could not be refreshed within the staleness ceiling
    #[error("Device cache unavailable: {0}")]
    CacheUnavailable(String),

    /// Multiple equally-ranked devices matched a singular-target intent
    #[error("Ambiguous target: {0}")]
    AmbiguousTarget(String),

    /// No device matched any of the intent's mentions
    #[error("No target found: {0}")]
    NoTargetFound(String),

    /// SET_POSITION outside the 0-100 range
    #[error("Invalid position {0}: must be between 0 and 100")]
    InvalidPosition(i64),

    /// Device driver reported a command failure
    #[error("Device command failed: {0}")]
    DeviceCommandFailed(String),

    /// Durable store errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found errors (devices, rooms)
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl SkillError {
    /// Create a cache unavailable error
    pub fn cache_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::CacheUnavailable(msg.into())
    }

    /// Create an ambiguous target error
    pub fn ambiguous_target<S: Into<String>>(msg: S) -> Self {
        Self::AmbiguousTarget(msg.into())
    }

    /// Create a no target found error
    pub fn no_target_found<S: Into<String>>(msg: S) -> Self {
        Self::NoTargetFound(msg.into())
    }

    /// Create a device command failure error
    pub fn device_command_failed<S: Into<String>>(msg: S) -> Self {
        Self::DeviceCommandFailed(msg.into())
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SkillError::CacheUnavailable(_)
                | SkillError::Storage(_)
                | SkillError::DeviceCommandFailed(_)
                | SkillError::Io(_)
        )
    }

    /// Check if error maps to a user-facing clarification or validation reply
    /// rather than a generic failure
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SkillError::AmbiguousTarget(_)
                | SkillError::NoTargetFound(_)
                | SkillError::InvalidPosition(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifiers() {
        let cache_err = SkillError::cache_unavailable("store down");
        assert!(cache_err.is_retryable());
        assert!(!cache_err.is_user_facing());

        let ambiguous = SkillError::ambiguous_target("two candidates");
        assert!(!ambiguous.is_retryable());
        assert!(ambiguous.is_user_facing());

        let position = SkillError::InvalidPosition(150);
        assert!(!position.is_retryable());
        assert!(position.is_user_facing());
    }

    #[test]
    fn display_includes_context() {
        let err = SkillError::device_command_failed("driver timeout");
        let text = format!("{err}");
        assert!(text.contains("Device command failed"));
        assert!(text.contains("driver timeout"));

        let err = SkillError::InvalidPosition(150);
        assert!(format!("{err}").contains("150"));
    }
}
