//! Error types for the stage path engine
//!
//! Provides error handling for:
//! - Host configuration and field reference validation (fatal at setup)
//! - Metadata and record fetch failures (reported, state kept)
//! - Write-back failures (reported to the user, state kept)

/// Main stage path error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Qualified field reference could not be split into entity and field
    #[error("invalid field reference '{raw}': {reason}")]
    InvalidFieldReference {
        /// Raw string supplied by the host
        raw: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Record data does not carry the tracked field
    #[error("field not found in record data: {field}")]
    FieldNotFound {
        /// Bare field name that was looked up
        field: String,
    },

    /// Entity metadata could not be retrieved
    #[error("Failed to retrieve object info. {}", .messages.join(", "))]
    ObjectInfoFailure {
        /// Normalized failure messages
        messages: Vec<String>,
    },

    /// Stage values could not be retrieved
    #[error("Failed to retrieve picklist values. {}", .messages.join(", "))]
    MetadataFetchFailure {
        /// Normalized failure messages
        messages: Vec<String>,
    },

    /// Record data could not be retrieved
    #[error("Failed to retrieve record data. {}", .messages.join(", "))]
    RecordFetchFailure {
        /// Normalized failure messages
        messages: Vec<String>,
    },

    /// Stage change could not be written
    #[error("Error updating record. {}", .messages.join(", "))]
    WriteBackFailure {
        /// Normalized failure messages
        messages: Vec<String>,
    },

    /// Host configuration is unusable
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Session task is gone
    #[error("path session closed")]
    SessionClosed,
}

impl PathError {
    /// Create invalid field reference error
    #[inline]
    pub fn invalid_field_reference(raw: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidFieldReference {
            raw: raw.into(),
            reason,
        }
    }

    /// Check if error aborts component setup
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidFieldReference { .. } | Self::ConfigError(_)
        )
    }

    /// Normalized messages carried by data and write failures
    #[must_use]
    pub fn messages(&self) -> &[String] {
        match self {
            Self::ObjectInfoFailure { messages }
            | Self::MetadataFetchFailure { messages }
            | Self::RecordFetchFailure { messages }
            | Self::WriteBackFailure { messages } => messages,
            _ => &[],
        }
    }

    /// Title used when the error is shown to the user
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::InvalidFieldReference { .. } | Self::ConfigError(_) => "Invalid configuration",
            Self::FieldNotFound { .. } | Self::RecordFetchFailure { .. } => {
                "Failed to retrieve record data"
            }
            Self::ObjectInfoFailure { .. } => "Failed to retrieve object info",
            Self::MetadataFetchFailure { .. } => "Failed to retrieve picklist values",
            Self::WriteBackFailure { .. } => "Error updating record",
            Self::SessionClosed => "Path unavailable",
        }
    }
}

/// Result type alias for stage path operations
pub type PathResult<T> = Result<T, PathError>;
