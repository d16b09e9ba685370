//! Host configuration
//!
//! The host supplies the record, its entity and the qualified stage field
//! once, before any subscription starts. [`PathConfig::bind`] validates them.

use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// Host parameters for one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PathConfig {
    /// Record shown by the path
    pub record_id: String,
    /// Entity of the record
    pub object_api_name: String,
    /// Stage field, `Entity.Field`
    pub qualified_field_name: String,
    /// Capacity of the session event queue
    pub event_buffer: usize,
}

impl PathConfig {
    /// Create configuration
    #[inline]
    #[must_use]
    pub fn new(
        record_id: impl Into<String>,
        object_api_name: impl Into<String>,
        qualified_field_name: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            object_api_name: object_api_name.into(),
            qualified_field_name: qualified_field_name.into(),
            ..Self::default()
        }
    }

    /// With record ID
    #[inline]
    #[must_use]
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = record_id.into();
        self
    }

    /// With entity name
    #[inline]
    #[must_use]
    pub fn with_object_api_name(mut self, object_api_name: impl Into<String>) -> Self {
        self.object_api_name = object_api_name.into();
        self
    }

    /// With qualified stage field
    #[inline]
    #[must_use]
    pub fn with_field(mut self, qualified_field_name: impl Into<String>) -> Self {
        self.qualified_field_name = qualified_field_name.into();
        self
    }

    /// With event queue capacity
    #[inline]
    #[must_use]
    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// `PathError::ConfigError` on malformed input
    pub fn from_toml(input: &str) -> Result<Self, PathError> {
        toml::from_str(input).map_err(|e| PathError::ConfigError(e.to_string()))
    }

    /// Validate parameters
    ///
    /// # Errors
    /// - `PathError::InvalidFieldReference` for an unqualified stage field
    /// - `PathError::ConfigError` for a missing record, entity or zero buffer
    pub fn bind(&self) -> Result<BoundPath, PathError> {
        let field = FieldReference::parse(&self.qualified_field_name)?;
        if self.record_id.is_empty() {
            return Err(PathError::ConfigError("record_id is required".to_string()));
        }
        if self.object_api_name.is_empty() {
            return Err(PathError::ConfigError(
                "object_api_name is required".to_string(),
            ));
        }
        if self.event_buffer == 0 {
            return Err(PathError::ConfigError(
                "event_buffer must be positive".to_string(),
            ));
        }
        if !field.belongs_to(&self.object_api_name) {
            tracing::warn!(
                entity = %self.object_api_name,
                %field,
                "stage field belongs to a different entity"
            );
        }
        Ok(BoundPath {
            record_id: RecordId::new(self.record_id.clone()),
            entity: self.object_api_name.clone(),
            field,
            event_buffer: self.event_buffer,
        })
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            record_id: String::new(),
            object_api_name: String::new(),
            qualified_field_name: String::new(),
            event_buffer: 64,
        }
    }
}

/// Validated host parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundPath {
    /// Record shown by the path
    pub record_id: RecordId,
    /// Entity of the record
    pub entity: String,
    /// Stage field
    pub field: FieldReference,
    /// Capacity of the session event queue
    pub event_buffer: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_parses_field() {
        let bound = PathConfig::new("001A", "Account", "Account.Rating")
            .bind()
            .unwrap();
        assert_eq!(bound.field.field(), "Rating");
        assert_eq!(bound.record_id, RecordId::new("001A"));
        assert_eq!(bound.event_buffer, 64);
    }

    #[test]
    fn bind_fails_fast_on_unqualified_field() {
        let err = PathConfig::new("001A", "Account", "Rating").bind().unwrap_err();
        assert!(matches!(err, PathError::InvalidFieldReference { .. }));
    }

    #[test]
    fn bind_rejects_nested_field_path() {
        let err = PathConfig::new("001A", "Account", "Account.Custom.Stage")
            .bind()
            .unwrap_err();
        assert_eq!(
            err,
            PathError::invalid_field_reference("Account.Custom.Stage", "more than one '.' separator")
        );
    }

    #[test]
    fn bind_requires_record_and_entity() {
        assert!(matches!(
            PathConfig::new("", "Account", "Account.Rating").bind(),
            Err(PathError::ConfigError(_))
        ));
        assert!(matches!(
            PathConfig::new("001A", "", "Account.Rating").bind(),
            Err(PathError::ConfigError(_))
        ));
        assert!(PathConfig::new("001A", "Account", "Account.Rating")
            .with_event_buffer(0)
            .bind()
            .is_err());
    }

    #[test]
    fn from_toml_uses_defaults() {
        let config = PathConfig::from_toml(
            r#"
            record_id = "006A"
            object_api_name = "Opportunity"
            qualified_field_name = "Opportunity.StageName"
            "#,
        )
        .unwrap();
        assert_eq!(config.event_buffer, 64);
        assert_eq!(config.qualified_field_name, "Opportunity.StageName");

        assert!(PathConfig::from_toml("record_id = 5").is_err());
    }
}
