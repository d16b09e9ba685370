//! Current value tracking
//!
//! Tracks the record's stage value and the sub-type that scopes its valid
//! values. The sub-type is the record's own when it carries one, otherwise
//! the entity default learned from object metadata.

use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::notify::{normalize_one, SourceError};
use crate::types::{ObjectInfo, RecordSnapshot, RecordStageState, SubTypeId};

/// Tracker for the record side of the path
#[derive(Debug, Clone, Default)]
pub struct CurrentValueTracker {
    default_sub_type: Option<SubTypeId>,
    record_sub_type: Option<SubTypeId>,
    state: RecordStageState,
    record_seen: bool,
}

impl CurrentValueTracker {
    /// Create empty tracker
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply entity metadata
    ///
    /// Returns the newly resolved sub-type when the resolution changed.
    ///
    /// # Errors
    /// `PathError::ObjectInfoFailure` when the fetch failed
    pub fn on_object_info_received(
        &mut self,
        result: Result<ObjectInfo, SourceError>,
    ) -> Result<Option<SubTypeId>, PathError> {
        match result {
            Ok(info) => {
                tracing::debug!(
                    entity = %info.api_name,
                    default_sub_type = %info.default_sub_type,
                    "object info received"
                );
                self.default_sub_type = Some(info.default_sub_type);
                Ok(self.resolve())
            }
            Err(error) => {
                let err = PathError::ObjectInfoFailure {
                    messages: normalize_one(&error),
                };
                tracing::warn!(?error, "{err}");
                Err(err)
            }
        }
    }

    /// Apply record data
    ///
    /// Returns the newly resolved sub-type when the resolution changed.
    ///
    /// # Errors
    /// - `PathError::RecordFetchFailure` when the fetch failed
    /// - `PathError::FieldNotFound` when the record lacks the tracked field
    ///
    /// State is unchanged on error.
    pub fn on_record_data_received(
        &mut self,
        field: &FieldReference,
        result: Result<RecordSnapshot, SourceError>,
    ) -> Result<Option<SubTypeId>, PathError> {
        let record = match result {
            Ok(record) => record,
            Err(error) => {
                let err = PathError::RecordFetchFailure {
                    messages: normalize_one(&error),
                };
                tracing::warn!(%field, ?error, "{err}");
                return Err(err);
            }
        };

        let Some(value) = record.field(field.field()) else {
            tracing::warn!(record = %record.id, %field, "record data lacks tracked field");
            return Err(PathError::FieldNotFound {
                field: field.field().to_string(),
            });
        };

        self.state.current_value = value.value.clone();
        self.record_sub_type = record.sub_type;
        self.record_seen = true;
        tracing::debug!(
            record = %record.id,
            current = ?self.state.current_value,
            "record data received"
        );
        Ok(self.resolve())
    }

    /// Recompute the resolved sub-type, reporting a change
    fn resolve(&mut self) -> Option<SubTypeId> {
        if !self.record_seen {
            return None;
        }
        let resolved = self
            .record_sub_type
            .clone()
            .or_else(|| self.default_sub_type.clone());
        if resolved == self.state.sub_type_id {
            return None;
        }
        self.state.sub_type_id.clone_from(&resolved);
        resolved
    }

    /// Current stage value
    #[inline]
    #[must_use]
    pub fn current_value(&self) -> Option<&str> {
        self.state.current_value.as_deref()
    }

    /// Resolved sub-type
    #[inline]
    #[must_use]
    pub fn sub_type_id(&self) -> Option<&SubTypeId> {
        self.state.sub_type_id.as_ref()
    }

    /// Entity default sub-type, once known
    #[inline]
    #[must_use]
    pub fn default_sub_type(&self) -> Option<&SubTypeId> {
        self.default_sub_type.as_ref()
    }
}
