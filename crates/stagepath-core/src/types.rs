//! Core types for the stage path
//!
//! Defines:
//! - Record and sub-type identifiers
//! - Stage options and record snapshots received from collaborators
//! - Updates sent back to the record store
//! - Derived path steps and the published view

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create record ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sub-type ("record type") identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubTypeId(pub String);

impl SubTypeId {
    /// Create sub-type ID
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for SubTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One valid value of the stage field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageOption {
    /// Stored value
    pub value: String,
    /// Display label
    pub label: String,
}

impl StageOption {
    /// Create stage option
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Option whose label equals its value
    #[inline]
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// Entity metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Entity name
    pub api_name: String,
    /// Sub-type used by records that carry none
    pub default_sub_type: SubTypeId,
}

/// Value of one record field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    /// Raw value, absent when the field is null
    #[serde(default)]
    pub value: Option<String>,
}

impl FieldValue {
    /// Field holding a value
    #[inline]
    #[must_use]
    pub fn of(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    /// Null field
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::default()
    }
}

/// Record data delivered by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    /// Record ID
    pub id: RecordId,
    /// Record's own sub-type, if it has one
    #[serde(default)]
    pub sub_type: Option<SubTypeId>,
    /// Requested fields keyed by bare field name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl RecordSnapshot {
    /// Create snapshot with no fields
    #[inline]
    #[must_use]
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            sub_type: None,
            fields: BTreeMap::new(),
        }
    }

    /// With sub-type
    #[inline]
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: SubTypeId) -> Self {
        self.sub_type = Some(sub_type);
        self
    }

    /// With field value
    #[inline]
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Look up a field by bare name
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Partial update of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordUpdate {
    /// Target record
    pub record_id: RecordId,
    /// Fields to change, keyed by bare field name
    pub fields: BTreeMap<String, String>,
}

impl RecordUpdate {
    /// Update of a single field
    #[must_use]
    pub fn single(record_id: RecordId, field: impl Into<String>, value: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(field.into(), value.into());
        Self { record_id, fields }
    }
}

/// Tracked record inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStageState {
    /// Resolved sub-type (record's own, else entity default)
    pub sub_type_id: Option<SubTypeId>,
    /// Current stage value, absent until fetched or when null
    pub current_value: Option<String>,
}

/// One rendered step of the path
///
/// Derived on every reconciliation, never stored across updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStep {
    /// Stage value
    pub value: String,
    /// Display label
    pub label: String,
    /// Step holds the record's current value
    pub is_current: bool,
    /// Step precedes the current one
    pub is_completed: bool,
    /// Style classes for the renderer
    pub style_class: String,
}

/// View published to renderers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathView {
    /// Ordered steps, empty while stage values are unknown
    pub steps: Vec<PathStep>,
    /// Latest fetch diagnostic
    pub error_message: Option<String>,
    /// Current value is set but matches no step
    pub current_unmatched: bool,
    /// Number of reconciliations so far
    pub revision: u64,
}

impl PathView {
    /// Current step, if any
    #[must_use]
    pub fn current(&self) -> Option<&PathStep> {
        self.steps.iter().find(|s| s.is_current)
    }

    /// Steps marked completed
    pub fn completed(&self) -> impl Iterator<Item = &PathStep> {
        self.steps.iter().filter(|s| s.is_completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_update_single_field() {
        let update = RecordUpdate::single(RecordId::new("006A"), "StageName", "Closed Won");
        assert_eq!(update.fields.len(), 1);
        assert_eq!(update.fields["StageName"], "Closed Won");
    }

    #[test]
    fn snapshot_deserializes_null_field() {
        let json = r#"{"id":"001","fields":{"Rating":{"value":null}}}"#;
        let snapshot: RecordSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.sub_type, None);
        assert_eq!(snapshot.field("Rating"), Some(&FieldValue::null()));
        assert!(snapshot.field("Industry").is_none());
    }

    #[test]
    fn stage_option_plain_copies_value() {
        let option = StageOption::plain("Hot");
        assert_eq!(option.label, "Hot");
        assert_eq!(option.value, "Hot");
    }

    #[test]
    fn view_current_step() {
        let view = PathView {
            steps: vec![PathStep {
                value: "New".to_string(),
                label: "New".to_string(),
                is_current: true,
                is_completed: false,
                style_class: String::new(),
            }],
            ..PathView::default()
        };
        assert_eq!(view.current().map(|s| s.value.as_str()), Some("New"));
        assert_eq!(view.completed().count(), 0);
    }
}
