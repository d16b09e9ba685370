//! Collaborator interfaces
//!
//! Implement these traits to connect the path to a metadata service and a
//! record store. Transport, retries and timeouts belong to implementations.

use crate::field_ref::FieldReference;
use crate::notify::SourceError;
use crate::types::{ObjectInfo, RecordId, RecordSnapshot, RecordUpdate, StageOption, SubTypeId};

/// Read-only entity metadata
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Entity metadata, including its default sub-type
    async fn object_info(&self, entity: &str) -> Result<ObjectInfo, SourceError>;

    /// Ordered valid values of `field` within `sub_type`
    async fn stage_options(
        &self,
        sub_type: &SubTypeId,
        field: &FieldReference,
    ) -> Result<Vec<StageOption>, SourceError>;
}

/// Record reads and partial updates
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Current values of `fields` plus the record's sub-type
    async fn fetch_record(
        &self,
        record_id: &RecordId,
        fields: &[FieldReference],
    ) -> Result<RecordSnapshot, SourceError>;

    /// Apply a partial update, leaving other fields untouched
    async fn update_record(&self, update: RecordUpdate) -> Result<(), SourceError>;
}
