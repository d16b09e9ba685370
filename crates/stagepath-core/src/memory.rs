//! In-memory metadata source and record store
//!
//! Backs the CLI and tests. Seeded directly or from a JSON [`BackendFixture`];
//! failures can be queued per operation to exercise error paths.

use crate::field_ref::FieldReference;
use crate::notify::SourceError;
use crate::source::{MetadataSource, RecordStore};
use crate::types::{
    FieldValue, ObjectInfo, RecordId, RecordSnapshot, RecordUpdate, StageOption, SubTypeId,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Backend operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `MetadataSource::object_info`
    ObjectInfo,
    /// `MetadataSource::stage_options`
    StageOptions,
    /// `RecordStore::fetch_record`
    FetchRecord,
    /// `RecordStore::update_record`
    UpdateRecord,
}

/// Stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    /// Record ID
    pub id: RecordId,
    /// Entity name
    pub entity: String,
    /// Record's own sub-type
    #[serde(default)]
    pub sub_type: Option<SubTypeId>,
    /// Field values by bare name
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
}

/// Stage values of one field in one sub-type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistFixture {
    /// Sub-type scope
    pub sub_type: SubTypeId,
    /// Qualified field
    pub field: FieldReference,
    /// Ordered values
    pub values: Vec<StageOption>,
}

/// Serialized backend contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFixture {
    /// Entity metadata
    #[serde(default)]
    pub objects: Vec<ObjectInfo>,
    /// Stage values
    #[serde(default)]
    pub picklists: Vec<PicklistFixture>,
    /// Records
    #[serde(default)]
    pub records: Vec<StoredRecord>,
}

/// In-memory implementation of both collaborators
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    objects: DashMap<String, ObjectInfo>,
    picklists: DashMap<(SubTypeId, FieldReference), Vec<StageOption>>,
    records: DashMap<RecordId, StoredRecord>,
    failures: Mutex<HashMap<Operation, VecDeque<SourceError>>>,
    updates: Mutex<Vec<RecordUpdate>>,
}

impl InMemoryBackend {
    /// Create empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create backend seeded from a fixture
    #[must_use]
    pub fn from_fixture(fixture: BackendFixture) -> Self {
        let backend = Self::new();
        for object in fixture.objects {
            backend.insert_object(object);
        }
        for picklist in fixture.picklists {
            backend.insert_options(picklist.sub_type, picklist.field, picklist.values);
        }
        for record in fixture.records {
            backend.insert_record(record);
        }
        backend
    }

    /// Register entity metadata
    pub fn insert_object(&self, info: ObjectInfo) {
        self.objects.insert(info.api_name.clone(), info);
    }

    /// Register stage values for a field within a sub-type
    pub fn insert_options(&self, sub_type: SubTypeId, field: FieldReference, values: Vec<StageOption>) {
        self.picklists.insert((sub_type, field), values);
    }

    /// Insert or replace a record
    pub fn insert_record(&self, record: StoredRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Change a record's sub-type
    pub fn set_sub_type(&self, record_id: &RecordId, sub_type: Option<SubTypeId>) {
        if let Some(mut record) = self.records.get_mut(record_id) {
            record.sub_type = sub_type;
        }
    }

    /// Queue a failure for the next call of `operation`
    pub fn fail_next(&self, operation: Operation, error: SourceError) {
        self.failures
            .lock()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Stored value of a record field
    #[must_use]
    pub fn field_value(&self, record_id: &RecordId, field: &str) -> Option<String> {
        self.records
            .get(record_id)
            .and_then(|r| r.fields.get(field).cloned().flatten())
    }

    /// Updates applied so far, in order
    #[must_use]
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().clone()
    }

    fn take_failure(&self, operation: Operation) -> Result<(), SourceError> {
        match self
            .failures
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn resolved_sub_type(&self, record: &StoredRecord) -> Option<SubTypeId> {
        record.sub_type.clone().or_else(|| {
            self.objects
                .get(&record.entity)
                .map(|o| o.default_sub_type.clone())
        })
    }
}

#[async_trait::async_trait]
impl MetadataSource for InMemoryBackend {
    async fn object_info(&self, entity: &str) -> Result<ObjectInfo, SourceError> {
        self.take_failure(Operation::ObjectInfo)?;
        self.objects
            .get(entity)
            .map(|o| o.value().clone())
            .ok_or_else(|| SourceError::read([format!("Object {entity} is not supported")]))
    }

    async fn stage_options(
        &self,
        sub_type: &SubTypeId,
        field: &FieldReference,
    ) -> Result<Vec<StageOption>, SourceError> {
        self.take_failure(Operation::StageOptions)?;
        self.picklists
            .get(&(sub_type.clone(), field.clone()))
            .map(|v| v.value().clone())
            .ok_or_else(|| {
                SourceError::read([format!(
                    "No picklist values for {field} in record type {sub_type}"
                )])
            })
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryBackend {
    async fn fetch_record(
        &self,
        record_id: &RecordId,
        fields: &[FieldReference],
    ) -> Result<RecordSnapshot, SourceError> {
        self.take_failure(Operation::FetchRecord)?;
        let record = self.records.get(record_id).ok_or_else(|| {
            SourceError::read(["The requested resource does not exist".to_string()])
        })?;

        let mut snapshot = RecordSnapshot::new(record.id.clone());
        snapshot.sub_type = record.sub_type.clone();
        for field in fields {
            if !field.belongs_to(&record.entity) {
                return Err(SourceError::read([format!(
                    "Field {field} does not exist on {}",
                    record.entity
                )]));
            }
            if let Some(value) = record.fields.get(field.field()) {
                snapshot.fields.insert(
                    field.field().to_string(),
                    FieldValue {
                        value: value.clone(),
                    },
                );
            }
        }
        Ok(snapshot)
    }

    async fn update_record(&self, update: RecordUpdate) -> Result<(), SourceError> {
        self.take_failure(Operation::UpdateRecord)?;

        let sub_type = {
            let record = self
                .records
                .get(&update.record_id)
                .ok_or_else(|| SourceError::body("entity is deleted"))?;
            self.resolved_sub_type(&record)
        };

        let mut record = self
            .records
            .get_mut(&update.record_id)
            .ok_or_else(|| SourceError::body("entity is deleted"))?;

        for (name, value) in &update.fields {
            if !record.fields.contains_key(name) {
                return Err(SourceError::body(format!("No such column '{name}' on entity")));
            }
            let field = FieldReference::new(record.entity.clone(), name.clone())
                .map_err(|e| SourceError::body(e.to_string()))?;
            if let Some(sub_type) = &sub_type {
                if let Some(options) = self.picklists.get(&(sub_type.clone(), field)) {
                    if !options.iter().any(|o| &o.value == value) {
                        return Err(SourceError::body(format!(
                            "bad value for restricted picklist field: {value}"
                        )));
                    }
                }
            }
        }

        for (name, value) in &update.fields {
            record.fields.insert(name.clone(), Some(value.clone()));
        }
        drop(record);

        self.updates.lock().push(update);
        Ok(())
    }
}
