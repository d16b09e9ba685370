//! Testing utilities for the stagepath workspace
//!
//! Shared fixtures, a recording notification sink and session helpers.

#![allow(missing_docs)]

use parking_lot::Mutex;
use stagepath_core::{
    FieldReference, InMemoryBackend, Notification, NotificationSink, ObjectInfo, PathConfig,
    PathError, PathHandle, PathSession, PathView, RecordId, StageOption, StoredRecord, SubTypeId,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const RECORD_ID: &str = "006000000000001AAA";
pub const DEFAULT_SUB_TYPE: &str = "012000000000000AAA";
pub const RENEWAL_SUB_TYPE: &str = "0125g000000RnwAAA";
pub const STAGE_FIELD: &str = "Opportunity.StageName";

/// Upper bound for any single wait in tests
pub const WAIT: Duration = Duration::from_secs(5);

/// Sink that keeps every notification
#[derive(Debug, Default)]
pub struct RecordingSink {
    seen: Mutex<Vec<Notification>>,
    arrived: Notify,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    /// Wait until at least `n` notifications were recorded
    pub async fn wait_for_count(&self, n: usize) -> Vec<Notification> {
        within(async {
            loop {
                let notified = self.arrived.notified();
                if self.count() >= n {
                    return self.notifications();
                }
                notified.await;
            }
        })
        .await
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
        self.arrived.notify_waiters();
    }
}

/// Fail the test if `fut` does not finish within [`WAIT`]
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(WAIT, fut)
        .await
        .expect("timed out waiting in test")
}

pub fn stage_options(values: &[&str]) -> Vec<StageOption> {
    values.iter().map(|v| StageOption::plain(*v)).collect()
}

pub fn stage_field() -> FieldReference {
    FieldReference::parse(STAGE_FIELD).unwrap()
}

pub fn default_stages() -> Vec<StageOption> {
    stage_options(&["Prospecting", "Qualification", "Proposal", "Closed Won"])
}

pub fn renewal_stages() -> Vec<StageOption> {
    stage_options(&["Renewal Open", "Negotiation", "Renewed"])
}

/// Opportunity record without its own sub-type
pub fn opportunity_record(stage: Option<&str>) -> StoredRecord {
    StoredRecord {
        id: RecordId::new(RECORD_ID),
        entity: "Opportunity".to_string(),
        sub_type: None,
        fields: [
            ("StageName".to_string(), stage.map(str::to_string)),
            ("Name".to_string(), Some("Acme renewal".to_string())),
        ]
        .into_iter()
        .collect(),
    }
}

/// Backend with one opportunity at `stage` and two sub-types of stage values
pub fn opportunity_backend(stage: Option<&str>) -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::new();
    backend.insert_object(ObjectInfo {
        api_name: "Opportunity".to_string(),
        default_sub_type: SubTypeId::new(DEFAULT_SUB_TYPE),
    });
    backend.insert_options(SubTypeId::new(DEFAULT_SUB_TYPE), stage_field(), default_stages());
    backend.insert_options(SubTypeId::new(RENEWAL_SUB_TYPE), stage_field(), renewal_stages());
    backend.insert_record(opportunity_record(stage));
    Arc::new(backend)
}

pub fn opportunity_config() -> PathConfig {
    PathConfig::new(RECORD_ID, "Opportunity", STAGE_FIELD)
}

pub fn spawn_path(
    backend: &Arc<InMemoryBackend>,
    sink: &Arc<RecordingSink>,
) -> Result<PathHandle, PathError> {
    PathSession::spawn(
        &opportunity_config(),
        backend.clone(),
        backend.clone(),
        sink.clone(),
    )
}

/// Wait until the view shows steps and a current value, or times out
pub async fn wait_for_current(path: &PathHandle, value: &str) -> PathView {
    within(path.wait_for(|v| v.current().is_some_and(|s| s.value == value)))
        .await
        .expect("session closed")
}

/// Step values of a view in order
pub fn step_values(view: &PathView) -> Vec<&str> {
    view.steps.iter().map(|s| s.value.as_str()).collect()
}
