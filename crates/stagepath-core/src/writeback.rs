//! Stage change write-back
//!
//! Turns a click on a step into a single-field update and reports the
//! outcome. Local state is never changed here; the refreshed record data
//! that follows a successful write is the only source of the new value.

use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::notify::{normalize_one, Notification, NotificationSink};
use crate::source::RecordStore;
use crate::types::{RecordId, RecordUpdate};
use std::sync::Arc;

/// Outcome of a stage change request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Requested value is already current, nothing written
    Skipped,
    /// Update accepted by the record store
    Applied,
    /// Update rejected
    Failed {
        /// Normalized failure messages
        messages: Vec<String>,
    },
}

impl WriteOutcome {
    /// Whether a write reached the store successfully
    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Issues stage updates for one record
#[derive(Clone)]
pub struct WriteBackCoordinator {
    record_id: RecordId,
    field: FieldReference,
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for WriteBackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBackCoordinator")
            .field("record_id", &self.record_id)
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

impl WriteBackCoordinator {
    /// Create coordinator
    #[must_use]
    pub fn new(
        record_id: RecordId,
        field: FieldReference,
        store: Arc<dyn RecordStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            record_id,
            field,
            store,
            sink,
        }
    }

    /// Build the update for a requested value
    ///
    /// `None` when the value is already the tracked one.
    #[must_use]
    pub fn plan(&self, tracked: Option<&str>, requested: &str) -> Option<RecordUpdate> {
        if tracked == Some(requested) {
            return None;
        }
        Some(RecordUpdate::single(
            self.record_id.clone(),
            self.field.field(),
            requested,
        ))
    }

    /// Request a stage change and report the outcome
    ///
    /// Each call issues its own write; repeated clicks are not merged.
    pub async fn submit_stage_change(&self, tracked: Option<&str>, requested: &str) -> WriteOutcome {
        let Some(update) = self.plan(tracked, requested) else {
            tracing::debug!(value = requested, "clicked current stage, ignoring");
            return WriteOutcome::Skipped;
        };
        self.apply(update).await
    }

    /// Send a planned update to the store and report the outcome
    pub async fn apply(&self, update: RecordUpdate) -> WriteOutcome {
        tracing::info!(record = %self.record_id, field = %self.field, fields = ?update.fields, "updating record");

        match self.store.update_record(update).await {
            Ok(()) => {
                self.sink.notify(Notification::record_updated());
                WriteOutcome::Applied
            }
            Err(error) => {
                let err = PathError::WriteBackFailure {
                    messages: normalize_one(&error),
                };
                tracing::error!(record = %self.record_id, ?error, "{err}");
                self.sink.notify(Notification::update_failed(err.messages()));
                WriteOutcome::Failed {
                    messages: err.messages().to_vec(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Severity, SourceError};
    use crate::source::MockRecordStore;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<Notification>>);

    impl NotificationSink for Collect {
        fn notify(&self, notification: Notification) {
            self.0.lock().push(notification);
        }
    }

    fn coordinator(store: MockRecordStore, sink: Arc<Collect>) -> WriteBackCoordinator {
        WriteBackCoordinator::new(
            RecordId::new("001A"),
            FieldReference::parse("Account.Rating").unwrap(),
            Arc::new(store),
            sink,
        )
    }

    #[tokio::test]
    async fn same_value_issues_no_write() {
        let mut store = MockRecordStore::new();
        store.expect_update_record().never();
        let sink = Arc::new(Collect::default());

        let outcome = coordinator(store, sink.clone())
            .submit_stage_change(Some("Hot"), "Hot")
            .await;

        assert_eq!(outcome, WriteOutcome::Skipped);
        assert!(sink.0.lock().is_empty());
    }

    #[tokio::test]
    async fn new_value_writes_exactly_one_field() {
        let mut store = MockRecordStore::new();
        store
            .expect_update_record()
            .withf(|u| {
                u.record_id == RecordId::new("001A")
                    && u.fields.len() == 1
                    && u.fields.get("Rating").map(String::as_str) == Some("Warm")
            })
            .times(1)
            .returning(|_| Ok(()));
        let sink = Arc::new(Collect::default());

        let outcome = coordinator(store, sink.clone())
            .submit_stage_change(Some("Hot"), "Warm")
            .await;

        assert!(outcome.is_applied());
        let notes = sink.0.lock();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0], Notification::record_updated());
    }

    #[tokio::test]
    async fn absent_current_value_still_writes() {
        let mut store = MockRecordStore::new();
        store.expect_update_record().times(1).returning(|_| Ok(()));
        let sink = Arc::new(Collect::default());

        let outcome = coordinator(store, sink)
            .submit_stage_change(None, "Cold")
            .await;
        assert_eq!(outcome, WriteOutcome::Applied);
    }

    #[tokio::test]
    async fn failure_reports_normalized_message() {
        let mut store = MockRecordStore::new();
        store.expect_update_record().times(1).returning(|_| {
            Err(SourceError::read([
                "insufficient access rights on object id",
                "",
            ]))
        });
        let sink = Arc::new(Collect::default());

        let outcome = coordinator(store, sink.clone())
            .submit_stage_change(Some("Hot"), "Cold")
            .await;

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                messages: vec!["insufficient access rights on object id".to_string()]
            }
        );
        let notes = sink.0.lock();
        assert_eq!(notes[0].title, "Error updating record");
        assert_eq!(notes[0].message, "insufficient access rights on object id");
        assert_eq!(notes[0].severity, Severity::Error);
    }

    #[tokio::test]
    async fn repeated_clicks_are_not_merged() {
        let mut store = MockRecordStore::new();
        store.expect_update_record().times(2).returning(|_| Ok(()));
        let sink = Arc::new(Collect::default());
        let writer = coordinator(store, sink.clone());

        writer.submit_stage_change(Some("Hot"), "Cold").await;
        writer.submit_stage_change(Some("Hot"), "Cold").await;
        assert_eq!(sink.0.lock().len(), 2);
    }
}
