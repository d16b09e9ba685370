//! Event-driven path session
//!
//! One tokio task owns the [`PathState`] and consumes [`PathEvent`]s in
//! arrival order, so no two updates interleave. Fetches and writes run as
//! separate tasks and send their results back as events. Every processed
//! input republishes the view on a `watch` channel.
//!
//! - Object info and record data are fetched on start
//! - Stage values are fetched whenever the resolved sub-type changes
//! - A successful write triggers a record refresh, which is the only way
//!   the current value changes
//! - Late responses are applied as they arrive

use crate::config::{BoundPath, PathConfig};
use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::notify::{Notification, NotificationSink, Severity, SourceError};
use crate::source::{MetadataSource, RecordStore};
use crate::state::PathState;
use crate::types::{ObjectInfo, PathView, RecordId, RecordSnapshot, StageOption, SubTypeId};
use crate::writeback::{WriteBackCoordinator, WriteOutcome};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Input processed by a session
#[derive(Debug)]
pub enum PathEvent {
    /// Entity metadata arrived
    ObjectInfo(Result<ObjectInfo, SourceError>),
    /// Stage values arrived for a sub-type
    ValueSet {
        /// Sub-type the values were fetched for
        sub_type: SubTypeId,
        /// Fetch outcome
        result: Result<Vec<StageOption>, SourceError>,
    },
    /// Record data arrived
    RecordData(Result<RecordSnapshot, SourceError>),
    /// Re-fetch record data
    Refresh,
    /// User clicked the step holding this value
    Click {
        /// Requested stage value
        value: String,
        /// Receives the write outcome, if the caller waits for it
        reply: Option<oneshot::Sender<WriteOutcome>>,
    },
    /// A write finished
    WriteFinished(WriteOutcome),
    /// Stop the session
    Shutdown,
}

/// Handle for driving and observing a session
#[derive(Debug, Clone)]
pub struct PathHandle {
    record_id: RecordId,
    field: FieldReference,
    sender: mpsc::Sender<PathEvent>,
    view: watch::Receiver<PathView>,
}

impl PathHandle {
    /// Click the step holding `value`
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session has stopped
    pub async fn click(&self, value: impl Into<String>) -> Result<(), PathError> {
        self.send(PathEvent::Click {
            value: value.into(),
            reply: None,
        })
        .await
    }

    /// Click the step holding `value` and wait for the write outcome
    ///
    /// Resolves once the record store answered, before the refreshed record
    /// data reaches the view. Clicking the current value yields
    /// [`WriteOutcome::Skipped`] without a write.
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session stops first
    pub async fn submit(&self, value: impl Into<String>) -> Result<WriteOutcome, PathError> {
        let (reply, outcome) = oneshot::channel();
        self.send(PathEvent::Click {
            value: value.into(),
            reply: Some(reply),
        })
        .await?;
        outcome.await.map_err(|_| PathError::SessionClosed)
    }

    /// Push record data received outside the session, e.g. a change
    /// notification from the record store
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session has stopped
    pub async fn push_record(
        &self,
        result: Result<RecordSnapshot, SourceError>,
    ) -> Result<(), PathError> {
        self.send(PathEvent::RecordData(result)).await
    }

    /// Push stage values received outside the session
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session has stopped
    pub async fn push_value_set(
        &self,
        sub_type: SubTypeId,
        result: Result<Vec<StageOption>, SourceError>,
    ) -> Result<(), PathError> {
        self.send(PathEvent::ValueSet { sub_type, result }).await
    }

    /// Re-fetch record data
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session has stopped
    pub async fn refresh(&self) -> Result<(), PathError> {
        self.send(PathEvent::Refresh).await
    }

    /// Stop the session
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session has already stopped
    pub async fn shutdown(&self) -> Result<(), PathError> {
        self.send(PathEvent::Shutdown).await
    }

    /// Latest published view
    #[must_use]
    pub fn view(&self) -> PathView {
        self.view.borrow().clone()
    }

    /// Receiver notified on every published view
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PathView> {
        self.view.clone()
    }

    /// Wait until the published view satisfies `predicate`
    ///
    /// # Errors
    /// `PathError::SessionClosed` if the session stops first
    pub async fn wait_for<F>(&self, predicate: F) -> Result<PathView, PathError>
    where
        F: FnMut(&PathView) -> bool,
    {
        let mut view = self.view.clone();
        let matched = view
            .wait_for(predicate)
            .await
            .map_err(|_| PathError::SessionClosed)?;
        Ok(PathView::clone(&matched))
    }

    /// Record shown by the session
    #[inline]
    #[must_use]
    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// Stage field
    #[inline]
    #[must_use]
    pub fn field(&self) -> &FieldReference {
        &self.field
    }

    async fn send(&self, event: PathEvent) -> Result<(), PathError> {
        self.sender
            .send(event)
            .await
            .map_err(|_| PathError::SessionClosed)
    }
}

/// Session factory
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSession;

impl PathSession {
    /// Validate `config` and start a session on the current tokio runtime
    ///
    /// The field reference is checked before any fetch is issued.
    ///
    /// # Errors
    /// Setup errors from [`PathConfig::bind`]
    pub fn spawn(
        config: &PathConfig,
        metadata: Arc<dyn MetadataSource>,
        records: Arc<dyn RecordStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<PathHandle, PathError> {
        let bound = config.bind()?;
        let (sender, receiver) = mpsc::channel(bound.event_buffer);
        let (publisher, view) = watch::channel(PathView::default());

        let handle = PathHandle {
            record_id: bound.record_id.clone(),
            field: bound.field.clone(),
            sender: sender.clone(),
            view,
        };

        let task = SessionTask {
            state: PathState::new(bound.field.clone()),
            writer: WriteBackCoordinator::new(
                bound.record_id.clone(),
                bound.field.clone(),
                Arc::clone(&records),
                Arc::clone(&sink),
            ),
            bound,
            metadata,
            records,
            sink,
            events: sender.downgrade(),
            publisher,
        };

        tracing::info!(
            record = %handle.record_id,
            field = %handle.field,
            "starting path session"
        );
        tokio::spawn(task.run(receiver));

        Ok(handle)
    }
}

/// Session actor
struct SessionTask {
    bound: BoundPath,
    state: PathState,
    metadata: Arc<dyn MetadataSource>,
    records: Arc<dyn RecordStore>,
    sink: Arc<dyn NotificationSink>,
    writer: WriteBackCoordinator,
    events: mpsc::WeakSender<PathEvent>,
    publisher: watch::Sender<PathView>,
}

impl SessionTask {
    async fn run(mut self, mut receiver: mpsc::Receiver<PathEvent>) {
        self.fetch_object_info();
        self.fetch_record();

        while let Some(event) = receiver.recv().await {
            if matches!(event, PathEvent::Shutdown) {
                break;
            }
            self.handle(event);
            self.publish();
        }

        tracing::debug!(record = %self.bound.record_id, "path session stopped");
    }

    fn handle(&mut self, event: PathEvent) {
        match event {
            PathEvent::ObjectInfo(result) => {
                let outcome = self.state.apply_object_info(result);
                self.follow_sub_type(outcome);
            }
            PathEvent::ValueSet { sub_type, result } => {
                if let Err(err) = self.state.apply_value_set(sub_type, result) {
                    self.report(&err);
                }
            }
            PathEvent::RecordData(result) => {
                let outcome = self.state.apply_record(result);
                self.follow_sub_type(outcome);
            }
            PathEvent::Refresh => self.fetch_record(),
            PathEvent::Click { value, reply } => self.click(value, reply),
            PathEvent::WriteFinished(outcome) => {
                if outcome.is_applied() {
                    self.fetch_record();
                }
            }
            PathEvent::Shutdown => {}
        }
    }

    fn follow_sub_type(&self, outcome: Result<Option<SubTypeId>, PathError>) {
        match outcome {
            Ok(Some(sub_type)) => self.fetch_value_set(sub_type),
            Ok(None) => {}
            Err(err) => self.report(&err),
        }
    }

    fn click(&self, value: String, reply: Option<oneshot::Sender<WriteOutcome>>) {
        let Some(update) = self.writer.plan(self.state.current_value(), &value) else {
            tracing::debug!(%value, "clicked current stage, ignoring");
            if let Some(reply) = reply {
                let _ = reply.send(WriteOutcome::Skipped);
            }
            return;
        };
        let writer = self.writer.clone();
        self.spawn_io(async move {
            let outcome = writer.apply(update).await;
            if let Some(reply) = reply {
                let _ = reply.send(outcome.clone());
            }
            PathEvent::WriteFinished(outcome)
        });
    }

    fn fetch_object_info(&self) {
        let metadata = Arc::clone(&self.metadata);
        let entity = self.bound.entity.clone();
        tracing::debug!(%entity, "fetching object info");
        self.spawn_io(async move { PathEvent::ObjectInfo(metadata.object_info(&entity).await) });
    }

    fn fetch_value_set(&self, sub_type: SubTypeId) {
        let metadata = Arc::clone(&self.metadata);
        let field = self.bound.field.clone();
        tracing::debug!(%sub_type, %field, "fetching stage values");
        self.spawn_io(async move {
            let result = metadata.stage_options(&sub_type, &field).await;
            PathEvent::ValueSet { sub_type, result }
        });
    }

    fn fetch_record(&self) {
        let records = Arc::clone(&self.records);
        let record_id = self.bound.record_id.clone();
        let field = self.bound.field.clone();
        tracing::debug!(record = %record_id, "fetching record data");
        self.spawn_io(async move {
            PathEvent::RecordData(
                records
                    .fetch_record(&record_id, std::slice::from_ref(&field))
                    .await,
            )
        });
    }

    /// Run `work` off the session task and feed its event back
    fn spawn_io<F>(&self, work: F)
    where
        F: Future<Output = PathEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = work.await;
            if let Some(sender) = events.upgrade() {
                let _ = sender.send(event).await;
            }
        });
    }

    fn report(&self, err: &PathError) {
        self.sink
            .notify(Notification::new(err.title(), err.to_string(), Severity::Error));
    }

    fn publish(&self) {
        let next = self.state.view();
        self.publisher.send_if_modified(|current| {
            if current == next {
                false
            } else {
                current.clone_from(next);
                true
            }
        });
    }
}
