//! Synchronous path state
//!
//! Composes the value-set cache, the current-value tracker and the
//! reconciler. Every successful input replaces that input wholesale and
//! re-derives the view; failures keep the inputs and only record the
//! diagnostic.
//!
//! Diagnostics are kept per input. A failure stays visible until the same
//! input succeeds, so a good record push never hides a missing value set.

use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::notify::SourceError;
use crate::reconcile::{is_unmatched, reconcile};
use crate::tracker::CurrentValueTracker;
use crate::types::{ObjectInfo, PathView, RecordSnapshot, StageOption, SubTypeId};
use crate::value_set::ValueSetCache;

/// Input a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    ObjectInfo,
    ValueSet,
    Record,
}

/// Inputs and derived view of one path
#[derive(Debug, Clone)]
pub struct PathState {
    field: FieldReference,
    value_set: ValueSetCache,
    tracker: CurrentValueTracker,
    // Oldest first, at most one per input
    diagnostics: Vec<(Input, String)>,
    view: PathView,
}

impl PathState {
    /// Create idle state for a field
    #[must_use]
    pub fn new(field: FieldReference) -> Self {
        Self {
            field,
            value_set: ValueSetCache::new(),
            tracker: CurrentValueTracker::new(),
            diagnostics: Vec::new(),
            view: PathView::default(),
        }
    }

    /// Apply entity metadata
    ///
    /// Returns the sub-type whose stage values must be fetched next, if the
    /// resolution changed.
    ///
    /// # Errors
    /// Propagates the tracker failure after recording it in the view
    pub fn apply_object_info(
        &mut self,
        result: Result<ObjectInfo, SourceError>,
    ) -> Result<Option<SubTypeId>, PathError> {
        let changed = self
            .tracker
            .on_object_info_received(result)
            .inspect_err(|e| self.fail(Input::ObjectInfo, e))?;
        self.clear(Input::ObjectInfo);
        self.note_sub_type(changed.as_ref());
        self.refresh();
        Ok(changed)
    }

    /// Apply stage values fetched for `sub_type`
    ///
    /// Applied even when `sub_type` is no longer the resolved one.
    ///
    /// # Errors
    /// Propagates the cache failure after recording it in the view
    pub fn apply_value_set(
        &mut self,
        sub_type: SubTypeId,
        result: Result<Vec<StageOption>, SourceError>,
    ) -> Result<(), PathError> {
        if self.tracker.sub_type_id().is_some_and(|s| *s != sub_type) {
            tracing::debug!(%sub_type, "applying stage values for superseded sub-type");
        }
        self.value_set
            .on_value_set_received(sub_type, &self.field, result)
            .inspect_err(|e| self.fail(Input::ValueSet, e))?;
        self.clear(Input::ValueSet);
        self.refresh();
        Ok(())
    }

    /// Apply record data
    ///
    /// Returns the sub-type whose stage values must be fetched next, if the
    /// resolution changed.
    ///
    /// # Errors
    /// Propagates the tracker failure after recording it in the view
    pub fn apply_record(
        &mut self,
        result: Result<RecordSnapshot, SourceError>,
    ) -> Result<Option<SubTypeId>, PathError> {
        let changed = self
            .tracker
            .on_record_data_received(&self.field, result)
            .inspect_err(|e| self.fail(Input::Record, e))?;
        self.clear(Input::Record);
        self.note_sub_type(changed.as_ref());
        self.refresh();
        Ok(changed)
    }

    /// Latest derived view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &PathView {
        &self.view
    }

    /// Tracked stage value
    #[inline]
    #[must_use]
    pub fn current_value(&self) -> Option<&str> {
        self.tracker.current_value()
    }

    /// Resolved sub-type
    #[inline]
    #[must_use]
    pub fn sub_type_id(&self) -> Option<&SubTypeId> {
        self.tracker.sub_type_id()
    }

    /// Stage field
    #[inline]
    #[must_use]
    pub fn field(&self) -> &FieldReference {
        &self.field
    }

    /// Cached stage values
    #[inline]
    #[must_use]
    pub fn options(&self) -> Option<&[StageOption]> {
        self.value_set.options()
    }

    fn note_sub_type(&self, changed: Option<&SubTypeId>) {
        if let Some(sub_type) = changed {
            if self.value_set.is_stale_for(sub_type) {
                tracing::debug!(
                    %sub_type,
                    cached = ?self.value_set.scoped_to(),
                    "sub-type changed, showing stale stage values until refetched"
                );
            }
        }
    }

    fn refresh(&mut self) {
        let options = self.value_set.options();
        let current = self.tracker.current_value();
        let current_unmatched = is_unmatched(options, current);
        if current_unmatched {
            tracing::debug!(
                current = ?current,
                "current value matches no stage value, marking all steps completed"
            );
        }
        self.view = PathView {
            steps: reconcile(options, current),
            error_message: self.latest_diagnostic(),
            current_unmatched,
            revision: self.view.revision + 1,
        };
    }

    fn fail(&mut self, input: Input, error: &PathError) {
        self.clear(input);
        self.diagnostics.push((input, error.to_string()));
        self.view.error_message = self.latest_diagnostic();
        self.view.revision += 1;
    }

    fn clear(&mut self, input: Input) {
        self.diagnostics.retain(|(i, _)| *i != input);
    }

    fn latest_diagnostic(&self) -> Option<String> {
        self.diagnostics.last().map(|(_, message)| message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, RecordId};

    fn state() -> PathState {
        PathState::new(FieldReference::parse("Lead.Status").unwrap())
    }

    fn record(value: &str) -> RecordSnapshot {
        RecordSnapshot::new(RecordId::new("00Q1"))
            .with_sub_type(SubTypeId::new("RT1"))
            .with_field("Status", FieldValue::of(value))
    }

    fn options() -> Vec<StageOption> {
        ["New", "Qualified", "Closed"]
            .into_iter()
            .map(StageOption::plain)
            .collect()
    }

    #[test]
    fn record_first_then_values() {
        let mut state = state();
        let fetch = state.apply_record(Ok(record("Qualified"))).unwrap();
        assert_eq!(fetch, Some(SubTypeId::new("RT1")));
        assert!(state.view().steps.is_empty());

        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        let view = state.view();
        assert_eq!(view.steps.len(), 3);
        assert_eq!(view.current().unwrap().value, "Qualified");
        assert_eq!(view.revision, 2);
    }

    #[test]
    fn values_first_then_record() {
        let mut state = state();
        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        assert!(state.view().steps.iter().all(|s| !s.is_completed));

        state.apply_record(Ok(record("Closed"))).unwrap();
        assert_eq!(state.view().completed().count(), 2);
    }

    #[test]
    fn failure_keeps_steps_and_sets_message() {
        let mut state = state();
        state.apply_record(Ok(record("New"))).unwrap();
        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        let before = state.view().steps.clone();

        assert!(state
            .apply_record(Err(SourceError::plain("connection reset")))
            .is_err());
        assert_eq!(state.view().steps, before);
        assert_eq!(
            state.view().error_message.as_deref(),
            Some("Failed to retrieve record data. connection reset")
        );

        // Next good push clears the diagnostic
        state.apply_record(Ok(record("Qualified"))).unwrap();
        assert!(state.view().error_message.is_none());
    }

    #[test]
    fn object_info_failure_survives_record_push() {
        let mut state = state();
        assert!(state
            .apply_object_info(Err(SourceError::status("Forbidden")))
            .is_err());

        // Record without its own sub-type cannot resolve one
        let unscoped = RecordSnapshot::new(RecordId::new("00Q1"))
            .with_field("Status", FieldValue::of("New"));
        assert_eq!(state.apply_record(Ok(unscoped)).unwrap(), None);

        assert!(state.view().steps.is_empty());
        assert_eq!(
            state.view().error_message.as_deref(),
            Some("Failed to retrieve object info. Forbidden")
        );
    }

    #[test]
    fn value_set_failure_survives_record_push() {
        let mut state = state();
        state.apply_record(Ok(record("New"))).unwrap();
        assert!(state
            .apply_value_set(SubTypeId::new("RT1"), Err(SourceError::body("timeout")))
            .is_err());

        state.apply_record(Ok(record("Qualified"))).unwrap();
        assert_eq!(
            state.view().error_message.as_deref(),
            Some("Failed to retrieve picklist values. timeout")
        );

        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        assert!(state.view().error_message.is_none());
        assert_eq!(state.view().current().unwrap().value, "Qualified");
    }

    #[test]
    fn latest_standing_failure_is_shown() {
        let mut state = state();
        let _ = state.apply_object_info(Err(SourceError::status("Forbidden")));
        let _ = state.apply_record(Err(SourceError::plain("connection reset")));
        assert_eq!(
            state.view().error_message.as_deref(),
            Some("Failed to retrieve record data. connection reset")
        );

        state.apply_record(Ok(record("New"))).unwrap();
        assert_eq!(
            state.view().error_message.as_deref(),
            Some("Failed to retrieve object info. Forbidden")
        );
    }

    #[test]
    fn unmatched_value_is_flagged() {
        let mut state = state();
        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        state.apply_record(Ok(record("Recycled"))).unwrap();

        assert!(state.view().current_unmatched);
        assert!(state.view().steps.iter().all(|s| s.is_completed));
    }

    #[test]
    fn reapplying_same_inputs_gives_same_steps() {
        let mut state = state();
        state
            .apply_value_set(SubTypeId::new("RT1"), Ok(options()))
            .unwrap();
        state.apply_record(Ok(record("Qualified"))).unwrap();
        let first = state.view().steps.clone();

        state.apply_record(Ok(record("Qualified"))).unwrap();
        assert_eq!(state.view().steps, first);
    }
}
