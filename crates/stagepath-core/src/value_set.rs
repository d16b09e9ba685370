//! Cache of the valid stage values
//!
//! Holds the last option sequence received for the tracked field, tagged
//! with the sub-type it was fetched for. A new sequence always replaces the
//! previous one. Failures keep the previous sequence visible.

use crate::error::PathError;
use crate::field_ref::FieldReference;
use crate::notify::{normalize_one, SourceError};
use crate::types::{StageOption, SubTypeId};

/// Options scoped to one sub-type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSet {
    /// Sub-type the options were fetched for
    pub sub_type: SubTypeId,
    /// Options in source order
    pub options: Vec<StageOption>,
}

/// Latest known stage values
#[derive(Debug, Clone, Default)]
pub struct ValueSetCache {
    current: Option<ValueSet>,
}

impl ValueSetCache {
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the outcome of a value-set fetch
    ///
    /// # Errors
    /// `PathError::MetadataFetchFailure` when the fetch failed; the cached
    /// sequence is left untouched
    pub fn on_value_set_received(
        &mut self,
        sub_type: SubTypeId,
        field: &FieldReference,
        result: Result<Vec<StageOption>, SourceError>,
    ) -> Result<(), PathError> {
        match result {
            Ok(options) => {
                tracing::debug!(
                    %field,
                    %sub_type,
                    count = options.len(),
                    "stage values received"
                );
                self.current = Some(ValueSet { sub_type, options });
                Ok(())
            }
            Err(error) => {
                let err = PathError::MetadataFetchFailure {
                    messages: normalize_one(&error),
                };
                tracing::warn!(%field, %sub_type, ?error, "{err}");
                Err(err)
            }
        }
    }

    /// Cached options, `None` until the first successful fetch
    #[inline]
    #[must_use]
    pub fn options(&self) -> Option<&[StageOption]> {
        self.current.as_ref().map(|v| v.options.as_slice())
    }

    /// Sub-type the cached options belong to
    #[inline]
    #[must_use]
    pub fn scoped_to(&self) -> Option<&SubTypeId> {
        self.current.as_ref().map(|v| &v.sub_type)
    }

    /// Cached options were fetched for a different sub-type
    #[inline]
    #[must_use]
    pub fn is_stale_for(&self, sub_type: &SubTypeId) -> bool {
        self.scoped_to().is_some_and(|s| s != sub_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FieldReference {
        FieldReference::parse("Opportunity.StageName").unwrap()
    }

    #[test]
    fn success_replaces_whole_sequence() {
        let mut cache = ValueSetCache::new();
        assert!(cache.options().is_none());

        cache
            .on_value_set_received(
                SubTypeId::new("A"),
                &field(),
                Ok(vec![StageOption::plain("New"), StageOption::plain("Won")]),
            )
            .unwrap();
        cache
            .on_value_set_received(
                SubTypeId::new("A"),
                &field(),
                Ok(vec![StageOption::plain("Open")]),
            )
            .unwrap();

        assert_eq!(cache.options().unwrap(), [StageOption::plain("Open")]);
        assert_eq!(cache.scoped_to(), Some(&SubTypeId::new("A")));
    }

    #[test]
    fn failure_keeps_stale_sequence() {
        let mut cache = ValueSetCache::new();
        cache
            .on_value_set_received(SubTypeId::new("A"), &field(), Ok(vec![StageOption::plain("New")]))
            .unwrap();

        let err = cache
            .on_value_set_received(
                SubTypeId::new("B"),
                &field(),
                Err(SourceError::body("metadata unavailable")),
            )
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to retrieve picklist values. metadata unavailable"
        );
        assert_eq!(cache.options().unwrap().len(), 1);
        assert_eq!(cache.scoped_to(), Some(&SubTypeId::new("A")));
    }

    #[test]
    fn stale_until_new_sub_type_arrives() {
        let mut cache = ValueSetCache::new();
        assert!(!cache.is_stale_for(&SubTypeId::new("A")));

        cache
            .on_value_set_received(SubTypeId::new("A"), &field(), Ok(vec![]))
            .unwrap();
        assert!(cache.is_stale_for(&SubTypeId::new("B")));
        assert!(!cache.is_stale_for(&SubTypeId::new("A")));
    }
}
