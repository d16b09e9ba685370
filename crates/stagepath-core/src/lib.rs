//! Stagepath Core - stage path reconciliation and write-back
//!
//! Renders a record's stage field as an ordered path:
//! - Fetches the valid stage values for the record's sub-type
//! - Tracks the record's current stage value
//! - Derives steps with current/completed flags on every update
//! - Writes a clicked stage back to the record store and reports the outcome
//!
//! # Example
//!
//! ```rust,ignore
//! use stagepath_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<InMemoryBackend>) -> Result<(), PathError> {
//! let config = PathConfig::new("006A", "Opportunity", "Opportunity.StageName");
//! let path = PathSession::spawn(&config, backend.clone(), backend, Arc::new(TracingSink))?;
//!
//! let view = path.wait_for(|v| v.current().is_some()).await?;
//! println!("current stage: {}", view.current().unwrap().label);
//!
//! path.click("Closed Won").await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod error;
pub mod field_ref;
pub mod memory;
pub mod notify;
pub mod reconcile;
pub mod session;
pub mod source;
pub mod state;
pub mod tracker;
pub mod types;
pub mod value_set;
pub mod writeback;

// Re-exports for convenience
pub use config::{BoundPath, PathConfig};
pub use error::{PathError, PathResult};
pub use field_ref::FieldReference;
pub use memory::{BackendFixture, InMemoryBackend, Operation, PicklistFixture, StoredRecord};
pub use notify::{
    normalize, normalize_json, normalize_one, Notification, NotificationSink, Severity,
    SourceError, TracingSink,
};
pub use reconcile::reconcile;
pub use session::{PathEvent, PathHandle, PathSession};
pub use source::{MetadataSource, RecordStore};
pub use state::PathState;
pub use tracker::CurrentValueTracker;
pub use types::{
    FieldValue, ObjectInfo, PathStep, PathView, RecordId, RecordSnapshot, RecordStageState,
    RecordUpdate, StageOption, SubTypeId,
};
pub use value_set::{ValueSet, ValueSetCache};
pub use writeback::{WriteBackCoordinator, WriteOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with stage paths
    pub use crate::{
        FieldReference, InMemoryBackend, MetadataSource, Notification, NotificationSink,
        PathConfig, PathError, PathHandle, PathSession, PathStep, PathView, RecordStore,
        Severity, SourceError, StageOption, TracingSink,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
