//! Path model reconciliation
//!
//! Combines the cached stage options with the tracked current value into the
//! ordered step list a renderer draws.
//!
//! # Invariants
//!
//! - At most one step is current, and only for a non-empty current value
//! - Steps before the current one are completed, the rest are not
//! - With no (or an empty) current value nothing is completed
//! - A non-empty current value matching no option leaves every step
//!   completed, because the running flag never flips

use crate::types::{PathStep, StageOption};

/// Class present on every step
pub const BASE_CLASS: &str = "slds-path__item";
/// Classes added to the current step
pub const CURRENT_CLASSES: &str = "slds-is-current slds-is-active";
/// Class added to completed steps
pub const COMPLETE_CLASS: &str = "slds-is-complete";
/// Class added to steps not yet reached
pub const INCOMPLETE_CLASS: &str = "slds-is-incomplete";

/// Derive path steps
///
/// `None` or empty options is the idle state and yields no steps.
#[must_use]
pub fn reconcile(options: Option<&[StageOption]>, current_value: Option<&str>) -> Vec<PathStep> {
    let Some(options) = options.filter(|o| !o.is_empty()) else {
        return Vec::new();
    };

    let current = current_value.filter(|v| !v.is_empty());
    let mut is_completed = current.is_some();

    options
        .iter()
        .map(|option| {
            let is_current = current == Some(option.value.as_str());
            if is_current {
                is_completed = false;
            }
            PathStep {
                value: option.value.clone(),
                label: option.label.clone(),
                is_current,
                is_completed,
                style_class: style_class(is_current, is_completed),
            }
        })
        .collect()
}

/// Whether a non-empty current value is missing from the options
///
/// This is the case where [`reconcile`] marks every step completed.
#[must_use]
pub fn is_unmatched(options: Option<&[StageOption]>, current_value: Option<&str>) -> bool {
    match (options, current_value.filter(|v| !v.is_empty())) {
        (Some(options), Some(current)) if !options.is_empty() => {
            !options.iter().any(|o| o.value == current)
        }
        _ => false,
    }
}

fn style_class(is_current: bool, is_completed: bool) -> String {
    let modifier = if is_current {
        CURRENT_CLASSES
    } else if is_completed {
        COMPLETE_CLASS
    } else {
        INCOMPLETE_CLASS
    };
    format!("{BASE_CLASS} {modifier}")
}
