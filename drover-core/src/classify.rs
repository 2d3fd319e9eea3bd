//! Error classification
//!
//! [`classify`] is the one place that decides whether a failure means "the run
//! was cancelled" or "the action failed". The scheduler uses it to pick the log
//! level of a finished action, and composite actions use it to decide whether
//! to keep iterating after a sub-action fails.

use crate::error::ActionError;

/// Outcome of [`classify`]
#[derive(Debug, Clone)]
pub struct Classified {
    /// The error is, or contains, the abort sentinel
    pub aborted: bool,
    /// The error with nested collections flattened
    pub error: ActionError,
}

/// Classify an error as aborted or not, unwrapping nested multi-errors
///
/// - an error whose root cause is [`ActionError::Aborted`] is aborted as-is;
/// - a multi-error is flattened. If any member is aborted only that member is
///   returned, a single remaining member is classified on its own, and
///   anything larger is returned flattened so callers see the full set;
/// - everything else is returned unchanged.
pub fn classify(error: &ActionError) -> Classified {
    if error.is_aborted() {
        return Classified {
            aborted: true,
            error: error.clone(),
        };
    }

    let ActionError::Multi(multi) = error.root_cause() else {
        return Classified {
            aborted: false,
            error: error.clone(),
        };
    };

    let flat = multi.flatten();
    if let Some(abort) = flat.iter().find(|e| e.is_aborted()) {
        return Classified {
            aborted: true,
            error: abort.clone(),
        };
    }

    let mut members = flat.into_vec();
    if members.len() == 1 {
        let only = members.remove(0);
        return classify(&only);
    }

    Classified {
        aborted: false,
        error: ActionError::Multi(members.into_iter().collect()),
    }
}
