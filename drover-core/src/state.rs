//! Per-attempt action state

use crate::error::{ActionError, MultiError};

/// Mutable state of one action attempt
///
/// A fresh state is created at the start of every attempt and owned by that
/// attempt alone. A reconnect restart builds a new state with
/// [`ActionState::carry_over`], which keeps only `details`, so the failure that
/// triggered the reconnect is not reported again.
#[derive(Debug, Default)]
pub struct ActionState {
    /// The attempt failed
    pub failed: bool,
    /// Free-form details attached to the result log entry
    pub details: String,
    /// Skip result reporting entirely (bookkeeping-only actions)
    pub no_results: bool,
    /// Never restart this action after a transport disconnect
    pub no_restart_on_disconnect: bool,
    errors: Option<MultiError>,
}

impl ActionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt that inherits only the details of `previous`
    pub fn carry_over(previous: &ActionState) -> Self {
        Self {
            details: previous.details.clone(),
            ..Self::default()
        }
    }

    /// Record an error and mark the attempt failed
    pub fn add_error(&mut self, error: ActionError) {
        self.failed = true;
        self.errors.get_or_insert_with(MultiError::new).push(error);
    }

    /// Record several errors; marks the attempt failed only if there is at least one
    pub fn add_errors<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ActionError>,
    {
        for error in errors {
            self.add_error(error);
        }
    }

    /// Errors collected so far, as pushed
    pub fn errors(&self) -> Option<&MultiError> {
        self.errors.as_ref()
    }

    /// The collected errors flattened into one error
    pub fn error(&self) -> Option<ActionError> {
        self.errors.as_ref().and_then(|e| e.flatten().into_error())
    }

    /// Remove and return the collected errors flattened into one error
    pub fn take_error(&mut self) -> Option<ActionError> {
        self.errors.take().and_then(|e| e.flatten().into_error())
    }
}
