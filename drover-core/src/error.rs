//! Error types for action execution

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// Result type alias for action execution
pub type Result<T> = std::result::Result<T, ActionError>;

/// Error produced while executing an action
///
/// Errors are cloneable so the same failure can be attached to an
/// [`ActionState`](crate::ActionState), written to the action log and
/// surfaced to the caller.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    /// The run was cancelled. Never a failure statistic and never retried.
    #[error("action aborted")]
    Aborted,

    /// The transport dropped while the action was in flight
    #[error("connection lost: {0}")]
    Disconnected(String),

    /// The connection closed and could not be re-established
    #[error("websocket unexpectedly closed")]
    ConnectionClosed,

    /// A panic recovered at the action or sub-request boundary
    #[error("panic: {0}")]
    Panic(String),

    /// Plain business-logic failure
    #[error("{0}")]
    Failed(String),

    /// Invalid action settings
    #[error("invalid settings: {0}")]
    Validation(String),

    /// Several errors collected from sub-requests or sub-actions
    #[error(transparent)]
    Multi(MultiError),

    /// An error annotated with where it happened
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<ActionError>,
    },
}

impl ActionError {
    /// Create a plain failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a disconnect error
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::Disconnected(message.into())
    }

    /// Convert a panic payload caught by `catch_unwind` into an error
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panic(message)
    }

    /// Wrap this error with a description of where it happened
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Peel off every [`ActionError::Context`] wrapper
    pub fn root_cause(&self) -> &ActionError {
        let mut current = self;
        while let ActionError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether the root cause is the abort sentinel
    pub fn is_aborted(&self) -> bool {
        matches!(self.root_cause(), ActionError::Aborted)
    }

    /// Whether the error, or any error it aggregates, indicates that the
    /// transport went away
    pub fn is_disconnect(&self) -> bool {
        match self.root_cause() {
            ActionError::Disconnected(_) | ActionError::ConnectionClosed => true,
            ActionError::Multi(multi) => multi.iter().any(ActionError::is_disconnect),
            _ => false,
        }
    }

    /// Whether the error came from a recovered panic
    pub fn is_panic(&self) -> bool {
        match self.root_cause() {
            ActionError::Panic(_) => true,
            ActionError::Multi(multi) => multi.iter().any(ActionError::is_panic),
            _ => false,
        }
    }

    /// Short machine-friendly name of the error kind, used in log entries
    pub fn kind(&self) -> &'static str {
        match self.root_cause() {
            ActionError::Aborted => "aborted",
            ActionError::Disconnected(_) => "disconnected",
            ActionError::ConnectionClosed => "connection_closed",
            ActionError::Panic(_) => "panic",
            ActionError::Failed(_) => "failed",
            ActionError::Validation(_) => "validation",
            ActionError::Multi(_) => "multi",
            // root_cause never stops at a wrapper
            ActionError::Context { .. } => "context",
        }
    }
}

impl From<MultiError> for ActionError {
    fn from(multi: MultiError) -> Self {
        ActionError::Multi(multi)
    }
}

/// An ordered collection of errors
///
/// Nested collections are kept as pushed; [`MultiError::flatten`] inlines them.
#[derive(Debug, Clone, Default)]
pub struct MultiError {
    errors: Vec<ActionError>,
}

impl MultiError {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ActionError) {
        self.errors.push(error);
    }

    pub fn extend<I>(&mut self, errors: I)
    where
        I: IntoIterator<Item = ActionError>,
    {
        self.errors.extend(errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ActionError> {
        self.errors
    }

    /// Recursively inline nested collections, dropping those that end up empty
    pub fn flatten(&self) -> MultiError {
        let mut flat = MultiError::new();
        for error in &self.errors {
            match error {
                ActionError::Multi(nested) => flat.extend(nested.flatten().errors),
                other => flat.push(other.clone()),
            }
        }
        flat
    }

    /// Collapse into a single error
    ///
    /// Returns `None` when empty, the only member when there is one, and the
    /// whole collection otherwise.
    pub fn into_error(mut self) -> Option<ActionError> {
        match self.errors.len() {
            0 => None,
            1 => self.errors.pop(),
            _ => Some(ActionError::Multi(self)),
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.len() == 1 {
            write!(f, "1 error occurred:")?;
        } else {
            write!(f, "{} errors occurred:", self.errors.len())?;
        }
        for error in &self.errors {
            write!(f, "\n\t* {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl FromIterator<ActionError> for MultiError {
    fn from_iter<I: IntoIterator<Item = ActionError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MultiError {
    type Item = ActionError;
    type IntoIter = std::vec::IntoIter<ActionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a ActionError;
    type IntoIter = std::slice::Iter<'a, ActionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
