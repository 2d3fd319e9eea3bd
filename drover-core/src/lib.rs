//! Core types shared by every Drover crate
//!
//! This crate holds the pieces of the action lifecycle that carry no runtime
//! dependencies:
//! - [`ActionError`] and [`MultiError`], the error taxonomy of an action run
//! - [`classify`], the single decision point for "aborted or failed"
//! - [`ActionState`], the mutable per-attempt state handed to business logic
//! - identifier newtypes for actions and sessions

pub mod classify;
pub mod error;
pub mod state;
pub mod types;

pub use classify::{classify, Classified};
pub use error::{ActionError, MultiError, Result};
pub use state::ActionState;
pub use types::{next_action_id, ActionId, SessionId};
