//! Action types every registry created with builtins knows about

pub mod iterated;
pub mod setscriptvar;
pub mod thinktime;

use std::sync::Arc;
use tracing::warn;

use crate::registry::ActionRegistry;

pub use iterated::{IteratedFactory, IteratedSettings};
pub use setscriptvar::SetScriptVarSettings;
pub use thinktime::ThinkTimeSettings;

pub const THINK_TIME: &str = "thinktime";
pub const ITERATED: &str = "iterated";
pub const SET_SCRIPT_VAR: &str = "setscriptvar";

/// Register the built-in action types, keeping any already registered
pub fn register_all(registry: &ActionRegistry) {
    let results = [
        registry.register_settings::<ThinkTimeSettings>(THINK_TIME, false),
        registry.register(ITERATED, Arc::new(IteratedFactory), false),
        registry.register_settings::<SetScriptVarSettings>(SET_SCRIPT_VAR, false),
    ];
    for result in results {
        if let Err(e) = result {
            warn!("Skipping built-in action type: {}", e);
        }
    }
}
