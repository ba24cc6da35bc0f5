//! # Execution Context
//!
//! The mutable state carrier for a workflow run. Every step receives its own
//! deep copy; all fields own their data, so `Clone` *is* the isolation
//! boundary the engine relies on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The data envelope threaded through a pipeline run.
///
/// `state` holds durable business fields (e.g. booking fields), while
/// `storage` is ephemeral per-run scratch (deltas, buffers). `input` and
/// `output` are step-to-step payload slots. Exactly one of normal completion
/// or `stop == true` ends a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Correlation key for the run
    pub session_id: Option<String>,
    /// Data entering the current step
    pub input: Value,
    /// Accumulator for the step's result
    pub output: Value,
    /// Durable business fields
    pub state: HashMap<String, Value>,
    /// Ephemeral per-run scratch
    pub storage: HashMap<String, Value>,
    /// Termination signal
    pub stop: bool,
    /// Termination reason, if any
    pub error: Option<String>,
    /// Steps executed so far
    pub steps: u32,
    /// Name of the step to resume at; cleared once consumed
    pub jump_to: Option<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context correlated to a session.
    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Builder-style input seed.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Mark the run as stopped with a reason. Steps use this for expected
    /// terminal outcomes instead of returning an error.
    pub fn mark_stopped(&mut self, error: impl Into<String>) {
        self.stop = true;
        self.error = Some(error.into());
    }

    /// Request a transfer to a named step after this one returns.
    pub fn request_jump(&mut self, target: impl Into<String>) {
        self.jump_to = Some(target.into());
    }

    pub fn state_value(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    pub fn storage_value(&self, key: &str) -> Option<&Value> {
        self.storage.get(key)
    }

    pub fn set_storage(&mut self, key: impl Into<String>, value: Value) {
        self.storage.insert(key.into(), value);
    }

    /// True when a state field is present and neither null nor empty string.
    pub fn state_field_filled(&self, key: &str) -> bool {
        match self.state.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clone_is_a_deep_copy() {
        let mut ctx = ExecutionContext::with_session("session-1");
        ctx.set_state("pickup_location", json!("Old Square"));
        ctx.set_storage("delta_state", json!({"destination": "Airport"}));

        let mut copy = ctx.clone();
        copy.set_state("pickup_location", json!("New Square"));
        copy.storage
            .get_mut("delta_state")
            .and_then(Value::as_object_mut)
            .unwrap()
            .insert("pickup_time".to_string(), json!("18:00"));

        assert_eq!(ctx.state_value("pickup_location"), Some(&json!("Old Square")));
        assert_eq!(
            ctx.storage_value("delta_state"),
            Some(&json!({"destination": "Airport"}))
        );
    }

    #[test]
    fn test_mark_stopped_sets_both_fields() {
        let mut ctx = ExecutionContext::new();
        ctx.mark_stopped("no session_id set");
        assert!(ctx.stop);
        assert_eq!(ctx.error.as_deref(), Some("no session_id set"));
    }

    #[test]
    fn test_state_field_filled() {
        let mut ctx = ExecutionContext::new();
        assert!(!ctx.state_field_filled("destination"));
        ctx.set_state("destination", Value::Null);
        assert!(!ctx.state_field_filled("destination"));
        ctx.set_state("destination", json!(""));
        assert!(!ctx.state_field_filled("destination"));
        ctx.set_state("destination", json!("Airport"));
        assert!(ctx.state_field_filled("destination"));
        ctx.set_state("confirmed", json!(false));
        assert!(ctx.state_field_filled("confirmed"));
    }
}
