//! # Booking Assistant Steps
//!
//! The individual pipeline steps of the booking assistant. Each constructor
//! returns a named [`FnStep`] with its collaborators injected, so workflows
//! are wired from plain values and tests can substitute fakes.
//!
//! Steps follow the engine's failure convention: expected terminal outcomes
//! (missing session, unusable model output) soft-stop the context; only
//! genuinely unexpected conditions return `Err`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::llm::{parse_agent_action, AgentAction, LlmClient};
use crate::workflow::{ExecutionContext, FnStep};

/// Booking fields the extraction model may set.
pub const ALLOWED_STATE_FIELDS: &[&str] = &[
    "pickup_location",
    "destination",
    "pickup_time",
    "special_requests",
    "passengers",
    "confirmed",
];

/// Fields that must all be filled before a booking can be scheduled.
pub const REQUIRED_BOOKING_FIELDS: &[&str] = &[
    "pickup_location",
    "destination",
    "pickup_time",
    "special_requests",
];

/// Registry name the router jumps to while booking details are missing.
pub const FOLLOW_UP_STEP: &str = "ask_follow_up";

/// Rejects turns that arrive without a session or without user text.
pub fn user_input_guardrail() -> FnStep {
    FnStep::new("user_input_guardrail", |mut ctx: ExecutionContext| async move {
        if ctx.session_id.is_none() {
            ctx.mark_stopped("no session_id set");
            return Ok(ctx);
        }
        if !ctx.input.as_str().is_some_and(|s| !s.trim().is_empty()) {
            ctx.mark_stopped("empty user input");
        }
        Ok(ctx)
    })
}

/// Sends `storage["prompt"]` to the model and places the raw completion text
/// into `output`.
///
/// Model connectivity failures soft-stop the turn rather than aborting the
/// pipeline; the channel layer surfaces a retry message.
pub fn query_llm(client: Arc<dyn LlmClient>) -> FnStep {
    FnStep::new("query_llm", move |mut ctx: ExecutionContext| {
        let client = client.clone();
        async move {
            let Some(prompt) = ctx.storage_value("prompt").and_then(Value::as_str) else {
                ctx.mark_stopped("no prompt prepared for model query");
                return Ok(ctx);
            };
            match client.complete(prompt).await {
                Ok(text) => {
                    ctx.output = Value::String(text);
                }
                Err(e) => {
                    warn!(error = %e, "Model query failed");
                    ctx.mark_stopped(format!("model query failed: {e}"));
                }
            }
            Ok(ctx)
        }
    })
}

/// Recovers a structured action from the raw completion text in `output`.
///
/// Parsing itself never fails; a non-string `output` is a wiring error and
/// soft-stops the turn.
pub fn parse_llm_response() -> FnStep {
    FnStep::new("parse_llm_response", |mut ctx: ExecutionContext| async move {
        let Some(raw) = ctx.output.as_str() else {
            ctx.mark_stopped("parse_llm_response expects raw model text");
            return Ok(ctx);
        };
        let action = parse_agent_action(raw);
        debug!(?action, "Parsed model output");
        ctx.output = action.to_value();
        Ok(ctx)
    })
}

/// Validates an `update_state` action and accumulates its fields into
/// `storage["delta_state"]`.
///
/// Unknown field names mean the extraction model wandered off schema; the
/// turn soft-stops so nothing unvalidated reaches booking state. A
/// `respond_to_user` action passes through untouched.
pub fn state_output_guardrail() -> FnStep {
    FnStep::new("state_output_guardrail", |mut ctx: ExecutionContext| async move {
        let Some(action) = AgentAction::from_value(&ctx.output) else {
            ctx.mark_stopped("unrecognized action in model output");
            return Ok(ctx);
        };
        let AgentAction::UpdateState { args } = action else {
            return Ok(ctx);
        };

        if let Some(unknown) = args.keys().find(|k| !ALLOWED_STATE_FIELDS.contains(&k.as_str())) {
            warn!(field = %unknown, "Extraction model produced an unknown booking field");
            ctx.mark_stopped(format!("model produced unknown booking field '{unknown}'"));
            return Ok(ctx);
        }

        let delta = ctx
            .storage
            .entry("delta_state".to_string())
            .or_insert_with(|| json!({}));
        if let Some(delta) = delta.as_object_mut() {
            delta.extend(args);
        }
        Ok(ctx)
    })
}

/// Merges `storage["delta_state"]` into the durable booking state and clears
/// the delta.
pub fn apply_state_delta() -> FnStep {
    FnStep::new("apply_state_delta", |mut ctx: ExecutionContext| async move {
        let delta = ctx.storage.insert("delta_state".to_string(), json!({}));
        if let Some(Value::Object(fields)) = delta {
            for (key, value) in fields {
                ctx.set_state(key, value);
            }
        }
        Ok(ctx)
    })
}

fn booking_complete(ctx: &ExecutionContext) -> bool {
    REQUIRED_BOOKING_FIELDS.iter().all(|f| ctx.state_field_filled(f))
        && ctx.state_value("confirmed") == Some(&Value::Bool(true))
}

/// Decides the next move after a state update: stop when every booking field
/// is filled and the user has confirmed, otherwise jump back to the follow-up
/// question step.
pub fn router() -> FnStep {
    FnStep::new("route", |mut ctx: ExecutionContext| async move {
        if booking_complete(&ctx) {
            debug!(session_id = ctx.session_id.as_deref(), "Booking details complete");
            ctx.stop = true;
        } else {
            ctx.request_jump(FOLLOW_UP_STEP);
        }
        Ok(ctx)
    })
}
