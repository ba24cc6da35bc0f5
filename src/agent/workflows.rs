//! # Booking Assistant Wiring
//!
//! Composes the step constructors into the update-state and follow-up
//! pipelines, and the top-level assistant that routes between them. The
//! router's jump target name must match the follow-up step's registry name,
//! which is why wiring lives in one place.

use std::sync::Arc;

use crate::error::WorkflowError;
use crate::llm::LlmClient;
use crate::workflow::{SubWorkflow, Workflow};

use super::steps;

/// Pipeline that extracts booking fields from one user turn and merges them
/// into the durable state.
pub fn update_state_workflow(llm: Arc<dyn LlmClient>) -> Result<Workflow, WorkflowError> {
    Workflow::new()
        .use_step(steps::user_input_guardrail())?
        .use_step(steps::query_llm(llm))?
        .use_step(steps::parse_llm_response())?
        .use_step(steps::state_output_guardrail())?
        .use_step(steps::apply_state_delta())
}

/// Pipeline that asks the user for the next missing booking detail.
pub fn follow_up_workflow(llm: Arc<dyn LlmClient>) -> Result<Workflow, WorkflowError> {
    Workflow::new()
        .use_step(steps::query_llm(llm))?
        .use_step(steps::parse_llm_response())
}

/// The top-level booking assistant.
///
/// One run handles one user turn: extract fields, route, and either finish
/// (all details confirmed) or produce a follow-up question. The router jumps
/// to `ask_follow_up` by name, so that registry name is fixed here.
pub fn booking_assistant_workflow(llm: Arc<dyn LlmClient>) -> Result<Workflow, WorkflowError> {
    Workflow::new()
        .use_step(SubWorkflow::new(
            "update_state",
            Arc::new(update_state_workflow(llm.clone())?),
        ))?
        .use_step(steps::router())?
        .use_step(SubWorkflow::new(
            steps::FOLLOW_UP_STEP,
            Arc::new(follow_up_workflow(llm)?),
        ))
}
