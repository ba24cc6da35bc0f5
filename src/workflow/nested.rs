//! # Nested Workflow Adapter
//!
//! Wraps an entire child [`Workflow`] as a single [`Step`] in a parent
//! workflow. The adapter hands its received context to the child's `run` and
//! returns whatever context the child produces, so pipelines decompose into
//! reusable macro-steps without special-casing composition in the engine.

use std::sync::Arc;

use async_trait::async_trait;

use super::context::ExecutionContext;
use super::engine::Workflow;
use super::step::{Step, StepOutput};
use crate::error::WorkflowError;

/// A child workflow exposed as one step of a parent workflow.
///
/// A hard failure inside the child (e.g. an invalid incoming jump) surfaces
/// as a failure of this single adapter step in the parent. A child run that
/// ends stopped is a normal result; the parent engine then honors the `stop`
/// flag on the returned context.
pub struct SubWorkflow {
    name: String,
    inner: Arc<Workflow>,
}

impl SubWorkflow {
    pub fn new(name: impl Into<String>, inner: Arc<Workflow>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl Step for SubWorkflow {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<StepOutput, WorkflowError> {
        let result = self.inner.run(ctx).await?;
        Ok(StepOutput::Context(result))
    }
}
