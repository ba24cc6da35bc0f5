//! # Step Contract
//!
//! A step is a unit of pipeline work: it consumes an [`ExecutionContext`] and
//! produces a new one, either directly or as a lazy stream of intermediate
//! contexts of which only the last is retained. Steps must not assume the
//! context they receive is shared; the engine always hands them a private
//! copy.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::Stream;

use super::context::ExecutionContext;
use crate::error::WorkflowError;

/// Stream of intermediate contexts produced by a streaming step.
pub type ContextStream =
    Pin<Box<dyn Stream<Item = Result<ExecutionContext, WorkflowError>> + Send>>;

/// Result of one step invocation.
pub enum StepOutput {
    /// A single successor context
    Context(ExecutionContext),
    /// A lazy sequence of contexts; the engine drains it and keeps the last
    Stream(ContextStream),
}

impl From<ExecutionContext> for StepOutput {
    fn from(ctx: ExecutionContext) -> Self {
        StepOutput::Context(ctx)
    }
}

impl std::fmt::Debug for StepOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOutput::Context(ctx) => f.debug_tuple("Context").field(ctx).finish(),
            StepOutput::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// One unit of pipeline work.
///
/// An `Err` return is the hard-fail path: the engine halts the run and
/// surfaces a stopped pre-step snapshot. Expected terminal outcomes are
/// signalled by returning a context with `stop = true` instead.
#[async_trait]
pub trait Step: Send + Sync {
    /// Default registry name for this step.
    fn name(&self) -> &str;

    async fn execute(&self, ctx: ExecutionContext) -> Result<StepOutput, WorkflowError>;
}

type BoxedStepFn = dyn Fn(
        ExecutionContext,
    ) -> Pin<
        Box<dyn std::future::Future<Output = Result<ExecutionContext, WorkflowError>> + Send>,
    > + Send
    + Sync;

/// Adapts a named async closure into a [`Step`].
///
/// ```rust
/// use rideflow_core::workflow::{ExecutionContext, FnStep};
///
/// let step = FnStep::new("echo", |mut ctx: ExecutionContext| async move {
///     ctx.output = ctx.input.clone();
///     Ok(ctx)
/// });
/// ```
pub struct FnStep {
    name: String,
    func: Arc<BoxedStepFn>,
}

impl FnStep {
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<ExecutionContext, WorkflowError>>
            + Send
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |ctx| Box::pin(func(ctx))),
        }
    }
}

#[async_trait]
impl Step for FnStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: ExecutionContext) -> Result<StepOutput, WorkflowError> {
        (self.func)(ctx).await.map(StepOutput::from)
    }
}
