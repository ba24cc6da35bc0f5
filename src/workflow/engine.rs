//! # Workflow Engine
//!
//! Executes a static, named, ordered list of steps against one
//! [`ExecutionContext`], supporting conditional forward/backward transfer via
//! named jump targets.
//!
//! The jump mechanism is an explicit state machine: named steps are states,
//! `jump_to` is the transition, and the registry built at construction keeps
//! the set of reachable states statically enumerable. Per-step deep-copy
//! isolation is the concurrency-correctness primitive: many runs may execute
//! concurrently against one shared `Workflow`, which holds no mutable state.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, instrument, warn};

use super::context::ExecutionContext;
use super::step::{Step, StepOutput};
use crate::error::WorkflowError;

/// Default hard cap on steps executed in one run, bounding jump cycles.
pub const DEFAULT_MAX_STEPS_PER_RUN: u32 = 1000;

/// An immutable, registry-backed pipeline of named steps.
pub struct Workflow {
    steps: Vec<Arc<dyn Step>>,
    registry: HashMap<String, usize>,
    max_steps_per_run: u32,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("steps", &self.registry.keys().collect::<Vec<_>>())
            .field("max_steps_per_run", &self.max_steps_per_run)
            .finish()
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            registry: HashMap::new(),
            max_steps_per_run: DEFAULT_MAX_STEPS_PER_RUN,
        }
    }

    /// Override the per-run step budget.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps_per_run = max_steps;
        self
    }

    /// Append a step under its own name.
    pub fn use_step(self, step: impl Step + 'static) -> Result<Self, WorkflowError> {
        let name = step.name().to_string();
        self.register(Arc::new(step), name)
    }

    /// Append a step under an explicit registry name.
    pub fn use_step_named(
        self,
        step: impl Step + 'static,
        name: impl Into<String>,
    ) -> Result<Self, WorkflowError> {
        self.register(Arc::new(step), name.into())
    }

    fn register(mut self, step: Arc<dyn Step>, name: String) -> Result<Self, WorkflowError> {
        if self.registry.contains_key(&name) {
            return Err(WorkflowError::DuplicateStepName { name });
        }
        self.steps.push(step);
        self.registry.insert(name, self.steps.len() - 1);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when `name` is a registered jump target.
    pub fn has_step(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Execute the pipeline against `ctx`.
    ///
    /// Returns `Err` only when the incoming context carries a `jump_to` that
    /// names no registered step; the run fails before any step executes.
    /// All other failures are reported in-band: the returned context has
    /// `stop = true` and `error` populated.
    #[instrument(skip_all, fields(session_id = ctx.session_id.as_deref()))]
    pub async fn run(&self, ctx: ExecutionContext) -> Result<ExecutionContext, WorkflowError> {
        if let Some(target) = &ctx.jump_to {
            if !self.registry.contains_key(target) {
                return Err(WorkflowError::UnknownJumpTarget {
                    target: target.clone(),
                });
            }
        }

        let mut exec_ctx = ctx;

        if exec_ctx.stop {
            return Ok(exec_ctx);
        }

        let mut cursor = match exec_ctx.jump_to.take() {
            Some(target) => self.registry[&target],
            None => 0,
        };

        let mut executed: u32 = 0;
        let n = self.steps.len();

        while cursor < n {
            if executed >= self.max_steps_per_run {
                warn!(executed, "Step budget exceeded, stopping run");
                exec_ctx.mark_stopped(format!(
                    "run exceeded maximum of {} steps",
                    self.max_steps_per_run
                ));
                return Ok(exec_ctx);
            }

            let step = &self.steps[cursor];
            let step_name = step.name().to_string();
            debug!(cursor, step = %step_name, "Executing step");

            // Hand the step a private copy so partial mutation inside a
            // failing step never reaches the context we return.
            let step_ctx = exec_ctx.clone();

            let result = match step.execute(step_ctx).await {
                Ok(output) => self.normalize(output, &step_name).await,
                Err(e) => Err(e),
            };

            let mut next_ctx = match result {
                Ok(next) => next,
                Err(e) => {
                    error!(cursor, step = %step_name, error = %e, "Step failed");
                    exec_ctx.mark_stopped(e.to_string());
                    return Ok(exec_ctx);
                }
            };

            executed += 1;
            next_ctx.steps = next_ctx.steps.saturating_add(1);
            exec_ctx = next_ctx;

            if exec_ctx.stop {
                return Ok(exec_ctx);
            }

            if let Some(target) = exec_ctx.jump_to.take() {
                match self.registry.get(&target) {
                    Some(&index) => {
                        debug!(from = cursor, to = index, target = %target, "Jump transition");
                        cursor = index;
                    }
                    None => {
                        let e = WorkflowError::UnknownJumpTarget { target };
                        error!(cursor, step = %step_name, error = %e, "Invalid jump target");
                        exec_ctx.mark_stopped(e.to_string());
                        return Ok(exec_ctx);
                    }
                }
            } else {
                cursor += 1;
            }
        }

        Ok(exec_ctx)
    }

    /// Drain a step's output down to its final context.
    async fn normalize(
        &self,
        output: StepOutput,
        step_name: &str,
    ) -> Result<ExecutionContext, WorkflowError> {
        match output {
            StepOutput::Context(ctx) => Ok(ctx),
            StepOutput::Stream(mut stream) => {
                let mut last = None;
                while let Some(item) = stream.next().await {
                    last = Some(item?);
                }
                last.ok_or_else(|| WorkflowError::EmptyStepResult {
                    step: step_name.to_string(),
                })
            }
        }
    }
}
